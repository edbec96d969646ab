//! Example application: a contacts API with view tracking
//!
//! One axum app serves the contacts API (every call recorded with
//! `track_calls`) and the collector under the configured prefix.

pub mod contacts;
pub mod session;

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use viewtrack_client::HostInjection;
use viewtrack_collector::{client_config, track_calls, CollectorStore};
use viewtrack_core::prelude::*;
use viewtrack_core::{CallRecord, InstanceId, ViewRecord};

use crate::settings::Settings;

/// The whole example app over `store`.
pub fn app(store: CollectorStore, track_prefix: &str) -> Router {
    track_calls(contacts::router(), store.clone())
        .nest(track_prefix, viewtrack_collector::router(store))
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve_on(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(())
}

/// Run the example app until Ctrl-C.
pub async fn serve(settings: &Settings) -> Result<()> {
    let listener = TcpListener::bind(settings.server.bind.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.bind))?;
    let addr = listener.local_addr()?;
    info!(
        "Listening on http://{} (collector under {})",
        addr, settings.server.track_prefix
    );

    let store = CollectorStore::new();
    serve_on(listener, app(store, &settings.server.track_prefix), async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    })
    .await?;

    info!("Server stopped");
    Ok(())
}

/// What a scripted session left in the collector.
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub instance: InstanceId,
    pub reports_delivered: usize,
    pub reports_failed: usize,
    pub views: Vec<ViewRecord>,
    pub calls: Vec<CallRecord>,
}

/// Run app and scripted session on a loopback port and collect the results.
pub async fn run_demo(settings: &Settings) -> Result<DemoReport> {
    let prefix = settings.server.track_prefix.clone();
    let store = CollectorStore::new();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let origin = format!("http://{}", listener.local_addr()?);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_on(
        listener,
        app(store.clone(), &prefix),
        async move {
            let _ = stop_rx.await;
        },
    ));

    let page_url = format!("{origin}/contacts");
    let client_data = session::obtain_instance(&origin, &prefix, &page_url)
        .await
        .context("Failed to obtain an instance")?;
    let instance = client_data
        .instance
        .clone()
        .ok_or_else(|| Error::server("collector returned no instance"))?;
    info!("Demo session is instance {}", instance);

    let injection = HostInjection::new(Some(origin), client_config(&prefix), client_data);
    let stats = session::run_script(&injection, settings.demo.detail_views).await?;

    let report = DemoReport {
        views: store.views(Some(&instance)).await,
        calls: store.all_calls().await,
        instance,
        reports_delivered: stats.delivered,
        reports_failed: stats.failed,
    };

    let _ = stop_tx.send(());
    match server.await {
        Ok(result) => result?,
        Err(e) => warn!("Server task failed: {}", e),
    }

    Ok(report)
}
