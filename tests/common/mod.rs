//! Shared loopback server for integration tests

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use viewtrack::demo::{app, serve_on};
use viewtrack_collector::CollectorStore;

pub const TRACK_PREFIX: &str = "/track";

/// A running example app. The server stops when this is dropped.
pub struct TestApp {
    pub origin: String,
    pub store: CollectorStore,
    _stop: oneshot::Sender<()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    let store = CollectorStore::new();
    let (stop, stopped) = oneshot::channel::<()>();

    tokio::spawn(serve_on(
        listener,
        app(store.clone(), TRACK_PREFIX),
        async move {
            let _ = stopped.await;
        },
    ));

    TestApp {
        origin,
        store,
        _stop: stop,
    }
}
