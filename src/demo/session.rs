//! Scripted browser session driving the tracker headlessly

use serde_json::json;
use viewtrack_client::{HostInjection, Navigator, ReporterStats, TrackedClient, Tracker};
use viewtrack_core::prelude::*;
use viewtrack_core::{ClientData, StateParams};

use super::contacts::{self, Contact};

/// Ask the collector under `track_base` for a new instance, as a host page
/// would when it is served.
pub async fn obtain_instance(origin: &str, track_base: &str, page_url: &str) -> Result<ClientData> {
    let base = url::Url::parse(origin).map_err(|e| Error::config(format!("invalid origin: {e}")))?;
    let client = TrackedClient::builder().base_url(Some(base)).build();

    let response = client
        .post(&format!("{}/instances", track_base.trim_end_matches('/')))
        .json(&json!({ "url": page_url }))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(Error::server(format!(
            "instance creation answered {}",
            response.status()
        )));
    }
    response
        .json::<ClientData>()
        .await
        .map_err(|e| Error::transport(e.to_string()))
}

/// Browse the contact list, then open up to `detail_views` contacts, loading
/// each page's data through the tracked client.
pub async fn run_script(injection: &HostInjection, detail_views: usize) -> Result<ReporterStats> {
    let tracker = Tracker::start(injection, contacts::states());
    let navigator = Navigator::new();
    tracker.attach(&navigator);

    let result = browse(&tracker, &navigator, detail_views).await;
    let stats = tracker.shutdown().await;
    result.map(|()| stats)
}

async fn browse(tracker: &Tracker, navigator: &Navigator, detail_views: usize) -> Result<()> {
    navigator.navigate("contacts", StateParams::new());
    let list: Vec<Contact> = tracker
        .client()
        .get("/api/contacts")
        .send()
        .await?
        .json()
        .await
        .map_err(|e| Error::transport(e.to_string()))?;
    info!("Contact list has {} entries", list.len());

    for contact in list.iter().take(detail_views) {
        let mut params = StateParams::new();
        params.insert("id".to_string(), json!(contact.id.to_string()));
        navigator.navigate("contacts.detail", params);

        let response = tracker
            .client()
            .get(&format!("/api/contacts/{}", contact.id))
            .send()
            .await?;
        debug!("Contact {} -> {}", contact.id, response.status());
    }

    Ok(())
}
