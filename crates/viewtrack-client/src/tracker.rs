//! Tracker facade: wires identity, sequencer, client and reporter together

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use viewtrack_core::prelude::*;

use crate::config::HostInjection;
use crate::http::TrackedClient;
use crate::identity::SessionIdentity;
use crate::interceptor::ViewHeaderInterceptor;
use crate::navigation::Navigator;
use crate::reporter::{
    spawn_reporter, HttpReportTransport, ReportTarget, ReportTransport, ReporterStats,
};
use crate::sequencer::ViewSequencer;
use crate::states::StateRegistry;

/// A running view tracker for one browser instance.
///
/// The reporter task keeps running until [`Tracker::shutdown`].
pub struct Tracker {
    sequencer: Arc<ViewSequencer>,
    client: TrackedClient,
    reporter: Option<JoinHandle<ReporterStats>>,
}

impl Tracker {
    /// Start tracking with the injected host configuration.
    ///
    /// Reports are sent from the current tokio runtime. Without one, views
    /// are still sequenced and stamped but reports are dropped.
    pub fn start(injection: &HostInjection, states: StateRegistry) -> Self {
        Self::start_with_transport(injection, states, HttpReportTransport::new)
    }

    /// Like [`start`](Self::start) with a custom report transport built from
    /// the tracked client.
    pub fn start_with_transport<T, F>(
        injection: &HostInjection,
        states: StateRegistry,
        make_transport: F,
    ) -> Self
    where
        T: ReportTransport + Send + Sync + 'static,
        F: FnOnce(TrackedClient) -> T,
    {
        let identity = SessionIdentity::resolve(injection.client_data.as_ref());
        let origin = injection.origin_url();
        let sequencer = Arc::new(ViewSequencer::new(identity, states));

        let client = TrackedClient::builder()
            .base_url(origin.clone())
            .interceptor(ViewHeaderInterceptor::new(Arc::clone(&sequencer)))
            .build();

        let reporter = match (&injection.client_config, Handle::try_current()) {
            (Some(config), Ok(runtime)) => {
                if !config.has_placeholder() {
                    warn!(
                        "View URL {:?} has no instance placeholder",
                        config.new_view_url
                    );
                }
                let target = ReportTarget::new(config.clone(), origin);
                let (queue, handle) =
                    spawn_reporter(&runtime, make_transport(client.clone()), target);
                sequencer.attach_reports(queue);
                Some(handle)
            }
            (Some(_), Err(e)) => {
                error!(
                    "No async runtime for the reporter ({}); view reports will be dropped",
                    e
                );
                None
            }
            (None, _) => {
                error!(
                    "{}; view reports will be dropped",
                    Error::configuration_missing("tracker config (no view URL injected)")
                );
                None
            }
        };

        info!(
            "Tracker started for instance {}",
            sequencer.current_view_id().header_value()
        );

        Self {
            sequencer,
            client,
            reporter,
        }
    }

    /// Subscribe the sequencer to `navigator`'s start-of-navigation events.
    pub fn attach(&self, navigator: &Navigator) {
        navigator.subscribe(self.sequencer.clone());
    }

    /// Client whose requests carry the correlation header.
    pub fn client(&self) -> &TrackedClient {
        &self.client
    }

    pub fn sequencer(&self) -> &Arc<ViewSequencer> {
        &self.sequencer
    }

    /// Stop reporting and wait for in-flight reports.
    ///
    /// Views recorded afterwards are sequenced but not reported.
    pub async fn shutdown(mut self) -> ReporterStats {
        drop(self.sequencer.detach_reports());
        match self.reporter.take() {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                warn!("Reporter task failed: {}", e);
                ReporterStats::default()
            }),
            None => ReporterStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{contact_states, RecordingTransport};
    use serde_json::json;
    use std::io::Write;
    use std::sync::Mutex;
    use viewtrack_core::{ClientData, InstanceId, StateParams, TrackerConfig};

    fn injection(instance: Option<&str>) -> HostInjection {
        HostInjection {
            origin: Some("http://127.0.0.1:9000".to_string()),
            client_config: Some(TrackerConfig::new("/instances/:instance/views")),
            client_data: instance.map(|i| ClientData::new(InstanceId::new(i).unwrap())),
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_navigation_is_reported_in_order() {
        let transport = RecordingTransport::new();
        let recorder = transport.clone();
        let tracker =
            Tracker::start_with_transport(&injection(Some("abc123")), contact_states(), |_| {
                recorder
            });

        let navigator = Navigator::new();
        tracker.attach(&navigator);
        navigator.navigate("contacts", StateParams::new());
        let mut params = StateParams::new();
        params.insert("id".to_string(), json!("42"));
        navigator.navigate("contacts.detail", params);

        let stats = tracker.shutdown().await;
        assert_eq!(stats.delivered, 2);

        let mut posted = transport.posted();
        posted.sort_by_key(|(_, v)| v.sequence);
        assert_eq!(posted[0].1.sequence, 1);
        assert_eq!(posted[0].1.state_name, "contacts");
        assert_eq!(posted[1].1.sequence, 2);
        assert_eq!(posted[1].1.request_uri.as_deref(), Some("/contacts/42"));
        assert_eq!(
            posted[1].0.as_str(),
            "http://127.0.0.1:9000/instances/abc123/views"
        );
    }

    #[tokio::test]
    async fn test_client_requests_carry_current_view() {
        let tracker = Tracker::start_with_transport(
            &injection(Some("abc123")),
            contact_states(),
            |_| RecordingTransport::new(),
        );
        tracker.sequencer().record_view("contacts", StateParams::new());

        let request = tracker.client().get("/api/contacts").prepare().unwrap();
        assert_eq!(
            request.headers().get(viewtrack_core::VIEW_HEADER).unwrap(),
            "abc123 1"
        );
        assert_eq!(request.url().as_str(), "http://127.0.0.1:9000/api/contacts");
        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn test_without_config_views_are_dropped() {
        let mut inj = injection(Some("abc123"));
        inj.client_config = None;
        let tracker = Tracker::start(&inj, contact_states());

        let id = tracker.sequencer().record_view("contacts", StateParams::new());
        assert_eq!(id.sequence, 1);
        assert_eq!(tracker.shutdown().await, ReporterStats::default());
    }

    #[tokio::test]
    async fn test_recording_after_shutdown_still_sequences() {
        let transport = RecordingTransport::new();
        let recorder = transport.clone();
        let tracker =
            Tracker::start_with_transport(&injection(Some("abc123")), contact_states(), |_| {
                recorder
            });
        let sequencer = Arc::clone(tracker.sequencer());
        tracker.shutdown().await;

        let id = sequencer.record_view("contacts", StateParams::new());
        assert_eq!(id.sequence, 1);
        assert!(transport.posted().is_empty());
    }

    #[test]
    fn test_start_without_runtime_drops_reports() {
        let tracker = Tracker::start(&injection(Some("abc123")), contact_states());
        assert!(tracker.reporter.is_none());

        let first = tracker.sequencer().record_view("contacts", StateParams::new());
        let second = tracker.sequencer().record_view("contacts", StateParams::new());
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert!(tracker.sequencer().detach_reports().is_none());

        let request = tracker.client().get("/api/contacts").prepare().unwrap();
        assert_eq!(
            request.headers().get(viewtrack_core::VIEW_HEADER).unwrap(),
            "abc123 2"
        );
    }

    #[test]
    fn test_missing_identity_logged_once() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        tracing::subscriber::with_default(subscriber, || {
            runtime.block_on(async {
                let tracker = Tracker::start_with_transport(
                    &injection(None),
                    contact_states(),
                    |_| RecordingTransport::new(),
                );
                for _ in 0..3 {
                    tracker.sequencer().record_view("contacts", StateParams::new());
                    let _ = tracker.client().get("/api/contacts").prepare().unwrap();
                }
                tracker.shutdown().await;
            });
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            output.matches("Configuration missing: client data").count(),
            1
        );
    }
}
