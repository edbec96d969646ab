//! Fire-and-forget view reporting
//!
//! [`ViewSequencer::record_view`](crate::sequencer::ViewSequencer::record_view)
//! pushes snapshots onto a [`ReportQueue`] without blocking. A background
//! task drains the queue and POSTs each view, one task per report, so a slow
//! or failing collector never holds up navigation. Failures are logged and
//! dropped; there is no retry.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use url::Url;
use viewtrack_core::prelude::*;
use viewtrack_core::{TrackerConfig, ViewState};

use crate::http::TrackedClient;

/// Delivers one view report.
#[trait_variant::make(ReportTransport: Send)]
pub trait LocalReportTransport {
    /// POST `view` to `url`. Any non-success outcome is an error.
    async fn post_view(&self, url: &Url, view: &ViewState) -> Result<()>;
}

/// Reports over HTTP through the tracked client, so report requests carry
/// the correlation header like any other request.
#[derive(Clone)]
pub struct HttpReportTransport {
    client: TrackedClient,
}

impl HttpReportTransport {
    pub fn new(client: TrackedClient) -> Self {
        Self { client }
    }
}

impl ReportTransport for HttpReportTransport {
    async fn post_view(&self, url: &Url, view: &ViewState) -> Result<()> {
        let response = self.client.post(url.as_str()).json(view).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::report_delivery(format!(
                "collector answered {status} for view {}",
                view.sequence
            )))
        }
    }
}

/// Where reports go: the template plus the origin relative templates
/// resolve against.
#[derive(Debug, Clone)]
pub struct ReportTarget {
    config: TrackerConfig,
    origin: Option<Url>,
}

impl ReportTarget {
    pub fn new(config: TrackerConfig, origin: Option<Url>) -> Self {
        Self { config, origin }
    }

    pub fn url_for(&self, view: &ViewState) -> Result<Url> {
        self.config
            .resolve_report_url(self.origin.as_ref(), view.instance_id.as_ref())
    }
}

/// Sending half of the report channel. Enqueueing never blocks.
#[derive(Debug, Clone)]
pub struct ReportQueue {
    tx: mpsc::UnboundedSender<ViewState>,
}

impl ReportQueue {
    pub fn enqueue(&self, view: ViewState) -> Result<()> {
        self.tx.send(view).map_err(|_| Error::ChannelClosed)
    }
}

/// Outcome counts of a finished reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReporterStats {
    pub delivered: usize,
    pub failed: usize,
}

impl ReporterStats {
    fn tally(&mut self, delivered: bool) {
        if delivered {
            self.delivered += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Spawn the reporter on `runtime`.
///
/// The task runs until every [`ReportQueue`] clone is dropped, then waits
/// for in-flight reports and returns the tally.
pub fn spawn_reporter<T>(
    runtime: &Handle,
    transport: T,
    target: ReportTarget,
) -> (ReportQueue, JoinHandle<ReporterStats>)
where
    T: ReportTransport + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = runtime.spawn(run_reporter(rx, Arc::new(transport), target));
    (ReportQueue { tx }, handle)
}

async fn run_reporter<T>(
    mut rx: mpsc::UnboundedReceiver<ViewState>,
    transport: Arc<T>,
    target: ReportTarget,
) -> ReporterStats
where
    T: ReportTransport + Send + Sync + 'static,
{
    let mut stats = ReporterStats::default();
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            next = rx.recv() => match next {
                Some(view) => {
                    let url = match target.url_for(&view) {
                        Ok(url) => url,
                        Err(e) => {
                            debug!("Dropping report for view {}: {}", view.sequence, e);
                            stats.failed += 1;
                            continue;
                        }
                    };
                    let transport = Arc::clone(&transport);
                    in_flight.spawn(async move {
                        match transport.post_view(&url, &view).await {
                            Ok(()) => {
                                trace!("Reported view {} to {}", view.sequence, url);
                                true
                            }
                            Err(e) if e.is_recoverable() => {
                                debug!("Dropping report for view {}: {}", view.sequence, e);
                                false
                            }
                            Err(e) => {
                                warn!("Dropping report for view {}: {}", view.sequence, e);
                                false
                            }
                        }
                    });
                }
                None => break,
            },
            Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                stats.tally(done.unwrap_or(false));
            }
        }
    }

    while let Some(done) = in_flight.join_next().await {
        stats.tally(done.unwrap_or(false));
    }

    debug!(
        "Reporter stopped: {} delivered, {} failed",
        stats.delivered, stats.failed
    );
    stats
}
