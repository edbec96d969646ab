//! View sequencing
//!
//! The [`ViewSequencer`] owns the single current-view record for this
//! browser instance. Each navigation increments the sequence, overwrites the
//! state, and hands a snapshot to the report queue, all under one lock so
//! increments are never lost and reports are enqueued in sequence order.

use std::sync::{Mutex, MutexGuard};

use viewtrack_core::prelude::*;
use viewtrack_core::{StateParams, ViewId, ViewState};

use crate::identity::SessionIdentity;
use crate::navigation::{NavigationEvent, NavigationObserver};
use crate::reporter::ReportQueue;
use crate::states::StateRegistry;

struct Inner {
    view: ViewState,
    reports: Option<ReportQueue>,
}

/// Process-wide view sequencer. Share it behind an `Arc`.
pub struct ViewSequencer {
    identity: SessionIdentity,
    states: StateRegistry,
    inner: Mutex<Inner>,
}

impl ViewSequencer {
    pub fn new(identity: SessionIdentity, states: StateRegistry) -> Self {
        let view = ViewState::new(identity.instance().cloned());
        Self {
            identity,
            states,
            inner: Mutex::new(Inner {
                view,
                reports: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Route future view snapshots to `queue`.
    pub fn attach_reports(&self, queue: ReportQueue) {
        self.lock().reports = Some(queue);
    }

    /// Stop reporting. Returns the queue so the caller can close it.
    pub fn detach_reports(&self) -> Option<ReportQueue> {
        self.lock().reports.take()
    }

    /// Record the start of a navigation and return the new view's id.
    ///
    /// Never fails. An empty state name is recorded as-is with a warning.
    /// Without an attached report queue the snapshot is dropped.
    pub fn record_view(&self, state_name: &str, state_params: StateParams) -> ViewId {
        if state_name.is_empty() {
            warn!("Navigation without a state name; recording an unnamed view");
        }
        let request_uri = self.states.request_uri(state_name, &state_params);

        let mut inner = self.lock();
        inner.view.sequence += 1;
        inner.view.state_name = state_name.to_string();
        inner.view.state_params = state_params;
        inner.view.request_uri = request_uri;

        let snapshot = inner.view.clone();
        let view_id = snapshot.view_id();
        debug!("View {} -> {:?}", view_id, snapshot.state_name);

        match &inner.reports {
            Some(queue) => {
                if let Err(e) = queue.enqueue(snapshot) {
                    debug!("Dropping report for view {}: {}", view_id, e);
                }
            }
            None => debug!("No collector configured; dropping report for view {}", view_id),
        }

        view_id
    }

    /// Snapshot of the current view.
    pub fn current(&self) -> ViewState {
        self.lock().view.clone()
    }

    pub fn current_view_id(&self) -> ViewId {
        self.lock().view.view_id()
    }
}

impl NavigationObserver for ViewSequencer {
    fn navigation_started(&self, event: &NavigationEvent) {
        self.record_view(&event.state_name, event.params.clone());
    }
}
