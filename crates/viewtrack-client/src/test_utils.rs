//! Test helpers shared by unit and integration tests.

use std::sync::{Arc, Mutex};

use url::Url;
use viewtrack_core::prelude::*;
use viewtrack_core::ViewState;

use crate::reporter::ReportTransport;
use crate::states::StateRegistry;

/// Transport that records every report instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    posted: Arc<Mutex<Vec<(Url, ViewState)>>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the attempt, then reports a delivery failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn posted(&self) -> Vec<(Url, ViewState)> {
        self.posted.lock().unwrap().clone()
    }
}

impl ReportTransport for RecordingTransport {
    async fn post_view(&self, url: &Url, view: &ViewState) -> Result<()> {
        self.posted.lock().unwrap().push((url.clone(), view.clone()));
        if self.fail {
            Err(Error::report_delivery("collector unavailable"))
        } else {
            Ok(())
        }
    }
}

/// States used by the contacts example.
pub fn contact_states() -> StateRegistry {
    StateRegistry::new()
        .with_state("contacts", "/contacts")
        .with_state("contacts.detail", "/{id}")
}
