//! Session identity: which browser instance this client is
//!
//! Resolved once from host-injected [`ClientData`] and immutable afterwards.

use viewtrack_core::prelude::*;
use viewtrack_core::{ClientData, InstanceId};

/// The identity of this browser instance for the life of the process.
///
/// A missing identity is not fatal: views are still sequenced, stamped and
/// reported with the placeholder instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    instance: Option<InstanceId>,
}

impl SessionIdentity {
    /// Resolve the identity from injected client data.
    ///
    /// Logs the configuration-missing condition when the data or its instance
    /// is absent. Call once at startup; the result is shared from then on.
    pub fn resolve(client_data: Option<&ClientData>) -> Self {
        let instance = client_data.and_then(|data| data.instance.clone());
        if instance.is_none() {
            let err = match client_data {
                None => Error::configuration_missing("client data (no instance identity injected)"),
                Some(_) => Error::configuration_missing("client data has no instance"),
            };
            error!("{}; tracking continues without an instance id", err);
        }
        Self { instance }
    }

    /// An identity known ahead of time (tests, embedded hosts).
    pub fn known(instance: InstanceId) -> Self {
        Self {
            instance: Some(instance),
        }
    }

    pub fn instance(&self) -> Option<&InstanceId> {
        self.instance.as_ref()
    }

    /// Whether tracking runs without an instance id.
    pub fn is_degraded(&self) -> bool {
        self.instance.is_none()
    }
}
