//! # viewtrack-core - Core Domain Types
//!
//! Foundation crate for viewtrack. Provides the view/identity vocabulary
//! shared by the tracker and the collector, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing, url).
//!
//! ## Public API
//!
//! ### Views (`view`)
//! - [`InstanceId`] - Opaque identity of one browser instance
//! - [`ViewState`] - Current-view record and report POST body
//! - [`ViewId`] - `(instance, sequence)` pair carried by [`VIEW_HEADER`]
//!
//! ### Host Injection (`host`)
//! - [`TrackerConfig`] - Collector URL template with the `:instance` placeholder
//! - [`ClientData`] - Injected client identity
//!
//! ### Collector Records (`records`)
//! - [`InstanceRecord`], [`ViewRecord`], [`CallRecord`]
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use viewtrack_core::prelude::*;
//! ```

pub mod error;
pub mod host;
pub mod logging;
pub mod records;
pub mod view;

/// Prelude for common imports used throughout all viewtrack crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use host::{ClientData, TrackerConfig, INSTANCE_PLACEHOLDER, PATH_SEGMENT};
pub use records::{CallRecord, InstanceRecord, ViewRecord};
pub use view::{
    InstanceId, StateParams, ViewId, ViewState, MISSING_INSTANCE, SEQUENCE_BASELINE, VIEW_HEADER,
};
