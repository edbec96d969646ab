//! # viewtrack-client - Client-Side View Tracking
//!
//! Sequences page views for one browser instance, stamps every outgoing
//! request with the current view, and reports each new view to a collector.
//!
//! ## Public API
//!
//! - [`Tracker`] - Facade wiring everything below from a [`HostInjection`]
//! - [`SessionIdentity`] - Which browser instance this is, resolved once
//! - [`ViewSequencer`] - Owns the sequence counter and current view
//! - [`Navigator`] / [`NavigationObserver`] - Start-of-navigation events
//! - [`TrackedClient`] - HTTP client running [`RequestInterceptor`]s at dispatch
//! - [`ViewHeaderInterceptor`] - Stamps `X-Track-View: <instance> <sequence>`
//! - [`ReportTransport`] / [`spawn_reporter`] - Fire-and-forget view reports
//! - [`StateRegistry`] - State URL templates for `requestURI`
//!
//! ## Example
//!
//! ```rust,no_run
//! use viewtrack_client::{HostInjection, Navigator, StateRegistry, Tracker};
//! use viewtrack_core::StateParams;
//!
//! # async fn run() {
//! let states = StateRegistry::new().with_state("contacts", "/contacts");
//! let tracker = Tracker::start(&HostInjection::from_env(), states);
//! let navigator = Navigator::new();
//! tracker.attach(&navigator);
//!
//! navigator.navigate("contacts", StateParams::new());
//! let _ = tracker.client().get("/api/contacts").send().await;
//! tracker.shutdown().await;
//! # }
//! ```

pub mod config;
pub mod http;
pub mod identity;
pub mod interceptor;
pub mod navigation;
pub mod reporter;
pub mod sequencer;
pub mod states;
pub mod tracker;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use config::{load_host_injection, HostInjection};
pub use http::{TrackedClient, TrackedClientBuilder, TrackedRequest};
pub use identity::SessionIdentity;
pub use interceptor::{RequestInterceptor, ViewHeaderInterceptor, VIEW_HEADER_NAME};
pub use navigation::{NavigationEvent, NavigationObserver, Navigator};
pub use reporter::{
    spawn_reporter, HttpReportTransport, LocalReportTransport, ReportQueue, ReportTarget,
    ReportTransport, ReporterStats,
};
pub use sequencer::ViewSequencer;
pub use states::StateRegistry;
pub use tracker::Tracker;
