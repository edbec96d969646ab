//! # viewtrack-collector - View and Call Collector
//!
//! Server side of view tracking. Receives view reports from clients and
//! records API calls against the view named in their correlation header.
//! Storage is in memory.
//!
//! ```rust,no_run
//! use axum::Router;
//! use viewtrack_collector::{client_config, router, track_calls, CollectorStore};
//!
//! let store = CollectorStore::new();
//! let api: Router = Router::new(); // the application's API routes
//! let app = track_calls(api, store.clone()).nest("/track", router(store));
//! let config = client_config("/track");
//! # let _ = (app, config);
//! ```

pub mod api;
pub mod store;
pub mod track_call;

pub use api::{client_config, router, ApiError, CREATE_VIEW_ROUTE};
pub use store::{CollectorStore, NewCall, NewInstance};
pub use track_call::{track_calls, view_from_headers};
