//! viewtrack example application
//!
//! A contacts API whose calls are correlated with client-side page views.
//! All logic lives here; `main.rs` only parses arguments.

pub mod demo;
pub mod settings;

pub use demo::{run_demo, serve, DemoReport};
pub use settings::{init_config_dir, load_settings, Settings};
