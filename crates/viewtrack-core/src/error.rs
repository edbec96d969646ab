//! Tracker error types with recoverable/fatal classification

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Host Injection / Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration missing: {what}")]
    ConfigurationMissing { what: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid instance identifier: {value:?}")]
    InvalidInstance { value: String },

    // ─────────────────────────────────────────────────────────────
    // Correlation / Reporting Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid view header {value:?}: {reason}")]
    InvalidViewHeader { value: String, reason: String },

    #[error("View report delivery failed: {message}")]
    ReportDelivery { message: String },

    #[error("HTTP transport error: {message}")]
    Transport { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Server Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    #[error("Server error: {message}")]
    Server { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn configuration_missing(what: impl Into<String>) -> Self {
        Self::ConfigurationMissing { what: what.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_instance(value: impl Into<String>) -> Self {
        Self::InvalidInstance {
            value: value.into(),
        }
    }

    pub fn invalid_view_header(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidViewHeader {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn report_delivery(message: impl Into<String>) -> Self {
        Self::ReportDelivery {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Everything the tracker itself produces is recoverable: tracking runs in
    /// degraded mode rather than stopping the host.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ConfigurationMissing { .. }
                | Error::InvalidInstance { .. }
                | Error::InvalidViewHeader { .. }
                | Error::ReportDelivery { .. }
                | Error::Transport { .. }
                | Error::ChannelClosed
        )
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Server { .. } | Error::Config { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
