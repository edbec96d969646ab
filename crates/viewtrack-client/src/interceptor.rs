//! Outbound request interceptors
//!
//! Interceptors run synchronously on every request dispatched through a
//! [`TrackedClient`](crate::http::TrackedClient), immediately before it is
//! handed to the transport.

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use viewtrack_core::prelude::*;
use viewtrack_core::ViewId;

use crate::sequencer::ViewSequencer;

/// Lowercase wire name of [`viewtrack_core::VIEW_HEADER`].
pub const VIEW_HEADER_NAME: HeaderName = HeaderName::from_static("x-track-view");

/// A synchronous hook applied to each outgoing request at dispatch time.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: &mut reqwest::Request);
}

/// Stamps the correlation header with the view current at dispatch.
///
/// Reads a snapshot from the sequencer and never mutates it. A value that
/// cannot be encoded falls back to the placeholder instance so the request
/// still goes out.
pub struct ViewHeaderInterceptor {
    sequencer: Arc<ViewSequencer>,
}

impl ViewHeaderInterceptor {
    pub fn new(sequencer: Arc<ViewSequencer>) -> Self {
        Self { sequencer }
    }
}

impl RequestInterceptor for ViewHeaderInterceptor {
    fn intercept(&self, request: &mut reqwest::Request) {
        let view_id = self.sequencer.current_view_id();
        let value = match HeaderValue::from_str(&view_id.header_value()) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unencodable view header for {}: {}", view_id, e);
                let fallback = ViewId::new(None, view_id.sequence).header_value();
                match HeaderValue::from_str(&fallback) {
                    Ok(value) => value,
                    Err(_) => return,
                }
            }
        };
        trace!("{} {} <- {}", request.method(), request.url(), view_id);
        request.headers_mut().insert(VIEW_HEADER_NAME, value);
    }
}
