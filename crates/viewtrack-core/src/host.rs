//! Host-injected tracker configuration
//!
//! The host page supplies two objects before the tracker starts:
//! - [`TrackerConfig`] - where view reports go
//! - [`ClientData`] - which instance this client is

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::view::{InstanceId, MISSING_INSTANCE};

/// Placeholder token in [`TrackerConfig::new_view_url`].
pub const INSTANCE_PLACEHOLDER: &str = ":instance";

/// Characters escaped when a value is placed in a URL path segment.
pub const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Configuration the client requires to send tracking information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// URL template new views are POSTed to. Contains [`INSTANCE_PLACEHOLDER`].
    pub new_view_url: String,
}

impl TrackerConfig {
    pub fn new(new_view_url: impl Into<String>) -> Self {
        Self {
            new_view_url: new_view_url.into(),
        }
    }

    /// Substitute the instance into the template.
    ///
    /// An unknown instance is substituted as [`MISSING_INSTANCE`]. Only the
    /// first placeholder is replaced.
    pub fn report_url(&self, instance: Option<&InstanceId>) -> String {
        let segment = match instance {
            Some(id) => utf8_percent_encode(id.as_str(), PATH_SEGMENT).to_string(),
            None => MISSING_INSTANCE.to_string(),
        };
        self.new_view_url.replacen(INSTANCE_PLACEHOLDER, &segment, 1)
    }

    /// Resolve the report URL against the host origin when the template is
    /// relative.
    pub fn resolve_report_url(
        &self,
        origin: Option<&Url>,
        instance: Option<&InstanceId>,
    ) -> Result<Url> {
        let raw = self.report_url(instance);
        match Url::parse(&raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let origin = origin.ok_or_else(|| {
                    Error::config(format!("relative view URL {raw:?} needs a host origin"))
                })?;
                origin
                    .join(&raw)
                    .map_err(|e| Error::config(format!("invalid view URL {raw:?}: {e}")))
            }
            Err(e) => Err(Error::config(format!("invalid view URL {raw:?}: {e}"))),
        }
    }

    pub fn has_placeholder(&self) -> bool {
        self.new_view_url.contains(INSTANCE_PLACEHOLDER)
    }
}

/// Client-specific information the host injects at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientData {
    /// The instance associated with all views and calls from this client.
    #[serde(default)]
    pub instance: Option<InstanceId>,
}

impl ClientData {
    pub fn new(instance: InstanceId) -> Self {
        Self {
            instance: Some(instance),
        }
    }
}
