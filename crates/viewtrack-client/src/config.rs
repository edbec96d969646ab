//! Host injection: configuration the host supplies before the tracker starts
//!
//! Supports:
//! - a TOML file (`[client_config]`, `[client_data]`, `origin`)
//! - environment variables (`VIEWTRACK_ORIGIN`, `VIEWTRACK_NEW_VIEW_URL`,
//!   `VIEWTRACK_INSTANCE`)
//! - direct construction by an embedding host

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;
use viewtrack_core::prelude::*;
use viewtrack_core::{ClientData, InstanceId, TrackerConfig};

pub const ORIGIN_ENV: &str = "VIEWTRACK_ORIGIN";
pub const NEW_VIEW_URL_ENV: &str = "VIEWTRACK_NEW_VIEW_URL";
pub const INSTANCE_ENV: &str = "VIEWTRACK_INSTANCE";

/// Everything the host injects. Each part may be missing; the tracker then
/// runs in degraded mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInjection {
    /// Origin of the host page. Relative request and report URLs resolve
    /// against it.
    #[serde(default)]
    pub origin: Option<String>,

    #[serde(default)]
    pub client_config: Option<TrackerConfig>,

    #[serde(default)]
    pub client_data: Option<ClientData>,
}

impl HostInjection {
    pub fn new(origin: Option<String>, config: TrackerConfig, data: ClientData) -> Self {
        Self {
            origin,
            client_config: Some(config),
            client_data: Some(data),
        }
    }

    /// Read the injection from the environment.
    ///
    /// An invalid `VIEWTRACK_INSTANCE` is dropped with a warning, leaving the
    /// client data empty.
    pub fn from_env() -> Self {
        let origin = std::env::var(ORIGIN_ENV).ok().filter(|s| !s.is_empty());
        let client_config = std::env::var(NEW_VIEW_URL_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .map(TrackerConfig::new);
        let client_data = std::env::var(INSTANCE_ENV).ok().map(|raw| {
            let instance = match InstanceId::new(raw.trim()) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Ignoring {}: {}", INSTANCE_ENV, e);
                    None
                }
            };
            ClientData { instance }
        });

        Self {
            origin,
            client_config,
            client_data,
        }
    }

    /// Parsed host origin. An unparsable origin is logged and ignored.
    pub fn origin_url(&self) -> Option<Url> {
        let raw = self.origin.as_deref()?;
        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Ignoring invalid host origin {:?}: {}", raw, e);
                None
            }
        }
    }
}

/// Load a host injection file.
///
/// Missing or invalid files yield an empty injection (degraded mode), never
/// an error.
pub fn load_host_injection(path: &Path) -> HostInjection {
    if !path.exists() {
        debug!("No host injection file at {:?}, using defaults", path);
        return HostInjection::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(injection) => {
                debug!("Loaded host injection from {:?}", path);
                injection
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                HostInjection::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            HostInjection::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = tempdir().unwrap();
        let injection = load_host_injection(&temp.path().join("host.toml"));
        assert_eq!(injection, HostInjection::default());
    }

    #[test]
    fn test_load_host_injection_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("host.toml");
        let content = r#"
origin = "http://127.0.0.1:8888"

[client_config]
new_view_url = "/instances/:instance/views"

[client_data]
instance = "abc123"
"#;
        std::fs::write(&path, content).unwrap();

        let injection = load_host_injection(&path);
        assert_eq!(injection.origin.as_deref(), Some("http://127.0.0.1:8888"));
        assert_eq!(
            injection.client_config.unwrap().new_view_url,
            "/instances/:instance/views"
        );
        assert_eq!(
            injection.client_data.unwrap().instance.unwrap().as_str(),
            "abc123"
        );
    }

    #[test]
    fn test_load_numeric_instance() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("host.toml");
        std::fs::write(&path, "[client_data]\ninstance = 17\n").unwrap();

        let injection = load_host_injection(&path);
        assert!(injection.client_config.is_none());
        assert_eq!(
            injection.client_data.unwrap().instance.unwrap().as_str(),
            "17"
        );
    }

    #[test]
    fn test_load_invalid_toml_is_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("host.toml");
        std::fs::write(&path, "not valid toml {{{{").unwrap();

        assert_eq!(load_host_injection(&path), HostInjection::default());
    }

    #[test]
    fn test_origin_url_ignores_garbage() {
        let injection = HostInjection {
            origin: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(injection.origin_url().is_none());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var(ORIGIN_ENV, "http://localhost:9000");
        std::env::set_var(NEW_VIEW_URL_ENV, "/instances/:instance/views");
        std::env::set_var(INSTANCE_ENV, "w42");

        let injection = HostInjection::from_env();
        assert_eq!(
            injection.origin_url().unwrap().as_str(),
            "http://localhost:9000/"
        );
        assert!(injection.client_config.is_some());
        assert_eq!(
            injection.client_data.unwrap().instance.unwrap().as_str(),
            "w42"
        );

        std::env::remove_var(ORIGIN_ENV);
        std::env::remove_var(NEW_VIEW_URL_ENV);
        std::env::remove_var(INSTANCE_ENV);
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_instance() {
        std::env::remove_var(ORIGIN_ENV);
        std::env::remove_var(NEW_VIEW_URL_ENV);
        std::env::set_var(INSTANCE_ENV, "has space");

        let injection = HostInjection::from_env();
        assert!(injection.origin.is_none());
        assert!(injection.client_config.is_none());
        assert!(injection.client_data.unwrap().instance.is_none());

        std::env::remove_var(INSTANCE_ENV);
    }
}
