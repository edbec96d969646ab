//! Settings for the example application
//!
//! Read from `.viewtrack/config.toml` under the working directory. Missing or
//! invalid files fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use viewtrack_core::prelude::*;

pub const CONFIG_DIR: &str = ".viewtrack";
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub demo: DemoSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address `serve` listens on.
    pub bind: String,
    /// Path prefix the collector is mounted under.
    pub track_prefix: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8888".to_string(),
            track_prefix: "/track".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// How many contact detail views the scripted session opens.
    pub detail_views: usize,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self { detail_views: 2 }
    }
}

pub fn config_path(project_path: &Path) -> PathBuf {
    project_path.join(CONFIG_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `.viewtrack/config.toml`.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = config_path(project_path);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create `.viewtrack/config.toml` with commented defaults if missing.
pub fn init_config_dir(project_path: &Path) -> Result<PathBuf> {
    let dir = project_path.join(CONFIG_DIR);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::config(format!("Failed to create {CONFIG_DIR} dir: {e}")))?;
    }

    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# viewtrack example application

[server]
bind = "127.0.0.1:8888"   # address for `viewtrack serve`
track_prefix = "/track"   # where the collector is mounted

[demo]
detail_views = 2          # contact detail pages the scripted session opens
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config: {e}")))?;
        info!("Created {:?}", config_path);
    }

    Ok(config_path)
}
