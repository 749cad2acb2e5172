//! Application configuration.
//!
//! Settings are layered: built-in defaults, then an optional
//! `config.toml` under the user's config directory, then `EJAICE_*`
//! environment variables.

use std::{
    fs,
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Directory under the platform config root holding our files.
pub const CONFIG_DIR: &str = "ejaice";
/// File name of the editable configuration.
pub const CONFIG_FILE: &str = "config.toml";
/// File name of the persisted session.
pub const SESSION_FILE: &str = "session.json";

const DEFAULT_CONFIG: &str = r#"# Eja-iCe operator console configuration.

# Base URL of the backend API.
base_url = "http://127.0.0.1:8000"

# Per-request timeout, in seconds.
request_timeout_secs = 30

# Items per page in list views.
page_size = 10

# Serial device node of the card reader.
# scan_device = "/dev/ttyUSB0"

# Emit a fixed test identifier when no reader is available. Demo only;
# leave disabled in production.
scan_fallback = false
"#;

/// Runtime configuration for the console.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Fixed per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Page size for list views.
    pub page_size: usize,
    /// Serial device node of the card reader, when one is attached.
    pub scan_device: Option<PathBuf>,
    /// Whether the scan path may synthesize a test identifier when no
    /// device is available.
    pub scan_fallback: bool,
}

impl AppConfig {
    /// Load configuration from defaults, the config file, and environment.
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", "http://127.0.0.1:8000")?
            .set_default("request_timeout_secs", 30)?
            .set_default("page_size", 10)?
            .set_default("scan_fallback", false)?;

        let path = Self::config_dir().join(CONFIG_FILE);
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(Environment::with_prefix("EJAICE"))
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Directory holding the config file and persisted session.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
    }

    /// Path of the persisted session file.
    pub fn session_path() -> PathBuf {
        Self::config_dir().join(SESSION_FILE)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let dir = AppConfig::config_dir();
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        fs::write(&path, DEFAULT_CONFIG)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
