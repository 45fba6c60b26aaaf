//! Panel configuration
//!
//! Layered: built-in defaults, then an optional `trade-panel.{toml,yaml,json}`
//! file, then `TRADE_PANEL_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::presets::FilePresetStore;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TRADE_PANEL";

/// Config file base name (extension picked by the `config` crate)
pub const CONFIG_FILE: &str = "trade-panel";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PanelConfig {
    /// Trading API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Session token; the panel counts as connected when present
    #[serde(default)]
    pub api_token: Option<String>,
    /// Address of the traded token
    #[serde(default)]
    pub instrument_address: String,
    #[serde(default = "default_guard_timeout_ms")]
    pub guard_timeout_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_balance_poll_secs")]
    pub balance_poll_secs: u64,
    /// Where presets are stored (default: ~/.trade-panel)
    #[serde(default)]
    pub presets_dir: Option<PathBuf>,
    /// Optional JSON translation table overriding the English messages
    #[serde(default)]
    pub locale_file: Option<PathBuf>,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: None,
            instrument_address: String::new(),
            guard_timeout_ms: default_guard_timeout_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            balance_poll_secs: default_balance_poll_secs(),
            presets_dir: None,
            locale_file: None,
            locale: default_locale(),
        }
    }
}

impl PanelConfig {
    /// Load from file and environment
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: PanelConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.instrument_address.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "{}_INSTRUMENT_ADDRESS (or instrument_address) is required",
                ENV_PREFIX
            ));
        }
        if self.guard_timeout_ms == 0 {
            return Err(anyhow::anyhow!("guard_timeout_ms must be positive"));
        }
        if self.balance_poll_secs == 0 {
            return Err(anyhow::anyhow!("balance_poll_secs must be positive"));
        }
        Ok(())
    }

    pub fn connected(&self) -> bool {
        self.api_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn guard_timeout(&self) -> Duration {
        Duration::from_millis(self.guard_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn balance_poll_interval(&self) -> Duration {
        Duration::from_secs(self.balance_poll_secs)
    }

    pub fn presets_dir(&self) -> PathBuf {
        self.presets_dir
            .clone()
            .unwrap_or_else(FilePresetStore::default_dir)
    }
}

fn default_api_base_url() -> String { "http://localhost:8000/api/v1".to_string() }
fn default_guard_timeout_ms() -> u64 { 2000 }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_balance_poll_secs() -> u64 { 10 }
fn default_locale() -> String { "en".to_string() }
