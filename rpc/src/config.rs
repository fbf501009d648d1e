//! Service configuration with TOML file support.

use facegate_liveness::BranchEntry;
use facegate_types::LivenessParams;
use serde::{Deserialize, Serialize};

use crate::error::RpcError;

/// Configuration for the FaceGate service.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so
/// an empty file is a valid configuration — though the default API key is
/// only acceptable in development.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Port the HTTP API listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Service credential expected in the `X-Api-Key` header.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Base URL of the face engine (action analysis + identity matching).
    #[serde(default = "default_engine_url")]
    pub engine_url: String,

    /// Origins allowed by CORS; `"*"` allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between background sweeps of expired challenges.
    /// Zero disables the sweep (expiry is still enforced on every verify).
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,

    /// Liveness protocol parameters (TTL, thresholds, timeouts).
    #[serde(default)]
    pub liveness: LivenessParams,

    /// Branch/device table backing the tenant directory.
    #[serde(default)]
    pub directory: Vec<BranchEntry>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_port() -> u16 {
    8000
}

fn default_api_key() -> String {
    "change_me".to_string()
}

fn default_engine_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reaper_interval_secs() -> u64 {
    30
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, RpcError> {
        let content = std::fs::read_to_string(path).map_err(|e| RpcError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, RpcError> {
        toml::from_str(s).map_err(|e| RpcError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ServiceConfig is always serializable to TOML")
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            api_key: default_api_key(),
            engine_url: default_engine_url(),
            cors_origins: Vec::new(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            reaper_interval_secs: default_reaper_interval_secs(),
            liveness: LivenessParams::default(),
            directory: Vec::new(),
        }
    }
}
