//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// REST API connection
    #[serde(default)]
    pub api: RawApiConfig,

    /// Authenticated session; absent disables monitoring
    #[serde(default)]
    pub session: Option<RawSession>,

    /// Polling cadence
    #[serde(default)]
    pub polling: RawPolling,

    /// Expiry notification behaviour
    #[serde(default)]
    pub notifications: RawNotifications,

    /// CSV export settings
    #[serde(default)]
    pub export: RawExport,
}

/// REST API connection settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawApiConfig {
    /// Base URL, e.g. `https://passpilot.example.org`
    pub base_url: Option<String>,

    /// Name of the environment variable holding the session token
    pub token_env: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,
}

/// Session settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSession {
    pub user_id: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// School the user belongs to (organizational scope)
    pub school_id: Option<String>,
}

/// Polling intervals
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPolling {
    pub active_passes_seconds: Option<u64>,
    pub expiry_check_seconds: Option<u64>,
    pub school_seconds: Option<u64>,
}

/// Notification settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawNotifications {
    /// Width of the expiring-soon window in seconds
    pub window_seconds: Option<u64>,

    /// "every_cycle", "once" or "throttle"
    pub repeat: Option<String>,

    /// Minimum gap between repeats when `repeat = "throttle"`
    pub repeat_interval_seconds: Option<u64>,
}

/// Export settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawExport {
    pub output_dir: Option<PathBuf>,
}
