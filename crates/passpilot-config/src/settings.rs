//! Validated settings structures

use crate::schema::{RawApiConfig, RawConfig, RawExport, RawNotifications, RawPolling, RawSession};
use crate::validation::{RepeatKind, parse_repeat};
use passpilot_api::CurrentUser;
use passpilot_util::{SchoolId, UserId, default_data_dir};
use std::path::PathBuf;
use std::time::Duration;

/// Default active-pass refresh interval
pub const DEFAULT_ACTIVE_PASSES_INTERVAL: Duration = Duration::from_secs(10);

/// Default expiry check interval
pub const DEFAULT_EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Default school (trial status) refresh interval
pub const DEFAULT_SCHOOL_INTERVAL: Duration = Duration::from_secs(300);

/// Default width of the expiring-soon window
pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Default REST request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Validated settings ready for use by the service
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,

    /// Authenticated user; `None` disables monitoring
    pub session: Option<CurrentUser>,

    pub polling: PollingSettings,

    pub notifications: NotificationSettings,

    pub export: ExportSettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            api: ApiSettings::from_raw(raw.api),
            session: raw.session.map(convert_session),
            polling: PollingSettings::from_raw(raw.polling),
            notifications: NotificationSettings::from_raw(raw.notifications),
            export: ExportSettings::from_raw(raw.export),
        }
    }

    /// Organizational scope of the configured session
    pub fn scope(&self) -> Option<&SchoolId> {
        self.session.as_ref().and_then(CurrentUser::scope)
    }
}

/// REST API connection settings
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub token_env: Option<String>,
    pub timeout: Duration,
}

impl ApiSettings {
    fn from_raw(raw: RawApiConfig) -> Self {
        Self {
            base_url: raw
                .base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            token_env: raw.token_env,
            timeout: raw
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Read the session token from the configured environment variable
    pub fn token(&self) -> Option<String> {
        let var = self.token_env.as_deref()?;
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Some(token),
            _ => {
                tracing::warn!(env_var = var, "Session token variable is unset or empty");
                None
            }
        }
    }
}

/// Polling cadence for each periodic task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingSettings {
    pub active_passes: Duration,
    pub expiry_check: Duration,
    pub school: Duration,
}

impl PollingSettings {
    fn from_raw(raw: RawPolling) -> Self {
        Self {
            active_passes: raw
                .active_passes_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_ACTIVE_PASSES_INTERVAL),
            expiry_check: raw
                .expiry_check_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_EXPIRY_CHECK_INTERVAL),
            school: raw
                .school_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SCHOOL_INTERVAL),
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            active_passes: DEFAULT_ACTIVE_PASSES_INTERVAL,
            expiry_check: DEFAULT_EXPIRY_CHECK_INTERVAL,
            school: DEFAULT_SCHOOL_INTERVAL,
        }
    }
}

/// How often a pass that stays in the window is re-notified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatPolicy {
    /// Notify on every evaluation cycle (no memory between cycles)
    #[default]
    EveryCycle,
    /// Notify once while the pass stays in the window
    Once,
    /// Notify at most once per interval
    Throttle { interval: Duration },
}

/// Expiry notification settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationSettings {
    /// Passes with `0 < remaining <= window` are notified
    pub window: Duration,
    pub repeat: RepeatPolicy,
}

impl NotificationSettings {
    fn from_raw(raw: RawNotifications) -> Self {
        let repeat = match raw.repeat.as_deref().map(parse_repeat) {
            Some(Ok(RepeatKind::Once)) => RepeatPolicy::Once,
            Some(Ok(RepeatKind::Throttle)) => match raw.repeat_interval_seconds {
                Some(secs) if secs > 0 => RepeatPolicy::Throttle {
                    interval: Duration::from_secs(secs),
                },
                _ => RepeatPolicy::EveryCycle,
            },
            _ => RepeatPolicy::EveryCycle,
        };

        Self {
            window: raw
                .window_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_EXPIRY_WINDOW),
            repeat,
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_EXPIRY_WINDOW,
            repeat: RepeatPolicy::EveryCycle,
        }
    }
}

/// CSV export settings
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
}

impl ExportSettings {
    fn from_raw(raw: RawExport) -> Self {
        Self {
            output_dir: raw
                .output_dir
                .unwrap_or_else(|| default_data_dir().join("exports")),
        }
    }
}

fn convert_session(raw: RawSession) -> CurrentUser {
    CurrentUser {
        id: UserId::new(raw.user_id),
        display_name: raw.display_name.unwrap_or_default(),
        school_id: raw
            .school_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(SchoolId::new),
    }
}
