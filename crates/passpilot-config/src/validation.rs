//! Configuration validation

use crate::schema::{RawConfig, RawNotifications};
use thiserror::Error;
use url::Url;

/// Largest accepted value for any `*_seconds` setting (one week)
pub const MAX_INTERVAL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Missing required setting '{0}'")]
    MissingSetting(&'static str),

    #[error("Invalid URL '{value}': {message}")]
    InvalidUrl { value: String, message: String },

    #[error("Setting '{setting}' must be greater than zero")]
    ZeroInterval { setting: &'static str },

    #[error("Setting '{setting}' must be at most {max} seconds")]
    IntervalTooLarge { setting: &'static str, max: u64 },

    #[error("Unknown repeat policy '{0}' (expected every_cycle, once or throttle)")]
    UnknownRepeatPolicy(String),

    #[error("Session error: {0}")]
    SessionError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match &config.api.base_url {
        Some(url) => {
            if let Err(message) = check_base_url(url) {
                errors.push(ValidationError::InvalidUrl {
                    value: url.clone(),
                    message,
                });
            }
        }
        None => errors.push(ValidationError::MissingSetting("api.base_url")),
    }

    if let Some(token_env) = &config.api.token_env
        && token_env.trim().is_empty()
    {
        errors.push(ValidationError::MissingSetting("api.token_env"));
    }

    let intervals = [
        ("api.timeout_seconds", config.api.timeout_seconds),
        ("polling.active_passes_seconds", config.polling.active_passes_seconds),
        ("polling.expiry_check_seconds", config.polling.expiry_check_seconds),
        ("polling.school_seconds", config.polling.school_seconds),
        ("notifications.window_seconds", config.notifications.window_seconds),
    ];
    for (setting, value) in intervals {
        errors.extend(check_interval(setting, value));
    }

    if let Some(session) = &config.session {
        if session.user_id.trim().is_empty() {
            errors.push(ValidationError::SessionError("user_id cannot be empty".into()));
        }
        if let Some(school_id) = &session.school_id
            && school_id.trim().is_empty()
        {
            errors.push(ValidationError::SessionError(
                "school_id cannot be empty when present".into(),
            ));
        }
    }

    errors.extend(validate_notifications(&config.notifications));

    errors
}

fn validate_notifications(raw: &RawNotifications) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match raw.repeat.as_deref().map(parse_repeat) {
        None | Some(Ok(RepeatKind::EveryCycle)) | Some(Ok(RepeatKind::Once)) => {}
        Some(Ok(RepeatKind::Throttle)) => match raw.repeat_interval_seconds {
            None => errors.push(ValidationError::MissingSetting(
                "notifications.repeat_interval_seconds",
            )),
            value => errors.extend(check_interval(
                "notifications.repeat_interval_seconds",
                value,
            )),
        },
        Some(Err(e)) => errors.push(e),
    }

    errors
}

fn check_interval(setting: &'static str, value: Option<u64>) -> Option<ValidationError> {
    match value? {
        0 => Some(ValidationError::ZeroInterval { setting }),
        v if v > MAX_INTERVAL_SECONDS => Some(ValidationError::IntervalTooLarge {
            setting,
            max: MAX_INTERVAL_SECONDS,
        }),
        _ => None,
    }
}

/// Repeat policy names accepted in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatKind {
    EveryCycle,
    Once,
    Throttle,
}

/// Parse a repeat policy name
pub fn parse_repeat(s: &str) -> Result<RepeatKind, ValidationError> {
    match s.trim().to_lowercase().replace('-', "_").as_str() {
        "every_cycle" | "always" => Ok(RepeatKind::EveryCycle),
        "once" => Ok(RepeatKind::Once),
        "throttle" => Ok(RepeatKind::Throttle),
        other => Err(ValidationError::UnknownRepeatPolicy(other.to_string())),
    }
}

/// Check that a base URL is an absolute http(s) URL with a host
pub fn check_base_url(value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}', expected http or https", url.scheme()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("missing host".into());
    }

    Ok(())
}
