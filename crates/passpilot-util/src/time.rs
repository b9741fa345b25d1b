//! Time utilities for PassPilot
//!
//! All timestamps are held as `DateTime<Utc>`. Anything that needs the
//! current time takes a [`Clock`] so evaluations can be driven
//! deterministically in tests.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `PASSPILOT_MOCK_TIME` environment variable can be set
//! to shift [`SystemClock`] to a fixed starting point. The mocked clock keeps
//! advancing at the real rate.
//!
//! Format: `YYYY-MM-DD HH:MM:SS`, interpreted as UTC (e.g., `2025-08-18 20:15:00`)

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::sync::{Mutex, OnceLock};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "PASSPILOT_MOCK_TIME";

/// Format accepted in `PASSPILOT_MOCK_TIME`
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Milliseconds in one minute
pub const MINUTE_MS: i64 = 60_000;

/// Milliseconds in one day
pub const DAY_MS: i64 = 86_400_000;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Cached mock time offset from the real time when the process started.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT) {
                    Ok(naive_dt) => {
                        let mock_dt = Utc.from_utc_datetime(&naive_dt);
                        let offset = mock_dt.signed_duration_since(Utc::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = MOCK_TIME_FORMAT,
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current time, respecting mock time settings in debug builds.
pub fn now() -> DateTime<Utc> {
    let real_now = Utc::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Wall clock backed by [`now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        now()
    }
}

/// Manually driven clock for tests and replay
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.lock() = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut current = self.lock();
        *current += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid timestamp
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Parse an RFC 3339 timestamp into the canonical representation.
///
/// Returns `None` for empty or unparseable input instead of failing.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp the way the REST API emits them (`2025-08-18T20:19:59.196Z`)
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `"1 minute"`, `"4 minutes"`, `"0 minutes"`
pub fn pluralize(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let dt = parse_timestamp("2025-08-18T20:19:59.196Z").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_755_548_399_196);

        let offset = parse_timestamp("2025-08-18T22:19:59.196+02:00").unwrap();
        assert_eq!(dt, offset);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        for input in ["", "   ", "not a date", "2025-08-18", "18/08/2025 20:19"] {
            assert!(parse_timestamp(input).is_none(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_format_timestamp() {
        let dt = parse_timestamp("2025-08-18T22:37:58.451Z").unwrap();
        assert_eq!(format_timestamp(&dt), "2025-08-18T22:37:58.451Z");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "minute"), "1 minute");
        assert_eq!(pluralize(4, "minute"), "4 minutes");
        assert_eq!(pluralize(0, "day"), "0 days");
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2025, 8, 18, 20, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(30));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_mock_time_format_parses() {
        assert!(NaiveDateTime::parse_from_str("2025-08-18 20:15:00", MOCK_TIME_FORMAT).is_ok());
        assert!(NaiveDateTime::parse_from_str("2025-08-18T20:15:00", MOCK_TIME_FORMAT).is_err());
    }

    #[test]
    fn test_now_consistency() {
        let t1 = now();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let t2 = now();
        assert!(t2 > t1, "Time should advance forward");
        let _ = is_mock_time_active();
    }
}
