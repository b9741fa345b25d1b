//! Pass duration calculation
//!
//! Durations are whole minutes, rounded to nearest (ties up) and never less
//! than one. The calculator tolerates out-of-order timestamps: a pass
//! returned "before" it was issued still reports one minute.

use chrono::{DateTime, Utc};
use passpilot_api::Pass;
use passpilot_util::MINUTE_MS;

/// Smallest duration ever reported for a returned pass
pub const MIN_DURATION_MINUTES: i64 = 1;

/// Elapsed minutes between issue and return.
///
/// Returns `None` while the pass is still open.
pub fn compute_duration(issued_at: DateTime<Utc>, returned_at: Option<DateTime<Utc>>) -> Option<i64> {
    let returned_at = returned_at?;
    Some(raw_minutes(issued_at, returned_at).max(MIN_DURATION_MINUTES))
}

/// Rounded minutes without the floor; negative when the clocks disagree
fn raw_minutes(issued_at: DateTime<Utc>, returned_at: DateTime<Utc>) -> i64 {
    let diff_ms = returned_at.signed_duration_since(issued_at).num_milliseconds();
    (diff_ms + MINUTE_MS / 2).div_euclid(MINUTE_MS)
}

/// Duration shown for a pass.
///
/// Falls back from the computed value to the stored one, then to the
/// minimum. Open passes have no duration.
pub fn resolve_duration(pass: &Pass) -> Option<i64> {
    let returned_at = pass.returned_at?;

    if let Some(computed) = pass
        .issued_at
        .and_then(|issued| compute_duration(issued, Some(returned_at)))
    {
        return Some(computed);
    }

    match pass.stored_duration {
        Some(stored) if stored >= MIN_DURATION_MINUTES => Some(stored),
        _ => Some(MIN_DURATION_MINUTES),
    }
}

/// Duration written to exports: absent for any pass without a return time,
/// whatever the backend has stored.
pub fn export_duration(pass: &Pass) -> Option<i64> {
    if pass.returned_at.is_none() {
        return None;
    }
    resolve_duration(pass)
}

/// How far a pass's timestamps and stored duration can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationQuality {
    Consistent,
    /// Returned before issued; the floor hides a negative value
    ClockSkew { raw_minutes: i64 },
    /// Stored value disagrees with the timestamps
    StoredMismatch { stored: i64, computed: i64 },
}

impl DurationQuality {
    pub fn is_consistent(&self) -> bool {
        matches!(self, DurationQuality::Consistent)
    }
}

/// Inspect a pass for inconsistent duration data.
///
/// Never changes what [`resolve_duration`] reports.
pub fn assess_duration(pass: &Pass) -> DurationQuality {
    let (Some(issued_at), Some(returned_at)) = (pass.issued_at, pass.returned_at) else {
        return DurationQuality::Consistent;
    };

    let raw = raw_minutes(issued_at, returned_at);
    if raw < 0 {
        return DurationQuality::ClockSkew { raw_minutes: raw };
    }

    let computed = raw.max(MIN_DURATION_MINUTES);
    match pass.stored_duration {
        Some(stored) if stored >= MIN_DURATION_MINUTES && stored != computed => {
            DurationQuality::StoredMismatch { stored, computed }
        }
        _ => DurationQuality::Consistent,
    }
}
