//! Expiry monitor
//!
//! Each evaluation cycle looks at the currently open passes and produces one
//! notification for every pass whose deadline falls inside the
//! expiring-soon window.

use chrono::{DateTime, Utc};
use passpilot_api::{Notification, Pass, Severity};
use passpilot_config::{NotificationSettings, RepeatPolicy};
use passpilot_util::{MINUTE_MS, PassId, RepeatLimiter, SchoolId, pluralize};
use std::collections::HashSet;
use tracing::debug;

/// Title carried by every expiring-soon notification
pub const EXPIRING_SOON_TITLE: &str = "Pass Expiring Soon";

/// Evaluates open passes against the expiring-soon window
#[derive(Debug)]
pub struct ExpiryMonitor {
    window: chrono::Duration,
    /// `None` re-notifies on every cycle
    limiter: Option<RepeatLimiter<PassId>>,
}

impl ExpiryMonitor {
    pub fn new(settings: &NotificationSettings) -> Self {
        let limiter = match settings.repeat {
            RepeatPolicy::EveryCycle => None,
            RepeatPolicy::Once => Some(RepeatLimiter::once()),
            RepeatPolicy::Throttle { interval } => Some(RepeatLimiter::every(to_chrono(interval))),
        };

        Self {
            window: to_chrono(settings.window),
            limiter,
        }
    }

    pub fn window(&self) -> chrono::Duration {
        self.window
    }

    /// Run one evaluation cycle.
    ///
    /// Nothing is evaluated without an organizational scope. Passes that
    /// were already returned, or whose deadline is unusable, are skipped.
    pub fn evaluate(
        &mut self,
        scope: Option<&SchoolId>,
        passes: &[Pass],
        now: DateTime<Utc>,
    ) -> Vec<Notification> {
        let Some(scope) = scope else {
            debug!("No scope, skipping expiry evaluation");
            return Vec::new();
        };
        // Repeat memory is left untouched when there is nothing to look at
        if passes.is_empty() {
            return Vec::new();
        }

        let mut in_window = HashSet::new();
        let mut notifications = Vec::new();

        for pass in passes {
            if !pass.is_open() {
                debug!(pass_id = %pass.id, "Pass already returned, skipping");
                continue;
            }

            let Some(remaining) = pass.time_remaining(now) else {
                debug!(pass_id = %pass.id, "Pass has no usable expiry, skipping");
                continue;
            };

            if !is_expiring_soon(remaining, self.window) {
                continue;
            }
            in_window.insert(pass.id.clone());

            if let Some(limiter) = self.limiter.as_mut() {
                if !limiter.check(&pass.id, now) {
                    debug!(pass_id = %pass.id, "Repeat suppressed");
                    continue;
                }
            }

            let minutes = remaining.num_milliseconds().div_euclid(MINUTE_MS);
            debug!(
                school_id = %scope,
                pass_id = %pass.id,
                minutes_remaining = minutes,
                "Pass expiring soon"
            );
            notifications.push(expiring_notification(pass, minutes));
        }

        // Passes that left the window may notify again if they come back
        if let Some(limiter) = self.limiter.as_mut() {
            limiter.retain(|id| in_window.contains(id));
        }

        notifications
    }
}

impl Default for ExpiryMonitor {
    fn default() -> Self {
        Self::new(&NotificationSettings::default())
    }
}

/// `0 < remaining <= window`
pub fn is_expiring_soon(remaining: chrono::Duration, window: chrono::Duration) -> bool {
    remaining > chrono::Duration::zero() && remaining <= window
}

/// Build the user-facing notification for a pass
pub fn expiring_notification(pass: &Pass, minutes_remaining: i64) -> Notification {
    Notification {
        pass_id: pass.id.clone(),
        student_name: pass.student_name.clone(),
        title: EXPIRING_SOON_TITLE.to_string(),
        description: format!(
            "{}'s pass expires in {}",
            pass.student_name,
            pluralize(minutes_remaining, "minute")
        ),
        severity: Severity::Warning,
        minutes_remaining,
    }
}

/// Saturates; config validation caps intervals well below the limit
fn to_chrono(d: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
