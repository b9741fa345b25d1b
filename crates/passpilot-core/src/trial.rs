//! Trial evaluation

use chrono::{DateTime, Utc};
use passpilot_api::{Plan, School, Severity, TrialBanner, TrialStatus};
use passpilot_util::{DAY_MS, pluralize};

/// Days left in the school's trial, rounded up, never negative
pub fn trial_status(school: &School, now: DateTime<Utc>) -> TrialStatus {
    let days_remaining = match school.trial_end_date {
        Some(end) => {
            let ms = end.signed_duration_since(now).num_milliseconds();
            // ceil(ms / DAY_MS)
            (-(-ms).div_euclid(DAY_MS)).max(0)
        }
        None => 0,
    };

    TrialStatus {
        days_remaining,
        is_expired: days_remaining <= 0,
    }
}

/// Banner for a free-trial school the backend has flagged as expired.
///
/// Every other school gets no banner, whatever its trial dates say.
pub fn trial_banner(school: &School, now: DateTime<Utc>) -> Option<TrialBanner> {
    if school.plan != Plan::FreeTrial || !school.is_trial_expired {
        return None;
    }

    let status = trial_status(school, now);
    let banner = if status.is_expired {
        TrialBanner {
            severity: Severity::Error,
            title: "Free Trial Expired".into(),
            message: format!(
                "The free trial for {} has ended. Upgrade to keep issuing passes.",
                school_label(school)
            ),
            days_remaining: 0,
        }
    } else {
        TrialBanner {
            severity: Severity::Warning,
            title: "Free Trial Ending".into(),
            message: format!(
                "{} left in the free trial for {}.",
                pluralize(status.days_remaining, "day"),
                school_label(school)
            ),
            days_remaining: status.days_remaining,
        }
    };

    Some(banner)
}

fn school_label(school: &School) -> &str {
    if school.name.is_empty() {
        "your school"
    } else {
        &school.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use passpilot_util::{SchoolId, parse_timestamp};

    fn now() -> DateTime<Utc> {
        parse_timestamp("2025-08-18T12:00:00Z").unwrap()
    }

    fn school(plan: Plan, expired: bool, end: Option<DateTime<Utc>>) -> School {
        School {
            id: SchoolId::new("lincoln-high"),
            name: "Lincoln High".into(),
            plan,
            is_trial_expired: expired,
            trial_end_date: end,
        }
    }

    #[test]
    fn days_remaining_rounds_up() {
        let s = school(Plan::FreeTrial, false, Some(now() + Duration::hours(30)));
        let status = trial_status(&s, now());
        assert_eq!(status.days_remaining, 2);
        assert!(!status.is_expired);

        let exact = school(Plan::FreeTrial, false, Some(now() + Duration::days(3)));
        assert_eq!(trial_status(&exact, now()).days_remaining, 3);

        let soon = school(Plan::FreeTrial, false, Some(now() + Duration::milliseconds(1)));
        assert_eq!(trial_status(&soon, now()).days_remaining, 1);
    }

    #[test]
    fn past_or_missing_end_is_expired() {
        let past = school(Plan::FreeTrial, true, Some(now() - Duration::days(2)));
        assert_eq!(
            trial_status(&past, now()),
            TrialStatus {
                days_remaining: 0,
                is_expired: true
            }
        );

        let missing = school(Plan::FreeTrial, true, None);
        assert!(trial_status(&missing, now()).is_expired);
    }

    #[test]
    fn banner_suppressed_for_paid_plan() {
        let s = school(Plan::Paid, true, Some(now() - Duration::days(2)));
        assert!(trial_banner(&s, now()).is_none());

        let other = school(Plan::Other, true, None);
        assert!(trial_banner(&other, now()).is_none());
    }

    #[test]
    fn banner_suppressed_until_backend_flags_expiry() {
        let s = school(Plan::FreeTrial, false, Some(now() - Duration::days(2)));
        assert!(trial_banner(&s, now()).is_none());
    }

    #[test]
    fn expired_trial_banner_is_error() {
        let s = school(Plan::FreeTrial, true, Some(now() - Duration::days(2)));
        let banner = trial_banner(&s, now()).unwrap();
        assert_eq!(banner.severity, Severity::Error);
        assert_eq!(banner.days_remaining, 0);
        assert!(banner.message.contains("Lincoln High"));
    }

    #[test]
    fn flagged_trial_with_days_left_is_warning() {
        let s = school(Plan::FreeTrial, true, Some(now() + Duration::hours(20)));
        let banner = trial_banner(&s, now()).unwrap();
        assert_eq!(banner.severity, Severity::Warning);
        assert_eq!(banner.days_remaining, 1);
        assert!(banner.message.starts_with("1 day left"));

        let s = school(Plan::FreeTrial, true, Some(now() + Duration::days(4)));
        let banner = trial_banner(&s, now()).unwrap();
        assert!(banner.message.starts_with("4 days left"));
    }
}
