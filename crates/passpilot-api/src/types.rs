//! Shared types for PassPilot

use chrono::{DateTime, Utc};
use passpilot_util::{PassId, SchoolId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timestamp::lenient_text;

/// A hall pass as returned by the REST API.
///
/// `issued_at` and `expires_at` are always set by the issuing system, but a
/// malformed value on the wire arrives here as `None`; evaluators treat that
/// as "skip" rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PassWire")]
pub struct Pass {
    pub id: PassId,

    pub student_name: String,

    #[serde(with = "crate::timestamp::lenient_timestamp")]
    pub issued_at: Option<DateTime<Utc>>,

    /// Present once the pass is closed
    #[serde(with = "crate::timestamp::lenient_timestamp")]
    pub returned_at: Option<DateTime<Utc>>,

    /// Deadline computed by the issuing system
    #[serde(with = "crate::timestamp::lenient_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Duration in minutes persisted by the backend; may be absent, zero or stale
    pub stored_duration: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<String>,
}

/// Wire shape of a pass. Everything except `id` degrades to absent/empty.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PassWire {
    id: PassId,

    #[serde(default, deserialize_with = "crate::timestamp::lenient_string::deserialize")]
    student_name: String,

    #[serde(default, deserialize_with = "crate::timestamp::lenient_timestamp::deserialize")]
    issued_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "crate::timestamp::lenient_timestamp::deserialize")]
    returned_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "crate::timestamp::lenient_timestamp::deserialize")]
    expires_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "crate::timestamp::lenient_minutes::deserialize")]
    stored_duration: Option<i64>,

    /// Older payloads carry the stored duration under this name
    #[serde(default, deserialize_with = "crate::timestamp::lenient_minutes::deserialize")]
    duration: Option<i64>,

    #[serde(default)]
    destination: Option<Value>,

    #[serde(default)]
    issued_by: Option<Value>,
}

impl From<PassWire> for Pass {
    fn from(wire: PassWire) -> Self {
        Self {
            id: wire.id,
            student_name: wire.student_name,
            issued_at: wire.issued_at,
            returned_at: wire.returned_at,
            expires_at: wire.expires_at,
            stored_duration: wire.stored_duration.or(wire.duration),
            destination: lenient_text(wire.destination),
            issued_by: lenient_text(wire.issued_by),
        }
    }
}

impl Pass {
    /// Still open (not yet returned)
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Signed time left before `expires_at`; `None` if the deadline is unusable
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.expires_at.map(|expires| expires.signed_duration_since(now))
    }
}

/// Billing plan of a school
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    FreeTrial,
    Paid,
    /// Any plan this build does not know about
    #[default]
    #[serde(other)]
    Other,
}

/// A school (organization) record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: SchoolId,

    #[serde(default, with = "crate::timestamp::lenient_string")]
    pub name: String,

    #[serde(default)]
    pub plan: Plan,

    /// Computed server-side
    #[serde(default)]
    pub is_trial_expired: bool,

    #[serde(default, with = "crate::timestamp::lenient_timestamp")]
    pub trial_end_date: Option<DateTime<Utc>>,
}

/// The authenticated user exposed by the session provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,

    #[serde(default)]
    pub display_name: String,

    /// Organizational scope; `None` disables monitoring
    #[serde(default)]
    pub school_id: Option<SchoolId>,
}

impl CurrentUser {
    pub fn scope(&self) -> Option<&SchoolId> {
        self.school_id.as_ref()
    }
}

/// Visual severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A toast-style notification for a pass about to expire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub pass_id: PassId,
    pub student_name: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub minutes_remaining: i64,
}

/// Remaining trial time for a school
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialStatus {
    pub days_remaining: i64,
    pub is_expired: bool,
}

/// Banner shown while a free trial is flagged as expired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBanner {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub days_remaining: i64,
}

/// One line of the pass history export
///
/// `duration_minutes` is empty for passes that have not been returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub pass_id: PassId,
    pub student_name: String,
    pub destination: Option<String>,
    pub issued_by: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

impl ExportRow {
    /// Column names, in output order
    pub const HEADERS: [&'static str; 7] = [
        "pass_id",
        "student_name",
        "destination",
        "issued_by",
        "issued_at",
        "returned_at",
        "duration_minutes",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pass_deserializes_from_api_shape() {
        let value = json!({
            "id": "p-1",
            "studentName": "Avery Chen",
            "issuedAt": "2025-08-18T20:19:59.196Z",
            "returnedAt": "2025-08-18T22:37:58.451Z",
            "expiresAt": "2025-08-18T20:34:59.196Z",
            "duration": 138,
            "destination": "Library"
        });

        let pass: Pass = serde_json::from_value(value).unwrap();
        assert_eq!(pass.id.as_str(), "p-1");
        assert_eq!(pass.stored_duration, Some(138));
        assert!(pass.issued_at.is_some());
        assert!(!pass.is_open());
        assert_eq!(pass.destination.as_deref(), Some("Library"));
    }

    #[test]
    fn malformed_timestamps_become_absent() {
        let value = json!({
            "id": "p-2",
            "studentName": "Jordan",
            "issuedAt": "yesterday-ish",
            "expiresAt": null,
            "storedDuration": "n/a"
        });

        let pass: Pass = serde_json::from_value(value).unwrap();
        assert!(pass.issued_at.is_none());
        assert!(pass.expires_at.is_none());
        assert!(pass.stored_duration.is_none());
        assert!(pass.is_open());
    }

    #[test]
    fn loosely_typed_fields_are_tolerated() {
        let pass: Pass = serde_json::from_value(json!({
            "id": 42,
            "studentName": null,
            "expiresAt": "2025-08-18T20:34:59.196Z",
            "storedDuration": 12,
            "duration": 99,
            "issuedBy": 7
        }))
        .unwrap();

        assert_eq!(pass.id.as_str(), "42");
        assert_eq!(pass.student_name, "");
        assert_eq!(pass.stored_duration, Some(12));
        assert_eq!(pass.issued_by.as_deref(), Some("7"));
        assert!(pass.expires_at.is_some());
    }

    #[test]
    fn pass_without_id_is_rejected() {
        let result: Result<Pass, _> = serde_json::from_value(json!({ "studentName": "Avery" }));
        assert!(result.is_err());
    }

    #[test]
    fn pass_serializes_back_to_api_shape() {
        let pass: Pass = serde_json::from_value(json!({
            "id": "p-1",
            "studentName": "Avery",
            "issuedAt": "2025-08-18T20:19:59.196Z",
            "duration": 5
        }))
        .unwrap();

        let value = serde_json::to_value(&pass).unwrap();
        assert_eq!(value["studentName"], "Avery");
        assert_eq!(value["issuedAt"], "2025-08-18T20:19:59.196Z");
        assert_eq!(value["storedDuration"], 5);
        assert!(value["returnedAt"].is_null());
    }

    #[test]
    fn unknown_plan_maps_to_other() {
        let school: School = serde_json::from_value(json!({
            "id": "s-1",
            "plan": "enterprise",
            "isTrialExpired": false
        }))
        .unwrap();
        assert_eq!(school.plan, Plan::Other);

        let school: School = serde_json::from_value(json!({
            "id": "s-1",
            "plan": "free_trial",
            "isTrialExpired": true,
            "trialEndDate": "2025-09-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(school.plan, Plan::FreeTrial);
        assert!(school.trial_end_date.is_some());

        let school: School = serde_json::from_value(json!({ "id": 7, "name": null })).unwrap();
        assert_eq!(school.id.as_str(), "7");
        assert_eq!(school.name, "");
    }

    #[test]
    fn notification_serializes_camel_case() {
        let n = Notification {
            pass_id: PassId::new("p-1"),
            student_name: "Avery".into(),
            title: "Pass Expiring Soon".into(),
            description: "Avery's pass expires in 4 minutes".into(),
            severity: Severity::Warning,
            minutes_remaining: 4,
        };
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"minutesRemaining\":4"));
        assert!(json.contains("\"severity\":\"warning\""));
    }
}
