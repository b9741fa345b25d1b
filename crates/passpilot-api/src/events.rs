//! Event types written by the PassPilot service

use chrono::{DateTime, Utc};
use passpilot_util::SchoolId;
use serde::{Deserialize, Serialize};

use crate::{Notification, TrialBanner, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self::at(passpilot_util::now(), payload)
    }

    pub fn at(timestamp: DateTime<Utc>, payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp,
            payload,
        }
    }
}

/// All events the service emits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Service started monitoring a scope (or none, when disabled)
    ServiceStarted { school_id: Option<SchoolId> },

    /// A pass entered the expiring-soon window
    PassExpiringSoon(Notification),

    /// The active-pass snapshot was replaced
    ActivePassesUpdated { school_id: SchoolId, count: usize },

    /// The trial banner state changed; `None` means hidden
    TrialBannerChanged { banner: Option<TrialBanner> },

    /// A poll against the REST API failed
    PollFailed { task: String, error: String },

    /// Service is shutting down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;
    use passpilot_util::PassId;

    #[test]
    fn event_serialization() {
        let event = Event::new(EventPayload::PassExpiringSoon(Notification {
            pass_id: PassId::new("p-1"),
            student_name: "Avery".into(),
            title: "Pass Expiring Soon".into(),
            description: "Avery's pass expires in 1 minute".into(),
            severity: Severity::Warning,
            minutes_remaining: 1,
        }));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"pass_expiring_soon\""));

        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_version, API_VERSION);
        assert!(matches!(parsed.payload, EventPayload::PassExpiringSoon(_)));
    }

    #[test]
    fn hidden_banner_serializes_as_null() {
        let event = Event::new(EventPayload::TrialBannerChanged { banner: None });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"banner\":null"));
    }
}
