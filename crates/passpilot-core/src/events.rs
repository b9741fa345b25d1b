//! Events emitted by the polling service

use passpilot_api::{EventPayload, TrialBanner};
use passpilot_util::SchoolId;

/// Events emitted by the core (notifications go through the sink instead)
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// The active-pass snapshot was replaced
    ActivePassesUpdated { school_id: SchoolId, count: usize },

    /// Trial banner visibility or content changed
    TrialBannerChanged { banner: Option<TrialBanner> },

    /// A periodic fetch failed; the task keeps running
    PollFailed { task: &'static str, error: String },
}

impl From<CoreEvent> for EventPayload {
    fn from(event: CoreEvent) -> Self {
        match event {
            CoreEvent::ActivePassesUpdated { school_id, count } => {
                EventPayload::ActivePassesUpdated { school_id, count }
            }
            CoreEvent::TrialBannerChanged { banner } => EventPayload::TrialBannerChanged { banner },
            CoreEvent::PollFailed { task, error } => EventPayload::PollFailed {
                task: task.to_string(),
                error,
            },
        }
    }
}
