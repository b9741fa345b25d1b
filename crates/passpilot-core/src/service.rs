//! Polling service
//!
//! Wires the pass source, the expiry monitor and trial evaluation into three
//! periodic tasks on a [`Scheduler`]:
//!
//! - active-pass refresh: replaces the [`PassSnapshot`]
//! - expiry check: evaluates open passes and emits notifications to the sink
//! - school refresh: re-evaluates the trial banner
//!
//! Each task replaces only its own data. Fetch failures are logged, reported
//! as [`CoreEvent::PollFailed`] and never stop the task.

use chrono::{DateTime, Utc};
use passpilot_api::{CurrentUser, Notification, Pass, School, TrialBanner, TrialStatus};
use passpilot_client::{PassSource, SourceError};
use passpilot_config::{NotificationSettings, PollingSettings};
use passpilot_util::{Clock, PassPilotError, Result, SchoolId};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::{CoreEvent, ExpiryMonitor, NotificationSink, Scheduler, TaskHandle, trial_banner, trial_status};

pub const ACTIVE_PASSES_TASK: &str = "active-passes";
pub const EXPIRY_CHECK_TASK: &str = "expiry-check";
pub const SCHOOL_TASK: &str = "school";

/// Events beyond this many undelivered ones are dropped
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Latest successful active-pass fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassSnapshot {
    pub passes: Vec<Pass>,
    /// `None` until the first fetch succeeds
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Result of a one-shot evaluation
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub school: School,
    pub active_passes: usize,
    pub notifications: Vec<Notification>,
    pub trial: TrialStatus,
    pub banner: Option<TrialBanner>,
}

/// State shared between the periodic tasks
struct Shared {
    source: Arc<dyn PassSource>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    events: mpsc::Sender<CoreEvent>,
    snapshot: watch::Sender<PassSnapshot>,
}

impl Shared {
    /// Never waits: a task must not stall behind a slow event consumer
    fn emit(&self, event: CoreEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event = ?event, "Event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => debug!("Event receiver closed"),
        }
    }

    fn poll_failed(&self, task: &'static str, scope: &SchoolId, error: SourceError) {
        warn!(task, school_id = %scope, error = %error, "Poll failed");
        self.emit(CoreEvent::PollFailed {
            task,
            error: error.to_string(),
        });
    }

    async fn refresh_active_passes(&self, scope: &SchoolId) {
        match self.source.fetch_active_passes(scope).await {
            Ok(passes) => {
                let count = passes.len();
                self.snapshot.send_replace(PassSnapshot {
                    passes,
                    fetched_at: Some(self.clock.now()),
                });
                debug!(school_id = %scope, count, "Active passes refreshed");
                self.emit(CoreEvent::ActivePassesUpdated {
                    school_id: scope.clone(),
                    count,
                });
            }
            // Last snapshot stays in place until the next tick
            Err(e) => self.poll_failed(ACTIVE_PASSES_TASK, scope, e),
        }
    }

    async fn check_expiry(&self, scope: &SchoolId, monitor: &Mutex<ExpiryMonitor>) {
        let passes = match self.source.fetch_active_passes(scope).await {
            Ok(passes) => passes,
            Err(e) => {
                // Skip the cycle; repeat memory stays as it was
                self.poll_failed(EXPIRY_CHECK_TASK, scope, e);
                return;
            }
        };

        let now = self.clock.now();
        let notifications = monitor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .evaluate(Some(scope), &passes, now);

        for notification in &notifications {
            info!(
                pass_id = %notification.pass_id,
                minutes_remaining = notification.minutes_remaining,
                "Pass expiring soon"
            );
            self.sink.emit(notification);
        }
    }

    async fn refresh_school(&self, scope: &SchoolId, last: &Mutex<Option<Option<TrialBanner>>>) {
        let school = match self.source.fetch_school(scope).await {
            Ok(school) => school,
            Err(e) => return self.poll_failed(SCHOOL_TASK, scope, e),
        };

        let banner = trial_banner(&school, self.clock.now());
        let changed = {
            let mut last = last.lock().unwrap_or_else(|e| e.into_inner());
            if last.as_ref() == Some(&banner) {
                false
            } else {
                *last = Some(banner.clone());
                true
            }
        };

        if changed {
            info!(school_id = %scope, visible = banner.is_some(), "Trial banner changed");
            self.emit(CoreEvent::TrialBannerChanged { banner });
        }
    }
}

/// Background monitoring for one authenticated session
pub struct PollingService {
    shared: Arc<Shared>,
    session: Option<CurrentUser>,
    polling: PollingSettings,
    notifications: NotificationSettings,
    scheduler: Scheduler,
    handles: Vec<TaskHandle>,
}

impl PollingService {
    /// Create the service and the receiving end of its event stream
    pub fn new(
        source: Arc<dyn PassSource>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
        session: Option<CurrentUser>,
        polling: PollingSettings,
        notifications: NotificationSettings,
    ) -> (Self, mpsc::Receiver<CoreEvent>) {
        let (events, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (snapshot, _) = watch::channel(PassSnapshot::default());

        let service = Self {
            shared: Arc::new(Shared {
                source,
                clock,
                sink,
                events,
                snapshot,
            }),
            session,
            polling,
            notifications,
            scheduler: Scheduler::new(),
            handles: Vec::new(),
        };

        (service, events_rx)
    }

    /// Organizational scope being monitored
    pub fn scope(&self) -> Option<&SchoolId> {
        self.session.as_ref().and_then(CurrentUser::scope)
    }

    /// Watch the active-pass snapshot
    pub fn subscribe_snapshot(&self) -> watch::Receiver<PassSnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// Current active-pass snapshot
    pub fn snapshot(&self) -> PassSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Register the periodic tasks.
    ///
    /// Returns `false` (and registers nothing) when there is no scope or the
    /// tasks are already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }

        let Some(scope) = self.scope().cloned() else {
            info!("No authenticated scope, monitoring disabled");
            return false;
        };

        let shared = self.shared.clone();
        let active_scope = scope.clone();
        let active = self.scheduler.spawn_periodic(
            ACTIVE_PASSES_TASK,
            self.polling.active_passes,
            move || {
                let shared = shared.clone();
                let scope = active_scope.clone();
                async move { shared.refresh_active_passes(&scope).await }
            },
        );

        let shared = self.shared.clone();
        let expiry_scope = scope.clone();
        let monitor = Arc::new(Mutex::new(ExpiryMonitor::new(&self.notifications)));
        let expiry = self.scheduler.spawn_periodic(
            EXPIRY_CHECK_TASK,
            self.polling.expiry_check,
            move || {
                let shared = shared.clone();
                let scope = expiry_scope.clone();
                let monitor = monitor.clone();
                async move { shared.check_expiry(&scope, &monitor).await }
            },
        );

        let shared = self.shared.clone();
        let school_scope = scope.clone();
        let last_banner = Arc::new(Mutex::new(None));
        let school = self.scheduler.spawn_periodic(SCHOOL_TASK, self.polling.school, move || {
            let shared = shared.clone();
            let scope = school_scope.clone();
            let last_banner = last_banner.clone();
            async move { shared.refresh_school(&scope, &last_banner).await }
        });

        self.handles = vec![active, expiry, school];

        info!(
            school_id = %scope,
            active_passes_secs = self.polling.active_passes.as_secs(),
            expiry_check_secs = self.polling.expiry_check.as_secs(),
            school_secs = self.polling.school.as_secs(),
            "Polling started"
        );
        true
    }

    /// One expiry evaluation and one trial evaluation, outside the scheduler.
    ///
    /// Unlike the periodic tasks, fetch failures are returned as errors.
    pub async fn check_once(&self) -> Result<CheckReport> {
        let scope = self.scope().ok_or(PassPilotError::NoScope)?;
        let source = &self.shared.source;

        let passes = source
            .fetch_active_passes(scope)
            .await
            .map_err(|e| upstream_error(scope, e))?;
        let school = source
            .fetch_school(scope)
            .await
            .map_err(|e| upstream_error(scope, e))?;

        let now = self.shared.clock.now();
        let notifications =
            ExpiryMonitor::new(&self.notifications).evaluate(Some(scope), &passes, now);

        Ok(CheckReport {
            trial: trial_status(&school, now),
            banner: trial_banner(&school, now),
            active_passes: passes.len(),
            notifications,
            school,
        })
    }

    /// Stop every task and wait for them; nothing is emitted afterwards
    pub async fn shutdown(mut self) {
        self.handles.clear();
        self.scheduler.shutdown().await;
        info!("Polling stopped");
    }
}

/// Map a source failure onto the core error type
pub(crate) fn upstream_error(scope: &SchoolId, error: SourceError) -> PassPilotError {
    match error {
        SourceError::NotFound(_) => PassPilotError::SchoolNotFound(scope.clone()),
        other => PassPilotError::upstream(other.to_string()),
    }
}
