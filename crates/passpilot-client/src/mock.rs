//! Mock pass source for testing

use async_trait::async_trait;
use passpilot_api::{Pass, School};
use passpilot_util::SchoolId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::{PassSource, SourceError, SourceResult};

/// In-memory [`PassSource`] for unit and integration tests
#[derive(Debug, Default)]
pub struct MockPassSource {
    active: Mutex<HashMap<SchoolId, Vec<Pass>>>,
    history: Mutex<HashMap<SchoolId, Vec<Pass>>>,
    schools: Mutex<HashMap<SchoolId, School>>,
    failing: Mutex<Option<String>>,
    active_calls: AtomicUsize,
    school_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockPassSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the open passes returned for `scope`
    pub fn set_active_passes(&self, scope: &SchoolId, passes: Vec<Pass>) {
        lock(&self.active).insert(scope.clone(), passes);
    }

    /// Replace the full pass history returned for `scope`
    pub fn set_passes(&self, scope: &SchoolId, passes: Vec<Pass>) {
        lock(&self.history).insert(scope.clone(), passes);
    }

    /// Register or replace a school record
    pub fn set_school(&self, school: School) {
        lock(&self.schools).insert(school.id.clone(), school);
    }

    /// Make every fetch fail with the given message, or succeed again with `None`
    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failing) = message.map(str::to_string);
    }

    /// Number of `fetch_active_passes` calls so far
    pub fn active_pass_calls(&self) -> usize {
        self.active_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_school` calls so far
    pub fn school_calls(&self) -> usize {
        self.school_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> SourceResult<()> {
        match lock(&self.failing).as_ref() {
            Some(message) => Err(SourceError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PassSource for MockPassSource {
    async fn fetch_active_passes(&self, scope: &SchoolId) -> SourceResult<Vec<Pass>> {
        self.active_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(lock(&self.active).get(scope).cloned().unwrap_or_default())
    }

    async fn fetch_school(&self, scope: &SchoolId) -> SourceResult<School> {
        self.school_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        lock(&self.schools)
            .get(scope)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("school {}", scope)))
    }

    async fn fetch_passes(&self, scope: &SchoolId) -> SourceResult<Vec<Pass>> {
        self.check_failure()?;
        Ok(lock(&self.history).get(scope).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passpilot_api::Plan;
    use passpilot_util::PassId;

    fn pass(id: &str) -> Pass {
        Pass {
            id: PassId::new(id),
            student_name: "Student".into(),
            issued_at: None,
            returned_at: None,
            expires_at: None,
            stored_duration: None,
            destination: None,
            issued_by: None,
        }
    }

    #[tokio::test]
    async fn mock_returns_configured_passes() {
        let source = MockPassSource::new();
        let scope = SchoolId::new("s1");
        source.set_active_passes(&scope, vec![pass("a"), pass("b")]);

        let passes = source.fetch_active_passes(&scope).await.unwrap();
        assert_eq!(passes.len(), 2);
        assert_eq!(source.active_pass_calls(), 1);

        let other = source.fetch_active_passes(&SchoolId::new("s2")).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn mock_failure_mode() {
        let source = MockPassSource::new();
        let scope = SchoolId::new("s1");
        source.set_failure(Some("offline"));

        assert!(matches!(
            source.fetch_active_passes(&scope).await,
            Err(SourceError::Unavailable(_))
        ));
        assert!(source.fetch_school(&scope).await.is_err());

        source.set_failure(None);
        assert!(source.fetch_active_passes(&scope).await.is_ok());
    }

    #[tokio::test]
    async fn mock_unknown_school_is_not_found() {
        let source = MockPassSource::new();
        source.set_school(School {
            id: SchoolId::new("s1"),
            name: "Lincoln High".into(),
            plan: Plan::Paid,
            is_trial_expired: false,
            trial_end_date: None,
        });

        assert!(source.fetch_school(&SchoolId::new("s1")).await.is_ok());
        assert!(matches!(
            source.fetch_school(&SchoolId::new("s2")).await,
            Err(SourceError::NotFound(_))
        ));
        assert_eq!(source.school_calls(), 2);
    }
}
