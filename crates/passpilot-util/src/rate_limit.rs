//! Keyed repeat limiting
//!
//! Remembers when each key last fired so a caller can suppress repeats,
//! either for good (until the key is pruned) or for a minimum interval.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::Hash;

/// Per-key limiter driven by caller-supplied timestamps
#[derive(Debug)]
pub struct RepeatLimiter<K> {
    /// Minimum gap between two firings of the same key.
    /// `None` means a key fires once until it is pruned.
    min_interval: Option<chrono::Duration>,
    last_fired: HashMap<K, DateTime<Utc>>,
}

impl<K: Eq + Hash + Clone> RepeatLimiter<K> {
    /// Limiter that lets each key fire exactly once until pruned
    pub fn once() -> Self {
        Self {
            min_interval: None,
            last_fired: HashMap::new(),
        }
    }

    /// Limiter that lets each key fire at most once per `interval`
    pub fn every(interval: chrono::Duration) -> Self {
        Self {
            min_interval: Some(interval),
            last_fired: HashMap::new(),
        }
    }

    /// Check whether `key` may fire at `now`, recording the firing if so
    pub fn check(&mut self, key: &K, now: DateTime<Utc>) -> bool {
        match (self.last_fired.get(key), self.min_interval) {
            (None, _) => {}
            (Some(_), None) => return false,
            (Some(last), Some(interval)) => {
                if now.signed_duration_since(*last) < interval {
                    return false;
                }
            }
        }

        self.last_fired.insert(key.clone(), now);
        true
    }

    /// Drop the memory for keys the predicate rejects
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.last_fired.retain(|k, _| keep(k));
    }
}
