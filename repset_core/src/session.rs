//! Per-session mutable state.
//!
//! Owned exclusively by the session controller for the life of one session
//! and never persisted; abandoning a session drops it wholesale.

use crate::RestTimer;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Address of one set within the plan
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SetKey {
    pub exercise: usize,
    pub set: usize,
}

impl SetKey {
    pub fn new(exercise: usize, set: usize) -> Self {
        Self { exercise, set }
    }
}

/// Mutable state of a session in progress
///
/// The rest timer lives here beside the exercise cursor, not inside any
/// per-exercise record, so navigating never touches a running countdown.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub current_exercise_index: usize,
    /// Absent key means not completed
    pub completed_sets: BTreeMap<SetKey, bool>,
    pub rest_timer: RestTimer,
    pub completion_reported: bool,
    pub started_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            current_exercise_index: 0,
            completed_sets: BTreeMap::new(),
            rest_timer: RestTimer::new(),
            completion_reported: false,
            started_at,
        }
    }

    pub fn is_set_completed(&self, key: SetKey) -> bool {
        self.completed_sets.get(&key).copied().unwrap_or(false)
    }

    /// Flip one set, returning its new value
    ///
    /// Un-marking removes the key, so flipping twice leaves the map exactly
    /// as it was.
    pub fn flip(&mut self, key: SetKey) -> bool {
        if self.completed_sets.remove(&key).unwrap_or(false) {
            false
        } else {
            self.completed_sets.insert(key, true);
            true
        }
    }

    /// Completed sets among `0..total_sets` of one exercise
    pub fn completed_count(&self, exercise: usize, total_sets: usize) -> usize {
        (0..total_sets)
            .filter(|&set| self.is_set_completed(SetKey::new(exercise, set)))
            .count()
    }

    /// Completed sets across the whole session
    pub fn total_completed(&self) -> usize {
        self.completed_sets.values().filter(|&&done| done).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_is_involution() {
        let mut state = SessionState::new(Utc::now());
        let key = SetKey::new(0, 1);

        assert!(!state.is_set_completed(key));
        assert!(state.flip(key));
        assert!(state.is_set_completed(key));
        assert!(!state.flip(key));
        assert!(!state.is_set_completed(key));
        assert!(state.completed_sets.is_empty());
    }

    #[test]
    fn test_completed_count_ignores_other_exercises() {
        let mut state = SessionState::new(Utc::now());
        state.flip(SetKey::new(0, 0));
        state.flip(SetKey::new(0, 2));
        state.flip(SetKey::new(1, 0));
        // Outside the counted range
        state.flip(SetKey::new(0, 5));

        assert_eq!(state.completed_count(0, 3), 2);
        assert_eq!(state.completed_count(1, 3), 1);
        assert_eq!(state.total_completed(), 4);
    }
}
