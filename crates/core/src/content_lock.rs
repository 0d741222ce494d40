//! Content-lock gate.
//!
//! A two-state gate that closes community and study features once a learner
//! has started any activity without finishing onboarding. Locked iff some
//! first-activity flag is set AND personal info is incomplete; completing
//! personal info unlocks regardless of activity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    Unlocked,
    Locked,
}

impl LockState {
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, LockState::Locked)
    }

    /// Reconstructs the state from a stored boolean flag.
    #[must_use]
    pub fn from_locked_flag(locked: bool) -> Self {
        if locked {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }
}

/// Evaluates the gate for the given inputs.
#[must_use]
pub fn evaluate(activity_started: bool, personal_info_completed: bool) -> LockState {
    if activity_started && !personal_info_completed {
        LockState::Locked
    } else {
        LockState::Unlocked
    }
}

/// Returns the next state only when it differs from `current`.
///
/// `None` means the stored flag is already correct and no write is needed,
/// which keeps repeated checks idempotent.
#[must_use]
pub fn transition(
    current: LockState,
    activity_started: bool,
    personal_info_completed: bool,
) -> Option<LockState> {
    let next = evaluate(activity_started, personal_info_completed);
    (next != current).then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truth_table() {
        assert_eq!(evaluate(false, false), LockState::Unlocked);
        assert_eq!(evaluate(false, true), LockState::Unlocked);
        assert_eq!(evaluate(true, false), LockState::Locked);
        assert_eq!(evaluate(true, true), LockState::Unlocked);
    }

    #[test]
    fn test_completing_info_unlocks_despite_activity() {
        assert_eq!(
            transition(LockState::Locked, true, true),
            Some(LockState::Unlocked)
        );
    }

    #[test]
    fn test_activity_without_info_locks() {
        assert_eq!(
            transition(LockState::Unlocked, true, false),
            Some(LockState::Locked)
        );
    }

    #[test]
    fn test_reevaluation_with_unchanged_inputs_is_idempotent() {
        assert_eq!(transition(LockState::Locked, true, false), None);
        assert_eq!(transition(LockState::Unlocked, false, false), None);
        assert_eq!(transition(LockState::Unlocked, true, true), None);
    }

    #[test]
    fn test_flag_roundtrip() {
        assert!(LockState::from_locked_flag(true).is_locked());
        assert!(!LockState::from_locked_flag(false).is_locked());
    }
}
