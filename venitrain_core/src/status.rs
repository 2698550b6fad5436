//! Derived per-step status.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::procedure::StepId;

/// Display status of a step, derived from the session's outcome sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Failed,
    Completed,
    Skipped,
    Current,
    /// Below the current step without any recorded outcome.
    Missed,
    Upcoming,
}

/// Resolve a step's status. Precedence is fixed:
/// failed, completed, skipped, current, missed, upcoming.
pub fn step_status(
    id: StepId,
    current: StepId,
    completed: &BTreeSet<StepId>,
    failed: &BTreeSet<StepId>,
    skipped: &BTreeSet<StepId>,
) -> StepStatus {
    if failed.contains(&id) {
        StepStatus::Failed
    } else if completed.contains(&id) {
        StepStatus::Completed
    } else if skipped.contains(&id) {
        StepStatus::Skipped
    } else if id == current {
        StepStatus::Current
    } else if id < current {
        StepStatus::Missed
    } else {
        StepStatus::Upcoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> StepId {
        StepId::new(n).unwrap()
    }

    fn set(ids: &[u8]) -> BTreeSet<StepId> {
        ids.iter().map(|&n| id(n)).collect()
    }

    #[test]
    fn failed_wins_over_completed() {
        let s = step_status(id(2), id(3), &set(&[2]), &set(&[2]), &set(&[2]));
        assert_eq!(s, StepStatus::Failed);
    }

    #[test]
    fn completed_wins_over_skipped_and_current() {
        let s = step_status(id(3), id(3), &set(&[3]), &set(&[]), &set(&[3]));
        assert_eq!(s, StepStatus::Completed);
    }

    #[test]
    fn skipped_wins_over_current() {
        let s = step_status(id(3), id(3), &set(&[]), &set(&[]), &set(&[3]));
        assert_eq!(s, StepStatus::Skipped);
    }

    #[test]
    fn positional_fallbacks() {
        let empty = set(&[]);
        assert_eq!(
            step_status(id(1), id(3), &empty, &empty, &empty),
            StepStatus::Missed
        );
        assert_eq!(
            step_status(id(3), id(3), &empty, &empty, &empty),
            StepStatus::Current
        );
        assert_eq!(
            step_status(id(4), id(3), &empty, &empty, &empty),
            StepStatus::Upcoming
        );
    }
}
