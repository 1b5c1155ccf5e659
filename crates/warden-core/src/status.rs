//! Lifecycle status shared by objects and chunks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an [`crate::object::ObjectRecord`] or a [`crate::chunk::Chunk`].
///
/// Transitions form the DAG documented in the scan-orchestration spec:
/// `WaitForScan <-> InProgress -> Scanned`, `* -> Ignored`, `* -> Skipped`,
/// `* -> Failed`. There is no direct `Scanned -> InProgress` outside a
/// rescan trigger (see [`Status::can_transition`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ignored,
    WaitForScan,
    InProgress,
    Scanned,
    RescanInProgress,
    Skipped,
    Failed,
}

impl Status {
    /// Relative priority used when deriving an object's aggregate status
    /// from its chunks (higher wins). `Scanned` is intentionally lowest
    /// among the "active" statuses: an object is only `Scanned` once every
    /// chunk agrees.
    fn priority(self) -> u8 {
        match self {
            Status::Failed => 6,
            Status::InProgress => 5,
            Status::RescanInProgress => 5,
            Status::WaitForScan => 4,
            Status::Skipped => 3,
            Status::Ignored => 2,
            Status::Scanned => 1,
        }
    }

    /// Derive the max-priority status across a set of chunk statuses, per
    /// the "object aggregate status is derived" invariant. Returns `None`
    /// for an object with no chunks (caller should treat that as `Scanned`
    /// per the zero-size / unsupported-extension rule).
    pub fn aggregate<I: IntoIterator<Item = Status>>(chunk_statuses: I) -> Option<Status> {
        let statuses: Vec<Status> = chunk_statuses.into_iter().collect();
        if statuses.is_empty() {
            return None;
        }
        if statuses.iter().all(|s| *s == Status::Scanned) {
            return Some(Status::Scanned);
        }
        statuses.into_iter().max_by_key(|s| s.priority())
    }

    /// Whether `from -> to` is a legal status transition.
    pub fn can_transition(from: Status, to: Status) -> bool {
        use Status::*;
        match (from, to) {
            (WaitForScan, InProgress) => true,
            (InProgress, WaitForScan) => true,
            (InProgress, Scanned) => true,
            (Scanned, RescanInProgress) => true,
            (RescanInProgress, Scanned) => true,
            (RescanInProgress, WaitForScan) => true,
            (_, Ignored) => true,
            (_, Skipped) => true,
            (_, Failed) => true,
            (a, b) if a == b => true,
            _ => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ignored => "IGNORED",
            Status::WaitForScan => "WAIT_FOR_SCAN",
            Status::InProgress => "IN_PROGRESS",
            Status::Scanned => "SCANNED",
            Status::RescanInProgress => "RESCAN_IN_PROGRESS",
            Status::Skipped => "SKIPPED",
            Status::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_round_trip_is_legal() {
        assert!(Status::can_transition(Status::WaitForScan, Status::InProgress));
        assert!(Status::can_transition(Status::InProgress, Status::Scanned));
        assert!(Status::can_transition(Status::InProgress, Status::WaitForScan));
    }

    #[test]
    fn scanned_cannot_jump_back_to_in_progress() {
        assert!(!Status::can_transition(Status::Scanned, Status::InProgress));
    }

    #[test]
    fn rescan_reenters_wait_for_scan() {
        assert!(Status::can_transition(Status::Scanned, Status::RescanInProgress));
        assert!(Status::can_transition(Status::RescanInProgress, Status::WaitForScan));
    }

    #[test]
    fn aggregate_all_scanned_is_scanned() {
        let agg = Status::aggregate([Status::Scanned, Status::Scanned]);
        assert_eq!(agg, Some(Status::Scanned));
    }

    #[test]
    fn aggregate_prefers_highest_priority_non_scanned() {
        let agg = Status::aggregate([Status::Scanned, Status::Failed, Status::WaitForScan]);
        assert_eq!(agg, Some(Status::Failed));
    }

    #[test]
    fn aggregate_of_no_chunks_is_none() {
        assert_eq!(Status::aggregate(std::iter::empty()), None);
    }
}
