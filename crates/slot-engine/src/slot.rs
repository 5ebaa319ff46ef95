//! Candidate meeting slots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate meeting interval with a justification and rank score.
///
/// Serialized as `{ id, start, end, reason, score }` with RFC 3339 timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Unique within one batch.
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Short human-readable reason this slot was offered.
    pub reason: String,
    /// Higher is better.
    pub score: i64,
}

impl Slot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Sort slots best-first by score.
///
/// The sort is stable, so slots with equal scores keep their relative order.
/// A batch from [`crate::SlotFinder`] is already in this order.
pub fn rank_by_score(slots: &mut [Slot]) {
    slots.sort_by(|a, b| b.score.cmp(&a.score));
}
