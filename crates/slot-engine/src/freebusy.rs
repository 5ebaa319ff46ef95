//! Free/busy arithmetic over busy intervals.
//!
//! Sorts busy intervals by start, merges overlapping or touching ones, then
//! reports the gaps between them within a window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A period during which a participant is busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// A gap with nobody busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FreeWindow {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Merge overlapping or adjacent busy intervals, clipped to the given window.
///
/// Returns a sorted, non-overlapping list of intervals.
pub fn merge_busy(
    busy: &[BusyInterval],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<BusyInterval> {
    let mut clipped: Vec<BusyInterval> = busy
        .iter()
        .filter(|b| b.start < window_end && b.end > window_start && b.start < b.end)
        .map(|b| BusyInterval::new(b.start.max(window_start), b.end.min(window_end)))
        .collect();

    clipped.sort_by_key(|b| (b.start, b.end));

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(clipped.len());
    for interval in clipped {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => last.end = last.end.max(interval.end),
            _ => merged.push(interval),
        }
    }
    merged
}

/// Gaps inside `[window_start, window_end)` not covered by any busy interval.
///
/// Intervals may overlap and may come from several participants; they are
/// merged first. Returns windows sorted by start.
pub fn free_windows(
    busy: &[BusyInterval],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<FreeWindow> {
    if window_start >= window_end {
        return Vec::new();
    }

    let mut free = Vec::new();
    let mut cursor = window_start;
    for interval in merge_busy(busy, window_start, window_end) {
        if cursor < interval.start {
            free.push(FreeWindow {
                start: cursor,
                end: interval.start,
            });
        }
        cursor = cursor.max(interval.end);
    }

    // Trailing gap after the last busy period.
    if cursor < window_end {
        free.push(FreeWindow {
            start: cursor,
            end: window_end,
        });
    }
    free
}
