//! 空闲时段计算：在一天的忙碌事件之间寻找可用时间。
//!
//! # Free-Slot Scheduler
//!
//! Pure interval arithmetic over a day's busy events. Given a window and a
//! minimum duration, [`find_free_slots`] returns the ordered, non-overlapping
//! gaps between (merged) busy blocks.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use coach_chat::scheduler::{find_free_slots, BusyEvent};
//!
//! let at = |h, m| Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap();
//! let busy = vec![BusyEvent::new(at(9, 0), at(10, 0))];
//! let free = find_free_slots(&busy, at(8, 0), at(12, 0), Duration::minutes(30));
//! assert_eq!(free.len(), 2);
//! assert_eq!(free[0].start(), at(8, 0));
//! assert_eq!(free[1].end(), at(12, 0));
//! ```

pub mod calendar;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use calendar::{schedule_session, CalendarError, CalendarProvider, InMemoryCalendar};

/// A busy block as supplied by the calendar collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl BusyEvent {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            all_day: false,
            title: None,
        }
    }

    pub fn all_day(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            all_day: true,
            ..Self::new(start, end)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A contiguous span of free time. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FreeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl FreeInterval {
    /// `None` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Free gaps inside `[window_start, window_end)` that last at least `min_duration`.
///
/// All-day events and events that are empty after clipping to the window are
/// ignored. Overlapping or touching busy blocks are merged before gaps are
/// measured. A non-positive `min_duration` admits every positive-width gap.
pub fn find_free_slots(
    busy_events: &[BusyEvent],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_duration: Duration,
) -> Vec<FreeInterval> {
    if window_start >= window_end {
        return Vec::new();
    }

    let mut busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = busy_events
        .iter()
        .filter(|e| !e.all_day)
        .filter(|e| e.end > window_start && e.start < window_end)
        .map(|e| (e.start.max(window_start), e.end.min(window_end)))
        .filter(|(s, e)| s < e)
        .collect();
    busy.sort_by_key(|(s, _)| *s);

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::with_capacity(busy.len());
    for (start, end) in busy {
        match merged.last_mut() {
            // Touching blocks merge; no zero-width gap between them.
            Some((_, last_end)) if start <= *last_end => {
                if end > *last_end {
                    *last_end = end;
                }
            }
            _ => merged.push((start, end)),
        }
    }

    let long_enough = |gap: &FreeInterval| gap.duration() >= min_duration;
    let mut free = Vec::new();
    let mut cursor = window_start;
    for (block_start, block_end) in merged {
        if let Some(gap) = FreeInterval::new(cursor, block_start).filter(long_enough) {
            free.push(gap);
        }
        cursor = cursor.max(block_end);
    }
    if let Some(gap) = FreeInterval::new(cursor, window_end).filter(long_enough) {
        free.push(gap);
    }
    free
}
