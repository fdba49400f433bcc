//! Calendar collaborator and session booking.
//!
//! The scheduler never touches a concrete calendar API. Hosts implement
//! [`CalendarProvider`]; booking a session simply adds a busy block that later
//! [`super::find_free_slots`] calls observe.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::debug;

use super::{find_free_slots, BusyEvent, FreeInterval};

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar access denied")]
    AccessDenied,

    #[error("calendar unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Busy events overlapping `[start, end)`.
    async fn busy_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BusyEvent>, CalendarError>;

    async fn create_event(&self, event: BusyEvent) -> Result<(), CalendarError>;
}

/// Calendar held in memory.
#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    events: Mutex<Vec<BusyEvent>>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<BusyEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<BusyEvent>>, CalendarError> {
        self.events
            .lock()
            .map_err(|_| CalendarError::Unavailable("calendar lock poisoned".into()))
    }
}

#[async_trait]
impl CalendarProvider for InMemoryCalendar {
    async fn busy_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BusyEvent>, CalendarError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|e| e.end > start && e.start < end)
            .cloned()
            .collect())
    }

    async fn create_event(&self, event: BusyEvent) -> Result<(), CalendarError> {
        self.lock()?.push(event);
        Ok(())
    }
}

/// Book the earliest slot in the window that fits `duration`.
///
/// Returns the booked interval, or `None` when nothing fits.
pub async fn schedule_session(
    calendar: &dyn CalendarProvider,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    duration: Duration,
    title: &str,
) -> Result<Option<FreeInterval>, CalendarError> {
    let busy = calendar.busy_events(window_start, window_end).await?;
    let Some(slot) = find_free_slots(&busy, window_start, window_end, duration)
        .into_iter()
        .next()
    else {
        debug!(window_start = %window_start, window_end = %window_end, "no free slot for session");
        return Ok(None);
    };

    let booked = FreeInterval::new(slot.start(), slot.start() + duration).unwrap_or(slot);
    calendar
        .create_event(BusyEvent::new(booked.start(), booked.end()).with_title(title))
        .await?;
    debug!(start = %booked.start(), end = %booked.end(), "session booked");
    Ok(Some(booked))
}
