//! models/calendar_model.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intervalo ocupado `[start, end)`: ninguna entrega puede solaparlo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ConflictInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Solapamiento semiabierto con `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && self.start < end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
}

impl CalendarEvent {
    pub fn interval(&self) -> ConflictInterval {
        ConflictInterval::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCalendarEventRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
}
