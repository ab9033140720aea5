//! models/schedule_model.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    pub campaign_id: String,
    pub recipient_ids: Vec<String>,
    pub content_type: String,
    pub earliest_time: Option<DateTime<Utc>>,
    pub latest_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientSlot {
    pub recipient_id: String,
    /// `None` = no hay hueco libre dentro de la ventana
    pub scheduled_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub campaign_id: String,
    pub earliest_time: DateTime<Utc>,
    pub latest_time: DateTime<Utc>,
    pub slots: Vec<RecipientSlot>,
}

impl ScheduleResponse {
    pub fn slot_for(&self, recipient_id: &str) -> Option<DateTime<Utc>> {
        self.slots
            .iter()
            .find(|s| s.recipient_id == recipient_id)
            .and_then(|s| s.scheduled_time)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub campaign_id: String,
    pub recipient_id: String,
    pub scheduled_time: DateTime<Utc>,
    pub content_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
