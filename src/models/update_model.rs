//! models/update_model.rs
//! Registros de actualización (contenido + destinatarios + estado).

use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Pending,
    Scheduled,
    Sent,
    Failed,
}

impl UpdateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateStatus::Pending => "pending",
            UpdateStatus::Scheduled => "scheduled",
            UpdateStatus::Sent => "sent",
            UpdateStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UpdateStatus::Pending),
            "scheduled" => Ok(UpdateStatus::Scheduled),
            "sent" => Ok(UpdateStatus::Sent),
            "failed" => Ok(UpdateStatus::Failed),
            other => Err(anyhow!("Unknown update status '{other}'")),
        }
    }
}

/// Contenido estructurado de una actualización.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateContent {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub id: String,
    pub campaign_id: String,
    pub update_type: String,
    pub content: UpdateContent,
    pub recipients: Vec<String>,
    pub channel_id: Option<String>,
    pub status: UpdateStatus,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub sent_time: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub last_error: Option<String>,
    /// Destinatarios que ya lo recibieron
    pub delivered_to: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUpdateRequest {
    pub campaign_id: String,
    pub update_type: String,
    pub content: UpdateContent,
    pub recipients: Vec<String>,
    pub channel_id: Option<String>,
    /// Si viene, el registro nace "scheduled"; si no, "pending"
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// Fila del log de auditoría (solo se agregan, nunca se borran)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLogEntry {
    pub id: String,
    pub update_id: String,
    pub status: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanUpdateRequest {
    pub campaign_id: String,
    pub update_type: String,
    pub content: UpdateContent,
    pub recipients: Vec<String>,
    pub channel_id: Option<String>,
    pub earliest_time: Option<DateTime<Utc>>,
    pub latest_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanUpdateResponse {
    pub updates: Vec<UpdateRecord>,
    /// Destinatarios sin hueco libre en la ventana; el llamador decide.
    pub unscheduled: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchRequest {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    pub processed: u32,
}
