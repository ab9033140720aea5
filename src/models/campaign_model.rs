//! models/campaign_model.rs
//! Eventos de campaña que generan actualizaciones automáticas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum CampaignEvent {
    /// Campaña nueva: se avisa con una actualización "notification"
    CampaignCreated {
        name: Option<String>,
        description: Option<String>,
    },
    /// Engagement anómalo: actualización "alert"
    HighEngagement {
        content_id: Option<String>,
        #[serde(default)]
        metrics: BTreeMap<String, f64>,
    },
}

impl CampaignEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignEvent::CampaignCreated { .. } => "campaign_created",
            CampaignEvent::HighEngagement { .. } => "high_engagement",
        }
    }

    pub fn update_type(&self) -> &'static str {
        match self {
            CampaignEvent::CampaignCreated { .. } => "notification",
            CampaignEvent::HighEngagement { .. } => "alert",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignEventRequest {
    pub event: CampaignEvent,
    /// Sin lista explícita se usan los destinatarios programados de la campaña
    pub recipients: Option<Vec<String>>,
    pub channel_id: Option<String>,
}
