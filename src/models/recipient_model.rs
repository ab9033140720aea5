//! models/recipient_model.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::channel_model::ChannelType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    /// Canales que acepta el destinatario ("email" por defecto)
    pub channels: Vec<ChannelType>,
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Recipient {
    pub fn accepts(&self, channel: ChannelType) -> bool {
        self.channels.contains(&channel)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipientRequest {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub channels: Option<Vec<ChannelType>>,
    pub webhook_url: Option<String>,
}
