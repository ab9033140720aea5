//! models/channel_model.rs
//! Canales de distribución y su configuración tipada.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelType {
    Email,
    Slack,
    Sms,
    #[serde(alias = "api")]
    ApiWebhook,
}

impl ChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelType::Email => "email",
            ChannelType::Slack => "slack",
            ChannelType::Sms => "sms",
            ChannelType::ApiWebhook => "api-webhook",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Config SMTP de un canal de email (STARTTLS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailChannelConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_name: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel_type", rename_all = "kebab-case")]
pub enum ChannelConfig {
    Email(EmailChannelConfig),
    Slack {
        #[serde(default)]
        workspace: Option<String>,
    },
    Sms {
        #[serde(default)]
        provider: Option<String>,
        #[serde(default)]
        from_number: Option<String>,
    },
    ApiWebhook {
        #[serde(default)]
        url: Option<String>,
    },
}

impl ChannelConfig {
    pub fn channel_type(&self) -> ChannelType {
        match self {
            ChannelConfig::Email(_) => ChannelType::Email,
            ChannelConfig::Slack { .. } => ChannelType::Slack,
            ChannelConfig::Sms { .. } => ChannelType::Sms,
            ChannelConfig::ApiWebhook { .. } => ChannelType::ApiWebhook,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionChannel {
    pub id: String,
    pub name: String,
    pub config: ChannelConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DistributionChannel {
    pub fn channel_type(&self) -> ChannelType {
        self.config.channel_type()
    }

    /// Copia sin la contraseña SMTP, para respuestas HTTP.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let ChannelConfig::Email(cfg) = &mut copy.config {
            if cfg.password.is_some() {
                cfg.password = Some("********".to_string());
            }
        }
        copy
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
    pub config: ChannelConfig,
}
