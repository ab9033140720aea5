//! services/delivery_service.rs
//! Entrega de una actualización a un destinatario por un canal concreto.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use crate::{
    errors::DeliveryFailure,
    models::{
        channel_model::{ChannelConfig, DistributionChannel},
        recipient_model::Recipient,
        update_model::UpdateContent,
    },
    services::email_service::EmailService,
};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct DeliveryService {
    email_service: EmailService,
    http_client: Client,
}

impl DeliveryService {
    pub fn new(email_service: EmailService, http_client: Client) -> Self {
        Self {
            email_service,
            http_client,
        }
    }

    /// Devuelve un mensaje descriptivo en caso de éxito.
    pub async fn send_to_recipient(
        &self,
        channel: &DistributionChannel,
        recipient: &Recipient,
        update_id: &str,
        content: &UpdateContent,
    ) -> Result<String, DeliveryFailure> {
        match &channel.config {
            ChannelConfig::Email(config) => {
                self.email_service
                    .send_update_email(config, recipient, content)
                    .await?;
                Ok(format!("Email sent to {}", recipient.email))
            }
            ChannelConfig::Slack { .. } => {
                // TODO: publicar vía Slack Web API cuando exista un token por workspace
                log::info!("(delivery) Slack update for {} (stub)", recipient.name);
                Ok(format!("Slack update recorded for {}", recipient.name))
            }
            ChannelConfig::Sms { provider, .. } => {
                log::info!(
                    "(delivery) SMS update for {} via {} (stub)",
                    recipient.name,
                    provider.as_deref().unwrap_or("default provider")
                );
                Ok(format!("SMS update recorded for {}", recipient.name))
            }
            ChannelConfig::ApiWebhook { url } => {
                let target = recipient.webhook_url.as_deref().or(url.as_deref());
                match target {
                    Some(target) => self.post_webhook(target, recipient, update_id, content).await,
                    None => {
                        log::info!(
                            "(delivery) No webhook URL for {}, recording update (stub)",
                            recipient.name
                        );
                        Ok(format!("API update recorded for {}", recipient.name))
                    }
                }
            }
        }
    }

    async fn post_webhook(
        &self,
        url: &str,
        recipient: &Recipient,
        update_id: &str,
        content: &UpdateContent,
    ) -> Result<String, DeliveryFailure> {
        let payload = json!({
            "update_id": update_id,
            "recipient_id": recipient.id,
            "content": content,
        });

        let resp = self
            .http_client
            .post(url)
            .json(&payload)
            .timeout(WEBHOOK_TIMEOUT)
            .send()
            .await
            .map_err(|e| DeliveryFailure::delivery(format!("Webhook POST to {url} failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            log::info!("(delivery) Webhook {} accepted update {}", url, update_id);
            Ok(format!("Webhook {url} returned {status}"))
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(DeliveryFailure::delivery(format!(
                "Webhook {url} returned {status}: {body}"
            )))
        }
    }
}
