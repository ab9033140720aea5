//! services/dispatcher.rs
//! Procesa registros vencidos: entrega, reintento con backoff exponencial o fallo.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    errors::DeliveryFailure,
    models::{
        channel_model::{ChannelType, DistributionChannel},
        update_model::UpdateStatus,
    },
    services::{
        channel_service::ChannelService, delivery_service::DeliveryService,
        recipient_service::RecipientService,
        update_service::{UpdateRow, UpdateService},
    },
};

/// Intentos fallidos transitorios antes de marcar "failed"
pub const MAX_RETRIES: u32 = 3;
pub const BASE_BACKOFF_MINUTES: i64 = 30;
/// Duración del lease de un intento
pub const LEASE_MINUTES: i64 = 10;
pub const DEFAULT_DISPATCH_LIMIT: u32 = 10;

/// 30 * 2^retry_count minutos
pub fn backoff_delay(retry_count: u32) -> Duration {
    Duration::minutes(BASE_BACKOFF_MINUTES.saturating_mul(1i64 << retry_count.min(30)))
}

/// Resultado de un intento sobre un registro.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent,
    Rescheduled { retry_count: u32, next_attempt: DateTime<Utc> },
    Failed { reason: String },
    /// Otro dispatcher tiene el lease o el registro ya no está activo
    Skipped,
}

/// Un fallo de entrega sigue el ciclo de reintentos; un error de
/// almacenamiento se propaga al llamador.
enum AttemptError {
    Failure(DeliveryFailure),
    Storage(anyhow::Error),
}

impl From<DeliveryFailure> for AttemptError {
    fn from(failure: DeliveryFailure) -> Self {
        AttemptError::Failure(failure)
    }
}

#[derive(Clone, Debug)]
pub struct Dispatcher {
    update_service: UpdateService,
    recipient_service: RecipientService,
    channel_service: ChannelService,
    delivery_service: DeliveryService,
}

impl Dispatcher {
    pub fn new(
        update_service: UpdateService,
        recipient_service: RecipientService,
        channel_service: ChannelService,
        delivery_service: DeliveryService,
    ) -> Self {
        Self {
            update_service,
            recipient_service,
            channel_service,
            delivery_service,
        }
    }

    pub async fn process_due(&self, limit: u32) -> Result<u32> {
        self.process_due_at(limit, Utc::now()).await
    }

    /// Devuelve cuántos registros quedaron "sent" en esta pasada.
    pub async fn process_due_at(&self, limit: u32, now: DateTime<Utc>) -> Result<u32> {
        let due = self.update_service.fetch_due(now, limit).await?;
        log::info!("(dispatcher) {} due update(s) at {}", due.len(), now);

        let mut processed = 0;
        for row in due {
            if self.dispatch_row(row, now).await? == DispatchOutcome::Sent {
                processed += 1;
            }
        }

        log::info!("(dispatcher) Processed {} update(s)", processed);
        Ok(processed)
    }

    /// Intenta un registro concreto ya mismo (p.ej. envío manual).
    pub async fn dispatch_update(&self, update_id: &str, now: DateTime<Utc>) -> Result<DispatchOutcome> {
        let row = self.update_service.get_row(update_id).await?;
        let status: UpdateStatus = row.status.parse()?;
        if !matches!(status, UpdateStatus::Pending | UpdateStatus::Scheduled) {
            log::info!(
                "(dispatcher) Update {} is already {}, nothing to do",
                update_id,
                status
            );
            return Ok(DispatchOutcome::Skipped);
        }
        self.dispatch_row(row, now).await
    }

    async fn dispatch_row(&self, row: UpdateRow, now: DateTime<Utc>) -> Result<DispatchOutcome> {
        let lease_until = now + Duration::minutes(LEASE_MINUTES);
        if !self.update_service.claim(&row.id, now, lease_until).await? {
            log::info!("(dispatcher) Update {} is leased elsewhere, skipping", row.id);
            return Ok(DispatchOutcome::Skipped);
        }

        match self.attempt(&row, now).await {
            Ok(message) => {
                self.update_service.mark_sent(&row.id, now, &message).await?;
                Ok(DispatchOutcome::Sent)
            }
            Err(AttemptError::Failure(failure)) => self.handle_failure(&row, failure, now).await,
            Err(AttemptError::Storage(e)) => {
                // El lease vence solo; el registro conserva su estado.
                log::error!("(dispatcher) Storage error on update {}: {:#}", row.id, e);
                Err(e)
            }
        }
    }

    async fn attempt(&self, row: &UpdateRow, now: DateTime<Utc>) -> Result<String, AttemptError> {
        let content = row.parse_content().map_err(|e| {
            DeliveryFailure::content_not_found(format!("update {}: {e:#}", row.id))
        })?;
        if content.title.trim().is_empty() {
            return Err(DeliveryFailure::content_not_found(format!(
                "update {} has no title",
                row.id
            ))
            .into());
        }
        let recipient_ids = row.parse_recipients().map_err(|e| {
            DeliveryFailure::content_not_found(format!("update {}: {e:#}", row.id))
        })?;
        let mut delivered = row
            .parse_delivered()
            .map_err(|e| DeliveryFailure::processing(format!("{e:#}")))?;
        let channel = self.resolve_channel(row.channel_id.as_deref()).await?;

        let mut delivered_now = 0;
        for recipient_id in &recipient_ids {
            if delivered.contains(recipient_id) {
                log::debug!(
                    "(dispatcher) update={} recipient={} already delivered",
                    row.id,
                    recipient_id
                );
                continue;
            }

            let recipient = self
                .recipient_service
                .get_recipient(recipient_id)
                .await
                .map_err(AttemptError::Storage)?
                .ok_or_else(|| {
                    DeliveryFailure::recipient_not_found(format!("recipient_id={recipient_id}"))
                })?;

            if !recipient.accepts(channel.channel_type()) {
                log::info!(
                    "(dispatcher) Recipient {} does not accept {}, skipping",
                    recipient.id,
                    channel.channel_type()
                );
                continue;
            }

            match self
                .delivery_service
                .send_to_recipient(&channel, &recipient, &row.id, &content)
                .await
            {
                Ok(msg) => {
                    log::info!("(dispatcher) update={} recipient={}: {}", row.id, recipient.id, msg);
                    delivered.push(recipient.id.clone());
                    delivered_now += 1;
                    self.update_service
                        .record_delivery(&row.id, &delivered, now)
                        .await
                        .map_err(AttemptError::Storage)?;
                }
                Err(failure) => {
                    log::error!(
                        "(dispatcher) update={} recipient={} {}",
                        row.id,
                        recipient.id,
                        failure
                    );
                    return Err(failure.into());
                }
            }
        }

        if delivered.is_empty() {
            return Err(DeliveryFailure::recipient_not_found(format!(
                "no eligible recipients for {} channel '{}'",
                channel.channel_type(),
                channel.name
            ))
            .into());
        }

        Ok(format!(
            "Delivered via {} '{}' to {}/{} recipient(s) ({} in this attempt)",
            channel.channel_type(),
            channel.name,
            delivered.len(),
            recipient_ids.len(),
            delivered_now
        ))
    }

    async fn resolve_channel(
        &self,
        channel_id: Option<&str>,
    ) -> Result<DistributionChannel, AttemptError> {
        let lookup = match channel_id {
            Some(id) => self.channel_service.get_channel(id).await,
            None => self.channel_service.default_channel(ChannelType::Email).await,
        };

        lookup.map_err(AttemptError::Storage)?.ok_or_else(|| {
            DeliveryFailure::channel_not_found(format!(
                "channel_id={}",
                channel_id.unwrap_or("<default email>")
            ))
            .into()
        })
    }

    async fn handle_failure(
        &self,
        row: &UpdateRow,
        failure: DeliveryFailure,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome> {
        if !failure.retryable {
            let reason = failure.to_string();
            self.update_service
                .mark_failed(&row.id, now, row.retry_count(), &reason)
                .await?;
            return Ok(DispatchOutcome::Failed { reason });
        }

        let retry_count = row.retry_count() + 1;
        if retry_count >= MAX_RETRIES {
            let reason = format!("Max retries exceeded: {failure}");
            self.update_service
                .mark_failed(&row.id, now, retry_count, &reason)
                .await?;
            return Ok(DispatchOutcome::Failed { reason });
        }

        let next_attempt = now + backoff_delay(retry_count);
        self.update_service
            .reschedule(&row.id, now, retry_count, next_attempt, &failure.to_string())
            .await?;
        Ok(DispatchOutcome::Rescheduled {
            retry_count,
            next_attempt,
        })
    }
}
