//! services/update_service.rs
//! Persistencia y ciclo de vida de los registros de actualización.
//! Cada transición escribe estado + fila de auditoría en una sola transacción.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite, Transaction};
use uuid::Uuid;

use crate::{
    db::{format_ts, parse_opt_ts, parse_ts},
    errors::{LookupError, ValidationError},
    models::update_model::{
        CreateUpdateRequest, UpdateContent, UpdateLogEntry, UpdateRecord, UpdateStatus,
    },
    services::event_bus::{EventBus, UpdateEvent},
};

const UPDATE_COLUMNS: &str = "id, campaign_id, update_type, content, recipients, channel_id, \
     status, scheduled_time, sent_time, retry_count, last_error, delivered_to, created_at, updated_at";

/// Fila cruda; el contenido JSON se resuelve aparte para poder
/// distinguir "contenido ilegible" de un error de almacenamiento.
#[derive(Debug, Clone, FromRow)]
pub struct UpdateRow {
    pub id: String,
    pub campaign_id: String,
    pub update_type: String,
    pub content: String,
    pub recipients: String,
    pub channel_id: Option<String>,
    pub status: String,
    pub scheduled_time: Option<String>,
    pub sent_time: Option<String>,
    pub retry_count: i64,
    pub last_error: Option<String>,
    pub delivered_to: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UpdateRow {
    pub fn parse_content(&self) -> Result<UpdateContent> {
        serde_json::from_str(&self.content)
            .with_context(|| format!("Unreadable content for update {}", self.id))
    }

    pub fn parse_recipients(&self) -> Result<Vec<String>> {
        serde_json::from_str(&self.recipients)
            .with_context(|| format!("Unreadable recipient list for update {}", self.id))
    }

    /// Destinatarios ya entregados en intentos anteriores.
    pub fn parse_delivered(&self) -> Result<Vec<String>> {
        serde_json::from_str(&self.delivered_to)
            .with_context(|| format!("Unreadable delivery list for update {}", self.id))
    }

    pub fn retry_count(&self) -> u32 {
        u32::try_from(self.retry_count).unwrap_or(0)
    }

    pub fn into_record(self) -> Result<UpdateRecord> {
        Ok(UpdateRecord {
            content: self.parse_content()?,
            recipients: self.parse_recipients()?,
            status: self.status.parse()?,
            scheduled_time: parse_opt_ts(self.scheduled_time.as_deref())?,
            sent_time: parse_opt_ts(self.sent_time.as_deref())?,
            retry_count: self.retry_count(),
            delivered_to: self.parse_delivered()?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            id: self.id,
            campaign_id: self.campaign_id,
            update_type: self.update_type,
            channel_id: self.channel_id,
            last_error: self.last_error,
        })
    }
}

#[derive(Debug, FromRow)]
struct LogRow {
    id: String,
    update_id: String,
    status: String,
    message: String,
    created_at: String,
}

#[derive(Clone, Debug)]
pub struct UpdateService {
    db_pool: Pool<Sqlite>,
    events: EventBus,
}

impl UpdateService {
    pub fn new(db_pool: Pool<Sqlite>, events: EventBus) -> Self {
        Self { db_pool, events }
    }

    /// Crea el registro en "scheduled" si trae hora, si no en "pending".
    pub async fn create_update(
        &self,
        req: CreateUpdateRequest,
        now: DateTime<Utc>,
    ) -> Result<UpdateRecord> {
        if req.recipients.is_empty() {
            return Err(ValidationError::NoRecipients.into());
        }

        let status = if req.scheduled_time.is_some() {
            UpdateStatus::Scheduled
        } else {
            UpdateStatus::Pending
        };

        let record = UpdateRecord {
            id: Uuid::new_v4().to_string(),
            campaign_id: req.campaign_id,
            update_type: req.update_type,
            content: req.content,
            recipients: req.recipients,
            channel_id: req.channel_id,
            status,
            scheduled_time: req.scheduled_time,
            sent_time: None,
            retry_count: 0,
            last_error: None,
            delivered_to: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO updates (
                id, campaign_id, update_type, content, recipients, channel_id,
                status, scheduled_time, sent_time, retry_count, last_error,
                lease_until, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, 0, NULL, NULL, ?9, ?9)
            "#,
        )
        .bind(&record.id)
        .bind(&record.campaign_id)
        .bind(&record.update_type)
        .bind(serde_json::to_string(&record.content)?)
        .bind(serde_json::to_string(&record.recipients)?)
        .bind(&record.channel_id)
        .bind(record.status.as_str())
        .bind(record.scheduled_time.as_ref().map(format_ts))
        .bind(format_ts(&now))
        .execute(&self.db_pool)
        .await
        .context("Failed to insert update record")?;

        log::info!(
            "(updates) Created update {} for campaign {} ({})",
            record.id,
            record.campaign_id,
            record.status
        );
        self.events.publish(UpdateEvent::UpdateCreated {
            update_id: record.id.clone(),
            campaign_id: record.campaign_id.clone(),
            scheduled_time: record.scheduled_time,
        });

        Ok(record)
    }

    pub async fn get_update(&self, update_id: &str) -> Result<UpdateRecord> {
        self.get_row(update_id).await?.into_record()
    }

    pub async fn get_row(&self, update_id: &str) -> Result<UpdateRow> {
        let sql = format!("SELECT {UPDATE_COLUMNS} FROM updates WHERE id = ?1");
        sqlx::query_as::<_, UpdateRow>(&sql)
            .bind(update_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to load update")?
            .ok_or_else(|| LookupError::new("update", update_id).into())
    }

    pub async fn list_updates(
        &self,
        status: Option<UpdateStatus>,
        campaign_id: Option<&str>,
    ) -> Result<Vec<UpdateRecord>> {
        let sql = format!(
            r#"
            SELECT {UPDATE_COLUMNS} FROM updates
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR campaign_id = ?2)
            ORDER BY created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, UpdateRow>(&sql)
            .bind(status.map(|s| s.as_str()))
            .bind(campaign_id)
            .fetch_all(&self.db_pool)
            .await
            .context("Failed to list updates")?;

        rows.into_iter().map(UpdateRow::into_record).collect()
    }

    pub async fn list_logs(&self, update_id: &str) -> Result<Vec<UpdateLogEntry>> {
        let rows = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, update_id, status, message, created_at
            FROM update_logs
            WHERE update_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(update_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to list update logs")?;

        rows.into_iter()
            .map(|r| {
                Ok(UpdateLogEntry {
                    created_at: parse_ts(&r.created_at)?,
                    id: r.id,
                    update_id: r.update_id,
                    status: r.status,
                    message: r.message,
                })
            })
            .collect()
    }

    /// Registros pendientes/programados cuya hora ya pasó, el más antiguo primero.
    /// Los "pending" sin hora cuentan como vencidos desde su creación.
    pub async fn fetch_due(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<UpdateRow>> {
        let sql = format!(
            r#"
            SELECT {UPDATE_COLUMNS} FROM updates
            WHERE status IN ('pending', 'scheduled')
              AND COALESCE(scheduled_time, created_at) <= ?1
              AND (lease_until IS NULL OR lease_until <= ?1)
            ORDER BY COALESCE(scheduled_time, created_at) ASC
            LIMIT ?2
            "#
        );
        let rows = sqlx::query_as::<_, UpdateRow>(&sql)
            .bind(format_ts(&now))
            .bind(i64::from(limit))
            .fetch_all(&self.db_pool)
            .await
            .context("Failed to select due updates")?;
        Ok(rows)
    }

    /// Toma el lease del registro. Solo un llamador gana.
    pub async fn claim(
        &self,
        update_id: &str,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE updates
            SET lease_until = ?1
            WHERE id = ?2
              AND status IN ('pending', 'scheduled')
              AND (lease_until IS NULL OR lease_until <= ?3)
            "#,
        )
        .bind(format_ts(&lease_until))
        .bind(update_id)
        .bind(format_ts(&now))
        .execute(&self.db_pool)
        .await
        .context("Failed to claim update")?;

        Ok(result.rows_affected() == 1)
    }

    /// Persiste la lista de entregados tras cada envío exitoso, para que un
    /// reintento no repita a quien ya lo recibió.
    pub async fn record_delivery(
        &self,
        update_id: &str,
        delivered_to: &[String],
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE updates
            SET delivered_to = ?1, updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(serde_json::to_string(delivered_to)?)
        .bind(format_ts(&now))
        .bind(update_id)
        .execute(&self.db_pool)
        .await
        .context("Failed to record delivery")?;
        Ok(())
    }

    pub async fn mark_sent(&self, update_id: &str, now: DateTime<Utc>, message: &str) -> Result<()> {
        let mut tx = self.db_pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE updates
            SET status = 'sent', sent_time = ?1, last_error = NULL,
                lease_until = NULL, updated_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(format_ts(&now))
        .bind(update_id)
        .execute(&mut *tx)
        .await
        .context("Failed to mark update as sent")?;
        append_log(&mut tx, update_id, UpdateStatus::Sent.as_str(), message, now).await?;
        tx.commit().await?;

        log::info!("(updates) Update {} sent: {}", update_id, message);
        self.events.publish(UpdateEvent::UpdateSent {
            update_id: update_id.to_string(),
            sent_time: now,
        });
        Ok(())
    }

    /// Fallo permanente. `scheduled_time` no se toca.
    pub async fn mark_failed(
        &self,
        update_id: &str,
        now: DateTime<Utc>,
        retry_count: u32,
        message: &str,
    ) -> Result<()> {
        let mut tx = self.db_pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE updates
            SET status = 'failed', retry_count = ?1, last_error = ?2,
                lease_until = NULL, updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(i64::from(retry_count))
        .bind(message)
        .bind(format_ts(&now))
        .bind(update_id)
        .execute(&mut *tx)
        .await
        .context("Failed to mark update as failed")?;
        append_log(&mut tx, update_id, UpdateStatus::Failed.as_str(), message, now).await?;
        tx.commit().await?;

        log::error!("(updates) Update {} failed permanently: {}", update_id, message);
        self.events.publish(UpdateEvent::UpdateFailed {
            update_id: update_id.to_string(),
            reason: message.to_string(),
        });
        Ok(())
    }

    /// Reprograma tras un fallo transitorio; el registro sigue "scheduled".
    pub async fn reschedule(
        &self,
        update_id: &str,
        now: DateTime<Utc>,
        retry_count: u32,
        next_attempt: DateTime<Utc>,
        message: &str,
    ) -> Result<()> {
        let mut tx = self.db_pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE updates
            SET status = 'scheduled', retry_count = ?1, scheduled_time = ?2,
                last_error = ?3, lease_until = NULL, updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(i64::from(retry_count))
        .bind(format_ts(&next_attempt))
        .bind(message)
        .bind(format_ts(&now))
        .bind(update_id)
        .execute(&mut *tx)
        .await
        .context("Failed to reschedule update")?;
        append_log(
            &mut tx,
            update_id,
            "retry_scheduled",
            &format!("Scheduled for retry at {}: {}", format_ts(&next_attempt), message),
            now,
        )
        .await?;
        tx.commit().await?;

        log::warn!(
            "(updates) Update {} retry #{} at {}: {}",
            update_id,
            retry_count,
            next_attempt,
            message
        );
        self.events.publish(UpdateEvent::RetryScheduled {
            update_id: update_id.to_string(),
            retry_count,
            next_attempt,
        });
        Ok(())
    }
}

async fn append_log(
    tx: &mut Transaction<'_, Sqlite>,
    update_id: &str,
    status: &str,
    message: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO update_logs (id, update_id, status, message, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(update_id)
    .bind(status)
    .bind(message)
    .bind(format_ts(&now))
    .execute(&mut **tx)
    .await
    .context("Failed to append update log")?;
    Ok(())
}
