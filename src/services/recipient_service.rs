//! services/recipient_service.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::{
    db::{format_ts, parse_ts},
    errors::ValidationError,
    models::{
        channel_model::ChannelType,
        recipient_model::{CreateRecipientRequest, Recipient},
    },
};

#[derive(Debug, FromRow)]
struct RecipientRow {
    id: String,
    name: String,
    email: String,
    role: Option<String>,
    channels: String,
    webhook_url: Option<String>,
    created_at: String,
}

impl RecipientRow {
    fn into_recipient(self) -> Result<Recipient> {
        let channels: Vec<ChannelType> = serde_json::from_str(&self.channels)
            .with_context(|| format!("Invalid channel list for recipient {}", self.id))?;
        Ok(Recipient {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            channels,
            webhook_url: self.webhook_url,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct RecipientService {
    db_pool: Pool<Sqlite>,
}

impl RecipientService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        RecipientService { db_pool }
    }

    pub async fn add_recipient(
        &self,
        req: CreateRecipientRequest,
        now: DateTime<Utc>,
    ) -> Result<Recipient> {
        if req.email.trim().is_empty() || !req.email.contains('@') {
            return Err(ValidationError::Invalid(format!("invalid email '{}'", req.email)).into());
        }

        let mut channels: Vec<ChannelType> = Vec::new();
        for channel in req.channels.unwrap_or_default() {
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
        if channels.is_empty() {
            channels.push(ChannelType::Email);
        }

        let recipient = Recipient {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            email: req.email.trim().to_string(),
            role: req.role,
            channels,
            webhook_url: req.webhook_url,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO recipients (id, name, email, role, channels, webhook_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&recipient.id)
        .bind(&recipient.name)
        .bind(&recipient.email)
        .bind(&recipient.role)
        .bind(serde_json::to_string(&recipient.channels)?)
        .bind(&recipient.webhook_url)
        .bind(format_ts(&recipient.created_at))
        .execute(&self.db_pool)
        .await
        .context("Failed to insert recipient")?;

        log::info!(
            "(recipients) Added recipient {} ({})",
            recipient.name,
            recipient.id
        );
        Ok(recipient)
    }

    pub async fn get_recipient(&self, recipient_id: &str) -> Result<Option<Recipient>> {
        let row = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT id, name, email, role, channels, webhook_url, created_at
            FROM recipients
            WHERE id = ?1
            "#,
        )
        .bind(recipient_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Failed to load recipient")?;

        row.map(RecipientRow::into_recipient).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Recipient>> {
        let row = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT id, name, email, role, channels, webhook_url, created_at
            FROM recipients
            WHERE email = ?1
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.db_pool)
        .await
        .context("Failed to look up recipient by email")?;

        row.map(RecipientRow::into_recipient).transpose()
    }

    pub async fn list_recipients(&self) -> Result<Vec<Recipient>> {
        let rows = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT id, name, email, role, channels, webhook_url, created_at
            FROM recipients
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to list recipients")?;

        rows.into_iter().map(RecipientRow::into_recipient).collect()
    }
}
