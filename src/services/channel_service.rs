use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::{
    db::{format_ts, parse_ts},
    models::channel_model::{
        ChannelConfig, ChannelType, CreateChannelRequest, DistributionChannel, EmailChannelConfig,
    },
};

/// Nombre del canal de email que se sincroniza con la config de arranque
pub const DEFAULT_EMAIL_CHANNEL_NAME: &str = "Default Email Channel";

#[derive(Debug, FromRow)]
struct ChannelRow {
    id: String,
    name: String,
    config: String,
    created_at: String,
    updated_at: String,
}

impl ChannelRow {
    fn into_channel(self) -> Result<DistributionChannel> {
        let config: ChannelConfig = serde_json::from_str(&self.config)
            .with_context(|| format!("Invalid config for channel {}", self.id))?;
        Ok(DistributionChannel {
            id: self.id,
            name: self.name,
            config,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ChannelService {
    db_pool: Pool<Sqlite>,
}

impl ChannelService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        ChannelService { db_pool }
    }

    pub async fn create_channel(
        &self,
        req: CreateChannelRequest,
        now: DateTime<Utc>,
    ) -> Result<DistributionChannel> {
        let channel = DistributionChannel {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            config: req.config,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO distribution_channels (
                id, name, channel_type, config, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&channel.id)
        .bind(&channel.name)
        .bind(channel.channel_type().as_str())
        .bind(serde_json::to_string(&channel.config)?)
        .bind(format_ts(&now))
        .execute(&self.db_pool)
        .await
        .context("Error creating distribution channel")?;

        log::info!(
            "(channels) Created {} channel '{}' ({})",
            channel.channel_type(),
            channel.name,
            channel.id
        );
        Ok(channel)
    }

    pub async fn get_channel(&self, channel_id: &str) -> Result<Option<DistributionChannel>> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, name, config, created_at, updated_at
            FROM distribution_channels
            WHERE id = ?1
            "#,
        )
        .bind(channel_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Error loading distribution channel")?;

        row.map(ChannelRow::into_channel).transpose()
    }

    /// El canal más antiguo del tipo pedido.
    pub async fn default_channel(
        &self,
        channel_type: ChannelType,
    ) -> Result<Option<DistributionChannel>> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, name, config, created_at, updated_at
            FROM distribution_channels
            WHERE channel_type = ?1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(channel_type.as_str())
        .fetch_optional(&self.db_pool)
        .await
        .context("Error loading default channel")?;

        row.map(ChannelRow::into_channel).transpose()
    }

    pub async fn list_channels(&self) -> Result<Vec<DistributionChannel>> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, name, config, created_at, updated_at
            FROM distribution_channels
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        rows.into_iter().map(ChannelRow::into_channel).collect()
    }

    /// Crea o actualiza el canal de email por defecto con la config SMTP de arranque.
    pub async fn sync_default_email_channel(
        &self,
        config: EmailChannelConfig,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let config = ChannelConfig::Email(config);
        let config_json = serde_json::to_string(&config)?;

        let existing: Option<(String,)> = sqlx::query_as(
            r#"SELECT id FROM distribution_channels WHERE name = ?1 AND channel_type = 'email'"#,
        )
        .bind(DEFAULT_EMAIL_CHANNEL_NAME)
        .fetch_optional(&self.db_pool)
        .await?;

        match existing {
            Some((id,)) => {
                sqlx::query(
                    r#"UPDATE distribution_channels SET config = ?1, updated_at = ?2 WHERE id = ?3"#,
                )
                .bind(config_json)
                .bind(format_ts(&now))
                .bind(&id)
                .execute(&self.db_pool)
                .await
                .context("Error updating default email channel")?;
                log::info!("(channels) Default email channel {} refreshed from config", id);
                Ok(id)
            }
            None => {
                let channel = self
                    .create_channel(
                        CreateChannelRequest {
                            name: DEFAULT_EMAIL_CHANNEL_NAME.to_string(),
                            config,
                        },
                        now,
                    )
                    .await?;
                Ok(channel.id)
            }
        }
    }
}
