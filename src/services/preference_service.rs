//! services/preference_service.rs
//! Acceso a `recipient_preferences`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc, Weekday};
use sqlx::{FromRow, Pool, Sqlite};

use crate::{
    db::{format_ts, parse_opt_ts, parse_ts},
    models::preference_model::{
        normalize_weekdays, parse_time_of_day, parse_weekday, weekday_name, RecipientPreference,
        UpdatePreferencesRequest, DEFAULT_PREFERRED_DAYS,
    },
};

#[derive(Debug, FromRow)]
struct PreferenceRow {
    recipient_id: String,
    preferred_time: String,
    preferred_days: String,
    preferred_frequency: String,
    engagement_score: f64,
    last_contact: Option<String>,
    updated_at: String,
}

impl PreferenceRow {
    fn into_preference(self) -> Result<RecipientPreference> {
        let preferred_time = parse_time_of_day(&self.preferred_time).with_context(|| {
            format!(
                "Invalid preferred_time '{}' for recipient {}",
                self.preferred_time, self.recipient_id
            )
        })?;
        let day_names: Vec<String> = serde_json::from_str(&self.preferred_days)
            .with_context(|| format!("Invalid preferred_days for {}", self.recipient_id))?;
        // Nombres desconocidos se ignoran; si no queda ninguno, los días por defecto.
        let mut preferred_days: Vec<Weekday> =
            day_names.iter().filter_map(|n| parse_weekday(n)).collect();
        if preferred_days.is_empty() {
            log::warn!(
                "(preferences) No valid preferred_days {:?} for recipient {}, using defaults",
                day_names,
                self.recipient_id
            );
            preferred_days = DEFAULT_PREFERRED_DAYS.to_vec();
        }
        normalize_weekdays(&mut preferred_days);

        Ok(RecipientPreference {
            recipient_id: self.recipient_id,
            preferred_time,
            preferred_days,
            frequency: self.preferred_frequency.parse()?,
            engagement_score: self.engagement_score,
            last_contact: parse_opt_ts(self.last_contact.as_deref())?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PreferenceService {
    db_pool: Pool<Sqlite>,
}

impl PreferenceService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        PreferenceService { db_pool }
    }

    pub async fn get_preferences(&self, recipient_id: &str) -> Result<Option<RecipientPreference>> {
        let row = sqlx::query_as::<_, PreferenceRow>(
            r#"
            SELECT recipient_id, preferred_time, preferred_days, preferred_frequency,
                   engagement_score, last_contact, updated_at
            FROM recipient_preferences
            WHERE recipient_id = ?1
            "#,
        )
        .bind(recipient_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Failed to load recipient preferences")?;

        row.map(PreferenceRow::into_preference).transpose()
    }

    /// Devuelve las preferencias guardadas o crea (y persiste) las de por defecto.
    /// Ojo: es una lectura con escritura como efecto secundario.
    pub async fn get_or_create_default(
        &self,
        recipient_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RecipientPreference> {
        if let Some(existing) = self.get_preferences(recipient_id).await? {
            return Ok(existing);
        }

        let defaults = RecipientPreference::defaults_for(recipient_id, now);
        self.save_preferences(&defaults).await?;
        log::info!(
            "(preferences) Stored default preferences for new recipient {}",
            recipient_id
        );
        Ok(defaults)
    }

    pub async fn save_preferences(&self, pref: &RecipientPreference) -> Result<()> {
        let day_names: Vec<&str> = pref.preferred_days.iter().map(|d| weekday_name(*d)).collect();
        let days_json = serde_json::to_string(&day_names)?;
        let last_contact = pref.last_contact.as_ref().map(format_ts);

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO recipient_preferences (
                recipient_id, preferred_time, preferred_days, preferred_frequency,
                engagement_score, last_contact, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&pref.recipient_id)
        .bind(pref.preferred_time.format("%H:%M").to_string())
        .bind(days_json)
        .bind(pref.frequency.as_str())
        .bind(pref.engagement_score)
        .bind(last_contact)
        .bind(format_ts(&pref.updated_at))
        .execute(&self.db_pool)
        .await
        .context("Failed to save recipient preferences")?;

        Ok(())
    }

    /// Aplica un cambio explícito; valida antes de escribir.
    pub async fn update_preferences(
        &self,
        recipient_id: &str,
        req: UpdatePreferencesRequest,
        now: DateTime<Utc>,
    ) -> Result<RecipientPreference> {
        let mut pref = match self.get_preferences(recipient_id).await? {
            Some(p) => p,
            None => RecipientPreference::defaults_for(recipient_id, now),
        };

        if let Some(time) = req.preferred_time {
            pref.preferred_time = time;
        }
        if let Some(days) = req.preferred_days {
            pref.preferred_days = days;
        }
        if let Some(frequency) = req.frequency {
            pref.frequency = frequency;
        }
        if let Some(score) = req.engagement_score {
            pref.engagement_score = score;
        }
        pref.updated_at = now;

        pref.validate()?;
        self.save_preferences(&pref).await?;
        Ok(pref)
    }
}
