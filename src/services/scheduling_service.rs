//! services/scheduling_service.rs
//! Calcula la hora de envío por destinatario y la persiste; también
//! convierte un plan en registros de actualización programados.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::{
    db::{format_ts, parse_ts},
    errors::{SchedulingError, ValidationError},
    models::{
        schedule_model::{RecipientSlot, ScheduleEntry, ScheduleRequest, ScheduleResponse},
        update_model::{CreateUpdateRequest, PlanUpdateRequest, PlanUpdateResponse},
    },
    services::{
        calendar_service::CalendarService,
        event_bus::{EventBus, UpdateEvent},
        preference_service::PreferenceService,
        time_selector::select_time,
        update_service::UpdateService,
    },
};

/// Ventana por defecto cuando no se indica `latest_time`
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, FromRow)]
struct ScheduleRow {
    id: String,
    campaign_id: String,
    recipient_id: String,
    scheduled_time: String,
    content_type: String,
    status: String,
    created_at: String,
}

#[derive(Clone, Debug)]
pub struct SchedulingService {
    db_pool: Pool<Sqlite>,
    preference_service: PreferenceService,
    calendar_service: CalendarService,
    update_service: UpdateService,
    events: EventBus,
}

impl SchedulingService {
    pub fn new(
        db_pool: Pool<Sqlite>,
        preference_service: PreferenceService,
        calendar_service: CalendarService,
        update_service: UpdateService,
        events: EventBus,
    ) -> Self {
        Self {
            db_pool,
            preference_service,
            calendar_service,
            update_service,
            events,
        }
    }

    pub async fn get_optimal_schedule(
        &self,
        req: &ScheduleRequest,
        now: DateTime<Utc>,
    ) -> Result<ScheduleResponse> {
        let earliest = req.earliest_time.unwrap_or(now);
        let latest = req
            .latest_time
            .unwrap_or_else(|| earliest + Duration::days(DEFAULT_WINDOW_DAYS));
        if earliest > latest {
            return Err(SchedulingError::InvalidRange { earliest, latest }.into());
        }

        let conflicts = self
            .calendar_service
            .conflicts_in_window(earliest, latest)
            .await?;
        log::info!(
            "(scheduling) campaign={} recipients={} window=[{}, {}] conflicts={}",
            req.campaign_id,
            req.recipient_ids.len(),
            earliest,
            latest,
            conflicts.len()
        );

        let mut slots = Vec::with_capacity(req.recipient_ids.len());
        for recipient_id in &req.recipient_ids {
            let preferences = self
                .preference_service
                .get_or_create_default(recipient_id, now)
                .await?;
            let scheduled_time = select_time(&preferences, &conflicts, earliest, latest)?;
            if scheduled_time.is_none() {
                log::warn!(
                    "(scheduling) No free slot for recipient {} in campaign {}",
                    recipient_id,
                    req.campaign_id
                );
            }
            slots.push(RecipientSlot {
                recipient_id: recipient_id.clone(),
                scheduled_time,
            });
        }

        self.save_schedule(&req.campaign_id, &req.content_type, &slots, now)
            .await?;

        let scheduled = slots.iter().filter(|s| s.scheduled_time.is_some()).count();
        self.events.publish(UpdateEvent::ScheduleComputed {
            campaign_id: req.campaign_id.clone(),
            scheduled,
            unscheduled: slots.len() - scheduled,
        });

        Ok(ScheduleResponse {
            campaign_id: req.campaign_id.clone(),
            earliest_time: earliest,
            latest_time: latest,
            slots,
        })
    }

    /// Un registro "scheduled" por cada hora distinta; los destinatarios
    /// sin hueco se devuelven aparte.
    pub async fn plan_update(
        &self,
        req: PlanUpdateRequest,
        now: DateTime<Utc>,
    ) -> Result<PlanUpdateResponse> {
        if req.recipients.is_empty() {
            return Err(ValidationError::NoRecipients.into());
        }

        let schedule = self
            .get_optimal_schedule(
                &ScheduleRequest {
                    campaign_id: req.campaign_id.clone(),
                    recipient_ids: req.recipients.clone(),
                    content_type: req.update_type.clone(),
                    earliest_time: req.earliest_time,
                    latest_time: req.latest_time,
                },
                now,
            )
            .await?;

        let mut by_slot: BTreeMap<DateTime<Utc>, Vec<String>> = BTreeMap::new();
        let mut unscheduled = Vec::new();
        for slot in schedule.slots {
            match slot.scheduled_time {
                Some(time) => by_slot.entry(time).or_default().push(slot.recipient_id),
                None => unscheduled.push(slot.recipient_id),
            }
        }

        let mut updates = Vec::with_capacity(by_slot.len());
        for (time, recipients) in by_slot {
            let record = self
                .update_service
                .create_update(
                    CreateUpdateRequest {
                        campaign_id: req.campaign_id.clone(),
                        update_type: req.update_type.clone(),
                        content: req.content.clone(),
                        recipients,
                        channel_id: req.channel_id.clone(),
                        scheduled_time: Some(time),
                    },
                    now,
                )
                .await?;
            updates.push(record);
        }

        Ok(PlanUpdateResponse {
            updates,
            unscheduled,
        })
    }

    pub async fn list_schedule(&self, campaign_id: &str) -> Result<Vec<ScheduleEntry>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, campaign_id, recipient_id, scheduled_time, content_type, status, created_at
            FROM schedules
            WHERE campaign_id = ?1
            ORDER BY scheduled_time ASC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to list schedule")?;

        rows.into_iter()
            .map(|r| {
                Ok(ScheduleEntry {
                    scheduled_time: parse_ts(&r.scheduled_time)?,
                    created_at: parse_ts(&r.created_at)?,
                    id: r.id,
                    campaign_id: r.campaign_id,
                    recipient_id: r.recipient_id,
                    content_type: r.content_type,
                    status: r.status,
                })
            })
            .collect()
    }

    /// Destinatarios con algún horario guardado para la campaña, en orden de alta.
    pub async fn campaign_recipients(&self, campaign_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT recipient_id FROM schedules
            WHERE campaign_id = ?1
            GROUP BY recipient_id
            ORDER BY MIN(created_at) ASC, recipient_id ASC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to load campaign recipients")?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn save_schedule(
        &self,
        campaign_id: &str,
        content_type: &str,
        slots: &[RecipientSlot],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.db_pool.begin().await?;
        for slot in slots {
            let Some(time) = slot.scheduled_time else {
                continue;
            };
            sqlx::query(
                r#"
                INSERT INTO schedules (
                    id, campaign_id, recipient_id, scheduled_time,
                    content_type, status, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, 'scheduled', ?6, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(campaign_id)
            .bind(&slot.recipient_id)
            .bind(format_ts(&time))
            .bind(content_type)
            .bind(format_ts(&now))
            .execute(&mut *tx)
            .await
            .context("Failed to save schedule entry")?;
        }
        tx.commit().await?;
        Ok(())
    }
}
