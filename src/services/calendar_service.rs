//! services/calendar_service.rs
//! Eventos de calendario que bloquean entregas.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::{
    db::{format_ts, parse_ts},
    errors::ValidationError,
    models::calendar_model::{CalendarEvent, ConflictInterval, CreateCalendarEventRequest},
};

#[derive(Debug, FromRow)]
struct CalendarEventRow {
    id: String,
    start_time: String,
    end_time: String,
    title: String,
    description: Option<String>,
}

impl CalendarEventRow {
    fn into_event(self) -> Result<CalendarEvent> {
        Ok(CalendarEvent {
            id: self.id,
            start_time: parse_ts(&self.start_time)?,
            end_time: parse_ts(&self.end_time)?,
            title: self.title,
            description: self.description,
        })
    }
}

#[derive(Clone, Debug)]
pub struct CalendarService {
    db_pool: Pool<Sqlite>,
}

impl CalendarService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        CalendarService { db_pool }
    }

    pub async fn add_event(&self, req: CreateCalendarEventRequest) -> Result<CalendarEvent> {
        if req.end_time <= req.start_time {
            return Err(ValidationError::EmptyInterval.into());
        }

        let event = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            start_time: req.start_time,
            end_time: req.end_time,
            title: req.title,
            description: req.description,
        };

        sqlx::query(
            r#"
            INSERT INTO calendar_events (id, start_time, end_time, title, description)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&event.id)
        .bind(format_ts(&event.start_time))
        .bind(format_ts(&event.end_time))
        .bind(&event.title)
        .bind(&event.description)
        .execute(&self.db_pool)
        .await
        .context("Failed to insert calendar event")?;

        log::info!(
            "(calendar) Added event {} [{} - {}]",
            event.id,
            event.start_time,
            event.end_time
        );
        Ok(event)
    }

    /// Eventos que solapan `[start, end)`; sin límites devuelve todos.
    pub async fn list_events(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>> {
        let rows = sqlx::query_as::<_, CalendarEventRow>(
            r#"
            SELECT id, start_time, end_time, title, description
            FROM calendar_events
            WHERE (?1 IS NULL OR end_time > ?1)
              AND (?2 IS NULL OR start_time < ?2)
            ORDER BY start_time ASC
            "#,
        )
        .bind(start.as_ref().map(format_ts))
        .bind(end.as_ref().map(format_ts))
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to list calendar events")?;

        rows.into_iter().map(CalendarEventRow::into_event).collect()
    }

    /// Conflictos que pueden afectar a entregas entre `earliest` y `latest`.
    /// Incluye eventos que envuelven la ventana entera.
    pub async fn conflicts_in_window(
        &self,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    ) -> Result<Vec<ConflictInterval>> {
        let slot_end = latest + crate::services::time_selector::delivery_window();
        let events = self.list_events(Some(earliest), Some(slot_end)).await?;
        Ok(events.iter().map(CalendarEvent::interval).collect())
    }
}
