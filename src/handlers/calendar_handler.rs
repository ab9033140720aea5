//! handlers/calendar_handler.rs
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    handlers::error_response, models::calendar_model::CreateCalendarEventRequest,
    services::calendar_service::CalendarService,
};

#[derive(Deserialize)]
pub struct EventRangeQuery {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

/// POST /api/calendar/events
pub async fn create_event_endpoint(
    calendar_service: web::Data<CalendarService>,
    body: web::Json<CreateCalendarEventRequest>,
) -> HttpResponse {
    match calendar_service.add_event(body.into_inner()).await {
        Ok(event) => HttpResponse::Created().json(event),
        Err(e) => error_response(&e),
    }
}

/// GET /api/calendar/events?start=..&end=..
pub async fn list_events_endpoint(
    calendar_service: web::Data<CalendarService>,
    query: web::Query<EventRangeQuery>,
) -> HttpResponse {
    match calendar_service.list_events(query.start, query.end).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => error_response(&e),
    }
}
