//! handlers/schedule_handler.rs
use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::{
    handlers::error_response, models::schedule_model::ScheduleRequest,
    services::scheduling_service::SchedulingService,
};

/// POST /api/schedules
pub async fn optimal_schedule_endpoint(
    scheduling_service: web::Data<SchedulingService>,
    body: web::Json<ScheduleRequest>,
) -> HttpResponse {
    match scheduling_service
        .get_optimal_schedule(&body.into_inner(), Utc::now())
        .await
    {
        Ok(schedule) => HttpResponse::Ok().json(schedule),
        Err(e) => error_response(&e),
    }
}

/// GET /api/schedules/{campaign_id}
pub async fn list_schedule_endpoint(
    scheduling_service: web::Data<SchedulingService>,
    path: web::Path<String>,
) -> HttpResponse {
    match scheduling_service.list_schedule(&path.into_inner()).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => error_response(&e),
    }
}
