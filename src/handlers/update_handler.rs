//! handlers/update_handler.rs
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    handlers::error_response,
    models::update_model::{
        CreateUpdateRequest, DispatchRequest, DispatchResponse, PlanUpdateRequest, UpdateStatus,
    },
    services::{
        dispatcher::{Dispatcher, DEFAULT_DISPATCH_LIMIT},
        scheduling_service::SchedulingService,
        update_service::UpdateService,
    },
};

#[derive(Deserialize)]
pub struct UpdateFilterQuery {
    status: Option<UpdateStatus>,
    campaign_id: Option<String>,
}

/// POST /api/updates
pub async fn create_update_endpoint(
    update_service: web::Data<UpdateService>,
    body: web::Json<CreateUpdateRequest>,
) -> HttpResponse {
    match update_service
        .create_update(body.into_inner(), Utc::now())
        .await
    {
        Ok(record) => HttpResponse::Created().json(record),
        Err(e) => error_response(&e),
    }
}

/// GET /api/updates?status=..&campaign_id=..
pub async fn list_updates_endpoint(
    update_service: web::Data<UpdateService>,
    query: web::Query<UpdateFilterQuery>,
) -> HttpResponse {
    let query = query.into_inner();

    match update_service
        .list_updates(query.status, query.campaign_id.as_deref())
        .await
    {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => error_response(&e),
    }
}

/// GET /api/updates/{id}
pub async fn get_update_endpoint(
    update_service: web::Data<UpdateService>,
    path: web::Path<String>,
) -> HttpResponse {
    match update_service.get_update(&path.into_inner()).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => error_response(&e),
    }
}

/// GET /api/updates/{id}/logs
pub async fn update_logs_endpoint(
    update_service: web::Data<UpdateService>,
    path: web::Path<String>,
) -> HttpResponse {
    let update_id = path.into_inner();

    // 404 si el registro no existe, en vez de una lista vacía
    if let Err(e) = update_service.get_row(&update_id).await {
        return error_response(&e);
    }

    match update_service.list_logs(&update_id).await {
        Ok(logs) => HttpResponse::Ok().json(logs),
        Err(e) => error_response(&e),
    }
}

/// POST /api/updates/plan
pub async fn plan_update_endpoint(
    scheduling_service: web::Data<SchedulingService>,
    body: web::Json<PlanUpdateRequest>,
) -> HttpResponse {
    match scheduling_service
        .plan_update(body.into_inner(), Utc::now())
        .await
    {
        Ok(plan) => HttpResponse::Ok().json(plan),
        Err(e) => error_response(&e),
    }
}

/// POST /api/updates/{id}/send
pub async fn send_update_endpoint(
    dispatcher: web::Data<Dispatcher>,
    path: web::Path<String>,
) -> HttpResponse {
    let update_id = path.into_inner();

    match dispatcher.dispatch_update(&update_id, Utc::now()).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({
            "success": true,
            "update_id": update_id,
            "result": outcome
        })),
        Err(e) => error_response(&e),
    }
}

/// POST /api/dispatch
pub async fn dispatch_endpoint(
    dispatcher: web::Data<Dispatcher>,
    body: Option<web::Json<DispatchRequest>>,
) -> HttpResponse {
    let limit = body
        .and_then(|b| b.into_inner().limit)
        .unwrap_or(DEFAULT_DISPATCH_LIMIT);

    match dispatcher.process_due(limit).await {
        Ok(processed) => HttpResponse::Ok().json(DispatchResponse { processed }),
        Err(e) => error_response(&e),
    }
}
