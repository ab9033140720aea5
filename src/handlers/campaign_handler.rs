//! handlers/campaign_handler.rs
use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::{
    handlers::error_response, models::campaign_model::CampaignEventRequest,
    services::campaign_service::CampaignService,
};

/// POST /api/campaigns/{id}/events
pub async fn campaign_event_endpoint(
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
    body: web::Json<CampaignEventRequest>,
) -> HttpResponse {
    let campaign_id = path.into_inner();

    match campaign_service
        .process_campaign_event(&campaign_id, body.into_inner(), Utc::now())
        .await
    {
        Ok(record) => HttpResponse::Created().json(record),
        Err(e) => error_response(&e),
    }
}
