//! handlers/channel_handler.rs
use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::{
    handlers::error_response,
    models::channel_model::{CreateChannelRequest, DistributionChannel},
    services::channel_service::ChannelService,
};

/// POST /api/channels
pub async fn create_channel_endpoint(
    channel_service: web::Data<ChannelService>,
    body: web::Json<CreateChannelRequest>,
) -> HttpResponse {
    match channel_service
        .create_channel(body.into_inner(), Utc::now())
        .await
    {
        Ok(channel) => HttpResponse::Created().json(channel.redacted()),
        Err(e) => error_response(&e),
    }
}

/// GET /api/channels
pub async fn list_channels_endpoint(channel_service: web::Data<ChannelService>) -> HttpResponse {
    match channel_service.list_channels().await {
        Ok(list) => {
            let list: Vec<DistributionChannel> = list.iter().map(|c| c.redacted()).collect();
            HttpResponse::Ok().json(list)
        }
        Err(e) => error_response(&e),
    }
}
