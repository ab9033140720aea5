//! handlers/mod.rs
//! Módulo que agrupa los handlers HTTP (destinatarios, calendario, canales, envíos).

use actix_web::HttpResponse;
use serde_json::json;

use crate::errors::{LookupError, SchedulingError, ValidationError};

pub mod calendar_handler;
pub mod campaign_handler;
pub mod channel_handler;
pub mod recipient_handler;
pub mod schedule_handler;
pub mod update_handler;

/// 404 para búsquedas, 400 para validación, 500 para lo demás.
pub fn error_response(err: &anyhow::Error) -> HttpResponse {
    let body = json!({
        "success": false,
        "error": err.to_string()
    });

    if err.downcast_ref::<LookupError>().is_some() {
        HttpResponse::NotFound().json(body)
    } else if err.downcast_ref::<ValidationError>().is_some()
        || err.downcast_ref::<SchedulingError>().is_some()
    {
        HttpResponse::BadRequest().json(body)
    } else {
        log::error!("Request failed: {:#}", err);
        HttpResponse::InternalServerError().json(body)
    }
}
