//! handlers/recipient_handler.rs
use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::{
    errors::LookupError,
    handlers::error_response,
    models::{preference_model::UpdatePreferencesRequest, recipient_model::CreateRecipientRequest},
    services::{preference_service::PreferenceService, recipient_service::RecipientService},
};

/// POST /api/recipients
pub async fn create_recipient_endpoint(
    recipient_service: web::Data<RecipientService>,
    body: web::Json<CreateRecipientRequest>,
) -> HttpResponse {
    match recipient_service
        .add_recipient(body.into_inner(), Utc::now())
        .await
    {
        Ok(recipient) => HttpResponse::Created().json(recipient),
        Err(e) => error_response(&e),
    }
}

/// GET /api/recipients
pub async fn list_recipients_endpoint(
    recipient_service: web::Data<RecipientService>,
) -> HttpResponse {
    match recipient_service.list_recipients().await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => error_response(&e),
    }
}

/// GET /api/recipients/{id}
pub async fn get_recipient_endpoint(
    recipient_service: web::Data<RecipientService>,
    path: web::Path<String>,
) -> HttpResponse {
    let recipient_id = path.into_inner();

    match recipient_service.get_recipient(&recipient_id).await {
        Ok(Some(recipient)) => HttpResponse::Ok().json(recipient),
        Ok(None) => error_response(&LookupError::new("recipient", recipient_id).into()),
        Err(e) => error_response(&e),
    }
}

/// GET /api/recipients/{id}/preferences
///
/// Un destinatario conocido sin preferencias recibe (y persiste) las de por defecto.
pub async fn get_preferences_endpoint(
    recipient_service: web::Data<RecipientService>,
    preference_service: web::Data<PreferenceService>,
    path: web::Path<String>,
) -> HttpResponse {
    let recipient_id = path.into_inner();

    match recipient_service.get_recipient(&recipient_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(&LookupError::new("recipient", recipient_id).into()),
        Err(e) => return error_response(&e),
    }

    match preference_service
        .get_or_create_default(&recipient_id, Utc::now())
        .await
    {
        Ok(pref) => HttpResponse::Ok().json(pref),
        Err(e) => error_response(&e),
    }
}

/// PUT /api/recipients/{id}/preferences
pub async fn update_preferences_endpoint(
    recipient_service: web::Data<RecipientService>,
    preference_service: web::Data<PreferenceService>,
    path: web::Path<String>,
    body: web::Json<UpdatePreferencesRequest>,
) -> HttpResponse {
    let recipient_id = path.into_inner();

    match recipient_service.get_recipient(&recipient_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(&LookupError::new("recipient", recipient_id).into()),
        Err(e) => return error_response(&e),
    }

    match preference_service
        .update_preferences(&recipient_id, body.into_inner(), Utc::now())
        .await
    {
        Ok(pref) => HttpResponse::Ok().json(pref),
        Err(e) => error_response(&e),
    }
}
