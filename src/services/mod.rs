//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod calendar_service;
pub mod campaign_service;
pub mod channel_service;
pub mod delivery_service;
pub mod dispatcher;
pub mod email_service;
pub mod event_bus;
pub mod preference_service;
pub mod recipient_service;
pub mod scheduling_service;
pub mod time_selector;
pub mod update_service;
