//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod calendar_model;
pub mod campaign_model;
pub mod channel_model;
pub mod preference_model;
pub mod recipient_model;
pub mod schedule_model;
pub mod update_model;
