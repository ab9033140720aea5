//! errors.rs
//! Errores tipados del dominio. El resto de la app usa `anyhow` con contexto.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("invalid scheduling window: earliest {earliest} is after latest {latest}")]
    InvalidRange {
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
}

/// Errores de validación de requests (HTTP 400).
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("preferred_days must not be empty")]
    EmptyWeekdays,
    #[error("engagement_score must be within [0, 1], got {0}")]
    EngagementOutOfRange(f64),
    #[error("event end_time must be after start_time")]
    EmptyInterval,
    #[error("recipient list must not be empty")]
    NoRecipients,
    #[error("{0}")]
    Invalid(String),
}

/// Búsqueda sin resultado (HTTP 404).
#[derive(Debug, Error)]
#[error("{entity} not found: {id}")]
pub struct LookupError {
    pub entity: &'static str,
    pub id: String,
}

impl LookupError {
    pub fn new(entity: &'static str, id: impl Into<String>) -> Self {
        Self {
            entity,
            id: id.into(),
        }
    }
}

/// Errores de configuración: fatales al arrancar.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sender email is required (--sender-email or SENDER_EMAIL)")]
    MissingSender,
    #[error("invalid sender email '{0}'")]
    InvalidSender(String),
    #[error("SMTP user and password must be given together")]
    IncompleteCredentials,
    #[error("SMTP port must be non-zero")]
    InvalidPort,
}

/// Clase de fallo de un intento de entrega.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ContentNotFound,
    ChannelNotFound,
    RecipientNotFound,
    Delivery,
    Processing,
}

impl FailureKind {
    /// Solo los errores de transporte se reintentan.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Delivery)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::ContentNotFound => "content_not_found",
            FailureKind::ChannelNotFound => "channel_not_found",
            FailureKind::RecipientNotFound => "recipient_not_found",
            FailureKind::Delivery => "delivery_error",
            FailureKind::Processing => "processing_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fallo de entrega. `retryable` se decide una sola vez, al construirlo.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct DeliveryFailure {
    pub kind: FailureKind,
    pub retryable: bool,
    pub message: String,
}

impl DeliveryFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            retryable: kind.is_retryable(),
            message: message.into(),
        }
    }

    pub fn content_not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ContentNotFound, message)
    }

    pub fn channel_not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ChannelNotFound, message)
    }

    pub fn recipient_not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RecipientNotFound, message)
    }

    pub fn delivery(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Delivery, message)
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Processing, message)
    }
}
