//! config/app_config.rs
//! Configuración de arranque: flags de CLI con respaldo en variables de entorno.

use std::path::PathBuf;

use clap::Args;

use crate::{errors::ConfigError, models::channel_model::EmailChannelConfig};

#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Archivo SQLite
    #[arg(long, env = "DB_PATH", default_value = "data/updates.db")]
    pub db_path: PathBuf,

    #[arg(long, env = "SMTP_SERVER", default_value = "smtp.gmail.com")]
    pub smtp_server: String,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    #[arg(long, env = "SENDER_NAME", default_value = "Campaign Updates")]
    pub sender_name: String,

    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    #[arg(long, env = "SMTP_PASS", hide_env_values = true)]
    pub smtp_pass: Option<String>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sender = self
            .sender_email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSender)?;
        if !sender.contains('@') {
            return Err(ConfigError::InvalidSender(sender.to_string()));
        }
        if self.smtp_port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.smtp_user.is_some() != self.smtp_pass.is_some() {
            return Err(ConfigError::IncompleteCredentials);
        }
        Ok(())
    }

    /// Config SMTP del canal de email por defecto; exige una config válida.
    pub fn email_channel_config(&self) -> Result<EmailChannelConfig, ConfigError> {
        self.validate()?;
        Ok(EmailChannelConfig {
            smtp_server: self.smtp_server.clone(),
            smtp_port: self.smtp_port,
            sender_email: self
                .sender_email
                .clone()
                .unwrap_or_default()
                .trim()
                .to_string(),
            sender_name: self.sender_name.clone(),
            username: self.smtp_user.clone(),
            password: self.smtp_pass.clone(),
        })
    }
}
