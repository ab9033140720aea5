//! db.rs
//! Conexión a SQLite, migraciones y helpers de timestamps.

use std::{path::Path, str::FromStr};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

/// Abre (o crea) la base de datos en `db_path` y devuelve el pool.
/// El pool se pasa explícitamente a cada servicio; no hay conexión global.
pub async fn setup_database(db_path: &Path) -> Result<Pool<Sqlite>> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create directory {}", parent.display()))?;
        }
    }

    let db_url = format!("sqlite:{}", db_path.to_string_lossy());
    log::info!("Connecting to SQLite at {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)
        .with_context(|| format!("Invalid SQLite url {db_url}"))?
        .create_if_missing(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("Could not connect to the SQLite database")?;

    Ok(db_pool)
}

/// Corre las migraciones embebidas de `./migrations`
pub async fn run_migrations(db_pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(db_pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}

/// Formato fijo (milisegundos, sufijo `Z`): el orden lexicográfico en SQLite
/// coincide con el cronológico.
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid stored timestamp '{raw}'"))?;
    Ok(parsed.with_timezone(&Utc))
}

pub fn parse_opt_ts(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_ts).transpose()
}
