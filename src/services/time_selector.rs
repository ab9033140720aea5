//! services/time_selector.rs
//! Selección del momento de entrega para un destinatario.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::{
    errors::SchedulingError,
    models::{calendar_model::ConflictInterval, preference_model::RecipientPreference},
};

/// Duración reservada para cada entrega
pub const DELIVERY_WINDOW_MINUTES: i64 = 60;

pub fn delivery_window() -> Duration {
    Duration::minutes(DELIVERY_WINDOW_MINUTES)
}

/// Recorre los días desde `earliest` y devuelve el primer día preferido cuya
/// hora preferida queda dentro de `[earliest, latest]` sin solapar ningún
/// conflicto. `Ok(None)` si la ventana se agota sin hueco.
pub fn select_time(
    preferences: &RecipientPreference,
    conflicts: &[ConflictInterval],
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, SchedulingError> {
    if earliest > latest {
        return Err(SchedulingError::InvalidRange { earliest, latest });
    }

    let window = delivery_window();
    let last_day = latest.date_naive();
    let mut day = earliest.date_naive();

    while day <= last_day {
        if preferences.prefers(day.weekday()) {
            let candidate = Utc.from_utc_datetime(&day.and_time(preferences.preferred_time));

            if candidate > latest {
                break;
            }

            if candidate >= earliest {
                let candidate_end = candidate + window;
                let blocked = conflicts
                    .iter()
                    .any(|c| c.overlaps(candidate, candidate_end));
                if !blocked {
                    return Ok(Some(candidate));
                }
                log::debug!(
                    "Slot {} for recipient {} blocked by a calendar conflict",
                    candidate,
                    preferences.recipient_id
                );
            }
        }

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(None)
}
