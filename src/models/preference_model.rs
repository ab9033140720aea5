//! models/preference_model.rs
//! Preferencias de entrega por destinatario.

use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

pub const DEFAULT_PREFERRED_DAYS: [Weekday; 3] = [Weekday::Mon, Weekday::Wed, Weekday::Fri];
pub const DEFAULT_ENGAGEMENT_SCORE: f64 = 0.5;

pub fn default_preferred_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default()
}

/// Frecuencia deseada. Informativa: el selector no la aplica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(anyhow!("Unknown frequency '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientPreference {
    pub recipient_id: String,
    #[serde(with = "time_of_day")]
    pub preferred_time: NaiveTime,
    #[serde(with = "weekday_list")]
    pub preferred_days: Vec<Weekday>,
    pub frequency: Frequency,
    pub engagement_score: f64,
    pub last_contact: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl RecipientPreference {
    /// Preferencias por defecto para un destinatario nunca visto.
    pub fn defaults_for(recipient_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            preferred_time: default_preferred_time(),
            preferred_days: DEFAULT_PREFERRED_DAYS.to_vec(),
            frequency: Frequency::default(),
            engagement_score: DEFAULT_ENGAGEMENT_SCORE,
            last_contact: Some(now),
            updated_at: now,
        }
    }

    pub fn prefers(&self, day: Weekday) -> bool {
        self.preferred_days.contains(&day)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.preferred_days.is_empty() {
            return Err(ValidationError::EmptyWeekdays);
        }
        if !(0.0..=1.0).contains(&self.engagement_score) {
            return Err(ValidationError::EngagementOutOfRange(self.engagement_score));
        }
        Ok(())
    }
}

/// Cambios explícitos de preferencias (PUT). Los campos ausentes no se tocan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePreferencesRequest {
    #[serde(default, with = "time_of_day::option")]
    pub preferred_time: Option<NaiveTime>,
    #[serde(default, with = "weekday_list::option")]
    pub preferred_days: Option<Vec<Weekday>>,
    pub frequency: Option<Frequency>,
    pub engagement_score: Option<f64>,
}

/// Ordena por lunes..domingo y elimina duplicados.
pub fn normalize_weekdays(days: &mut Vec<Weekday>) {
    days.sort_by_key(|d| d.num_days_from_monday());
    days.dedup();
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Acepta "Monday", "monday" o "Mon".
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    raw.trim().parse::<Weekday>().ok()
}

pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Serializa la hora como "HH:MM".
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid time of day '{raw}'")))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{de, Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::super::parse_time_of_day(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid time of day '{raw}'"))),
                None => Ok(None),
            }
        }
    }
}

/// Serializa los días como nombres completos en inglés.
pub mod weekday_list {
    use chrono::Weekday;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(days: &[Weekday], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(days.iter().map(|d| super::weekday_name(*d)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Weekday>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        parse_names(&names).map_err(de::Error::custom)
    }

    pub(super) fn parse_names(names: &[String]) -> Result<Vec<Weekday>, String> {
        let mut days = names
            .iter()
            .map(|n| super::parse_weekday(n).ok_or_else(|| format!("invalid weekday '{n}'")))
            .collect::<Result<Vec<_>, _>>()?;
        super::normalize_weekdays(&mut days);
        Ok(days)
    }

    pub mod option {
        use chrono::Weekday;
        use serde::{de, Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<Weekday>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<Vec<String>>::deserialize(deserializer)? {
                Some(names) => super::parse_names(&names).map(Some).map_err(de::Error::custom),
                None => Ok(None),
            }
        }
    }
}
