//! Per-schedule configuration.

use chrono::Duration;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::config::global::parse_time_zone;
use crate::error::{FixtureError, FixtureResult};
use crate::event::EventColor;
use crate::source::{Selectors, SourceFormat};

const DEFAULT_GAME_MINUTES: i64 = 60;

fn default_format() -> String {
    "ssb".to_string()
}

/// A schedule file as written by the operator.
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    /// Display name, also the name of the destination calendar
    pub name: String,
    pub url: String,
    #[serde(default = "default_format")]
    pub format: String,
    pub selectors: Option<Selectors>,
    pub color: EventColor,
    pub time_zone: Option<String>,
    pub game_minutes: Option<i64>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

impl ScheduleConfig {
    /// Validate into a `Schedule`, using `fallback_zone` when the file has no
    /// `time_zone` of its own.
    pub fn into_schedule(self, fallback_zone: Option<Tz>) -> FixtureResult<Schedule> {
        let format = SourceFormat::from_parts(&self.format, self.selectors)?;

        let time_zone = match self.time_zone.as_deref() {
            Some(name) => parse_time_zone(name)?,
            None => fallback_zone.ok_or_else(|| {
                FixtureError::Config(format!("Schedule '{}' has no time_zone", self.name))
            })?,
        };

        let minutes = self.game_minutes.unwrap_or(DEFAULT_GAME_MINUTES);
        if minutes <= 0 {
            return Err(FixtureError::Config(format!(
                "Schedule '{}' has a non-positive game_minutes ({})",
                self.name, minutes
            )));
        }

        Ok(Schedule {
            name: self.name,
            url: self.url,
            format,
            color: self.color,
            time_zone,
            game_length: Duration::minutes(minutes),
            attendees: self.attendees,
        })
    }
}

/// One schedule: a source page, its destination calendar, and how its
/// events should look.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub name: String,
    pub url: String,
    pub format: SourceFormat,
    pub color: EventColor,
    pub time_zone: Tz,
    pub game_length: Duration,
    pub attendees: Vec<String>,
}

impl Schedule {
    /// The private marker written on every event this schedule creates.
    pub fn tag(&self) -> &str {
        &self.url
    }
}
