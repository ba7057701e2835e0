//! Error types for fixturecal.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading schedules, scraping, or reconciling.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No schedule configs found in {}", .0.display())]
    NoSchedules(PathBuf),

    #[error("Schedule '{0}' not found")]
    ScheduleNotFound(String),

    #[error("Unsupported source format '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid time zone '{0}'")]
    InvalidTimeZone(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Calendar store error: {0}")]
    Store(String),

    #[error("Event {event_id} is tagged {found:?}, expected '{expected}'")]
    TagMismatch {
        event_id: String,
        expected: String,
        found: Option<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for FixtureError {
    fn from(err: toml::de::Error) -> Self {
        FixtureError::Config(err.to_string())
    }
}

impl From<config::ConfigError> for FixtureError {
    fn from(err: config::ConfigError) -> Self {
        FixtureError::Config(err.to_string())
    }
}

/// Result type alias for fixturecal operations.
pub type FixtureResult<T> = Result<T, FixtureError>;
