//! Scraped and calendar-side event types.
//!
//! `ScrapedEvent`s come out of an event source and live for one pass.
//! `CalendarEvent`s are what the calendar store currently holds. The
//! reconciler turns differences between the two into `NewEvent`s and
//! `EventPatch`es.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::FixtureError;

/// A single game as read from a schedule page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedEvent {
    pub round_name: String,
    /// Local wall-clock start in the schedule's time zone
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub venue: String,
    pub detail_url: Option<String>,
}

impl fmt::Display for ScrapedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.round_name)
    }
}

/// An event as stored in the remote calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub summary: String,
    pub location: Option<String>,
    pub color: Option<EventColor>,
    pub description: Option<String>,
    /// Private marker naming the schedule that created this event
    pub schedule_tag: Option<String>,
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)
    }
}

/// Google Calendar's fixed event palette.
///
/// Deserializes from a palette name (any case) or a numeric id as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    Lavender,
    Sage,
    Grape,
    Flamingo,
    Banana,
    Tangerine,
    Peacock,
    Graphite,
    Blueberry,
    Basil,
    Tomato,
}

impl EventColor {
    const ALL: [EventColor; 11] = [
        EventColor::Lavender,
        EventColor::Sage,
        EventColor::Grape,
        EventColor::Flamingo,
        EventColor::Banana,
        EventColor::Tangerine,
        EventColor::Peacock,
        EventColor::Graphite,
        EventColor::Blueberry,
        EventColor::Basil,
        EventColor::Tomato,
    ];

    /// Numeric colour id used by the store (1-based).
    pub fn id(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            EventColor::Lavender => "lavender",
            EventColor::Sage => "sage",
            EventColor::Grape => "grape",
            EventColor::Flamingo => "flamingo",
            EventColor::Banana => "banana",
            EventColor::Tangerine => "tangerine",
            EventColor::Peacock => "peacock",
            EventColor::Graphite => "graphite",
            EventColor::Blueberry => "blueberry",
            EventColor::Basil => "basil",
            EventColor::Tomato => "tomato",
        }
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventColor {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u8>() {
            return Self::from_id(id)
                .ok_or_else(|| FixtureError::Config(format!("Unknown colour id {id}")));
        }
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FixtureError::Config(format!("Unknown colour '{s}'")))
    }
}

impl<'de> Deserialize<'de> for EventColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Payload for inserting a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// IANA zone the naive start/end are expressed in
    pub time_zone: String,
    pub location: String,
    pub color: EventColor,
    pub description: Option<String>,
    pub schedule_tag: String,
    pub attendees: Vec<String>,
}

/// A partial update; `None` fields are left untouched on the remote event.
///
/// The schedule tag is deliberately absent: it never changes after insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub location: Option<String>,
    pub color: Option<EventColor>,
    /// `Some("")` clears the remote description
    pub description: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    /// Required by the store whenever `start` or `end` is set
    pub time_zone: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.location.is_none()
            && self.color.is_none()
            && self.description.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }

    /// Names of fields this patch sets, for logging and rendering.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.start.is_some() {
            fields.push("start");
        }
        if self.end.is_some() {
            fields.push("end");
        }
        if self.summary.is_some() {
            fields.push("summary");
        }
        if self.location.is_some() {
            fields.push("location");
        }
        if self.color.is_some() {
            fields.push("color");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        fields
    }
}
