//! Event sources: fetching a schedule page and turning it into
//! `ScrapedEvent`s.
//!
//! Parsing is dispatched on [`SourceFormat`], a closed set of supported page
//! layouts. Unknown format names are rejected when the schedule is loaded.

mod custom;
mod ssb;

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::config::Schedule;
use crate::error::{FixtureError, FixtureResult};
use crate::event::ScrapedEvent;

pub use custom::Selectors;

/// Supported schedule page layouts.
#[derive(Debug, Clone)]
pub enum SourceFormat {
    /// Sydney Social Basketball team pages
    Ssb,
    /// Any page, described by CSS selectors
    Custom(Selectors),
}

impl SourceFormat {
    pub fn from_parts(name: &str, selectors: Option<Selectors>) -> FixtureResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ssb" => Ok(SourceFormat::Ssb),
            "custom" => selectors.map(SourceFormat::Custom).ok_or_else(|| {
                FixtureError::Config("format \"custom\" requires a [selectors] table".into())
            }),
            _ => Err(FixtureError::UnsupportedFormat(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Ssb => "ssb",
            SourceFormat::Custom(_) => "custom",
        }
    }
}

/// Something that can produce the current list of games for a schedule.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    async fn fetch(&self, schedule: &Schedule) -> FixtureResult<Vec<ScrapedEvent>>;
}

/// Fetches schedule pages over HTTP.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> FixtureResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fixturecal/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FixtureError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(HttpSource { client })
    }

    /// Retrieve the raw HTML of a page.
    pub async fn get_html(&self, url: &str) -> FixtureResult<String> {
        let fetch_err = |reason: String| FixtureError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {status}")));
        }

        response.text().await.map_err(|e| fetch_err(e.to_string()))
    }
}

impl EventSource for HttpSource {
    async fn fetch(&self, schedule: &Schedule) -> FixtureResult<Vec<ScrapedEvent>> {
        let html = self.get_html(&schedule.url).await?;
        debug!(
            schedule = %schedule.name,
            format = schedule.format.name(),
            bytes = html.len(),
            "fetched schedule page"
        );
        parse(&html, schedule)
    }
}

/// Parse a schedule page using the schedule's declared format.
pub fn parse(html: &str, schedule: &Schedule) -> FixtureResult<Vec<ScrapedEvent>> {
    let rows = match &schedule.format {
        SourceFormat::Ssb => ssb::parse_rows(html)?,
        SourceFormat::Custom(selectors) => custom::parse_rows(html, selectors)?,
    };

    let (date_format, time_format) = match &schedule.format {
        SourceFormat::Ssb => (ssb::DATE_FORMAT, ssb::TIME_FORMAT),
        SourceFormat::Custom(selectors) => {
            (selectors.date_format.as_str(), selectors.time_format.as_str())
        }
    };

    rows.into_iter()
        .map(|row| {
            let start = parse_start(&row.date, &row.time, date_format, time_format)?;
            Ok(ScrapedEvent {
                round_name: row.round_name(),
                start,
                end: start + schedule.game_length,
                venue: row.venue.unwrap_or_default(),
                detail_url: row.link.and_then(|href| absolutize(&schedule.url, &href)),
            })
        })
        .collect()
}

/// Raw text fields pulled out of one game's markup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RawRow {
    pub round: String,
    pub opponent: Option<String>,
    pub date: String,
    pub time: String,
    pub venue: Option<String>,
    pub link: Option<String>,
}

impl RawRow {
    fn round_name(&self) -> String {
        match &self.opponent {
            Some(opponent) => format!("{}: {}", self.round, opponent),
            None => self.round.clone(),
        }
    }
}

/// Combine a date and a 12/24h time string into a naive local timestamp.
///
/// Whitespace inside the time is removed so that "6:00 pm" and "6:00PM"
/// parse the same.
fn parse_start(
    date: &str,
    time: &str,
    date_format: &str,
    time_format: &str,
) -> FixtureResult<NaiveDateTime> {
    let time: String = time.split_whitespace().collect::<String>().to_uppercase();
    let input = format!("{} {}", date.trim(), time);
    let format = format!("{date_format} {time_format}");

    NaiveDateTime::parse_from_str(&input, &format).map_err(|e| {
        FixtureError::Scrape(format!("Could not parse '{input}' as '{format}': {e}"))
    })
}

fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match url::Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Some(href.to_string()),
    }
}

pub(crate) fn compile_selector(selector: &str) -> FixtureResult<scraper::Selector> {
    scraper::Selector::parse(selector)
        .map_err(|e| FixtureError::Config(format!("Invalid CSS selector '{selector}': {e:?}")))
}

/// Collapse runs of whitespace to single spaces and trim.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
