//! Pages described entirely by CSS selectors.

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use super::{RawRow, compile_selector, normalize_whitespace};
use crate::error::{FixtureError, FixtureResult};

fn default_date_format() -> String {
    super::ssb::DATE_FORMAT.to_string()
}

fn default_time_format() -> String {
    super::ssb::TIME_FORMAT.to_string()
}

/// Selectors for a `custom` schedule. `row` matches one element per game;
/// every other selector is evaluated inside that row.
///
/// ```toml
/// [selectors]
/// row = "table.fixtures tbody tr"
/// round = "td.round"
/// opponent = "td.opponent"
/// date = "td.date"
/// time = "td.time"
/// venue = "td.venue"
/// link = "td.match a"
/// date_format = "%Y-%m-%d"
/// time_format = "%H:%M"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Selectors {
    pub row: String,
    pub round: String,
    pub opponent: Option<String>,
    pub date: String,
    pub time: String,
    pub venue: Option<String>,
    pub link: Option<String>,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

struct Compiled {
    row: Selector,
    round: Selector,
    opponent: Option<Selector>,
    date: Selector,
    time: Selector,
    venue: Option<Selector>,
    link: Option<Selector>,
    anchor: Selector,
}

impl Compiled {
    fn new(selectors: &Selectors) -> FixtureResult<Self> {
        let optional = |s: &Option<String>| s.as_deref().map(compile_selector).transpose();

        Ok(Compiled {
            row: compile_selector(&selectors.row)?,
            round: compile_selector(&selectors.round)?,
            opponent: optional(&selectors.opponent)?,
            date: compile_selector(&selectors.date)?,
            time: compile_selector(&selectors.time)?,
            venue: optional(&selectors.venue)?,
            link: optional(&selectors.link)?,
            anchor: compile_selector("a[href]")?,
        })
    }
}

pub(crate) fn parse_rows(html: &str, selectors: &Selectors) -> FixtureResult<Vec<RawRow>> {
    let compiled = Compiled::new(selectors)?;
    let document = Html::parse_document(html);
    let mut rows = Vec::new();

    for (index, row) in document.select(&compiled.row).enumerate() {
        let round = first_text(row, &compiled.round);
        let date = first_text(row, &compiled.date);
        let time = first_text(row, &compiled.time);

        // Header and spacer rows match `row` but carry none of the fields
        let (round, date, time) = match (round, date, time) {
            (None, None, None) => continue,
            (Some(round), Some(date), Some(time)) => (round, date, time),
            (round, date, _) => {
                let missing = if round.is_none() {
                    "round"
                } else if date.is_none() {
                    "date"
                } else {
                    "time"
                };
                return Err(FixtureError::Scrape(format!(
                    "Row {} has no '{}' value",
                    index + 1,
                    missing
                )));
            }
        };

        let opponent = compiled
            .opponent
            .as_ref()
            .and_then(|s| first_text(row, s));
        let venue = compiled.venue.as_ref().and_then(|s| first_text(row, s));
        let link = compiled
            .link
            .as_ref()
            .and_then(|s| row.select(s).next())
            .and_then(|element| href(element, &compiled.anchor));

        rows.push(RawRow {
            round,
            opponent,
            date,
            time,
            venue,
            link,
        });
    }

    Ok(rows)
}

fn first_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

fn href(element: ElementRef<'_>, anchor: &Selector) -> Option<String> {
    element
        .value()
        .attr("href")
        .or_else(|| {
            element
                .select(anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
        })
        .map(str::to_string)
}
