//! Sydney Social Basketball team pages.
//!
//! Each game is a `div.grid` whose cells carry an `h5` label ("Round",
//! "Opponent", "Date", "Time", "Venue") followed by the value as sibling
//! text, e.g. `<h5>Date</h5> 01/05/2024`.

use scraper::{ElementRef, Html};
use tracing::debug;

use super::{RawRow, compile_selector, normalize_whitespace};
use crate::error::{FixtureError, FixtureResult};

pub(crate) const DATE_FORMAT: &str = "%d/%m/%Y";
pub(crate) const TIME_FORMAT: &str = "%I:%M%p";

#[derive(Debug, Default)]
struct Field {
    text: String,
    href: Option<String>,
}

pub(crate) fn parse_rows(html: &str) -> FixtureResult<Vec<RawRow>> {
    let document = Html::parse_document(html);
    let grid = compile_selector("div.grid")?;
    let label = compile_selector("h5")?;
    let anchor = compile_selector("a[href]")?;

    let mut rows = Vec::new();

    for (index, game) in document.select(&grid).enumerate() {
        let fields = labelled_fields(game, &label, &anchor);
        if fields.is_empty() {
            debug!(index, "skipping grid without labelled cells");
            continue;
        }

        let find = |name: &str| {
            fields
                .iter()
                .find(|(label, _)| label == name)
                .map(|(_, field)| field)
        };
        let required = |name: &str| {
            find(name)
                .map(|field| field.text.clone())
                .filter(|text| !text.is_empty())
                .ok_or_else(|| {
                    FixtureError::Scrape(format!("Game {} has no '{}' value", index + 1, name))
                })
        };

        let round = required("round")?;
        let date = required("date")?;
        let time = required("time")?;
        let opponent = find("opponent")
            .map(|field| field.text.clone())
            .filter(|text| !text.is_empty());
        let venue = find("venue")
            .or_else(|| find("location"))
            .or_else(|| find("court"))
            .map(|field| field.text.clone())
            .filter(|text| !text.is_empty());

        rows.push(RawRow {
            round,
            opponent,
            date,
            time,
            venue,
            link: details_link(game, &anchor),
        });
    }

    Ok(rows)
}

/// Collect `(label, value)` pairs for every `h5` inside one game.
///
/// The value is the text of everything after the label up to the next
/// label in the same parent.
fn labelled_fields(
    game: ElementRef<'_>,
    label: &scraper::Selector,
    anchor: &scraper::Selector,
) -> Vec<(String, Field)> {
    let mut fields = Vec::new();

    for heading in game.select(label) {
        let name = normalize_whitespace(&heading.text().collect::<String>())
            .trim_end_matches(':')
            .to_lowercase();

        let mut field = Field::default();
        let mut text = String::new();

        for sibling in heading.next_siblings() {
            if let Some(element) = ElementRef::wrap(sibling) {
                if element.value().name() == "h5" {
                    break;
                }
                text.push(' ');
                text.extend(element.text());
                if field.href.is_none() {
                    field.href = if element.value().name() == "a" {
                        element.value().attr("href").map(str::to_string)
                    } else {
                        element
                            .select(anchor)
                            .next()
                            .and_then(|a| a.value().attr("href"))
                            .map(str::to_string)
                    };
                }
            } else if let Some(fragment) = sibling.value().as_text() {
                text.push(' ');
                text.push_str(fragment);
            }
        }

        field.text = normalize_whitespace(&text);
        fields.push((name, field));
    }

    fields
}

/// The first link whose text mentions "details", if the game has one.
fn details_link(game: ElementRef<'_>, anchor: &scraper::Selector) -> Option<String> {
    game.select(anchor)
        .find(|a| {
            a.text()
                .collect::<String>()
                .to_lowercase()
                .contains("detail")
        })
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use crate::config::Schedule;
    use crate::event::EventColor;
    use crate::source::{SourceFormat, parse};

    const PAGE: &str = r#"
<html><body>
  <div class="grid">
    <div class="cell"><h5>Round</h5> R3</div>
    <div class="cell"><h5>Opponent</h5> <a href="/team/lions/">Lions</a></div>
    <div class="cell"><h5>Date</h5> 01/05/2024</div>
    <div class="cell"><h5>Time</h5> 6:00PM</div>
    <div class="cell"><h5>Venue</h5> Court 2</div>
    <div class="cell"><a href="/game/1234/">Game details</a></div>
  </div>
  <div class="grid">
    <div class="cell"><h5>Round</h5> R4</div>
    <div class="cell"><h5>Opponent</h5> <a href="/team/tigers/">Tigers</a></div>
    <div class="cell"><h5>Date</h5> 08/05/2024</div>
    <div class="cell"><h5>Time</h5> 8:40 pm</div>
  </div>
  <div class="grid"><p>Ladder</p></div>
</body></html>
"#;

    fn schedule(minutes: i64) -> Schedule {
        Schedule {
            name: "Shake Shaq".to_string(),
            url: "https://sydneysocialbasketball.com.au/team/shake-shaq-6/".to_string(),
            format: SourceFormat::Ssb,
            color: EventColor::Tomato,
            time_zone: chrono_tz::Australia::Sydney,
            game_length: Duration::minutes(minutes),
            attendees: Vec::new(),
        }
    }

    #[test]
    fn test_parses_games_in_page_order() {
        let events = parse(PAGE, &schedule(60)).unwrap();
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.round_name, "R3: Lions");
        assert_eq!(
            first.start,
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap()
        );
        assert_eq!(first.end, first.start + Duration::minutes(60));
        assert_eq!(first.venue, "Court 2");
        assert_eq!(
            first.detail_url.as_deref(),
            Some("https://sydneysocialbasketball.com.au/game/1234/")
        );

        let second = &events[1];
        assert_eq!(second.round_name, "R4: Tigers");
        assert_eq!(
            second.start,
            NaiveDate::from_ymd_opt(2024, 5, 8)
                .unwrap()
                .and_hms_opt(20, 40, 0)
                .unwrap()
        );
        assert_eq!(second.venue, "");
        assert_eq!(second.detail_url, None);
    }

    #[test]
    fn test_game_length_sets_end() {
        let events = parse(PAGE, &schedule(45)).unwrap();
        assert_eq!(events[0].end - events[0].start, Duration::minutes(45));
    }

    #[test]
    fn test_missing_time_is_a_scrape_error() {
        let page = r#"<div class="grid"><h5>Round</h5> R1 <h5>Date</h5> 01/05/2024</div>"#;
        let err = parse(page, &schedule(60)).unwrap_err();
        assert!(matches!(err, crate::FixtureError::Scrape(msg) if msg.contains("time")));
    }

    #[test]
    fn test_empty_page_yields_no_events() {
        assert!(parse("<html></html>", &schedule(60)).unwrap().is_empty());
    }
}
