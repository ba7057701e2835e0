//! ICS file generation.

use chrono::{DateTime, NaiveDateTime, Utc};
use icalendar::{Calendar, Component, EventLike, Property};

use crate::config::Schedule;
use crate::error::FixtureResult;
use crate::event::ScrapedEvent;

/// Generate one .ics document holding every game of a schedule.
///
/// UIDs are derived from the schedule name and game start, so re-exporting
/// an unchanged schedule yields the same UIDs and importers update in place.
pub fn generate_ics(
    schedule: &Schedule,
    events: &[ScrapedEvent],
    stamp: DateTime<Utc>,
) -> FixtureResult<String> {
    let mut cal = Calendar::new();
    cal.name(&schedule.name);
    cal.append_property(Property::new("X-WR-TIMEZONE", schedule.time_zone.name()));

    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();
    let tzid = schedule.time_zone.name();
    let prefix = slug::slugify(&schedule.name);

    for event in events {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&format!(
            "{}-{}@fixturecal",
            prefix,
            event.start.format("%Y%m%dT%H%M%S")
        ));
        ics_event.summary(&event.round_name);
        ics_event.add_property("DTSTAMP", &dtstamp);

        add_zoned_property(&mut ics_event, "DTSTART", &event.start, tzid);
        add_zoned_property(&mut ics_event, "DTEND", &event.end, tzid);

        if !event.venue.is_empty() {
            ics_event.location(&event.venue);
        }

        if let Some(ref url) = event.detail_url {
            ics_event.description(url);
            ics_event.add_property("URL", url);
        }

        cal.push(ics_event.done());
    }

    Ok(strip_ics_bloat(&cal.done().to_string()))
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with our own
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:-//fixturecal//EN\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn add_zoned_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    time: &NaiveDateTime,
    tzid: &str,
) {
    let mut prop = Property::new(name, time.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", tzid);
    ics_event.append_property(prop);
}
