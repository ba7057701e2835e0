//! Conversions between fixturecal's event types and Google's JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use fixturecal_core::{
    CalendarEvent, EventColor, EventPatch, FixtureError, FixtureResult, NewEvent,
};

use crate::types::{Attendee, EventDateTime, ExtendedProperties, GoogleEvent};

/// Private extended property holding the schedule tag.
pub(crate) const SCHEDULE_PROPERTY: &str = "schedule";

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn zoned(time: NaiveDateTime, time_zone: &str) -> EventDateTime {
    EventDateTime {
        date_time: Some(time.format(NAIVE_FORMAT).to_string()),
        date: None,
        time_zone: Some(time_zone.to_string()),
    }
}

fn parse_time(event_id: &str, time: Option<&EventDateTime>) -> FixtureResult<DateTime<FixedOffset>> {
    let raw = time
        .and_then(|t| t.date_time.as_deref())
        .ok_or_else(|| FixtureError::Store(format!("Event {event_id} has no timed start/end")))?;

    DateTime::parse_from_rfc3339(raw)
        .map_err(|e| FixtureError::Store(format!("Event {event_id} has bad time '{raw}': {e}")))
}

impl TryFrom<GoogleEvent> for CalendarEvent {
    type Error = FixtureError;

    fn try_from(event: GoogleEvent) -> FixtureResult<Self> {
        let id = event
            .id
            .ok_or_else(|| FixtureError::Store("Event without an id".into()))?;
        let start = parse_time(&id, event.start.as_ref())?;
        let end = parse_time(&id, event.end.as_ref())?;

        let color = event
            .color_id
            .and_then(|id| id.parse::<u8>().ok())
            .and_then(EventColor::from_id);

        let schedule_tag = event
            .extended_properties
            .and_then(|mut props| props.private.remove(SCHEDULE_PROPERTY));

        Ok(CalendarEvent {
            id,
            start,
            end,
            summary: event.summary.unwrap_or_default(),
            location: event.location.filter(|l| !l.is_empty()),
            color,
            description: event.description,
            schedule_tag,
        })
    }
}

pub(crate) fn to_insert(new: &NewEvent) -> GoogleEvent {
    let private = BTreeMap::from([(SCHEDULE_PROPERTY.to_string(), new.schedule_tag.clone())]);

    GoogleEvent {
        summary: Some(new.summary.clone()),
        description: new.description.clone(),
        location: Some(new.location.clone()).filter(|l| !l.is_empty()),
        color_id: Some(new.color.id().to_string()),
        start: Some(zoned(new.start, &new.time_zone)),
        end: Some(zoned(new.end, &new.time_zone)),
        extended_properties: Some(ExtendedProperties { private }),
        attendees: (!new.attendees.is_empty()).then(|| {
            new.attendees
                .iter()
                .map(|email| Attendee {
                    email: email.clone(),
                })
                .collect()
        }),
        ..Default::default()
    }
}

/// Body for a PATCH request, carrying only the fields the patch sets.
pub(crate) fn to_patch(patch: &EventPatch) -> FixtureResult<GoogleEvent> {
    let time_zone = || {
        patch.time_zone.as_deref().ok_or_else(|| {
            FixtureError::Store("Patch moves an event without naming a time zone".into())
        })
    };

    Ok(GoogleEvent {
        summary: patch.summary.clone(),
        description: patch.description.clone(),
        location: patch.location.clone(),
        color_id: patch.color.map(|c| c.id().to_string()),
        start: patch.start.map(|t| time_zone().map(|z| zoned(t, z))).transpose()?,
        end: patch.end.map(|t| time_zone().map(|z| zoned(t, z))).transpose()?,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_from_google_reads_tag_and_color() {
        let json = r#"{
            "id": "abc",
            "summary": "R3: Lions",
            "location": "",
            "colorId": "11",
            "start": {"dateTime": "2024-05-01T18:00:00+10:00", "timeZone": "Australia/Sydney"},
            "end": {"dateTime": "2024-05-01T19:00:00+10:00"},
            "extendedProperties": {"private": {"schedule": "sched-A"}}
        }"#;
        let google: GoogleEvent = serde_json::from_str(json).unwrap();
        let event = CalendarEvent::try_from(google).unwrap();

        assert_eq!(event.id, "abc");
        assert_eq!(event.color, Some(EventColor::Tomato));
        assert_eq!(event.location, None);
        assert_eq!(event.schedule_tag.as_deref(), Some("sched-A"));
        assert_eq!(event.start.to_rfc3339(), "2024-05-01T18:00:00+10:00");
    }

    #[test]
    fn test_all_day_events_are_rejected() {
        let json = r#"{"id": "x", "start": {"date": "2024-05-01"}, "end": {"date": "2024-05-02"}}"#;
        let google: GoogleEvent = serde_json::from_str(json).unwrap();
        assert!(CalendarEvent::try_from(google).is_err());
    }

    #[test]
    fn test_patch_body_has_only_set_fields() {
        let patch = EventPatch {
            location: Some("Court 5".to_string()),
            ..Default::default()
        };

        let body = serde_json::to_value(to_patch(&patch).unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"location": "Court 5"}));
    }

    #[test]
    fn test_patch_times_carry_zone() {
        let patch = EventPatch {
            start: Some(at(19)),
            end: Some(at(20)),
            time_zone: Some("Australia/Sydney".to_string()),
            ..Default::default()
        };

        let body = serde_json::to_value(to_patch(&patch).unwrap()).unwrap();
        assert_eq!(
            body["start"],
            serde_json::json!({"dateTime": "2024-05-01T19:00:00", "timeZone": "Australia/Sydney"})
        );

        let unzoned = EventPatch {
            start: Some(at(19)),
            ..Default::default()
        };
        assert!(to_patch(&unzoned).is_err());
    }

    #[test]
    fn test_insert_body_tags_event() {
        let new = NewEvent {
            summary: "R3: Lions".to_string(),
            start: at(18),
            end: at(19),
            time_zone: "Australia/Sydney".to_string(),
            location: "Court 2".to_string(),
            color: EventColor::Sage,
            description: None,
            schedule_tag: "sched-A".to_string(),
            attendees: vec!["coach@example.com".to_string()],
        };

        let body = serde_json::to_value(to_insert(&new)).unwrap();
        assert_eq!(body["extendedProperties"]["private"]["schedule"], "sched-A");
        assert_eq!(body["colorId"], "2");
        assert_eq!(body["attendees"][0]["email"], "coach@example.com");
        assert!(body.get("description").is_none());
        assert!(body.get("id").is_none());
    }
}
