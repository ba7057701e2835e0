//! Lookup of a schedule's calendar events by local start time.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use chrono_tz::Tz;
use tracing::warn;

use crate::event::CalendarEvent;

/// Local wall-clock start in the schedule's zone, whole seconds.
pub type MatchKey = NaiveDateTime;

/// Key for a stored event: its start seen from `zone`, offset dropped.
pub fn remote_key(start: &DateTime<FixedOffset>, zone: Tz) -> MatchKey {
    truncate(start.with_timezone(&zone).naive_local())
}

/// Key for a scraped event's naive start.
pub fn scraped_key(start: NaiveDateTime) -> MatchKey {
    truncate(start)
}

fn truncate(time: NaiveDateTime) -> NaiveDateTime {
    time.with_nanosecond(0).unwrap_or(time)
}

/// Calendar events carrying one schedule tag, ordered by `MatchKey`.
///
/// Events with a different (or no) tag are dropped while building, even if
/// the store was asked to filter them already.
#[derive(Debug)]
pub struct MatchIndex<'a> {
    by_key: BTreeMap<MatchKey, &'a CalendarEvent>,
}

impl<'a> MatchIndex<'a> {
    pub fn build(events: &'a [CalendarEvent], tag: &str, zone: Tz) -> Self {
        let mut by_key: BTreeMap<MatchKey, &'a CalendarEvent> = BTreeMap::new();

        for event in events {
            if event.schedule_tag.as_deref() != Some(tag) {
                continue;
            }

            let key = remote_key(&event.start, zone);
            if let Some(kept) = by_key.get(&key) {
                warn!(
                    tag,
                    start = %key,
                    kept = %kept.id,
                    ignored = %event.id,
                    "two calendar events share a start time"
                );
                continue;
            }
            by_key.insert(key, event);
        }

        MatchIndex { by_key }
    }

    pub fn get(&self, key: &MatchKey) -> Option<&'a CalendarEvent> {
        self.by_key.get(key).copied()
    }

    /// Events starting on `date`, earliest first.
    pub fn on_date(&self, date: NaiveDate) -> impl Iterator<Item = &'a CalendarEvent> + '_ {
        self.by_key
            .range(date.and_time(NaiveTime::MIN)..)
            .take_while(move |(key, _)| key.date() == date)
            .map(|(_, event)| *event)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: &str, tag: Option<&str>, start: DateTime<FixedOffset>) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            start,
            end: start + chrono::Duration::hours(1),
            summary: id.to_string(),
            location: None,
            color: None,
            description: None,
            schedule_tag: tag.map(str::to_string),
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        chrono::Utc
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .fixed_offset()
    }

    #[test]
    fn test_keys_use_schedule_zone() {
        // 08:00 UTC is 18:00 in Sydney (AEST, +10) on 1 May
        let key = remote_key(&utc(2024, 5, 1, 8, 0), chrono_tz::Australia::Sydney);
        assert_eq!(
            key,
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_other_tags_are_excluded() {
        let events = vec![
            event("a", Some("sched-A"), utc(2024, 5, 1, 18, 0)),
            event("b", Some("sched-B"), utc(2024, 5, 1, 19, 0)),
            event("c", None, utc(2024, 5, 1, 20, 0)),
        ];

        let index = MatchIndex::build(&events, "sched-A", chrono_tz::UTC);
        assert_eq!(index.len(), 1);
        assert!(index.get(&utc(2024, 5, 1, 18, 0).naive_utc()).is_some());
    }

    #[test]
    fn test_on_date_is_ordered_and_bounded() {
        let events = vec![
            event("late", Some("t"), utc(2024, 5, 1, 21, 0)),
            event("next-day", Some("t"), utc(2024, 5, 2, 0, 0)),
            event("early", Some("t"), utc(2024, 5, 1, 9, 0)),
            event("prev-day", Some("t"), utc(2024, 4, 30, 23, 59)),
        ];
        let index = MatchIndex::build(&events, "t", chrono_tz::UTC);

        let ids: Vec<_> = index
            .on_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }
}
