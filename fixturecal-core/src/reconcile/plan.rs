//! Deciding skip / patch / insert for each scraped event.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::Schedule;
use crate::event::{CalendarEvent, EventPatch, NewEvent, ScrapedEvent};
use crate::reconcile::action::{Action, Counts, SkipReason};
use crate::reconcile::match_index::{MatchIndex, remote_key, scraped_key};

/// The actions for one schedule, in scrape order.
#[derive(Debug, Clone)]
pub struct Plan {
    pub schedule: String,
    pub tag: String,
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn counts(&self) -> Counts {
        Counts::tally(self.actions.iter())
    }

    pub fn is_noop(&self) -> bool {
        !self.actions.iter().any(Action::is_write)
    }
}

/// Decide what to do with each scraped event. Pure: no store calls.
///
/// Exact start matches are settled for the whole scrape first, so a game
/// that kept its time is never taken as the "moved" candidate of another
/// game on the same date.
pub fn plan(schedule: &Schedule, scraped: &[ScrapedEvent], existing: &[CalendarEvent]) -> Plan {
    let tag = schedule.tag();
    let index = MatchIndex::build(existing, tag, schedule.time_zone);
    debug!(schedule = %schedule.name, indexed = index.len(), "built match index");

    let mut decided: Vec<Option<Action>> = (0..scraped.len()).map(|_| None).collect();
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut seen = HashSet::new();

    for (slot, event) in decided.iter_mut().zip(scraped) {
        let key = scraped_key(event.start);

        if !seen.insert(key) {
            warn!(
                schedule = %schedule.name,
                round = %event.round_name,
                start = %key,
                "duplicate start in scraped schedule, skipping"
            );
            *slot = Some(Action::Skip {
                event: event.clone(),
                event_id: None,
                reason: SkipReason::DuplicateInSource,
            });
            continue;
        }

        if let Some(current) = index.get(&key) {
            claimed.insert(current.id.as_str());
            *slot = Some(exact_match(schedule, event, current));
        }
    }

    for (slot, event) in decided.iter_mut().zip(scraped) {
        if slot.is_some() {
            continue;
        }

        let candidates: Vec<&CalendarEvent> = index
            .on_date(event.start.date())
            .filter(|candidate| !claimed.contains(candidate.id.as_str()))
            .collect();

        *slot = Some(match candidates.first() {
            Some(current) => {
                if candidates.len() > 1 {
                    warn!(
                        schedule = %schedule.name,
                        date = %event.start.date(),
                        candidates = candidates.len(),
                        chosen = %current.id,
                        "several unmatched events on one date, moving the earliest"
                    );
                }
                claimed.insert(current.id.as_str());
                rescheduled(schedule, event, current)
            }
            None => insert(schedule, event),
        });
    }

    Plan {
        schedule: schedule.name.clone(),
        tag: tag.to_string(),
        actions: decided.into_iter().flatten().collect(),
    }
}

fn description(event: &ScrapedEvent) -> String {
    event.detail_url.clone().unwrap_or_default()
}

/// Patch only the fields that differ; skip when none do.
fn exact_match(schedule: &Schedule, event: &ScrapedEvent, current: &CalendarEvent) -> Action {
    let mut patch = EventPatch::default();

    if current.summary != event.round_name {
        patch.summary = Some(event.round_name.clone());
    }
    if current.color != Some(schedule.color) {
        patch.color = Some(schedule.color);
    }
    let wanted = description(event);
    if current.description.as_deref().unwrap_or_default() != wanted {
        patch.description = Some(wanted);
    }
    if current.location.as_deref().unwrap_or_default() != event.venue {
        patch.location = Some(event.venue.clone());
    }
    if remote_key(&current.end, schedule.time_zone) != scraped_key(event.end) {
        patch.end = Some(event.end);
        patch.time_zone = Some(schedule.time_zone.name().to_string());
    }

    if patch.is_empty() {
        debug!(schedule = %schedule.name, round = %event.round_name, "up to date");
        return Action::Skip {
            event: event.clone(),
            event_id: Some(current.id.clone()),
            reason: SkipReason::UpToDate,
        };
    }

    Action::Patch {
        event: event.clone(),
        event_id: current.id.clone(),
        patch,
        rescheduled: false,
    }
}

/// Same game, new time: rewrite everything in one patch.
fn rescheduled(schedule: &Schedule, event: &ScrapedEvent, current: &CalendarEvent) -> Action {
    Action::Patch {
        event: event.clone(),
        event_id: current.id.clone(),
        patch: EventPatch {
            summary: Some(event.round_name.clone()),
            location: Some(event.venue.clone()),
            color: Some(schedule.color),
            description: Some(description(event)),
            start: Some(event.start),
            end: Some(event.end),
            time_zone: Some(schedule.time_zone.name().to_string()),
        },
        rescheduled: true,
    }
}

fn insert(schedule: &Schedule, event: &ScrapedEvent) -> Action {
    Action::Insert {
        event: event.clone(),
        new: NewEvent {
            summary: event.round_name.clone(),
            start: event.start,
            end: event.end,
            time_zone: schedule.time_zone.name().to_string(),
            location: event.venue.clone(),
            color: schedule.color,
            description: event.detail_url.clone(),
            schedule_tag: schedule.tag().to_string(),
            attendees: schedule.attendees.clone(),
        },
    }
}
