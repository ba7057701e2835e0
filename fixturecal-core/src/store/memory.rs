//! In-memory `CalendarStore` that records every write, for tests.
//!
//! Available outside this crate with the `test-util` feature.

use std::cell::RefCell;
use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use super::{CalendarStore, Container};
use crate::error::{FixtureError, FixtureResult};
use crate::event::{CalendarEvent, EventPatch, NewEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    CreateContainer(String),
    Insert(NewEvent),
    Patch { event_id: String, patch: EventPatch },
}

#[derive(Default)]
pub struct MemoryStore {
    containers: RefCell<Vec<Container>>,
    events: RefCell<BTreeMap<String, Vec<CalendarEvent>>>,
    writes: RefCell<Vec<Write>>,
    next_id: RefCell<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(self, id: &str, display_name: &str) -> Self {
        self.containers.borrow_mut().push(Container {
            id: id.to_string(),
            display_name: display_name.to_string(),
        });
        self
    }

    /// Place an event directly, without recording a write.
    pub fn seed(&self, container_id: &str, event: CalendarEvent) {
        self.events
            .borrow_mut()
            .entry(container_id.to_string())
            .or_default()
            .push(event);
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.borrow().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }

    pub fn events(&self, container_id: &str) -> Vec<CalendarEvent> {
        self.events
            .borrow()
            .get(container_id)
            .cloned()
            .unwrap_or_default()
    }

    fn allocate_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        format!("{prefix}-{next}")
    }
}

fn localize(time: NaiveDateTime, zone: &str) -> FixtureResult<DateTime<FixedOffset>> {
    let tz: Tz = zone
        .parse()
        .map_err(|_| FixtureError::InvalidTimeZone(zone.to_string()))?;
    tz.from_local_datetime(&time)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| FixtureError::Store(format!("{time} does not exist in {zone}")))
}

impl CalendarStore for MemoryStore {
    async fn list_containers(&self) -> FixtureResult<Vec<Container>> {
        Ok(self.containers.borrow().clone())
    }

    async fn create_container(
        &self,
        display_name: &str,
        _description: &str,
    ) -> FixtureResult<String> {
        let id = self.allocate_id("cal");
        self.containers.borrow_mut().push(Container {
            id: id.clone(),
            display_name: display_name.to_string(),
        });
        self.writes
            .borrow_mut()
            .push(Write::CreateContainer(display_name.to_string()));
        Ok(id)
    }

    async fn list_events(
        &self,
        container_id: &str,
        schedule_tag: &str,
    ) -> FixtureResult<Vec<CalendarEvent>> {
        Ok(self
            .events(container_id)
            .into_iter()
            .filter(|event| event.schedule_tag.as_deref() == Some(schedule_tag))
            .collect())
    }

    async fn create_event(&self, container_id: &str, event: &NewEvent) -> FixtureResult<String> {
        let id = self.allocate_id("evt");
        let stored = CalendarEvent {
            id: id.clone(),
            start: localize(event.start, &event.time_zone)?,
            end: localize(event.end, &event.time_zone)?,
            summary: event.summary.clone(),
            location: Some(event.location.clone()).filter(|l| !l.is_empty()),
            color: Some(event.color),
            description: event.description.clone(),
            schedule_tag: Some(event.schedule_tag.clone()),
        };
        self.seed(container_id, stored);
        self.writes.borrow_mut().push(Write::Insert(event.clone()));
        Ok(id)
    }

    async fn patch_event(
        &self,
        container_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> FixtureResult<String> {
        let mut events = self.events.borrow_mut();
        let event = events
            .get_mut(container_id)
            .and_then(|events| events.iter_mut().find(|e| e.id == event_id))
            .ok_or_else(|| FixtureError::Store(format!("HTTP 404: no event {event_id}")))?;

        let zone = patch.time_zone.as_deref().unwrap_or("UTC");
        if let Some(start) = patch.start {
            event.start = localize(start, zone)?;
        }
        if let Some(end) = patch.end {
            event.end = localize(end, zone)?;
        }
        if let Some(summary) = &patch.summary {
            event.summary = summary.clone();
        }
        if let Some(location) = &patch.location {
            event.location = Some(location.clone());
        }
        if let Some(color) = patch.color {
            event.color = Some(color);
        }
        if let Some(description) = &patch.description {
            event.description = Some(description.clone());
        }

        self.writes.borrow_mut().push(Write::Patch {
            event_id: event_id.to_string(),
            patch: patch.clone(),
        });
        Ok(event_id.to_string())
    }

    async fn get_event(&self, container_id: &str, event_id: &str) -> FixtureResult<CalendarEvent> {
        self.events(container_id)
            .into_iter()
            .find(|event| event.id == event_id)
            .ok_or_else(|| FixtureError::Store(format!("HTTP 404: no event {event_id}")))
    }
}
