//! The remote calendar a schedule is mirrored into.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

use crate::error::FixtureResult;
use crate::event::{CalendarEvent, EventPatch, NewEvent};

/// A calendar that can hold events, as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub display_name: String,
}

/// Operations a calendar backend must support.
///
/// Every call is awaited before the next one starts, so implementations
/// don't need to be `Sync`.
#[allow(async_fn_in_trait)]
pub trait CalendarStore {
    async fn list_containers(&self) -> FixtureResult<Vec<Container>>;

    /// Create a container and return its id.
    async fn create_container(&self, display_name: &str, description: &str)
    -> FixtureResult<String>;

    /// Events in `container_id` carrying `schedule_tag`.
    async fn list_events(
        &self,
        container_id: &str,
        schedule_tag: &str,
    ) -> FixtureResult<Vec<CalendarEvent>>;

    /// Insert an event and return its id.
    async fn create_event(&self, container_id: &str, event: &NewEvent) -> FixtureResult<String>;

    /// Apply a partial update and return the event id.
    async fn patch_event(
        &self,
        container_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> FixtureResult<String>;

    async fn get_event(&self, container_id: &str, event_id: &str) -> FixtureResult<CalendarEvent>;
}
