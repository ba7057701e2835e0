//! Google Calendar as a `CalendarStore`, over the v3 REST API.

use fixturecal_core::{
    CalendarEvent, CalendarStore, Container, EventPatch, FixtureError, FixtureResult, NewEvent,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::convert::{SCHEDULE_PROPERTY, to_insert, to_patch};
use crate::types::{CalendarList, CreatedCalendar, EventList, GoogleEvent, NewCalendar};

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

const PAGE_SIZE: &str = "250";

pub struct GoogleCalendar {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GoogleCalendar {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(GOOGLE_CALENDAR_API_BASE, access_token)
    }

    /// Point at a different API root (used by tests).
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        GoogleCalendar {
            http: Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    fn url(&self, segments: &[&str]) -> FixtureResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FixtureError::Config(format!("Bad Google API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| FixtureError::Config("Google API base URL cannot have a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> FixtureResult<T> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| FixtureError::Store(format!("Google API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FixtureError::Store(format!(
                "Google API error ({}): {}",
                status,
                error_message(&body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FixtureError::Store(format!("Failed to parse Google response: {e}")))
    }
}

/// Google wraps errors as `{"error": {"message": ...}}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

impl CalendarStore for GoogleCalendar {
    async fn list_containers(&self) -> FixtureResult<Vec<Container>> {
        let url = self.url(&["users", "me", "calendarList"])?;
        let mut containers = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(url.clone());
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: CalendarList = self.send(request).await?;
            containers.extend(page.items.into_iter().map(|entry| Container {
                display_name: entry.summary,
                id: entry.id,
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = containers.len(), "listed calendars");
        Ok(containers)
    }

    async fn create_container(
        &self,
        display_name: &str,
        description: &str,
    ) -> FixtureResult<String> {
        let url = self.url(&["calendars"])?;
        let body = NewCalendar {
            summary: display_name,
            description,
        };

        let created: CreatedCalendar = self.send(self.http.post(url).json(&body)).await?;
        Ok(created.id)
    }

    async fn list_events(
        &self,
        container_id: &str,
        schedule_tag: &str,
    ) -> FixtureResult<Vec<CalendarEvent>> {
        let url = self.url(&["calendars", container_id, "events"])?;
        let filter = format!("{SCHEDULE_PROPERTY}={schedule_tag}");
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(url.clone()).query(&[
                ("privateExtendedProperty", filter.as_str()),
                ("singleEvents", "true"),
                ("showDeleted", "false"),
                ("maxResults", PAGE_SIZE),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: EventList = self.send(request).await?;
            for item in page.items {
                if item.status.as_deref() == Some("cancelled") {
                    continue;
                }
                match CalendarEvent::try_from(item) {
                    Ok(event) => events.push(event),
                    Err(e) => warn!(calendar = container_id, error = %e, "skipping event"),
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(calendar = container_id, count = events.len(), "listed events");
        Ok(events)
    }

    async fn create_event(&self, container_id: &str, event: &NewEvent) -> FixtureResult<String> {
        let url = self.url(&["calendars", container_id, "events"])?;
        let mut request = self.http.post(url).json(&to_insert(event));
        if !event.attendees.is_empty() {
            request = request.query(&[("sendUpdates", "all")]);
        }

        let created: GoogleEvent = self.send(request).await?;
        created
            .id
            .ok_or_else(|| FixtureError::Store("Google returned an event without an id".into()))
    }

    async fn patch_event(
        &self,
        container_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> FixtureResult<String> {
        let url = self.url(&["calendars", container_id, "events", event_id])?;
        let body = to_patch(patch)?;

        let updated: GoogleEvent = self.send(self.http.patch(url).json(&body)).await?;
        Ok(updated.id.unwrap_or_else(|| event_id.to_string()))
    }

    async fn get_event(&self, container_id: &str, event_id: &str) -> FixtureResult<CalendarEvent> {
        let url = self.url(&["calendars", container_id, "events", event_id])?;
        let event: GoogleEvent = self.send(self.http.get(url)).await?;
        CalendarEvent::try_from(event)
    }
}
