//! Core library for fixturecal: schedule configuration, page scraping, and
//! reconciliation of scraped games against a calendar store.

pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod ics;
pub mod reconcile;
pub mod source;
pub mod store;

pub use config::{GlobalConfig, Schedule, ScheduleConfig};
pub use container::{find_container, resolve_container};
pub use error::{FixtureError, FixtureResult};
pub use event::{CalendarEvent, EventColor, EventPatch, NewEvent, ScrapedEvent};
pub use reconcile::{Action, ActionKind, BatchReport, Plan, Report, reconcile};
pub use source::{EventSource, HttpSource, SourceFormat};
pub use store::{CalendarStore, Container};
