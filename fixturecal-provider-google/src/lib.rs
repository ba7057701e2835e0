//! Google Calendar backend for fixturecal.
//!
//! `GoogleCalendar` implements `CalendarStore` over the Calendar v3 REST
//! API. `Session` turns the operator's refresh token into an access token.

pub mod app_config;
mod convert;
mod google;
pub mod session;
mod types;

pub use app_config::Credentials;
pub use google::{GOOGLE_CALENDAR_API_BASE, GoogleCalendar};
pub use session::Session;

/// Build a store from the configured credentials, refreshing the access
/// token if needed.
pub async fn connect() -> anyhow::Result<GoogleCalendar> {
    let credentials = app_config::load()?;
    let session = Session::load_valid(&credentials).await?;
    Ok(GoogleCalendar::new(session.access_token()))
}
