//! iCalendar export of a scraped schedule.
//!
//! Lets a schedule be subscribed to or imported without going through a
//! calendar store at all.

mod generate;

pub use generate::generate_ics;
