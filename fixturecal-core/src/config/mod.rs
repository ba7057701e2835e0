//! Configuration for fixturecal.
//!
//! Global settings live in ~/.config/fixturecal/config.toml. Each schedule
//! is its own TOML file inside `schedules_dir`.

mod global;
mod schedule;

pub use global::GlobalConfig;
pub use schedule::{Schedule, ScheduleConfig};
