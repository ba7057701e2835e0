use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use fixturecal_core::ics::generate_ics;
use fixturecal_core::{EventSource, GlobalConfig, Schedule};
use tracing::info;

use crate::render::Render;
use crate::utils::tui;

pub async fn run(config: &GlobalConfig, schedule: &Schedule, output: Option<&Path>) -> Result<()> {
    let source = super::http_source(config)?;

    let spinner = tui::create_spinner(schedule.render());
    let events = source.fetch(schedule).await;
    spinner.finish_and_clear();
    let events = events?;

    let ics = generate_ics(schedule, &events, Utc::now())?;

    match output {
        Some(path) => {
            std::fs::write(path, &ics)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(games = events.len(), path = %path.display(), "exported schedule");
        }
        None => print!("{ics}"),
    }

    Ok(())
}
