use anyhow::Result;
use fixturecal_core::{EventSource, GlobalConfig, Schedule};
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui;

pub async fn run(config: &GlobalConfig, schedule: &Schedule) -> Result<()> {
    let source = super::http_source(config)?;

    let spinner = tui::create_spinner(schedule.render());
    let events = source.fetch(schedule).await;
    spinner.finish_and_clear();
    let events = events?;

    println!("{}", schedule.render());
    if events.is_empty() {
        println!("   {}", "No games on the page".dimmed());
    }
    for event in &events {
        println!("   {}", event.render());
    }

    Ok(())
}
