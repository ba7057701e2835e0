use anyhow::Result;
use fixturecal_core::reconcile::plan;
use fixturecal_core::{
    CalendarStore, EventSource, FixtureResult, GlobalConfig, Plan, Schedule, find_container,
};
use owo_colors::OwoColorize;

use crate::render::{ActionsRender, Render};
use crate::utils::tui;

pub async fn run(config: &GlobalConfig, schedules: Vec<Schedule>, verbose: bool) -> Result<()> {
    let source = super::http_source(config)?;

    let spinner = tui::create_spinner("Connecting to Google Calendar".to_string());
    let store = fixturecal_provider_google::connect().await;
    spinner.finish_and_clear();
    let store = store?;

    for (i, schedule) in schedules.iter().enumerate() {
        let spinner = tui::create_spinner(schedule.render());
        let result = preview(&source, &store, schedule).await;
        spinner.finish_and_clear();

        println!("{}", schedule.render());

        match result {
            Ok((plan, true)) => println!("{}", plan.render(verbose)),
            Ok((plan, false)) => {
                println!("   {}", "Calendar will be created".dimmed());
                println!("{}", plan.render(verbose));
            }
            Err(e) => println!("   {}", e.to_string().red()),
        }

        if i < schedules.len() - 1 {
            println!();
        }
    }

    Ok(())
}

/// Plan a sync without writing. The flag says whether the calendar exists.
async fn preview<E: EventSource, S: CalendarStore>(
    source: &E,
    store: &S,
    schedule: &Schedule,
) -> FixtureResult<(Plan, bool)> {
    let scraped = source.fetch(schedule).await?;

    match find_container(store, &schedule.name).await? {
        Some(container) => {
            let existing = store.list_events(&container.id, schedule.tag()).await?;
            Ok((plan(schedule, &scraped, &existing), true))
        }
        None => Ok((plan(schedule, &scraped, &[]), false)),
    }
}
