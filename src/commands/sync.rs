use anyhow::Result;
use fixturecal_core::reconcile::BatchReport;
use fixturecal_core::{
    CalendarStore, EventSource, FixtureResult, GlobalConfig, Report, Schedule, ScrapedEvent,
    reconcile, resolve_container,
};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::render::{ActionsRender, Render};
use crate::utils::tui;

pub async fn run(config: &GlobalConfig, schedules: Vec<Schedule>, verbose: bool) -> Result<()> {
    let source = super::http_source(config)?;

    let spinner = tui::create_spinner("Connecting to Google Calendar".to_string());
    let store = fixturecal_provider_google::connect().await;
    spinner.finish_and_clear();
    let store = store?;

    let (batch, failed) = sync_all(&source, &store, &schedules, verbose).await;
    summarize(&batch, &failed)
}

/// Sync every schedule in order. A failing schedule is reported and skipped;
/// the names of the failed ones are returned next to the reports.
pub(crate) async fn sync_all<E: EventSource, S: CalendarStore>(
    source: &E,
    store: &S,
    schedules: &[Schedule],
    verbose: bool,
) -> (BatchReport, Vec<String>) {
    let mut reports = Vec::new();
    let mut failed = Vec::new();

    for (i, schedule) in schedules.iter().enumerate() {
        // Only the fetch runs under the spinner; writes log to stderr.
        let spinner = tui::create_spinner(schedule.render());
        let scraped = source.fetch(schedule).await;
        spinner.finish_and_clear();

        println!("{}", schedule.render());

        let result = match scraped {
            Ok(scraped) => write_schedule(store, schedule, &scraped).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(report) => {
                println!("{}", report.render(verbose));
                reports.push(report);
            }
            Err(e) => {
                debug!(schedule = %schedule.name, error = ?e, "sync failed");
                println!("   {}", e.to_string().red());
                failed.push(schedule.name.clone());
            }
        }

        if i < schedules.len() - 1 {
            println!();
        }
    }

    (BatchReport(reports), failed)
}

async fn write_schedule<S: CalendarStore>(
    store: &S,
    schedule: &Schedule,
    scraped: &[ScrapedEvent],
) -> FixtureResult<Report> {
    let container_id = resolve_container(store, &schedule.name, &schedule.url).await?;
    reconcile(store, schedule, &container_id, scraped).await
}

/// Print run totals; any failed schedule makes the run fail.
fn summarize(batch: &BatchReport, failed: &[String]) -> Result<()> {
    let totals = batch.totals();
    if totals.writes() > 0 {
        println!(
            "\nSynced: {} inserted, {} updated, {} unchanged",
            totals.inserted, totals.patched, totals.skipped
        );
    }

    if !failed.is_empty() {
        anyhow::bail!("Sync failed for: {}", failed.join(", "));
    }

    Ok(())
}
