mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fixturecal_core::{FixtureError, GlobalConfig, Schedule};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fixturecal", version)]
#[command(about = "Mirror sports fixture pages into Google Calendar")]
struct Cli {
    /// Show every event and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every schedule and bring its calendar up to date
    Sync {
        /// Only operate on this schedule (by name)
        #[arg(short, long)]
        schedule: Option<String>,
    },
    /// Show what sync would change, without writing anything
    Status {
        /// Only operate on this schedule (by name)
        #[arg(short, long)]
        schedule: Option<String>,
    },
    /// Print the games parsed from a schedule's page
    Scrape {
        /// Schedule name
        name: String,
    },
    /// Write a schedule's games as an .ics file
    Export {
        /// Schedule name
        name: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = GlobalConfig::load().context("Failed to load fixturecal config")?;

    match cli.command {
        Commands::Sync { schedule } => {
            let schedules = resolve_schedules(&config, schedule.as_deref())?;
            commands::sync::run(&config, schedules, cli.verbose).await
        }
        Commands::Status { schedule } => {
            let schedules = resolve_schedules(&config, schedule.as_deref())?;
            commands::status::run(&config, schedules, cli.verbose).await
        }
        Commands::Scrape { name } => {
            let schedule = resolve_one(&config, &name)?;
            commands::scrape::run(&config, &schedule).await
        }
        Commands::Export { name, output } => {
            let schedule = resolve_one(&config, &name)?;
            commands::export::run(&config, &schedule, output.as_deref()).await
        }
    }
}

/// Logs go to stderr so they never mix with rendered output.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "fixturecal=debug"
    } else {
        "fixturecal=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_schedules(config: &GlobalConfig) -> Result<Vec<Schedule>> {
    match config.load_schedules() {
        Ok(schedules) => Ok(schedules),
        Err(FixtureError::NoSchedules(dir)) => anyhow::bail!(
            "No schedules found in {}.\n\n\
            Add one .toml file per schedule, for example:\n\n  \
            name = \"Shake Shaq\"\n  \
            url = \"https://sydneysocialbasketball.com.au/team/shake-shaq-6/\"\n  \
            color = \"tomato\"",
            dir.display()
        ),
        Err(e) => Err(e).context("Failed to load schedules"),
    }
}

fn resolve_schedules(config: &GlobalConfig, filter: Option<&str>) -> Result<Vec<Schedule>> {
    let schedules = load_schedules(config)?;

    match filter {
        Some(name) => {
            let available: Vec<_> = schedules.iter().map(|s| s.name.clone()).collect();
            match schedules.into_iter().find(|s| s.name == name) {
                Some(schedule) => Ok(vec![schedule]),
                None => anyhow::bail!(
                    "{}. Available: {}",
                    FixtureError::ScheduleNotFound(name.to_string()),
                    available.join(", ")
                ),
            }
        }
        None => Ok(schedules),
    }
}

fn resolve_one(config: &GlobalConfig, name: &str) -> Result<Schedule> {
    let mut schedules = resolve_schedules(config, Some(name))?;
    schedules
        .pop()
        .ok_or_else(|| FixtureError::ScheduleNotFound(name.to_string()).into())
}
