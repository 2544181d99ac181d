//! # Board Simulator
//!
//! Runs an executor, dependents and supervisors against one task board until
//! it drains or overloads, then prints a summary.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use taskboard::config::ConfigManager;
use taskboard::logging::init_structured_logging;
use taskboard::{Simulation, SimulationReport, Termination};

#[derive(Parser)]
#[command(name = "board-simulator")]
#[command(about = "Run producer, supervisor and executor roles against a shared task board")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration directory (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Environment name; selects taskboard.{environment}.toml
    #[arg(short, long)]
    environment: Option<String>,

    /// Number of dependent producers
    #[arg(long)]
    dependents: Option<usize>,

    /// Number of supervisors
    #[arg(long)]
    supervisors: Option<usize>,

    /// Pending tasks allowed before the board reports overload
    #[arg(long)]
    max_tasks: Option<usize>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let environment = cli
        .environment
        .unwrap_or_else(ConfigManager::detect_environment);
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir, &environment)
        .context("failed to load configuration")?;

    let mut config = manager.into_config();
    if let Some(dependents) = cli.dependents {
        config.simulation.dependents = dependents;
    }
    if let Some(supervisors) = cli.supervisors {
        config.simulation.supervisors = supervisors;
    }
    if let Some(max_tasks) = cli.max_tasks {
        config.executor.max_tasks = max_tasks;
    }

    init_structured_logging(&config.logging);

    let report = Simulation::new(config)
        .context("invalid simulation settings")?
        .run()
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &SimulationReport) {
    match report.termination {
        Some(Termination::Drained { executed }) => {
            println!("All tasks complete: {executed} executed");
        }
        Some(Termination::Overloaded { unfinished }) => {
            println!("Too many tasks: {unfinished} unfinished");
        }
        None => println!("Deadline passed before the board terminated"),
    }
    println!(
        "elapsed {}ms, added {}, executed {}, escalations {}, duplicates {}",
        report.elapsed_ms,
        report.stats.added,
        report.stats.executed,
        report.stats.escalations,
        report.stats.duplicates
    );
    for producer in &report.producers {
        println!(
            "  {:<16} submitted {:>4}  still tracking {:>4}",
            producer.name, producer.submitted, producer.outstanding
        );
    }
}
