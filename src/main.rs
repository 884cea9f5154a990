//! cardsort: card-sorting experiment runner
//!
//! Usage:
//!   cardsort run --condition A_V1            → interactive terminal session
//!   cardsort simulate --participants 20      → seeded simulated participants
//!   cardsort conditions                      → list the condition registry
//!   cardsort dump-config                     → print the default config as TOML
//!   cardsort version                         → show version

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use cardsort::args::parse_accuracy;
use cardsort::logging::init_tracing;
use cardsort::terminal::{TerminalParticipant, TerminalRenderer};
use cardsort_core::{Condition, ExperimentConfig};
use cardsort_session::{
    write_json_pretty, ManualClock, NullRenderer, SessionReport, SessionRunner, SimulatedParticipant,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "cardsort",
    about = "Card-sorting experiment runner with demonstration, card-sort and transfer phases",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Write JSON logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one interactive session in the terminal
    Run {
        /// Condition name from the registry (default: NA(accidental))
        #[arg(short, long)]
        condition: Option<String>,
        /// Experiment config file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// RNG seed for trial generation (default: random)
        #[arg(long)]
        seed: Option<u64>,
        /// Where to write the session report (default: stdout)
        #[arg(short, long)]
        report: Option<PathBuf>,
        /// Demonstration speed multiplier; 0 plays without pauses
        #[arg(long, default_value_t = 1.0)]
        pace: f64,
    },
    /// Run simulated participants through a condition
    Simulate {
        #[arg(short, long)]
        condition: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Base seed; participant i uses seed + i for trials and its bitwise
        /// complement for responses
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(short, long, default_value_t = 1)]
        participants: u32,
        /// Probability that each simulated response is correct, in (0, 1]
        #[arg(short, long, default_value_t = 0.8, value_parser = parse_accuracy)]
        accuracy: f64,
        /// Abandon a participant whose phase runs this many trials unmet
        #[arg(long, default_value_t = 1000)]
        max_trials: u32,
        /// Write all reports as a JSON array
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// List known conditions
    Conditions {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default experiment config as TOML
    DumpConfig,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run {
            condition,
            config,
            seed,
            report,
            pace,
        } => {
            let condition = load_condition(config.as_deref(), condition.as_deref())?;
            run_interactive(condition, seed, report.as_deref(), pace).await?;
        }
        Commands::Simulate {
            condition,
            config,
            seed,
            participants,
            accuracy,
            max_trials,
            report,
        } => {
            let condition = load_condition(config.as_deref(), condition.as_deref())?;
            let limits = SimulationLimits {
                accuracy,
                max_trials,
            };
            simulate(condition, seed, participants, limits, report.as_deref()).await?;
        }
        Commands::Conditions { config } => {
            let config = load_config(config.as_deref())?;
            list_conditions(&config)?;
        }
        Commands::DumpConfig => {
            print!("{}", ExperimentConfig::default().to_toml()?);
        }
        Commands::Version => {
            println!("cardsort v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ExperimentConfig> {
    match path {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(ExperimentConfig::default()),
    }
}

fn load_condition(path: Option<&Path>, name: Option<&str>) -> anyhow::Result<Condition> {
    Ok(load_config(path)?.resolve(name)?)
}

fn list_conditions(config: &ExperimentConfig) -> anyhow::Result<()> {
    for name in config.condition_names() {
        match config.resolve(Some(name)) {
            Ok(c) => println!(
                "{name:<16} rule={} incidental={} demo={} cue={:?} criteria={}/{}",
                c.sorting_rule(),
                c.incidental(),
                if c.skip_demo() { "skip" } else { "play" },
                c.animation_cue(),
                c.card_sort_criterion(),
                c.transfer_criterion(),
            ),
            Err(e) => println!("{name:<16} invalid: {e}"),
        }
    }
    Ok(())
}

async fn run_interactive(
    condition: Condition,
    seed: Option<u64>,
    report_path: Option<&Path>,
    pace: f64,
) -> anyhow::Result<()> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let cancel = CancellationToken::new();
    let mut runner = SessionRunner::new(condition, rng).with_cancellation(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, abandoning session");
            cancel.cancel();
        }
    });

    let mut participant = TerminalParticipant::stdin();
    let mut renderer = TerminalRenderer::new(pace);
    let report = runner.run(&mut participant, &mut renderer).await?;
    emit_report(&report, report_path)
}

fn emit_report(report: &SessionReport, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => report.write_json(path)?,
        None => println!("{}", report.to_json_pretty()?),
    }
    Ok(())
}

struct SimulationLimits {
    accuracy: f64,
    max_trials: u32,
}

async fn simulate(
    condition: Condition,
    seed: u64,
    participants: u32,
    limits: SimulationLimits,
    report_path: Option<&Path>,
) -> anyhow::Result<()> {
    let mut reports = Vec::with_capacity(participants as usize);
    for i in 0..participants {
        let seed = seed.wrapping_add(u64::from(i));
        let clock = ManualClock::new(Utc::now());
        let mut participant = SimulatedParticipant::new(!seed, limits.accuracy)?
            .with_clock(clock.clone(), 800..=3000);
        let mut runner = SessionRunner::new(condition.clone(), StdRng::seed_from_u64(seed))
            .with_clock(Arc::new(clock))
            .with_trial_limit(limits.max_trials);

        let report = runner.run(&mut participant, &mut NullRenderer).await?;
        println!(
            "participant {:>3}: card-sort {} trials ({} to criterion, {:.3}s latency), transfer {} trials ({} to criterion, {:.3}s latency)",
            i + 1,
            report.card_sort.total_trials,
            report.card_sort.trials_to_criterion,
            report.card_sort.switch_latency_seconds,
            report.transfer.total_trials,
            report.transfer.trials_to_criterion,
            report.transfer.switch_latency_seconds,
        );
        reports.push(report);
    }

    if let Some(path) = report_path {
        write_json_pretty(&reports, path)?;
        tracing::info!(count = reports.len(), "Wrote reports to {}", path.display());
    }
    Ok(())
}
