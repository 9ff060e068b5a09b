//! echodrill command-line front end
//!
//! Segments transcripts, edits the per-item cut plan and runs practice
//! schedules against a simulated transport.

mod commands;
mod state;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    estimate::EstimateArgs, flag::FlagArgs, mark::MarkArgs, rehearse::RehearseArgs,
    segment::SegmentArgs, tune::TuneArgs,
};

/// Shadowing and repetition practice for narrated audio.
#[derive(Parser)]
#[command(name = "echodrill", version)]
struct Cli {
    /// Directory holding saved cut plans (defaults to the platform data dir).
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a word-timed transcript into sentences.
    Segment(SegmentArgs),
    /// Predict how long a practice run will take.
    Estimate(EstimateArgs),
    /// Run a practice schedule on the simulated transport.
    Rehearse(RehearseArgs),
    /// Insert a pause or hard-word marker into a sentence.
    Mark(MarkArgs),
    /// Nudge the fine-tune offsets of a segment.
    Tune(TuneArgs),
    /// Flag or unflag a sentence for practice.
    Flag(FlagArgs),
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = state::open_store(cli.store_dir)?;

    match cli.command {
        Command::Segment(args) => commands::segment::run(&store, args).await,
        Command::Estimate(args) => commands::estimate::run(&store, args).await,
        Command::Rehearse(args) => commands::rehearse::run(&store, args).await,
        Command::Mark(args) => commands::mark::run(&store, args).await,
        Command::Tune(args) => commands::tune::run(&store, args).await,
        Command::Flag(args) => commands::flag::run(&store, args).await,
    }
}
