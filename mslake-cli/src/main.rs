//! mslake CLI — convert legacy Metastock data into the data-lake layout.
//!
//! Commands:
//! - `convert` — decode a Metastock tree and write daily bar archives
//!   plus ticker-identity map files
//! - `instruments` — list every discoverable security without converting

use anyhow::Result;
use clap::{Parser, Subcommand};
use mslake_core::walker::list_instruments;
use mslake_core::{run, ConvertConfig, ConvertSummary};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mslake",
    about = "mslake — Metastock to data-lake converter"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a Metastock tree and write the daily bar archive and map
    /// files. Overwrites any existing output for the market.
    Convert {
        /// Source directory of unzipped Metastock data.
        #[arg(long)]
        source_dir: PathBuf,

        /// Destination data-lake root directory.
        #[arg(long)]
        destination_dir: PathBuf,

        /// Market tag used in the output layout.
        #[arg(long, default_value = "metastock")]
        market: String,

        /// Emit the run summary as JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List ticker, name and marketplace for every discoverable security.
    Instruments {
        /// Source directory of unzipped Metastock data.
        #[arg(long)]
        source_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert {
            source_dir,
            destination_dir,
            market,
            json,
        } => run_convert(source_dir, destination_dir, market, json),
        Commands::Instruments { source_dir } => run_instruments(&source_dir),
    }
}

fn run_convert(
    source_dir: PathBuf,
    destination_dir: PathBuf,
    market: String,
    json: bool,
) -> Result<()> {
    let config = ConvertConfig {
        source_dir,
        destination_dir,
        market,
    };
    let summary = run(&config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn run_instruments(source_dir: &Path) -> Result<()> {
    let mut instruments = list_instruments(source_dir)?;
    instruments.sort_by(|a, b| a.ticker.cmp(&b.ticker));

    if instruments.is_empty() {
        println!("No securities found under {}", source_dir.display());
        return Ok(());
    }

    println!("{:<12} {:<20} {}", "Ticker", "Marketplace", "Name");
    println!("{}", "-".repeat(52));
    for inst in &instruments {
        println!("{:<12} {:<20} {}", inst.ticker, inst.marketplace, inst.name);
    }
    println!();
    println!("{} securities", instruments.len());
    Ok(())
}

fn print_summary(summary: &ConvertSummary) {
    println!();
    println!("=== Conversion Result ===");
    println!("Securities seen:    {}", summary.securities_seen);
    println!("Securities written: {}", summary.securities_written);
    println!("Securities empty:   {}", summary.securities_empty);
    println!("Records skipped:    {}", summary.records_skipped);
    println!();
}
