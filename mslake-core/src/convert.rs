//! End-to-end conversion driver: legacy tree in, data lake out.

use crate::lake::{self, LakeError};
use crate::mapfile::{self, MapFileError};
use crate::sanitize;
use crate::walker::{self, WalkError};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, trace};

/// Explicit configuration for one conversion run. Passed by value into
/// the driver; there is no ambient global state.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Root of the unzipped legacy Metastock tree.
    pub source_dir: PathBuf,
    /// Root of the destination data lake.
    pub destination_dir: PathBuf,
    /// Market tag used in the lake layout and map-file scoping.
    pub market: String,
}

impl ConvertConfig {
    pub fn new(source_dir: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            market: "metastock".to_string(),
        }
    }
}

/// Errors that abort a conversion run. Per-security decode problems are
/// logged and skipped inside the walker and sanitizer; only a missing
/// source tree or a failing destination gets this far.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("source directory {0} does not exist")]
    MissingSource(PathBuf),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Lake(#[from] LakeError),

    #[error(transparent)]
    MapFile(#[from] MapFileError),

    #[error("destination I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters for one conversion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConvertSummary {
    /// Securities discovered in the source tree.
    pub securities_seen: usize,
    /// Securities that produced an archive and a map-file update.
    pub securities_written: usize,
    /// Securities whose sanitized series came out empty.
    pub securities_empty: usize,
    /// Individual records dropped for invalid dates.
    pub records_skipped: usize,
}

/// Run a full conversion.
///
/// The destination `equity/{market}` folder is wiped and rebuilt, so
/// re-running over the same destination replaces earlier output.
pub fn run(config: &ConvertConfig) -> Result<ConvertSummary, ConvertError> {
    if !config.source_dir.is_dir() {
        return Err(ConvertError::MissingSource(config.source_dir.clone()));
    }

    let market_root = lake::market_root(&config.destination_dir, &config.market);
    if market_root.exists() {
        fs::remove_dir_all(&market_root)?;
    }
    let daily_dir = lake::daily_dir(&config.destination_dir, &config.market);
    let map_dir = lake::map_file_dir(&config.destination_dir, &config.market);
    fs::create_dir_all(&map_dir)?;

    let securities = walker::scan_tree(&config.source_dir)?;
    let mut summary = ConvertSummary::default();

    for security in &securities {
        summary.securities_seen += 1;
        let series = sanitize::build_bars(security);
        summary.records_skipped += series.records_skipped;

        let Some(first_date) = series.first_date() else {
            trace!(ticker = %security.ticker, "no valid bars; nothing written");
            summary.securities_empty += 1;
            continue;
        };

        lake::write_daily_zip(&daily_dir, &security.ticker, &series.bars)?;
        mapfile::update(&map_dir, &security.ticker, first_date)?;
        summary.securities_written += 1;
        trace!(ticker = %security.ticker, bars = series.bars.len(), "security written");
    }

    info!(
        seen = summary.securities_seen,
        written = summary.securities_written,
        empty = summary.securities_empty,
        skipped_records = summary.records_skipped,
        "conversion complete"
    );
    Ok(summary)
}
