//! Ticker-identity map files.
//!
//! A map file is the durable record of which date range a ticker was
//! valid: ordered `yyyyMMdd,ticker` rows terminated by a far-future
//! sentinel row. The converter only ever needs the two-row form —
//! earliest traded date plus sentinel — but must never duplicate or
//! reorder rows that already cover a date.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// Far-future "still valid" sentinel date.
pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2050, 12, 31).expect("sentinel date is valid")
}

const DATE_FORMAT: &str = "%Y%m%d";

/// Structured error types for map-file operations.
#[derive(Debug, Error)]
pub enum MapFileError {
    #[error("map file I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("malformed map file row in {path}: {row}")]
    MalformedRow { path: PathBuf, row: String },
}

/// One `(effective-date, ticker)` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFileRow {
    pub date: NaiveDate,
    pub ticker: String,
}

/// Path of a ticker's map file. Lowercasing here is load-bearing: it
/// must match on both read and write paths or lookups silently miss.
pub fn map_file_path(map_dir: &Path, ticker: &str) -> PathBuf {
    map_dir.join(format!("{}.csv", ticker.to_lowercase()))
}

/// Read the ordered rows of an existing map file.
pub fn read_rows(path: &Path) -> Result<Vec<MapFileRow>, MapFileError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|source| MapFileError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| MapFileError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let malformed = || MapFileError::MalformedRow {
            path: path.to_path_buf(),
            row: record.iter().collect::<Vec<_>>().join(","),
        };
        let date_field = record.get(0).ok_or_else(malformed)?;
        let ticker = record.get(1).ok_or_else(malformed)?;
        let date =
            NaiveDate::parse_from_str(date_field, DATE_FORMAT).map_err(|_| malformed())?;
        rows.push(MapFileRow {
            date,
            ticker: ticker.to_string(),
        });
    }
    Ok(rows)
}

/// Whether an ordered row set already maps the given date.
pub fn covers(rows: &[MapFileRow], date: NaiveDate) -> bool {
    match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => first.date <= date && date <= last.date,
        _ => false,
    }
}

/// Ensure a two-row registry covering `[first_date, sentinel]` exists
/// for the ticker.
///
/// Idempotent: when the existing file already covers `first_date`,
/// nothing is written. Returns `true` when a file was (re)written.
pub fn update(map_dir: &Path, ticker: &str, first_date: NaiveDate) -> Result<bool, MapFileError> {
    fs::create_dir_all(map_dir).map_err(|source| MapFileError::Io {
        path: map_dir.to_path_buf(),
        source,
    })?;

    let path = map_file_path(map_dir, ticker);
    if path.exists() {
        let rows = read_rows(&path)?;
        if covers(&rows, first_date) {
            trace!(ticker, date = %first_date, "map file already covers date");
            return Ok(false);
        }
    }

    let lower = ticker.to_lowercase();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .map_err(|source| MapFileError::Csv {
            path: path.clone(),
            source,
        })?;
    for row in [
        MapFileRow {
            date: first_date,
            ticker: lower.clone(),
        },
        MapFileRow {
            date: sentinel_date(),
            ticker: lower,
        },
    ] {
        writer
            .write_record([row.date.format(DATE_FORMAT).to_string(), row.ticker])
            .map_err(|source| MapFileError::Csv {
                path: path.clone(),
                source,
            })?;
    }
    writer.flush().map_err(|source| MapFileError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(true)
}
