//! Daily bar archive output in the standard data-lake layout.
//!
//! Layout under the destination root:
//! `equity/{market}/daily/{ticker}.zip` — one zip per security holding
//! `{ticker}.csv` with `yyyyMMdd 00:00,open,high,low,close,volume`
//! rows, prices scaled to integers by 10000 per the daily equity
//! convention. Map files live next to it under
//! `equity/{market}/map_files/`.

use crate::domain::DailyBar;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Daily equity prices are persisted as `price * 10000` integers.
pub const PRICE_SCALE: f64 = 10_000.0;

/// Structured error types for archive writes. These abort the whole
/// run: silently dropping output on a failing destination would be
/// worse than failing loudly.
#[derive(Debug, Error)]
pub enum LakeError {
    #[error("lake I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("zip error at {path}: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },
}

/// `{dest}/equity/{market}` — the root wiped and rebuilt per run.
pub fn market_root(destination: &Path, market: &str) -> PathBuf {
    destination.join("equity").join(market)
}

/// Directory holding the per-security daily archives.
pub fn daily_dir(destination: &Path, market: &str) -> PathBuf {
    market_root(destination, market).join("daily")
}

/// Directory holding the ticker-identity map files.
pub fn map_file_dir(destination: &Path, market: &str) -> PathBuf {
    market_root(destination, market).join("map_files")
}

fn scaled(price: f64) -> i64 {
    (price * PRICE_SCALE).round() as i64
}

/// Write one security's ordered bars as `{ticker}.zip`.
///
/// The archive is written to a `.tmp` sibling and renamed into place so
/// a crash never leaves a half-written file under the final name.
pub fn write_daily_zip(
    daily_dir: &Path,
    ticker: &str,
    bars: &[DailyBar],
) -> Result<PathBuf, LakeError> {
    fs::create_dir_all(daily_dir).map_err(|source| LakeError::Io {
        path: daily_dir.to_path_buf(),
        source,
    })?;

    let lower = ticker.to_lowercase();
    let path = daily_dir.join(format!("{lower}.zip"));
    let tmp = daily_dir.join(format!("{lower}.zip.tmp"));
    let io_err = |source| LakeError::Io {
        path: tmp.clone(),
        source,
    };

    let file = File::create(&tmp).map_err(io_err)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(format!("{lower}.csv"), options)
        .map_err(|source| LakeError::Zip {
            path: tmp.clone(),
            source,
        })?;
    for bar in bars {
        writeln!(
            zip,
            "{} 00:00,{},{},{},{},{}",
            bar.date.format("%Y%m%d"),
            scaled(bar.open),
            scaled(bar.high),
            scaled(bar.low),
            scaled(bar.close),
            bar.volume.round() as i64,
        )
        .map_err(io_err)?;
    }
    zip.finish().map_err(|source| LakeError::Zip {
        path: tmp.clone(),
        source,
    })?;

    fs::rename(&tmp, &path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        LakeError::Io {
            path: path.clone(),
            source,
        }
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Read;
    use zip::ZipArchive;

    fn sample_bars() -> Vec<DailyBar> {
        vec![
            DailyBar {
                date: NaiveDate::from_ymd_opt(2001, 2, 10).unwrap(),
                open: 10.25,
                high: 11.0,
                low: 10.0,
                close: 10.5,
                volume: 5000.0,
            },
            DailyBar {
                date: NaiveDate::from_ymd_opt(2001, 2, 11).unwrap(),
                open: 10.5,
                high: 10.75,
                low: 10.25,
                close: 10.6,
                volume: 6000.0,
            },
        ]
    }

    fn read_zip_csv(path: &Path, name: &str) -> String {
        let file = File::open(path).unwrap();
        let mut archive = ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn writes_scaled_daily_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_daily_zip(dir.path(), "VOLVY", &sample_bars()).unwrap();
        assert_eq!(path.file_name().unwrap(), "volvy.zip");

        let content = read_zip_csv(&path, "volvy.csv");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "20010210 00:00,102500,110000,100000,105000,5000");
        assert_eq!(lines[1], "20010211 00:00,105000,107500,102500,106000,6000");
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        write_daily_zip(dir.path(), "VOLVY", &sample_bars()).unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn layout_paths() {
        let dest = Path::new("/lake");
        assert_eq!(
            daily_dir(dest, "metastock"),
            Path::new("/lake/equity/metastock/daily")
        );
        assert_eq!(
            map_file_dir(dest, "metastock"),
            Path::new("/lake/equity/metastock/map_files")
        );
    }
}
