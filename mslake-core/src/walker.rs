//! Discovery of securities in a legacy Metastock directory tree.
//!
//! Each subfolder (arbitrarily nested) may hold one `MASTER` index file
//! plus numbered `F{n}.dat` price files. The walk is depth-first and
//! synchronous; every file handle is closed before the next security is
//! touched, since real trees hold thousands of securities.

use crate::decode::{
    DecodeError, MasterHeader, PriceRecord, SecurityEntry, MASTER_RECORD_LEN,
};
use crate::domain::InstrumentInfo;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{trace, warn};

/// Index file name inside each data folder.
pub const MASTER_FILE: &str = "MASTER";

/// Errors that abort the whole walk. Per-security problems never
/// surface here; they are logged and the security is skipped or
/// yielded with zero records.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("cannot read source folder {path}: {source}")]
    Folder {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One discovered security with its full decoded price history.
#[derive(Debug, Clone)]
pub struct DiscoveredSecurity {
    /// Ticker with embedded spaces replaced by hyphens.
    pub ticker: String,
    pub name: String,
    /// Name of the folder the MASTER file was found in.
    pub marketplace: String,
    pub fields: u8,
    /// Chronologically ordered as stored in the data file.
    pub records: Vec<PriceRecord>,
}

/// Replace the spaces legacy tickers may contain; output identifiers
/// must not have any.
pub fn sanitize_ticker(symbol: &str) -> String {
    symbol.replace(' ', "-")
}

/// Recursively discover every security under `root`, decoding each
/// one's price history.
pub fn scan_tree(root: &Path) -> Result<Vec<DiscoveredSecurity>, WalkError> {
    let mut out = Vec::new();
    scan_folder(root, &mut out)?;
    Ok(out)
}

/// Recursively list instrument identities under `root` without decoding
/// any price file.
pub fn list_instruments(root: &Path) -> Result<Vec<InstrumentInfo>, WalkError> {
    let mut out = Vec::new();
    list_folder(root, &mut out)?;
    Ok(out)
}

fn subfolders(dir: &Path) -> Result<Vec<PathBuf>, WalkError> {
    let entries = fs::read_dir(dir).map_err(|source| WalkError::Folder {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| WalkError::Folder {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn folder_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn scan_folder(dir: &Path, out: &mut Vec<DiscoveredSecurity>) -> Result<(), WalkError> {
    for sub in subfolders(dir)? {
        scan_folder(&sub, out)?;
    }

    let marketplace = folder_name(dir);
    for entry in read_master(dir) {
        let fields = match entry.validated_fields() {
            Ok(fields) => fields,
            Err(e) => {
                warn!(folder = %dir.display(), symbol = %entry.symbol, error = %e,
                      "skipping corrupt MASTER entry");
                continue;
            }
        };
        let ticker = sanitize_ticker(&entry.symbol);
        if ticker.is_empty() {
            // Unaddressable downstream; expected in real trees.
            continue;
        }
        let records = read_price_file(&dir.join(format!("F{}.dat", entry.file_num)), fields);
        out.push(DiscoveredSecurity {
            ticker,
            name: entry.name,
            marketplace: marketplace.clone(),
            fields,
            records,
        });
    }
    Ok(())
}

fn list_folder(dir: &Path, out: &mut Vec<InstrumentInfo>) -> Result<(), WalkError> {
    for sub in subfolders(dir)? {
        list_folder(&sub, out)?;
    }

    let marketplace = folder_name(dir);
    for entry in read_master(dir) {
        if entry.validated_fields().is_err() {
            continue;
        }
        let ticker = sanitize_ticker(&entry.symbol);
        if ticker.is_empty() {
            continue;
        }
        out.push(InstrumentInfo {
            ticker,
            name: entry.name,
            marketplace: marketplace.clone(),
        });
    }
    Ok(())
}

/// Read every security entry from the folder's MASTER file, if one
/// exists. A truncated or unreadable index yields the entries decoded
/// so far.
fn read_master(dir: &Path) -> Vec<SecurityEntry> {
    let path = dir.join(MASTER_FILE);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(_) => return Vec::new(),
    };
    let size = match file.metadata() {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot stat MASTER file");
            return Vec::new();
        }
    };

    let mut reader = BufReader::new(file);
    if let Err(e) = MasterHeader::read(&mut reader) {
        warn!(path = %path.display(), error = %e, "cannot read MASTER header");
        return Vec::new();
    }

    let mut entries = Vec::new();
    let mut pos = MASTER_RECORD_LEN;
    while pos + MASTER_RECORD_LEN <= size {
        match SecurityEntry::read(&mut reader) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "abandoning MASTER scan");
                break;
            }
        }
        pos += MASTER_RECORD_LEN;
    }
    if pos < size {
        trace!(path = %path.display(), trailing = size - pos, "trailing bytes after last MASTER entry");
    }
    entries
}

/// Decode the full price history from one `F{n}.dat` file.
///
/// A missing file means the security simply has no history. The first
/// record-width slot is a file header and is discarded. Any decode
/// failure abandons the whole file: the security is treated as having
/// zero bars rather than a partial, possibly garbled history.
fn read_price_file(path: &Path, fields: u8) -> Vec<PriceRecord> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return Vec::new(),
    };
    let size = match file.metadata() {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot stat price file");
            return Vec::new();
        }
    };
    let mut reader = BufReader::new(file);

    // Leading header slot.
    let mut pos = match PriceRecord::read(&mut reader, fields) {
        Ok((_, consumed)) => consumed,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "abandoning truncated price file");
            return Vec::new();
        }
    };

    let width = u64::from(fields) * 4;
    let mut records = Vec::new();
    while pos + width <= size {
        match PriceRecord::read(&mut reader, fields) {
            Ok((record, consumed)) => {
                records.push(record);
                pos += consumed;
            }
            Err(e @ DecodeError::Truncated(_)) | Err(e @ DecodeError::Io(_)) => {
                warn!(path = %path.display(), error = %e, "abandoning truncated price file");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "abandoning unreadable price file");
                return Vec::new();
            }
        }
    }
    if pos < size {
        trace!(path = %path.display(), trailing = size - pos, "trailing bytes after last price record");
    }
    records
}
