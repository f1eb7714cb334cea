//! Byte-level decoding of the legacy Metastock record layouts.
//!
//! A data folder holds one MASTER index file (53-byte header followed
//! by 53-byte security entries) and numbered `F{n}.dat` price files
//! whose record width depends on the per-security field count (5, 6 or
//! 7 four-byte fields). All multi-byte integers are little-endian, and
//! every numeric field is an MBF single (see [`crate::mbf`]).
//!
//! The original format was defined as a packed in-memory structure
//! overlay; this module decodes it with explicit ordered reads instead,
//! preserving the exact offsets and widths.

use crate::mbf::msbin_to_ieee;
use chrono::NaiveDate;
use std::io::Read;
use thiserror::Error;

/// Width of the MASTER header and of each security entry.
pub const MASTER_RECORD_LEN: u64 = 53;

/// Structured error types for record decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("truncated read while decoding {0}")]
    Truncated(&'static str),

    #[error("invalid legacy date value {0}")]
    InvalidDate(i32),

    #[error("unsupported field count {0} (expected 5, 6 or 7)")]
    UnsupportedFieldCount(u8),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn read_bytes<const N: usize>(
    reader: &mut impl Read,
    context: &'static str,
) -> Result<[u8; N], DecodeError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => DecodeError::Truncated(context),
        _ => DecodeError::Io(e),
    })?;
    Ok(buf)
}

fn read_u8(reader: &mut impl Read, context: &'static str) -> Result<u8, DecodeError> {
    Ok(read_bytes::<1>(reader, context)?[0])
}

fn read_u16(reader: &mut impl Read, context: &'static str) -> Result<u16, DecodeError> {
    Ok(u16::from_le_bytes(read_bytes::<2>(reader, context)?))
}

fn read_u32(reader: &mut impl Read, context: &'static str) -> Result<u32, DecodeError> {
    Ok(u32::from_le_bytes(read_bytes::<4>(reader, context)?))
}

/// Decode a fixed-width, blank-padded text buffer.
///
/// The prefix up to the first NUL (or the full buffer when no NUL is
/// present) is interpreted as text, then trailing whitespace is
/// trimmed.
fn fixed_width_text(buf: &[u8]) -> String {
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).trim_end().to_string()
}

/// The 53-byte header at the start of a MASTER file.
#[derive(Debug, Clone, Copy)]
pub struct MasterHeader {
    /// Number of security entries the index claims to hold.
    pub num_files: u16,
    /// Number to assign to the next new `F{n}` file.
    pub next_file: u16,
}

impl MasterHeader {
    /// Read the header, consuming exactly [`MASTER_RECORD_LEN`] bytes.
    pub fn read(reader: &mut impl Read) -> Result<Self, DecodeError> {
        let num_files = read_u16(reader, "MASTER header")?;
        let next_file = read_u16(reader, "MASTER header")?;
        read_bytes::<49>(reader, "MASTER header")?;
        Ok(Self {
            num_files,
            next_file,
        })
    }
}

/// One 53-byte security entry from the MASTER index.
#[derive(Debug, Clone)]
pub struct SecurityEntry {
    /// The `n` of the `F{n}.dat` file holding this security's prices.
    pub file_num: u8,
    /// Computrac file type marker.
    pub file_type: [u8; 2],
    /// Record length in the data file, in bytes.
    pub record_length: u8,
    /// Fields per record in the data file; 5, 6 or 7.
    pub fields: u8,
    /// Security display name.
    pub name: String,
    /// Version 2.8 flag.
    pub version_flag: u8,
    /// First date in the data file, MBF-encoded.
    pub first_date: u32,
    /// Last date in the data file, MBF-encoded.
    pub last_date: u32,
    /// Time period code: one of IDWMQY. Only daily ('D') is supported.
    pub period: u8,
    /// Intraday time base.
    pub intraday_time: u16,
    /// Ticker symbol as stored, blank padded.
    pub symbol: String,
    /// ASCII '*' when marked for autorun.
    pub autorun: u8,
}

impl SecurityEntry {
    /// Read one entry, consuming exactly [`MASTER_RECORD_LEN`] bytes.
    pub fn read(reader: &mut impl Read) -> Result<Self, DecodeError> {
        const CTX: &str = "MASTER security entry";
        let file_num = read_u8(reader, CTX)?;
        let file_type = read_bytes::<2>(reader, CTX)?;
        let record_length = read_u8(reader, CTX)?;
        let fields = read_u8(reader, CTX)?;
        read_bytes::<2>(reader, CTX)?; // reserved
        let name = fixed_width_text(&read_bytes::<16>(reader, CTX)?);
        read_bytes::<1>(reader, CTX)?; // reserved
        let version_flag = read_u8(reader, CTX)?;
        let first_date = read_u32(reader, CTX)?;
        let last_date = read_u32(reader, CTX)?;
        let period = read_u8(reader, CTX)?;
        let intraday_time = read_u16(reader, CTX)?;
        let symbol = fixed_width_text(&read_bytes::<14>(reader, CTX)?);
        read_bytes::<1>(reader, CTX)?; // reserved
        let autorun = read_u8(reader, CTX)?;
        read_bytes::<1>(reader, CTX)?; // reserved
        Ok(Self {
            file_num,
            file_type,
            record_length,
            fields,
            name,
            version_flag,
            first_date,
            last_date,
            period,
            intraday_time,
            symbol,
            autorun,
        })
    }

    /// Validate the field count invariant; anything outside {5, 6, 7}
    /// marks a corrupt entry.
    pub fn validated_fields(&self) -> Result<u8, DecodeError> {
        match self.fields {
            5..=7 => Ok(self.fields),
            other => Err(DecodeError::UnsupportedFieldCount(other)),
        }
    }
}

/// One decoded OHLCV sample from an `F{n}.dat` file.
///
/// All numeric fields are decoded eagerly at read time. The date is
/// kept in its raw MBF form because turning it into a calendar date can
/// fail per record; callers use [`legacy_date`] and skip on error.
#[derive(Debug, Clone, Copy)]
pub struct PriceRecord {
    /// Raw MBF-encoded packed date (see [`legacy_date`]).
    pub date: u32,
    /// Absent from 5-field files; decodes as 0.0 there.
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
    pub volume: f32,
    /// Only present in 7-field files; decodes as 0.0 otherwise.
    pub open_interest: f32,
}

impl PriceRecord {
    /// Read one record of `fields` four-byte columns.
    ///
    /// Returns the record and the number of bytes consumed
    /// (`fields * 4`), so the caller can track stream position without
    /// re-seeking.
    pub fn read(reader: &mut impl Read, fields: u8) -> Result<(Self, u64), DecodeError> {
        const CTX: &str = "price record";
        if !(5..=7).contains(&fields) {
            return Err(DecodeError::UnsupportedFieldCount(fields));
        }
        let date = read_u32(reader, CTX)?;
        let open = if fields >= 6 {
            msbin_to_ieee(read_u32(reader, CTX)?)
        } else {
            0.0
        };
        let high = msbin_to_ieee(read_u32(reader, CTX)?);
        let low = msbin_to_ieee(read_u32(reader, CTX)?);
        let close = msbin_to_ieee(read_u32(reader, CTX)?);
        let volume = msbin_to_ieee(read_u32(reader, CTX)?);
        let open_interest = if fields >= 7 {
            msbin_to_ieee(read_u32(reader, CTX)?)
        } else {
            0.0
        };
        Ok((
            Self {
                date,
                open,
                high,
                low,
                close,
                volume,
                open_interest,
            },
            u64::from(fields) * 4,
        ))
    }
}

/// Decode a raw MBF date field into a calendar date.
///
/// The decoded float holds an integer of the form `YYMMDD` counted from
/// 1900: `1010203` is 2001-02-03. A zero decode is the legacy "no date"
/// sentinel and fails, as does any triple that is not a real calendar
/// day; callers recover by skipping the record.
pub fn legacy_date(raw: u32) -> Result<NaiveDate, DecodeError> {
    let yymmdd = msbin_to_ieee(raw) as i32;
    if yymmdd <= 0 {
        return Err(DecodeError::InvalidDate(yymmdd));
    }
    let year = yymmdd / 10_000 + 1900;
    let month = (yymmdd % 10_000) / 100;
    let day = yymmdd % 100;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .ok_or(DecodeError::InvalidDate(yymmdd))
}
