//! mslake core — Metastock binary decoding and data-lake conversion.
//!
//! This crate migrates legacy Metastock price databases into a
//! resolution-partitioned daily bar archive plus a ticker-identity
//! map-file registry:
//! - MBF (Microsoft Basic floating-point) to IEEE-754 conversion
//! - MASTER index and `F{n}.dat` price record decoding
//! - Recursive discovery of securities in a legacy directory tree
//! - Time-series sanitizing (gap reset, rounding, price repair)
//! - Map-file registry maintenance and zipped daily CSV output

pub mod convert;
pub mod decode;
pub mod domain;
pub mod lake;
pub mod mapfile;
pub mod mbf;
pub mod sanitize;
pub mod walker;

pub use convert::{run, ConvertConfig, ConvertError, ConvertSummary};
