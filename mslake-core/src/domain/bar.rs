//! DailyBar — the fundamental output unit of the converter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single security on a single day.
///
/// Prices carry the legacy rounding policy applied by the sanitizer
/// (5 decimals below 10.0, 3 decimals at or above). Volume is carried
/// through at its native precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl DailyBar {
    /// Basic OHLC consistency check: high covers every other price and
    /// low is covered by them.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close > 0.0
    }
}
