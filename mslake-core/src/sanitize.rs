//! Time-series sanitizing and bar building.
//!
//! Raw decoded price records become [`DailyBar`]s under three policies,
//! applied in this order:
//! 1. records whose date cannot be constructed are skipped,
//! 2. a date gap above 30 calendar days wipes everything accumulated so
//!    far and restarts the series from the gap record,
//! 3. zero or inverted price fields are repaired from neighbors.
//!
//! The thresholds are behavioral contracts inherited from the legacy
//! converter and are pinned by tests; they are calibrated for daily
//! bars only.

use crate::decode::legacy_date;
use crate::domain::DailyBar;
use crate::walker::DiscoveredSecurity;
use tracing::trace;

/// A gap above this many calendar days marks a broken or discontinued
/// series.
pub const MAX_GAP_DAYS: i64 = 30;

/// Prices below this round to 5 decimals, at or above to 3.
pub const ROUNDING_BOUNDARY: f64 = 10.0;

/// Sanitized output for one security.
#[derive(Debug, Clone, Default)]
pub struct SanitizedSeries {
    /// Ordered daily bars; empty if every record was discarded.
    pub bars: Vec<DailyBar>,
    /// Records dropped for invalid dates.
    pub records_skipped: usize,
}

impl SanitizedSeries {
    /// Earliest valid bar date, used to seed the map-file registry.
    pub fn first_date(&self) -> Option<chrono::NaiveDate> {
        self.bars.first().map(|b| b.date)
    }
}

/// Apply the tick-size rounding convention: low-priced instruments keep
/// 5 decimals, high-priced 3.
pub fn round_price(price: f64) -> f64 {
    if price < ROUNDING_BOUNDARY {
        round_to(price, 5)
    } else {
        round_to(price, 3)
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Convert one security's decoded records into sanitized daily bars.
pub fn build_bars(security: &DiscoveredSecurity) -> SanitizedSeries {
    let mut series = SanitizedSeries::default();
    for record in &security.records {
        let date = match legacy_date(record.date) {
            Ok(date) => date,
            Err(e) => {
                trace!(ticker = %security.ticker, error = %e, "skipping record with invalid date");
                series.records_skipped += 1;
                continue;
            }
        };
        series.bars.push(DailyBar {
            date,
            open: round_price(f64::from(record.open)),
            high: round_price(f64::from(record.high)),
            low: round_price(f64::from(record.low)),
            close: round_price(f64::from(record.close)),
            volume: f64::from(record.volume),
        });
    }
    reset_on_gap(&mut series.bars, &security.ticker);
    repair_prices(&mut series.bars, &security.ticker);
    series
}

/// Drop everything before the last discontinuity.
///
/// Downstream consumers assume a single contiguous run per security, so
/// a gap above [`MAX_GAP_DAYS`] discards the whole accumulated history
/// and restarts from the record after the gap — a destructive reset,
/// not a localized skip.
fn reset_on_gap(bars: &mut Vec<DailyBar>, ticker: &str) {
    let mut run_start = 0;
    for i in 1..bars.len() {
        let gap = (bars[i].date - bars[i - 1].date).num_days();
        if gap > MAX_GAP_DAYS {
            trace!(ticker, date = %bars[i].date, gap, "time gap; restarting series");
            run_start = i;
        }
    }
    if run_start > 0 {
        bars.drain(..run_start);
    }
}

/// Repair zero and inverted price fields in place.
///
/// A zero close takes the previous close, a zero open takes the close,
/// and a low/high that is zero or on the wrong side of the close is
/// rebuilt from open and close.
fn repair_prices(bars: &mut [DailyBar], ticker: &str) {
    let mut prev_close = 0.0;
    for bar in bars.iter_mut() {
        let mut fixed = false;
        if bar.close == 0.0 {
            bar.close = prev_close;
            fixed = true;
        }
        if bar.open == 0.0 {
            bar.open = bar.close;
            fixed = true;
        }
        if bar.low == 0.0 || bar.low > bar.close {
            bar.low = bar.open.min(bar.close);
            fixed = true;
        }
        if bar.high == 0.0 || bar.high < bar.close {
            bar.high = bar.open.max(bar.close);
            fixed = true;
        }
        if fixed {
            trace!(ticker, date = %bar.date, "repaired inconsistent price fields");
        }
        prev_close = bar.close;
    }
}
