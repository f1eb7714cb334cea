//! Domain types shared across the converter.

pub mod bar;
pub mod instrument;

pub use bar::DailyBar;
pub use instrument::InstrumentInfo;
