//! Instrument identity as discovered in a legacy data tree.

use serde::{Deserialize, Serialize};

/// Identity of one discoverable security: sanitized ticker, display
/// name, and the subfolder it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    pub ticker: String,
    pub name: String,
    /// Name of the subfolder the security's MASTER file lives in,
    /// typically a market or exchange grouping.
    pub marketplace: String,
}
