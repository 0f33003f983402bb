//! Market data carriers consumed by aggregate queries

use crate::value_objects::{Price, Symbol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-of-book quote for an instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteTick {
    /// Instrument the quote is for
    pub symbol: Symbol,
    /// Best bid price
    pub bid: Price,
    /// Best ask price
    pub ask: Price,
    /// When the quote was observed
    pub timestamp: DateTime<Utc>,
}

impl QuoteTick {
    /// Create a new quote tick
    pub fn new(symbol: Symbol, bid: Price, ask: Price, timestamp: DateTime<Utc>) -> Self {
        Self { symbol, bid, ask, timestamp }
    }
}
