//! Shared models for the chart engine and its external providers.
//!
//! Contains the instrument key (symbol + timeframe), candle and volume
//! series, prediction records, and the wire shapes of the market data,
//! prediction, and backtest endpoints.

pub mod backtest;
pub mod candle;
pub mod prediction;
pub mod ticker;

use std::fmt;

pub use candle::{Candle, Direction, Series, VolumeBar};
pub use prediction::Prediction;

/// Chart timeframes offered for prediction and candle display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Timeframe {
    M30,
    H1,
    H4,
    #[default]
    D1,
    W1,
    Mo1,
}

impl Timeframe {
    /// Every supported timeframe, shortest first.
    pub const ALL: [Timeframe; 6] = [
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::Mo1,
    ];

    /// Parses a timeframe code (`"30m"`, `"1h"`, `"4h"`, `"1d"`, `"1w"`, `"1M"`).
    ///
    /// Codes are case-sensitive: `"1m"` is not a month.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "30m" => Some(Timeframe::M30),
            "1h" => Some(Timeframe::H1),
            "4h" => Some(Timeframe::H4),
            "1d" => Some(Timeframe::D1),
            "1w" => Some(Timeframe::W1),
            "1M" => Some(Timeframe::Mo1),
            _ => None,
        }
    }

    /// Returns the wire code sent to the prediction service.
    pub fn code(&self) -> &'static str {
        match self {
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            Timeframe::Mo1 => "1M",
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M30 => "30 Min",
            Timeframe::H1 => "1 Hour",
            Timeframe::H4 => "4 Hours",
            Timeframe::D1 => "1 Day",
            Timeframe::W1 => "1 Week",
            Timeframe::Mo1 => "1 Month",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Identifies which chart is active: a symbol paired with a timeframe.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstrumentKey {
    symbol: String,
    timeframe: Timeframe,
}

impl InstrumentKey {
    /// Creates a key, upper-casing the symbol (`"btcusdt"` → `"BTCUSDT"`).
    pub fn new(symbol: impl AsRef<str>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_uppercase(),
            timeframe,
        }
    }

    /// Upper-cased trading pair, e.g. `"BTCUSDT"`.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.timeframe)
    }
}
