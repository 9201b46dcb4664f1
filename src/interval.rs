//! Mapping from chart timeframes to the market data interval vocabulary.

use std::time::Duration;

use crate::models::Timeframe;

/// How far the prediction zone extends to the right of "now".
///
/// Fixed at 30 days regardless of timeframe.
pub const ZONE_HORIZON: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Kline intervals understood by the market data provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExternalInterval {
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
    OneWeek,
    OneMonth,
}

impl ExternalInterval {
    /// Returns the `interval` query value for the klines endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalInterval::ThirtyMinutes => "30m",
            ExternalInterval::OneHour => "1h",
            ExternalInterval::FourHours => "4h",
            ExternalInterval::OneDay => "1d",
            ExternalInterval::OneWeek => "1w",
            ExternalInterval::OneMonth => "1M",
        }
    }
}

impl From<Timeframe> for ExternalInterval {
    fn from(tf: Timeframe) -> Self {
        match tf {
            Timeframe::M30 => ExternalInterval::ThirtyMinutes,
            Timeframe::H1 => ExternalInterval::OneHour,
            Timeframe::H4 => ExternalInterval::FourHours,
            Timeframe::D1 => ExternalInterval::OneDay,
            Timeframe::W1 => ExternalInterval::OneWeek,
            Timeframe::Mo1 => ExternalInterval::OneMonth,
        }
    }
}

/// Maps a timeframe code to a kline interval.
///
/// Unrecognized codes fall back to [`ExternalInterval::OneDay`].
pub fn map_timeframe(code: &str) -> ExternalInterval {
    Timeframe::parse(code)
        .map(ExternalInterval::from)
        .unwrap_or(ExternalInterval::OneDay)
}

/// Lookahead used for the prediction zone of a timeframe.
pub fn lookahead_horizon(_timeframe: Timeframe) -> Duration {
    ZONE_HORIZON
}
