//! Read-model handed to the presentation layer.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::overlay::PredictionOverlay;
use crate::error::FailureKind;
use crate::models::{Candle, Direction, InstrumentKey, Prediction, Series, VolumeBar};
use crate::trend::TrendResult;

/// OHLCV values shown in the chart legend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegendSnapshot {
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub direction: Direction,
}

impl LegendSnapshot {
    pub(crate) fn from_pair(candle: &Candle, volume: &VolumeBar) -> Self {
        Self {
            time: candle.time,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: volume.value,
            direction: volume.direction,
        }
    }
}

/// A fetch failure kept for display until the next success of its kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub(crate) fn from_error(error: &crate::ForesightError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Latest failure per producer for the active key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Degradation {
    pub series: Option<Failure>,
    pub prediction: Option<Failure>,
    pub price: Option<Failure>,
}

impl Degradation {
    pub fn is_degraded(&self) -> bool {
        self.series.is_some() || self.prediction.is_some() || self.price.is_some()
    }
}

/// How the presentation layer should frame the chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayStatus {
    /// No instrument selected.
    #[default]
    Empty,
    /// Waiting on the first series for the active key.
    Loading,
    /// All producers healthy.
    Live,
    /// Data is displayed but at least one producer is failing.
    Stale,
    /// The series fetch failed and nothing can be displayed.
    Failed,
}

/// Consistent view of engine state at one instant.
#[derive(Clone, Debug, Default)]
pub struct ChartSnapshot {
    pub key: Option<InstrumentKey>,
    pub status: DisplayStatus,
    pub series: Arc<Series>,
    pub legend: Option<LegendSnapshot>,
    pub trend: Option<TrendResult>,
    pub prediction: Option<Prediction>,
    pub last_price: Option<Decimal>,
    pub overlay: Option<PredictionOverlay>,
    pub prediction_pending: bool,
    pub degradation: Degradation,
}

impl ChartSnapshot {
    pub fn candles(&self) -> &[Candle] {
        self.series.candles()
    }

    pub fn volume_bars(&self) -> &[VolumeBar] {
        self.series.volume()
    }

    pub fn overlay_present(&self) -> bool {
        self.overlay.is_some()
    }
}
