//! Shared test utilities: series builders and an in-memory data source.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use foresight::feed::DataSource;
use foresight::interval::ExternalInterval;
use foresight::models::prediction::PredictionResponse;
use foresight::models::{Candle, InstrumentKey, Prediction, Series};
use foresight::{ForesightError, Result};

/// Public market data endpoint used by the live tests.
pub const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";

/// Open time of the first candle built by [`series`] (2023-11-14T22:13:20Z).
pub const BASE_TIME: i64 = 1_700_000_000;

/// Spacing between candles built by [`series`].
pub const DAY: i64 = 86_400;

/// Clock pinned to [`BASE_TIME`] plus one hundred days.
pub fn fixed_clock() -> i64 {
    BASE_TIME + 100 * DAY
}

/// Builds a daily series whose candles close at `closes`, each opening at
/// the previous close, with ten units of volume per candle.
pub fn series(closes: &[Decimal]) -> Series {
    let mut open = closes.first().copied().unwrap_or(Decimal::ONE);
    let rows = closes.iter().enumerate().map(|(i, &close)| {
        let candle = Candle {
            time: BASE_TIME + i as i64 * DAY,
            open,
            high: open.max(close) + Decimal::ONE,
            low: open.min(close) - Decimal::ONE,
            close,
        };
        open = close;
        (candle, dec!(10))
    });
    Series::from_rows(rows.collect::<Vec<_>>()).expect("valid test series")
}

/// Builds a prediction for `key` the way the prediction feed would.
pub fn prediction(key: &InstrumentKey, predicted: Decimal, current: Option<Decimal>) -> Prediction {
    PredictionResponse {
        predicted_price: Some(predicted),
        current_price: current,
        ..Default::default()
    }
    .into_prediction(key)
    .expect("valid test prediction")
}

/// In-memory [`DataSource`] keyed by symbol.
///
/// Unknown symbols fail with a parse-class error. Price calls whose
/// zero-based index is listed in `failing_price_calls` fail with one too.
#[derive(Default)]
pub struct MockSource {
    pub series: HashMap<String, Series>,
    pub prices: HashMap<String, Decimal>,
    pub predictions: HashMap<String, (Decimal, Option<Decimal>)>,
    pub failing_price_calls: Vec<usize>,
    price_calls: AtomicUsize,
    priced_symbols: Mutex<Vec<String>>,
    predicted_keys: Mutex<Vec<InstrumentKey>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, series: Series) -> Self {
        self.series.insert(symbol.to_string(), series);
        self
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_prediction(
        mut self,
        symbol: &str,
        predicted: Decimal,
        current: Option<Decimal>,
    ) -> Self {
        self.predictions
            .insert(symbol.to_string(), (predicted, current));
        self
    }

    /// Number of price fetches attempted so far.
    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    /// Symbols of every price fetch, in call order.
    pub fn priced_symbols(&self) -> Vec<String> {
        self.priced_symbols.lock().unwrap().clone()
    }

    /// Number of prediction fetches made for `symbol` so far.
    pub fn prediction_calls(&self, symbol: &str) -> usize {
        self.predicted_keys
            .lock()
            .unwrap()
            .iter()
            .filter(|key| key.symbol() == symbol)
            .count()
    }
}

fn missing(what: &str, symbol: &str) -> ForesightError {
    ForesightError::MalformedPayload(format!("no {what} for {symbol}"))
}

#[async_trait]
impl DataSource for MockSource {
    async fn fetch_series(&self, symbol: &str, _interval: ExternalInterval) -> Result<Series> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| missing("series", symbol))
    }

    async fn fetch_last_price(&self, symbol: &str) -> Result<Decimal> {
        let call = self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.priced_symbols.lock().unwrap().push(symbol.to_string());
        if self.failing_price_calls.contains(&call) {
            return Err(ForesightError::MalformedPayload(format!(
                "simulated failure on call {call}"
            )));
        }
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| missing("price", symbol))
    }

    async fn fetch_prediction(&self, key: &InstrumentKey) -> Result<Prediction> {
        self.predicted_keys.lock().unwrap().push(key.clone());
        let (predicted, current) = self
            .predictions
            .get(key.symbol())
            .copied()
            .ok_or_else(|| missing("prediction", key.symbol()))?;
        Ok(prediction(key, predicted, current))
    }
}
