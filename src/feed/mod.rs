//! HTTP clients for the market data and prediction providers.
//!
//! This module is organized by endpoint:
//! - [`candles`] - Kline retrieval and normalization into a [`Series`]
//! - [`ticker`] - Last traded price
//! - [`prediction`] - Price prediction and strategy backtest
//!
//! Each fetch is a stateless function returning a value; [`HttpFeed`] bundles
//! a shared `reqwest::Client` with the configured endpoints and implements
//! [`DataSource`], the seam the driver and poller depend on.

mod candles;
mod prediction;
mod ticker;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;

use crate::Result;
use crate::config::FeedConfig;
use crate::interval::ExternalInterval;
use crate::models::backtest::BacktestReport;
use crate::models::{InstrumentKey, Prediction, Series};

// Re-export submodule functions at the module level for convenience
pub use candles::{fetch_series, parse_klines};
pub use prediction::{fetch_backtest, fetch_prediction};
pub use ticker::fetch_last_price;

/// Source of candles, live prices, and predictions.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Fetches the candle/volume series for `symbol` at `interval`.
    async fn fetch_series(&self, symbol: &str, interval: ExternalInterval) -> Result<Series>;

    /// Fetches the last traded price for `symbol`.
    async fn fetch_last_price(&self, symbol: &str) -> Result<Decimal>;

    /// Fetches the prediction for `key`.
    async fn fetch_prediction(&self, key: &InstrumentKey) -> Result<Prediction>;
}

/// [`DataSource`] backed by the REST endpoints in [`FeedConfig`].
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    market_url: String,
    prediction_url: String,
    candle_limit: u32,
}

impl HttpFeed {
    /// Builds a feed with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ForesightError::Http`](crate::ForesightError::Http) if the
    /// HTTP client cannot be constructed.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Builds a feed around a pre-configured client.
    pub fn with_client(client: Client, config: &FeedConfig) -> Self {
        Self {
            client,
            market_url: config.market_url.clone(),
            prediction_url: config.prediction_url.clone(),
            candle_limit: config.candle_limit,
        }
    }

    /// Runs a strategy backtest on the prediction service.
    ///
    /// # Errors
    ///
    /// See [`fetch_backtest`].
    pub async fn backtest(&self, days: u32, capital: Decimal) -> Result<BacktestReport> {
        fetch_backtest(&self.client, &self.prediction_url, days, capital).await
    }
}

#[async_trait]
impl DataSource for HttpFeed {
    async fn fetch_series(&self, symbol: &str, interval: ExternalInterval) -> Result<Series> {
        candles::fetch_series(
            &self.client,
            &self.market_url,
            symbol,
            interval,
            self.candle_limit,
        )
        .await
    }

    async fn fetch_last_price(&self, symbol: &str) -> Result<Decimal> {
        ticker::fetch_last_price(&self.client, &self.market_url, symbol).await
    }

    async fn fetch_prediction(&self, key: &InstrumentKey) -> Result<Prediction> {
        prediction::fetch_prediction(&self.client, &self.prediction_url, key).await
    }
}
