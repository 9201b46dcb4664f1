//! Live API integration tests against the public market data endpoint.
//!
//! These tests require network access.
//! Run with: `cargo test --features integration-tests`

#![cfg(feature = "integration-tests")]

mod common;

use foresight::config::FeedConfig;
use foresight::feed::{DataSource, HttpFeed};
use foresight::interval::ExternalInterval;
use rust_decimal::Decimal;

use common::BINANCE_API_URL;

fn live_feed() -> HttpFeed {
    let config = FeedConfig {
        market_url: BINANCE_API_URL.to_string(),
        candle_limit: 10,
        ..FeedConfig::default()
    };
    HttpFeed::new(&config).expect("Failed to build HTTP client")
}

#[tokio::test]
async fn test_fetch_daily_series() {
    let series = live_feed()
        .fetch_series("BTCUSDT", ExternalInterval::OneDay)
        .await
        .expect("Failed to fetch klines");

    assert_eq!(series.len(), 10);
    let times: Vec<i64> = series.candles().iter().map(|c| c.time).collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_fetch_monthly_series() {
    let series = live_feed()
        .fetch_series("ETHUSDT", ExternalInterval::OneMonth)
        .await
        .expect("Failed to fetch monthly klines");

    assert!(!series.is_empty());
}

#[tokio::test]
async fn test_fetch_last_price() {
    let price = live_feed()
        .fetch_last_price("BTCUSDT")
        .await
        .expect("Failed to fetch ticker");

    assert!(price > Decimal::ZERO);
}

#[tokio::test]
async fn test_unknown_symbol_is_an_error() {
    let result = live_feed().fetch_last_price("NOTASYMBOL").await;
    assert!(result.is_err());
}
