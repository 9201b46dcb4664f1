//! Prediction and backtest service requests.

use reqwest::Client;
use rust_decimal::Decimal;
use tracing::debug;

use crate::Result;
use crate::models::backtest::BacktestReport;
use crate::models::prediction::PredictionResponse;
use crate::models::{InstrumentKey, Prediction};

/// Fetches the current prediction for `key`.
///
/// Missing `confidence`/`accuracy` fields take their documented defaults.
///
/// # Errors
///
/// Returns [`ForesightError::Http`](crate::ForesightError::Http) on transport
/// failure or non-success status, and a parse-class error if the body is an
/// error report or lacks a usable `predicted_price`.
pub async fn fetch_prediction(
    client: &Client,
    base_url: &str,
    key: &InstrumentKey,
) -> Result<Prediction> {
    let url = format!("{}/predict", base_url.trim_end_matches('/'));

    let response = client
        .get(&url)
        .query(&[
            ("timeframe", key.timeframe().code()),
            ("symbol", key.symbol()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let body = response.bytes().await?;
    let raw: PredictionResponse = serde_json::from_slice(&body)?;
    let prediction = raw.into_prediction(key)?;
    debug!(%key, predicted = %prediction.predicted_price, "Fetched prediction");

    Ok(prediction)
}

/// Runs a strategy backtest over the last `days` days with `capital`.
///
/// # Errors
///
/// Returns [`ForesightError::Http`](crate::ForesightError::Http) on transport
/// failure or non-success status and
/// [`ForesightError::Json`](crate::ForesightError::Json) if the report
/// cannot be decoded.
pub async fn fetch_backtest(
    client: &Client,
    base_url: &str,
    days: u32,
    capital: Decimal,
) -> Result<BacktestReport> {
    let url = format!("{}/backtest", base_url.trim_end_matches('/'));
    let days = days.to_string();
    let capital = capital.to_string();

    let response = client
        .get(&url)
        .query(&[("days", days.as_str()), ("capital", capital.as_str())])
        .send()
        .await?
        .error_for_status()?;

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
