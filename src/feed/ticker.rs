//! Last traded price retrieval.

use reqwest::Client;
use rust_decimal::Decimal;

use crate::Result;
use crate::models::ticker::TickerPrice;

/// Fetches the latest traded price for `symbol`.
///
/// # Errors
///
/// Returns [`ForesightError::Http`](crate::ForesightError::Http) on transport
/// failure, [`ForesightError::Json`](crate::ForesightError::Json) on an
/// unexpected body, and
/// [`ForesightError::MalformedPayload`](crate::ForesightError::MalformedPayload)
/// if the price is not positive.
pub async fn fetch_last_price(client: &Client, base_url: &str, symbol: &str) -> Result<Decimal> {
    let url = format!("{}/ticker/price", base_url.trim_end_matches('/'));

    let response = client
        .get(&url)
        .query(&[("symbol", symbol)])
        .send()
        .await?
        .error_for_status()?;

    let body = response.bytes().await?;
    let ticker: TickerPrice = serde_json::from_slice(&body)?;

    if ticker.price <= Decimal::ZERO {
        return Err(crate::ForesightError::MalformedPayload(format!(
            "{} reported non-positive price {}",
            ticker.symbol, ticker.price
        )));
    }

    Ok(ticker.price)
}
