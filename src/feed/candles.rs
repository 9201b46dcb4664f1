//! Kline (candle) retrieval and normalization.

use std::str::FromStr;

use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::interval::ExternalInterval;
use crate::models::{Candle, Series};

/// Fetches up to `limit` recent candles for `symbol` at `interval`.
///
/// # Errors
///
/// Returns [`ForesightError::Http`](crate::ForesightError::Http) on transport
/// failure or non-success status, and a parse-class error if the body is
/// not a well-formed kline array.
pub async fn fetch_series(
    client: &Client,
    base_url: &str,
    symbol: &str,
    interval: ExternalInterval,
    limit: u32,
) -> Result<Series> {
    let url = format!("{}/klines", base_url.trim_end_matches('/'));
    let limit = limit.to_string();

    let response = client
        .get(&url)
        .query(&[
            ("symbol", symbol),
            ("interval", interval.as_str()),
            ("limit", limit.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let body = response.bytes().await?;
    let series = parse_klines(&body)?;
    debug!(symbol, interval = interval.as_str(), candles = series.len(), "Fetched series");

    Ok(series)
}

/// Normalizes a kline payload into a [`Series`], preserving source order.
///
/// Each row is `[openTimeMs, open, high, low, close, volume, ...]`; price
/// and volume cells may be JSON strings or numbers.
///
/// # Errors
///
/// Returns [`ForesightError::Json`](crate::ForesightError::Json) if the body
/// is not a JSON array of arrays, or
/// [`ForesightError::MalformedPayload`](crate::ForesightError::MalformedPayload)
/// if a row is short, non-numeric, or breaks a candle invariant.
pub fn parse_klines(body: &[u8]) -> Result<Series> {
    let rows: Vec<Vec<Value>> = serde_json::from_slice(body)?;

    let parsed = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| parse_row(row).map_err(|e| malformed(idx, &e)))
        .collect::<Result<Vec<_>>>()?;

    Series::from_rows(parsed)
}

fn parse_row(row: &[Value]) -> std::result::Result<(Candle, Decimal), String> {
    if row.len() < 6 {
        return Err(format!("expected at least 6 cells, got {}", row.len()));
    }

    let open_time_ms = row[0]
        .as_i64()
        .ok_or_else(|| format!("open time is not an integer: {}", row[0]))?;

    let candle = Candle {
        time: open_time_ms / 1000,
        open: cell_decimal(&row[1], "open")?,
        high: cell_decimal(&row[2], "high")?,
        low: cell_decimal(&row[3], "low")?,
        close: cell_decimal(&row[4], "close")?,
    };
    let volume = cell_decimal(&row[5], "volume")?;

    Ok((candle, volume))
}

/// Reads a decimal from a string or number cell.
fn cell_decimal(cell: &Value, field: &str) -> std::result::Result<Decimal, String> {
    let text = match cell {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(format!("{field} is not a number: {other}")),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| format!("{field} is not a number: {text:?}"))
}

fn malformed(idx: usize, reason: &str) -> crate::ForesightError {
    crate::ForesightError::MalformedPayload(format!("kline row {idx}: {reason}"))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::FailureKind;
    use crate::models::Direction;

    const BODY: &str = r#"[
        [1700000000000, "37000.10", "37500.00", "36900.00", "37400.00", "1234.5", 1700086399999, "0", 10, "0", "0", "0"],
        [1700086400000, "37400.00", "37450.00", "36000.00", "36100.25", "2000", 1700172799999, "0", 12, "0", "0", "0"]
    ]"#;

    #[test]
    fn parses_binance_rows_in_order() {
        let series = parse_klines(BODY.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);

        let first = series.candles()[0];
        assert_eq!(first.time, 1_700_000_000);
        assert_eq!(first.open, dec!(37000.10));
        assert_eq!(first.close, dec!(37400.00));

        let vols = series.volume();
        assert_eq!(vols[0].value, dec!(1234.5));
        assert_eq!(vols[0].direction, Direction::Up);
        assert_eq!(vols[1].direction, Direction::Down);
        assert_eq!(vols[1].time, 1_700_086_400);
    }

    #[test]
    fn accepts_numeric_cells() {
        let body = r#"[[60000, 10.5, 11, 10, 10.75, 3]]"#;
        let series = parse_klines(body.as_bytes()).unwrap();
        assert_eq!(series.candles()[0].high, dec!(11));
        assert_eq!(series.volume()[0].value, dec!(3));
    }

    #[test]
    fn non_numeric_ohlc_is_a_parse_failure() {
        let body = r#"[[60000, "abc", "11", "10", "10.75", "3"]]"#;
        let err = parse_klines(body.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
        assert!(err.to_string().contains("kline row 0: open"));
    }

    #[test]
    fn short_rows_are_rejected() {
        let err = parse_klines(br#"[[60000, "1", "1", "1"]]"#).unwrap_err();
        assert!(err.to_string().contains("at least 6 cells"));
    }

    #[test]
    fn wrong_shape_is_a_parse_failure() {
        let err = parse_klines(br#"{"code": -1121, "msg": "Invalid symbol."}"#).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn empty_array_is_an_empty_series() {
        assert!(parse_klines(b"[]").unwrap().is_empty());
    }
}
