//! Last traded price model.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Response of the `ticker/price` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}
