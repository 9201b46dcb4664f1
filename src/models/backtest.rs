//! Strategy backtest report, passed through to presentation untouched.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Body returned by `GET /backtest`.
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestReport {
    /// Percent return over the run.
    pub total_return: Decimal,
    /// Percent of closed trades that were profitable.
    pub win_rate: Decimal,
    pub profit_factor: Decimal,
    /// Percent peak-to-trough drawdown.
    pub max_drawdown: Decimal,
    #[serde(default)]
    pub equity_curve: Vec<EquityPoint>,
    pub final_capital: Decimal,
    pub total_trades: u32,
    pub wins: u32,
    pub losses: u32,
}

/// One day of the backtest equity curve.
#[derive(Debug, Clone, Deserialize)]
pub struct EquityPoint {
    pub date: String,
    pub equity: Decimal,
    pub price: Decimal,
}
