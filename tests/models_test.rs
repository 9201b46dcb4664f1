use rust_decimal_macros::dec;

use foresight::ForesightError;
use foresight::interval::{ExternalInterval, map_timeframe};
use foresight::models::backtest::BacktestReport;
use foresight::models::prediction::PredictionResponse;
use foresight::models::{Candle, InstrumentKey, Series, Timeframe};

fn candle(time: i64, open: rust_decimal::Decimal, close: rust_decimal::Decimal) -> Candle {
    Candle {
        time,
        open,
        high: open.max(close),
        low: open.min(close),
        close,
    }
}

#[test]
fn keys_differ_by_timeframe() {
    let daily = InstrumentKey::new("btcusdt", Timeframe::D1);
    let hourly = InstrumentKey::new("BTCUSDT", Timeframe::H1);

    assert_eq!(daily.symbol(), hourly.symbol());
    assert_ne!(daily, hourly);
    assert_eq!(daily, InstrumentKey::new("BTCUSDT", Timeframe::D1));
}

#[test]
fn unknown_timeframe_falls_back_to_daily() {
    assert_eq!(map_timeframe("2h"), ExternalInterval::OneDay);
    assert_eq!(map_timeframe(""), ExternalInterval::OneDay);
    assert_eq!(map_timeframe("1M"), ExternalInterval::OneMonth);
    assert_eq!(map_timeframe("30m"), ExternalInterval::ThirtyMinutes);
}

#[test]
fn series_pairs_volume_with_candles() {
    let series = Series::from_rows([
        (candle(60, dec!(10), dec!(12)), dec!(5)),
        (candle(120, dec!(12), dec!(11)), dec!(0)),
    ])
    .unwrap();

    assert_eq!(series.len(), series.volume().len());
    let (last, volume) = series.last().unwrap();
    assert_eq!(last.time, volume.time);
    assert_eq!(volume.value, dec!(0));
    assert!(series.at(90).is_none());
}

#[test]
fn series_rejects_out_of_order_candles() {
    let err = Series::from_rows([
        (candle(120, dec!(10), dec!(12)), dec!(5)),
        (candle(60, dec!(12), dec!(11)), dec!(5)),
    ])
    .unwrap_err();

    assert!(matches!(err, ForesightError::MalformedPayload(_)));
}

#[test]
fn series_rejects_broken_envelope() {
    let mut bad = candle(60, dec!(10), dec!(12));
    bad.high = dec!(11);

    assert!(Series::from_rows([(bad, dec!(1))]).is_err());
}

#[test]
fn empty_series_has_no_last_candle() {
    let series = Series::from_rows(Vec::new()).unwrap();
    assert!(series.is_empty());
    assert!(series.last().is_none());
}

#[test]
fn out_of_range_confidence_is_clamped() {
    let key = InstrumentKey::new("BTCUSDT", Timeframe::D1);
    let prediction = PredictionResponse {
        predicted_price: Some(dec!(87000)),
        confidence: Some(dec!(1.4)),
        accuracy: Some(dec!(-0.2)),
        current_price: Some(dec!(0)),
        ..Default::default()
    }
    .into_prediction(&key)
    .unwrap();

    assert_eq!(prediction.confidence, dec!(1));
    assert_eq!(prediction.accuracy, dec!(0));
    assert_eq!(prediction.current_price, None);
}

#[test]
fn backtest_without_equity_curve_decodes() {
    let json = r#"{
        "total_return": -3.1,
        "win_rate": 40,
        "profit_factor": 0.8,
        "max_drawdown": 12.4,
        "final_capital": 9690,
        "total_trades": 5,
        "wins": 2,
        "losses": 3
    }"#;

    let report: BacktestReport = serde_json::from_str(json).unwrap();

    assert_eq!(report.total_return, dec!(-3.1));
    assert!(report.equity_curve.is_empty());
    assert_eq!(report.total_trades, 5);
}

#[test]
fn key_symbol_is_always_normalized() {
    let key = InstrumentKey::new("  ethusdt\n", Timeframe::H4);
    assert_eq!(key.symbol(), "ETHUSDT");
    assert_eq!(key.timeframe(), Timeframe::H4);
    assert_eq!(key, InstrumentKey::new("ETHUSDT", Timeframe::H4));
}
