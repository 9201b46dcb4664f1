use rust_decimal_macros::dec;

use foresight::models::ticker::TickerPrice;

#[test]
fn deserialize_string_price() {
    let json = r#"{ "symbol": "BTCUSDT", "price": "86243.78000000" }"#;

    let ticker: TickerPrice = serde_json::from_str(json).unwrap();

    assert_eq!(ticker.symbol, "BTCUSDT");
    assert_eq!(ticker.price, dec!(86243.78));
}

#[test]
fn deserialize_numeric_price() {
    let json = r#"{ "symbol": "ETHUSDT", "price": 3210.55 }"#;

    let ticker: TickerPrice = serde_json::from_str(json).unwrap();

    assert_eq!(ticker.price, dec!(3210.55));
}

#[test]
fn missing_price_fails() {
    let json = r#"{ "symbol": "ETHUSDT" }"#;
    assert!(serde_json::from_str::<TickerPrice>(json).is_err());
}
