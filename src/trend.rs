//! Trend and sentiment classification of a predicted move.

use rust_decimal::Decimal;
use serde::Serialize;

/// Derived view of a predicted move away from the current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendResult {
    /// `predicted - current`.
    pub absolute_change: Decimal,
    /// `absolute_change / current * 100`.
    pub percent_change: Decimal,
    /// Strictly positive change only; an unchanged price is bearish.
    pub is_bullish: bool,
    /// `|percent_change| * 20 + 50`, clamped into `[0, 100]`.
    pub sentiment_strength: Decimal,
}

const SENTIMENT_SCALE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
const SENTIMENT_BASE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Classifies the move from `current_price` to `predicted_price`.
///
/// # Panics
///
/// Panics if `current_price` is zero, or if the change overflows `Decimal`.
/// Use [`checked_classify`] for prices that have not been range checked.
pub fn classify(current_price: Decimal, predicted_price: Decimal) -> TrendResult {
    assert!(
        !current_price.is_zero(),
        "trend classification requires a non-zero current price"
    );

    match checked_classify(current_price, predicted_price) {
        Some(trend) => trend,
        None => panic!("trend classification overflowed: {current_price} -> {predicted_price}"),
    }
}

/// Like [`classify`], but returns `None` instead of panicking when
/// `current_price` is zero or the percent change does not fit in a `Decimal`.
///
/// Sentiment strength saturates at 100 rather than overflowing.
pub fn checked_classify(current_price: Decimal, predicted_price: Decimal) -> Option<TrendResult> {
    if current_price.is_zero() {
        return None;
    }

    let absolute_change = predicted_price.checked_sub(current_price)?;
    let percent_change = absolute_change
        .checked_div(current_price)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    let sentiment_strength = percent_change
        .abs()
        .checked_mul(SENTIMENT_SCALE)
        .and_then(|s| s.checked_add(SENTIMENT_BASE))
        .unwrap_or(Decimal::ONE_HUNDRED)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);

    Some(TrendResult {
        absolute_change,
        percent_change,
        is_bullish: absolute_change > Decimal::ZERO,
        sentiment_strength,
    })
}
