//! Prediction service models.

use std::time::SystemTime;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::InstrumentKey;

/// Confidence assumed when the service omits it (85%).
pub const DEFAULT_CONFIDENCE: Decimal = Decimal::from_parts(85, 0, 0, false, 2);

/// Accuracy assumed when the service omits it (92%).
pub const DEFAULT_ACCURACY: Decimal = Decimal::from_parts(92, 0, 0, false, 2);

/// Raw body returned by `GET /predict`.
///
/// Every field is optional on the wire; an error body carries only
/// `error` and `message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub predicted_price: Option<Decimal>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub confidence: Option<Decimal>,
    /// Either a fraction (`0.925`) or a percentage (`92.5`).
    #[serde(default)]
    pub accuracy: Option<Decimal>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub correlation: Option<Decimal>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A predicted price for one instrument key.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub key: InstrumentKey,
    pub predicted_price: Decimal,
    /// Price the prediction was made against, when the service reported it.
    pub current_price: Option<Decimal>,
    /// Fraction in `[0, 1]`.
    pub confidence: Decimal,
    /// Fraction in `[0, 1]`.
    pub accuracy: Decimal,
    /// Service-side timestamp, verbatim.
    pub timestamp: Option<String>,
    pub model: Option<String>,
    /// Correlation multiplier applied to the base model's trend.
    pub correlation: Option<Decimal>,
    pub received_at: SystemTime,
}

impl PredictionResponse {
    /// Validates the body and converts it into a [`Prediction`] for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ForesightError::MalformedPayload`](crate::ForesightError::MalformedPayload)
    /// if the body is an error report, lacks `predicted_price`, carries a
    /// non-positive price, or echoes a symbol or timeframe other than `key`'s.
    pub fn into_prediction(self, key: &InstrumentKey) -> crate::Result<Prediction> {
        if let Some(error) = self.error {
            let detail = self.message.unwrap_or_default();
            return Err(crate::ForesightError::MalformedPayload(format!(
                "prediction service error: {error} {detail}"
            )));
        }

        if let Some(symbol) = &self.symbol
            && !symbol.trim().eq_ignore_ascii_case(key.symbol())
        {
            return Err(crate::ForesightError::MalformedPayload(format!(
                "prediction is for {symbol}, requested {key}"
            )));
        }
        if let Some(timeframe) = &self.timeframe
            && timeframe.trim() != key.timeframe().code()
        {
            return Err(crate::ForesightError::MalformedPayload(format!(
                "prediction is for timeframe {timeframe}, requested {key}"
            )));
        }

        let predicted_price = self.predicted_price.ok_or_else(|| {
            crate::ForesightError::MalformedPayload("missing predicted_price".into())
        })?;
        if predicted_price <= Decimal::ZERO {
            return Err(crate::ForesightError::MalformedPayload(format!(
                "predicted_price must be positive, got {predicted_price}"
            )));
        }

        let current_price = self.current_price.filter(|p| *p > Decimal::ZERO);

        let confidence = self
            .confidence
            .unwrap_or(DEFAULT_CONFIDENCE)
            .clamp(Decimal::ZERO, Decimal::ONE);

        let accuracy = match self.accuracy {
            Some(a) if a > Decimal::ONE => a / Decimal::ONE_HUNDRED,
            Some(a) => a,
            None => DEFAULT_ACCURACY,
        }
        .clamp(Decimal::ZERO, Decimal::ONE);

        Ok(Prediction {
            key: key.clone(),
            predicted_price,
            current_price,
            confidence,
            accuracy,
            timestamp: self.timestamp,
            model: self.model,
            correlation: self.correlation,
            received_at: SystemTime::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::Timeframe;

    fn key() -> InstrumentKey {
        InstrumentKey::new("BTCUSDT", Timeframe::D1)
    }

    #[test]
    fn missing_optionals_take_defaults() {
        let body: PredictionResponse =
            serde_json::from_str(r#"{"predicted_price": 87000.0}"#).unwrap();
        let p = body.into_prediction(&key()).unwrap();
        assert_eq!(p.predicted_price, dec!(87000));
        assert_eq!(p.confidence, dec!(0.85));
        assert_eq!(p.accuracy, dec!(0.92));
        assert!(p.current_price.is_none());
    }

    #[test]
    fn percentage_accuracy_is_normalized() {
        let body: PredictionResponse = serde_json::from_str(
            r#"{"predicted_price": 87000.0, "current_price": 86243.78, "accuracy": 92.5, "confidence": 0.8}"#,
        )
        .unwrap();
        let p = body.into_prediction(&key()).unwrap();
        assert_eq!(p.accuracy, dec!(0.925));
        assert_eq!(p.confidence, dec!(0.8));
        assert_eq!(p.current_price, Some(dec!(86243.78)));
    }

    #[test]
    fn error_body_is_rejected() {
        let body: PredictionResponse = serde_json::from_str(
            r#"{"error": "Model not loaded", "message": "Please train the model first"}"#,
        )
        .unwrap();
        let err = body.into_prediction(&key()).unwrap_err();
        assert!(err.to_string().contains("Model not loaded"));
    }

    #[test]
    fn matching_echo_is_accepted() {
        let body: PredictionResponse = serde_json::from_str(
            r#"{"predicted_price": 87000, "symbol": "BTCUSDT", "timeframe": "1d", "correlation": 1.0}"#,
        )
        .unwrap();
        let p = body.into_prediction(&key()).unwrap();
        assert_eq!(p.correlation, Some(dec!(1.0)));
    }

    #[test]
    fn echo_for_another_symbol_is_rejected() {
        let body: PredictionResponse = serde_json::from_str(
            r#"{"predicted_price": 87000, "symbol": "BTCUSDT", "timeframe": "1h"}"#,
        )
        .unwrap();
        let eth = InstrumentKey::new("ETHUSDT", Timeframe::H1);
        let err = body.into_prediction(&eth).unwrap_err();
        assert!(err.to_string().contains("prediction is for BTCUSDT"));
    }

    #[test]
    fn echo_for_another_timeframe_is_rejected() {
        let body: PredictionResponse = serde_json::from_str(
            r#"{"predicted_price": 87000, "symbol": "BTCUSDT", "timeframe": "1d"}"#,
        )
        .unwrap();
        let hourly = InstrumentKey::new("BTCUSDT", Timeframe::H1);
        assert!(body.into_prediction(&hourly).is_err());
    }

    #[test]
    fn non_positive_prediction_is_rejected() {
        let body = PredictionResponse {
            predicted_price: Some(dec!(0)),
            ..Default::default()
        };
        assert!(body.into_prediction(&key()).is_err());
    }
}
