//! OHLCV candle and volume series models.

use rust_decimal::Decimal;
use serde::Serialize;

/// A single OHLC candlestick bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candle {
    /// Bucket open time in seconds since the Unix epoch.
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Candle {
    /// Whether the candle closed at or above its open.
    pub fn direction(&self) -> Direction {
        if self.close >= self.open {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Checks positivity and high/low envelope invariants.
    fn check(&self) -> Result<(), String> {
        if [self.open, self.high, self.low, self.close]
            .iter()
            .any(|p| *p <= Decimal::ZERO)
        {
            return Err(format!("candle at {} has a non-positive price", self.time));
        }
        if self.high < self.open.max(self.close) || self.low > self.open.min(self.close) {
            return Err(format!(
                "candle at {} breaks its high/low envelope",
                self.time
            ));
        }
        Ok(())
    }
}

/// Colour class for a volume bar, derived from its candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Down,
}

/// Traded volume for one candle, index-aligned with its candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeBar {
    pub time: i64,
    pub value: Decimal,
    pub direction: Direction,
}

/// Candles paired 1:1 with volume bars, ordered by strictly increasing time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    candles: Vec<Candle>,
    volume: Vec<VolumeBar>,
}

impl Series {
    /// Builds a series from `(candle, volume)` rows in source order.
    ///
    /// # Errors
    ///
    /// Returns [`ForesightError::MalformedPayload`](crate::ForesightError::MalformedPayload)
    /// if a price is non-positive, a high/low envelope is violated, a volume
    /// is negative, or times are not strictly increasing.
    pub fn from_rows(rows: impl IntoIterator<Item = (Candle, Decimal)>) -> crate::Result<Self> {
        let mut candles: Vec<Candle> = Vec::new();
        let mut volume = Vec::new();

        for (candle, traded) in rows {
            candle.check().map_err(crate::ForesightError::MalformedPayload)?;
            if traded < Decimal::ZERO {
                return Err(crate::ForesightError::MalformedPayload(format!(
                    "candle at {} has negative volume",
                    candle.time
                )));
            }
            if let Some(prev) = candles.last()
                && candle.time <= prev.time
            {
                return Err(crate::ForesightError::MalformedPayload(format!(
                    "candle time {} does not follow {}",
                    candle.time, prev.time
                )));
            }

            volume.push(VolumeBar {
                time: candle.time,
                value: traded,
                direction: candle.direction(),
            });
            candles.push(candle);
        }

        Ok(Self { candles, volume })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn volume(&self) -> &[VolumeBar] {
        &self.volume
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Returns the last candle and its volume bar.
    pub fn last(&self) -> Option<(&Candle, &VolumeBar)> {
        self.candles.last().zip(self.volume.last())
    }

    /// Finds the candle/volume pair whose open time equals `time`.
    pub fn at(&self, time: i64) -> Option<(&Candle, &VolumeBar)> {
        let idx = self.candles.binary_search_by_key(&time, |c| c.time).ok()?;
        Some((&self.candles[idx], &self.volume[idx]))
    }
}
