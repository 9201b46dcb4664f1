//! Chart state engine.
//!
//! [`ChartEngine`] owns the authoritative view of the active chart: the
//! instrument key, its candle/volume series, the last applied prediction,
//! the live price, and the overlay handles drawn for that prediction.
//!
//! The engine never performs I/O. Selecting a key returns [`Command`]s for
//! the caller to execute; each fetch carries a [`Ticket`], and a completion
//! is applied only while its ticket is still the latest one issued for the
//! active key. Anything else is a stale response and is discarded.

pub mod overlay;
pub mod snapshot;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::ForesightError;
use crate::interval::{ExternalInterval, lookahead_horizon};
use crate::models::{Direction, InstrumentKey, Prediction, Series};
use crate::trend::{TrendResult, checked_classify};
use overlay::{OverlayState, OverlaySurface, PredictionOverlay, PriceLine, ZoneBand};
use snapshot::{ChartSnapshot, Degradation, DisplayStatus, Failure, LegendSnapshot};

/// Zone padding above the higher and below the lower price (2%).
const ZONE_PADDING: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Lifecycle of the active chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// No instrument key selected.
    #[default]
    Empty,
    /// A series fetch for the active key has not succeeded yet.
    Loading,
    /// A series for the active key is present.
    Ready,
}

/// Identifies one outstanding request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub key: InstrumentKey,
    pub seq: u64,
}

/// Work the engine asks its owner to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch the series for the ticket's key.
    FetchSeries {
        ticket: Ticket,
        interval: ExternalInterval,
    },
    /// Fetch the prediction for the ticket's key.
    FetchPrediction(Ticket),
    /// Poll the live price of this symbol, replacing any previous poller.
    WatchPrice(String),
    /// Restart the background prediction refresh timer.
    RestartRefresh,
}

/// Outcome of reconciling an asynchronous completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconcile {
    Applied,
    /// The request was superseded or its key is no longer active.
    Stale,
}

/// Owns chart state and reconciles asynchronous updates into it.
pub struct ChartEngine<S: OverlaySurface> {
    surface: S,
    key: Option<InstrumentKey>,
    phase: Phase,
    series: Arc<Series>,
    prediction: Option<Prediction>,
    last_price: Option<Decimal>,
    overlay: OverlayState,
    drawn: Option<PredictionOverlay>,
    hover: Option<i64>,
    next_seq: u64,
    series_seq: Option<u64>,
    prediction_seq: Option<u64>,
    degradation: Degradation,
    clock: fn() -> i64,
}

impl<S: OverlaySurface> ChartEngine<S> {
    /// Creates an engine in the [`Phase::Empty`] state drawing onto `surface`.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            key: None,
            phase: Phase::Empty,
            series: Arc::default(),
            prediction: None,
            last_price: None,
            overlay: OverlayState::default(),
            drawn: None,
            hover: None,
            next_seq: 0,
            series_seq: None,
            prediction_seq: None,
            degradation: Degradation::default(),
            clock: unix_now,
        }
    }

    /// Replaces the wall clock used to anchor the prediction zone.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn key(&self) -> Option<&InstrumentKey> {
        self.key.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.overlay
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Makes `key` the active instrument.
    ///
    /// Selecting the active key again is a no-op. Otherwise the old key's
    /// overlays are removed, its series, prediction, and failures are
    /// dropped, and fetches for the new key are requested. The live price
    /// survives a timeframe-only change.
    pub fn set_instrument_key(&mut self, key: InstrumentKey) -> Vec<Command> {
        if self.key.as_ref() == Some(&key) {
            return Vec::new();
        }

        let symbol_changed =
            self.key.as_ref().map(InstrumentKey::symbol) != Some(key.symbol());
        info!(%key, "Switching instrument");

        self.clear_overlay();
        self.series = Arc::default();
        self.prediction = None;
        self.hover = None;
        self.degradation = Degradation::default();
        if symbol_changed {
            self.last_price = None;
        }
        self.key = Some(key.clone());
        self.phase = Phase::Loading;

        let series_ticket = self.issue(&key);
        self.series_seq = Some(series_ticket.seq);
        let prediction_ticket = self.issue(&key);
        self.prediction_seq = Some(prediction_ticket.seq);

        let mut commands = vec![
            Command::FetchSeries {
                ticket: series_ticket,
                interval: ExternalInterval::from(key.timeframe()),
            },
            Command::FetchPrediction(prediction_ticket),
        ];
        if symbol_changed {
            commands.push(Command::WatchPrice(key.symbol().to_string()));
        }
        commands.push(Command::RestartRefresh);
        commands
    }

    /// Requests a fresh prediction for the active key, superseding any
    /// prediction request still in flight.
    pub fn refresh_prediction(&mut self) -> Option<Command> {
        let key = self.key.clone()?;
        let ticket = self.issue(&key);
        self.prediction_seq = Some(ticket.seq);
        debug!(%key, seq = ticket.seq, "Refreshing prediction");
        Some(Command::FetchPrediction(ticket))
    }

    /// Replaces the series for the ticket's key.
    ///
    /// Overlays are left alone, except that a prediction which arrived
    /// before its series is drawn now.
    pub fn apply_series(&mut self, ticket: &Ticket, series: Series) -> Reconcile {
        if !self.is_current(ticket, self.series_seq) {
            debug!(key = %ticket.key, seq = ticket.seq, "Discarding stale series");
            return Reconcile::Stale;
        }
        self.series_seq = None;

        if series.is_empty() {
            let error =
                ForesightError::MalformedPayload(format!("no candles returned for {}", ticket.key));
            warn!(key = %ticket.key, "Series fetch failed: {error}");
            self.degradation.series = Some(Failure::from_error(&error));
            return Reconcile::Applied;
        }

        info!(key = %ticket.key, candles = series.len(), "Applied series");
        self.series = Arc::new(series);
        self.phase = Phase::Ready;
        self.hover = None;
        self.degradation.series = None;

        if self.overlay.is_empty()
            && let Some(prediction) = &self.prediction
        {
            match self.plan_overlay(prediction) {
                Ok(overlay) => self.draw_overlay(overlay),
                Err(e) => {
                    warn!(key = %ticket.key, "Cannot draw prediction: {e}");
                    self.degradation.prediction = Some(Failure::from_error(&e));
                }
            }
        }
        Reconcile::Applied
    }

    /// Records a failed series fetch, keeping any series already shown.
    pub fn fail_series(&mut self, ticket: &Ticket, error: &ForesightError) -> Reconcile {
        if !self.is_current(ticket, self.series_seq) {
            debug!(key = %ticket.key, seq = ticket.seq, "Discarding stale series failure");
            return Reconcile::Stale;
        }
        self.series_seq = None;

        warn!(key = %ticket.key, "Series fetch failed: {error}");
        self.degradation.series = Some(Failure::from_error(error));
        Reconcile::Applied
    }

    /// Applies a prediction (or its absence) for the ticket's key and
    /// rebuilds the overlay to match.
    ///
    /// A prediction whose overlay cannot be computed is recorded as a
    /// failure and the last good prediction stays in place.
    pub fn apply_prediction(
        &mut self,
        ticket: &Ticket,
        prediction: Option<Prediction>,
    ) -> Reconcile {
        if !self.is_current(ticket, self.prediction_seq) {
            debug!(key = %ticket.key, seq = ticket.seq, "Discarding stale prediction");
            return Reconcile::Stale;
        }
        self.prediction_seq = None;

        let planned = match &prediction {
            Some(p) => self.plan_overlay(p),
            None => Ok(None),
        };
        match planned {
            Ok(overlay) => {
                self.prediction = prediction;
                self.degradation.prediction = None;
                self.draw_overlay(overlay);
            }
            Err(e) => {
                warn!(key = %ticket.key, "Rejected prediction: {e}");
                self.degradation.prediction = Some(Failure::from_error(&e));
            }
        }
        Reconcile::Applied
    }

    /// Records a failed prediction fetch, keeping the last good prediction.
    pub fn fail_prediction(&mut self, ticket: &Ticket, error: &ForesightError) -> Reconcile {
        if !self.is_current(ticket, self.prediction_seq) {
            debug!(key = %ticket.key, seq = ticket.seq, "Discarding stale prediction failure");
            return Reconcile::Stale;
        }
        self.prediction_seq = None;

        warn!(key = %ticket.key, "Prediction fetch failed: {error}");
        self.degradation.prediction = Some(Failure::from_error(error));
        Reconcile::Applied
    }

    /// Records a live price tick for `symbol`.
    pub fn apply_price(&mut self, symbol: &str, price: Decimal) -> Reconcile {
        if !self.is_active_symbol(symbol) || price <= Decimal::ZERO {
            debug!(symbol, "Discarding price tick");
            return Reconcile::Stale;
        }
        self.last_price = Some(price);
        self.degradation.price = None;
        Reconcile::Applied
    }

    /// Records a failed price tick for `symbol`, keeping the last price.
    pub fn fail_price(&mut self, symbol: &str, error: &ForesightError) -> Reconcile {
        if !self.is_active_symbol(symbol) {
            return Reconcile::Stale;
        }
        self.degradation.price = Some(Failure::from_error(error));
        Reconcile::Applied
    }

    /// Points the legend at the candle opening at `hover`, or back at the
    /// last candle when `None`.
    pub fn update_legend(&mut self, hover: Option<i64>) {
        self.hover = hover;
    }

    /// Current legend values.
    pub fn legend(&self) -> Option<LegendSnapshot> {
        self.hover
            .and_then(|time| self.series.at(time))
            .or_else(|| self.series.last())
            .map(|(candle, volume)| LegendSnapshot::from_pair(candle, volume))
    }

    /// Trend of the active prediction against the best known current price.
    pub fn trend(&self) -> Option<TrendResult> {
        let prediction = self.prediction.as_ref()?;
        let current = self
            .last_price
            .or(prediction.current_price)
            .or_else(|| self.series.last().map(|(c, _)| c.close))
            .filter(|p| *p > Decimal::ZERO)?;
        checked_classify(current, prediction.predicted_price)
    }

    /// Builds the read-model for the presentation layer.
    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            key: self.key.clone(),
            status: self.status(),
            series: Arc::clone(&self.series),
            legend: self.legend(),
            trend: self.trend(),
            prediction: self.prediction.clone(),
            last_price: self.last_price,
            overlay: self.drawn.clone(),
            prediction_pending: self.prediction_seq.is_some(),
            degradation: self.degradation.clone(),
        }
    }

    /// Removes every overlay and returns to [`Phase::Empty`].
    ///
    /// Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.key.is_some() {
            info!("Tearing down chart state");
        }
        self.clear_overlay();
        self.key = None;
        self.phase = Phase::Empty;
        self.series = Arc::default();
        self.prediction = None;
        self.last_price = None;
        self.hover = None;
        self.series_seq = None;
        self.prediction_seq = None;
        self.degradation = Degradation::default();
    }

    fn status(&self) -> DisplayStatus {
        match self.phase {
            Phase::Empty => DisplayStatus::Empty,
            Phase::Loading if self.degradation.series.is_some() => DisplayStatus::Failed,
            Phase::Loading => DisplayStatus::Loading,
            Phase::Ready if self.degradation.is_degraded() => DisplayStatus::Stale,
            Phase::Ready => DisplayStatus::Live,
        }
    }

    fn issue(&mut self, key: &InstrumentKey) -> Ticket {
        self.next_seq += 1;
        Ticket {
            key: key.clone(),
            seq: self.next_seq,
        }
    }

    fn is_current(&self, ticket: &Ticket, latest: Option<u64>) -> bool {
        self.key.as_ref() == Some(&ticket.key) && latest == Some(ticket.seq)
    }

    fn is_active_symbol(&self, symbol: &str) -> bool {
        self.key.as_ref().is_some_and(|k| k.symbol() == symbol)
    }

    fn clear_overlay(&mut self) {
        self.overlay.clear(&mut self.surface);
        self.drawn = None;
    }

    /// Computes the overlay for `prediction` over the current series.
    ///
    /// Returns `Ok(None)` while the series is empty. Prices whose zone or
    /// trend would overflow `Decimal` are a malformed payload.
    fn plan_overlay(&self, prediction: &Prediction) -> crate::Result<Option<PredictionOverlay>> {
        let Some((last, _)) = self.series.last() else {
            return Ok(None);
        };

        let reference = prediction
            .current_price
            .or(self.last_price)
            .unwrap_or(last.close);
        let predicted = prediction.predicted_price;
        let out_of_range = || {
            ForesightError::MalformedPayload(format!(
                "predicted price {predicted} against {reference} is out of range"
            ))
        };

        let trend = checked_classify(reference, predicted).ok_or_else(out_of_range)?;
        let upper = reference
            .max(predicted)
            .checked_mul(Decimal::ONE + ZONE_PADDING)
            .ok_or_else(out_of_range)?;
        let lower = reference
            .min(predicted)
            .checked_mul(Decimal::ONE - ZONE_PADDING)
            .ok_or_else(out_of_range)?;
        let direction = if trend.is_bullish {
            Direction::Up
        } else {
            Direction::Down
        };

        let from = (self.clock)();
        let horizon = lookahead_horizon(prediction.key.timeframe()).as_secs() as i64;
        Ok(Some(PredictionOverlay {
            line: PriceLine {
                price: predicted,
                direction,
            },
            zone: ZoneBand {
                from,
                to: from + horizon,
                upper,
                lower,
                direction,
            },
        }))
    }

    /// Replaces the drawn overlay with `overlay`.
    ///
    /// Old handles are always removed before new ones are created.
    fn draw_overlay(&mut self, overlay: Option<PredictionOverlay>) {
        self.clear_overlay();
        let Some(drawn) = overlay else {
            return;
        };

        self.overlay.price_line = Some(self.surface.create_price_line(drawn.line.clone()));
        self.overlay.zone = Some(self.surface.create_zone(drawn.zone.clone()));
        debug!(
            predicted = %drawn.line.price,
            direction = ?drawn.line.direction,
            "Drew prediction overlay"
        );
        self.drawn = Some(drawn);
    }
}

impl<S: OverlaySurface> Drop for ChartEngine<S> {
    fn drop(&mut self) {
        self.clear_overlay();
    }
}

/// Seconds since the Unix epoch.
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
