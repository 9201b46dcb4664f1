//! Prediction overlay primitives and their create/remove lifecycle.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Direction;

/// Opaque reference to a primitive drawn on an [`OverlaySurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayHandle(u64);

/// Horizontal line at the predicted price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PriceLine {
    pub price: Decimal,
    /// `Up` when the prediction is bullish.
    pub direction: Direction,
}

/// Shaded band projecting the prediction forward in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ZoneBand {
    /// Start of the band in Unix seconds.
    pub from: i64,
    /// End of the band in Unix seconds.
    pub to: i64,
    pub upper: Decimal,
    pub lower: Decimal,
    pub direction: Direction,
}

/// The pair of primitives drawn for the active prediction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PredictionOverlay {
    pub line: PriceLine,
    pub zone: ZoneBand,
}

/// A chart surface that can host overlay primitives.
///
/// Implementations hand out a fresh handle per creation. Removing a handle
/// that is not live must return `false` and leave the surface unchanged.
pub trait OverlaySurface {
    fn create_price_line(&mut self, line: PriceLine) -> OverlayHandle;

    fn create_zone(&mut self, zone: ZoneBand) -> OverlayHandle;

    /// Removes a primitive, returning whether it was live.
    fn remove(&mut self, handle: OverlayHandle) -> bool;
}

/// A primitive held by [`OverlayRegistry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    PriceLine(PriceLine),
    Zone(ZoneBand),
}

/// In-memory [`OverlaySurface`] tracking every live primitive.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    next_id: u64,
    live: BTreeMap<OverlayHandle, Primitive>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primitives currently drawn.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn get(&self, handle: OverlayHandle) -> Option<&Primitive> {
        self.live.get(&handle)
    }

    pub fn price_lines(&self) -> impl Iterator<Item = &PriceLine> {
        self.live.values().filter_map(|p| match p {
            Primitive::PriceLine(line) => Some(line),
            Primitive::Zone(_) => None,
        })
    }

    pub fn zones(&self) -> impl Iterator<Item = &ZoneBand> {
        self.live.values().filter_map(|p| match p {
            Primitive::Zone(zone) => Some(zone),
            Primitive::PriceLine(_) => None,
        })
    }

    fn insert(&mut self, primitive: Primitive) -> OverlayHandle {
        self.next_id += 1;
        let handle = OverlayHandle(self.next_id);
        self.live.insert(handle, primitive);
        handle
    }
}

impl OverlaySurface for OverlayRegistry {
    fn create_price_line(&mut self, line: PriceLine) -> OverlayHandle {
        self.insert(Primitive::PriceLine(line))
    }

    fn create_zone(&mut self, zone: ZoneBand) -> OverlayHandle {
        self.insert(Primitive::Zone(zone))
    }

    fn remove(&mut self, handle: OverlayHandle) -> bool {
        self.live.remove(&handle).is_some()
    }
}

/// Handles owned by the engine for the active instrument key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlayState {
    pub price_line: Option<OverlayHandle>,
    pub zone: Option<OverlayHandle>,
}

impl OverlayState {
    pub fn is_empty(&self) -> bool {
        self.price_line.is_none() && self.zone.is_none()
    }

    /// Removes every held handle from `surface`, leaving the state empty.
    ///
    /// Handles are taken before removal, so calling this twice removes each
    /// primitive exactly once.
    pub fn clear<S: OverlaySurface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(handle) = self.price_line.take() {
            surface.remove(handle);
        }
        if let Some(handle) = self.zone.take() {
            surface.remove(handle);
        }
    }
}
