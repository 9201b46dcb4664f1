//! Chart synchronization engine.
//!
//! Keeps a candle/volume series for the selected instrument in step with a
//! market data provider, polls the live price, and reconciles price
//! prediction overlays against the active chart, discarding responses that
//! arrive after the user has moved on to another instrument.

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod feed;
pub mod interval;
pub mod models;
pub mod poller;
pub mod trend;

pub use error::{ForesightError, Result};
