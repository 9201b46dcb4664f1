//! Application configuration loaded from environment variables.
//!
//! Every variable is optional:
//! - `FORESIGHT_MARKET_URL` - market data REST base URL
//! - `FORESIGHT_PREDICTION_URL` - prediction/backtest service base URL
//! - `FORESIGHT_CANDLE_LIMIT` - candles requested per series fetch
//! - `FORESIGHT_PRICE_POLL_MS` - live price poll cadence
//! - `FORESIGHT_PREDICTION_REFRESH_SECS` - background prediction refresh
//! - `FORESIGHT_HTTP_TIMEOUT_SECS` - per-request timeout

use std::time::Duration;

/// Default public market data endpoint.
const DEFAULT_MARKET_URL: &str = "https://api.binance.com/api/v3";

/// Default local prediction service endpoint.
const DEFAULT_PREDICTION_URL: &str = "http://127.0.0.1:5000/api";

const DEFAULT_CANDLE_LIMIT: u32 = 100;

/// Upper bound accepted by the klines endpoint.
const MAX_CANDLE_LIMIT: u32 = 1000;

const DEFAULT_PRICE_POLL: Duration = Duration::from_secs(1);
const DEFAULT_PREDICTION_REFRESH: Duration = Duration::from_secs(5 * 60);
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub cadence: CadenceConfig,
}

/// Endpoints and request shaping for the external providers.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub market_url: String,
    pub prediction_url: String,
    pub candle_limit: u32,
    pub http_timeout: Duration,
}

/// Timer cadences for the independent producers.
#[derive(Debug, Clone, Copy)]
pub struct CadenceConfig {
    pub price_poll: Duration,
    pub prediction_refresh: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            market_url: DEFAULT_MARKET_URL.to_string(),
            prediction_url: DEFAULT_PREDICTION_URL.to_string(),
            candle_limit: DEFAULT_CANDLE_LIMIT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            price_poll: DEFAULT_PRICE_POLL,
            prediction_refresh: DEFAULT_PREDICTION_REFRESH,
        }
    }
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`ForesightError::Config`](crate::ForesightError::Config) if a
/// numeric variable cannot be parsed or is out of range.
pub fn fetch_config() -> crate::Result<AppConfig> {
    config_from(non_empty_var)
}

/// Builds the configuration from an arbitrary variable lookup.
fn config_from(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<AppConfig> {
    let feed = FeedConfig {
        market_url: lookup("FORESIGHT_MARKET_URL")
            .unwrap_or_else(|| DEFAULT_MARKET_URL.to_string()),
        prediction_url: lookup("FORESIGHT_PREDICTION_URL")
            .unwrap_or_else(|| DEFAULT_PREDICTION_URL.to_string()),
        candle_limit: parse_var(&lookup, "FORESIGHT_CANDLE_LIMIT")?
            .unwrap_or(DEFAULT_CANDLE_LIMIT),
        http_timeout: parse_var(&lookup, "FORESIGHT_HTTP_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT),
    };

    if feed.candle_limit == 0 || feed.candle_limit > MAX_CANDLE_LIMIT {
        return Err(crate::ForesightError::Config(format!(
            "FORESIGHT_CANDLE_LIMIT must be between 1 and {MAX_CANDLE_LIMIT}, got {}",
            feed.candle_limit
        )));
    }

    let cadence = CadenceConfig {
        price_poll: parse_var(&lookup, "FORESIGHT_PRICE_POLL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PRICE_POLL),
        prediction_refresh: parse_var(&lookup, "FORESIGHT_PREDICTION_REFRESH_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PREDICTION_REFRESH),
    };

    if cadence.price_poll.is_zero() || cadence.prediction_refresh.is_zero() {
        return Err(crate::ForesightError::Config(
            "poll and refresh cadences must be non-zero".to_string(),
        ));
    }

    Ok(AppConfig { feed, cadence })
}

/// Parses a numeric variable, treating absence as `None`.
fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> crate::Result<Option<T>> {
    match lookup(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            crate::ForesightError::Config(format!("{name} is not a valid number: {raw:?}"))
        }),
        None => Ok(None),
    }
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
