use std::env;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use foresight::ForesightError;
use foresight::config::fetch_config;
use foresight::driver::ChartDriver;
use foresight::engine::snapshot::ChartSnapshot;
use foresight::feed::HttpFeed;
use foresight::models::{InstrumentKey, Timeframe};

const DEFAULT_SYMBOL: &str = "BTCUSDT";
const DEFAULT_BACKTEST_DAYS: u32 = 30;
const DEFAULT_BACKTEST_CAPITAL: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

#[tokio::main]
async fn main() -> Result<(), ForesightError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let app_config = fetch_config()?;
    let feed = HttpFeed::new(&app_config.feed)?;
    let args: Vec<String> = env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("backtest") {
        return run_backtest(&feed, &args[1..]).await;
    }

    let symbol = args.first().map_or(DEFAULT_SYMBOL, String::as_str);
    let timeframe = match args.get(1) {
        Some(code) => Timeframe::parse(code)
            .ok_or_else(|| ForesightError::Config(format!("unknown timeframe `{code}`")))?,
        None => Timeframe::default(),
    };
    let key = InstrumentKey::new(symbol, timeframe);

    let (handle, driver) = ChartDriver::spawn(Arc::new(feed), app_config.cadence);
    let mut snapshots = handle.snapshots();
    handle.select(key);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                report(&snapshots.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                handle.shutdown();
                break;
            }
        }
    }

    if let Err(e) = driver.await {
        warn!("Driver task ended abnormally: {e}");
    }
    Ok(())
}

async fn run_backtest(feed: &HttpFeed, args: &[String]) -> Result<(), ForesightError> {
    let days = match args.first() {
        Some(raw) => raw
            .parse()
            .map_err(|_| ForesightError::Config(format!("invalid backtest days `{raw}`")))?,
        None => DEFAULT_BACKTEST_DAYS,
    };
    let capital = match args.get(1) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ForesightError::Config(format!("invalid backtest capital `{raw}`")))?,
        None => DEFAULT_BACKTEST_CAPITAL,
    };

    let report = feed.backtest(days, capital).await?;
    info!(
        days,
        %capital,
        total_return = %report.total_return,
        win_rate = %report.win_rate,
        profit_factor = %report.profit_factor,
        max_drawdown = %report.max_drawdown,
        final_capital = %report.final_capital,
        trades = report.total_trades,
        wins = report.wins,
        losses = report.losses,
        "Backtest complete"
    );
    Ok(())
}

fn report(snapshot: &ChartSnapshot) {
    let Some(key) = &snapshot.key else { return };
    let close = snapshot.legend.map(|l| l.close);
    let trend = snapshot.trend;
    info!(
        %key,
        status = ?snapshot.status,
        candles = snapshot.candles().len(),
        close = ?close,
        last_price = ?snapshot.last_price,
        predicted = ?snapshot.prediction.as_ref().map(|p| p.predicted_price),
        bullish = ?trend.map(|t| t.is_bullish),
        strength = ?trend.map(|t| t.sentiment_strength),
        overlay = snapshot.overlay_present(),
        "Chart updated"
    );
}
