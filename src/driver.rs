//! Event loop that owns the chart engine and its asynchronous producers.
//!
//! [`ChartDriver`] receives [`Message`]s on an unbounded channel and handles
//! them one at a time, so no two reconciliations interleave. Fetches run in
//! spawned tasks and report back through the same channel; the engine's
//! ticket check decides whether their results still apply. After every
//! message a fresh [`ChartSnapshot`] is published on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::Result;
use crate::config::CadenceConfig;
use crate::engine::overlay::OverlayRegistry;
use crate::engine::snapshot::ChartSnapshot;
use crate::engine::{ChartEngine, Command, Ticket};
use crate::feed::DataSource;
use crate::models::{InstrumentKey, Prediction, Series};
use crate::poller::PricePoller;

/// Inputs to the driver loop.
#[derive(Debug)]
pub enum Message {
    /// The user selected a chart.
    Select(InstrumentKey),
    /// The pointer moved onto the candle opening at this time, or left the chart.
    Hover(Option<i64>),
    /// A series fetch completed.
    SeriesLoaded {
        ticket: Ticket,
        result: Result<Series>,
    },
    /// A prediction fetch completed.
    PredictionLoaded {
        ticket: Ticket,
        result: Result<Prediction>,
    },
    /// A price poll completed.
    PriceTick {
        symbol: String,
        result: Result<Decimal>,
    },
    /// Time to refresh the active prediction.
    RefreshPrediction,
    /// Tear everything down and stop the loop.
    Shutdown,
}

/// Cloneable handle for talking to a running [`ChartDriver`].
///
/// Send methods return `false` once the driver has stopped.
#[derive(Clone, Debug)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<Message>,
    snapshots: watch::Receiver<ChartSnapshot>,
}

impl DriverHandle {
    /// Switches the chart to `key`.
    pub fn select(&self, key: InstrumentKey) -> bool {
        self.tx.send(Message::Select(key)).is_ok()
    }

    /// Reports the hovered candle's open time, or `None` when the pointer leaves.
    pub fn hover(&self, time: Option<i64>) -> bool {
        self.tx.send(Message::Hover(time)).is_ok()
    }

    /// Requests an immediate prediction refresh.
    pub fn refresh(&self) -> bool {
        self.tx.send(Message::RefreshPrediction).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.tx.send(Message::Shutdown).is_ok()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> ChartSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn snapshots(&self) -> watch::Receiver<ChartSnapshot> {
        self.snapshots.clone()
    }
}

/// Owns the engine, the price poller, and the prediction refresh timer.
pub struct ChartDriver<D: DataSource> {
    engine: ChartEngine<OverlayRegistry>,
    source: Arc<D>,
    cadence: CadenceConfig,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    poller: PricePoller,
    refresh: Option<JoinHandle<()>>,
    snapshots: watch::Sender<ChartSnapshot>,
}

impl<D: DataSource> ChartDriver<D> {
    /// Creates a driver and the handle used to control it.
    #[must_use]
    pub fn new(source: Arc<D>, cadence: CadenceConfig) -> (Self, DriverHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(ChartSnapshot::default());
        let handle = DriverHandle {
            tx: tx.clone(),
            snapshots: snapshot_rx,
        };
        let driver = Self {
            engine: ChartEngine::new(OverlayRegistry::new()),
            source,
            cadence,
            tx,
            rx,
            poller: PricePoller::new(),
            refresh: None,
            snapshots,
        };
        (driver, handle)
    }

    /// Creates a driver and runs it on the Tokio runtime.
    pub fn spawn(source: Arc<D>, cadence: CadenceConfig) -> (DriverHandle, JoinHandle<()>) {
        let (driver, handle) = Self::new(source, cadence);
        (handle, tokio::spawn(driver.run()))
    }

    /// Processes messages until [`Message::Shutdown`] arrives or every
    /// snapshot receiver is dropped.
    pub async fn run(mut self) {
        info!("Chart driver started");
        loop {
            let message = tokio::select! {
                message = self.rx.recv() => message,
                () = self.snapshots.closed() => None,
            };
            let Some(message) = message else { break };
            if !self.update(message) {
                break;
            }
            self.snapshots.send_replace(self.engine.snapshot());
        }
        self.shutdown();
        info!("Chart driver stopped");
    }

    /// Applies one message. Returns `false` when the loop should stop.
    fn update(&mut self, message: Message) -> bool {
        match message {
            Message::Select(key) => {
                let commands = self.engine.set_instrument_key(key);
                self.execute(commands);
            }
            Message::Hover(time) => self.engine.update_legend(time),
            Message::SeriesLoaded { ticket, result } => match result {
                Ok(series) => {
                    self.engine.apply_series(&ticket, series);
                }
                Err(e) => {
                    self.engine.fail_series(&ticket, &e);
                }
            },
            Message::PredictionLoaded { ticket, result } => match result {
                Ok(prediction) => {
                    self.engine.apply_prediction(&ticket, Some(prediction));
                }
                Err(e) => {
                    self.engine.fail_prediction(&ticket, &e);
                }
            },
            Message::PriceTick { symbol, result } => match result {
                Ok(price) => {
                    self.engine.apply_price(&symbol, price);
                }
                Err(e) => {
                    self.engine.fail_price(&symbol, &e);
                }
            },
            Message::RefreshPrediction => {
                if let Some(command) = self.engine.refresh_prediction() {
                    self.execute(vec![command]);
                }
            }
            Message::Shutdown => return false,
        }
        true
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::FetchSeries { ticket, interval } => {
                    let source = Arc::clone(&self.source);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = source.fetch_series(ticket.key.symbol(), interval).await;
                        let _ = tx.send(Message::SeriesLoaded { ticket, result });
                    });
                }
                Command::FetchPrediction(ticket) => {
                    let source = Arc::clone(&self.source);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = source.fetch_prediction(&ticket.key).await;
                        let _ = tx.send(Message::PredictionLoaded { ticket, result });
                    });
                }
                Command::WatchPrice(symbol) => {
                    self.poller.start(
                        symbol,
                        Arc::clone(&self.source),
                        self.tx.clone(),
                        self.cadence.price_poll,
                    );
                }
                Command::RestartRefresh => self.restart_refresh(),
            }
        }
    }

    /// Replaces the refresh timer; the first refresh fires one full period
    /// after the key change.
    fn restart_refresh(&mut self) {
        if let Some(task) = self.refresh.take() {
            task.abort();
        }
        let period = self.cadence.prediction_refresh;
        let tx = self.tx.clone();
        debug!(?period, "Restarting prediction refresh timer");
        self.refresh = Some(tokio::spawn(refresh_timer(tx, period)));
    }

    fn shutdown(&mut self) {
        self.poller.stop();
        if let Some(task) = self.refresh.take() {
            task.abort();
        }
        self.engine.teardown();
        self.snapshots.send_replace(self.engine.snapshot());
    }
}

async fn refresh_timer(tx: mpsc::UnboundedSender<Message>, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if tx.send(Message::RefreshPrediction).is_err() {
            break;
        }
    }
}
