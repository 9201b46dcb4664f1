//! Periodic last-price polling for the active symbol.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::driver::Message;
use crate::feed::DataSource;

/// Owns at most one polling task.
///
/// Starting a new poll aborts the previous one, so ticks for an abandoned
/// symbol stop being produced. Ticks already queued for it are rejected by
/// the engine's symbol check.
#[derive(Debug, Default)]
pub struct PricePoller {
    task: Option<JoinHandle<()>>,
    symbol: Option<String>,
}

impl PricePoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbol currently being polled.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Polls `symbol` every `cadence`, sending each result to `tx`.
    ///
    /// A failed tick is reported and polling continues. The task ends when
    /// the receiving side of `tx` is dropped.
    pub fn start<D: DataSource>(
        &mut self,
        symbol: String,
        source: Arc<D>,
        tx: mpsc::UnboundedSender<Message>,
        cadence: Duration,
    ) {
        self.stop();
        debug!(%symbol, ?cadence, "Starting price poller");

        self.symbol = Some(symbol.clone());
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(cadence);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let result = source.fetch_last_price(&symbol).await;
                if let Err(e) = &result {
                    warn!(%symbol, "Price poll failed: {e}");
                }
                let tick = Message::PriceTick {
                    symbol: symbol.clone(),
                    result,
                };
                if tx.send(tick).is_err() {
                    break;
                }
            }
        }));
    }

    /// Aborts the polling task, if any.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.symbol = None;
    }
}

impl Drop for PricePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
