//! Background polling of the producer's cycle counter.
//!
//! A [`Watcher`] owns a Tokio task that peeks at the cycle counter on every
//! tick and performs a full read only when it changed. Each distinct cycle is
//! delivered at most once over a bounded channel.
//!
//! The task stops when [`Watcher::stop`] is called, when the [`Watcher`] is
//! dropped, when the consumer drops the receiving side, or on the first read
//! error. The error is kept and can be fetched with [`Watcher::error`] after
//! the channel closes.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, trace, warn};

use crate::client::ArgusClient;
use crate::config::WatchConfig;
use crate::error::{ArgusError, Result};
use crate::region::SharedRegion;
use crate::sample::Sample;

/// Shortest poll period; a zero period would stall the ticker.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running watch task.
#[derive(Debug)]
pub struct Watcher {
    samples: mpsc::Receiver<Sample>,
    cancel_tx: mpsc::Sender<()>,
    error: Arc<Mutex<Option<ArgusError>>>,
    task: JoinHandle<()>,
}

impl Watcher {
    /// Start polling `client` on the current Tokio runtime.
    ///
    /// Intervals shorter than [`MIN_INTERVAL`] are raised to it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn<R>(client: Arc<ArgusClient<R>>, config: &WatchConfig) -> Self
    where
        R: SharedRegion + 'static,
    {
        let (sample_tx, samples) = mpsc::channel(config.channel_capacity.max(1));
        let (cancel_tx, cancel_rx) = mpsc::channel(1);
        let error = Arc::new(Mutex::new(None));

        let mut interval = config.interval();
        if interval < MIN_INTERVAL {
            warn!(requested_ms = config.interval_ms, "Watch interval raised to 1 ms");
            interval = MIN_INTERVAL;
        }

        let task = tokio::spawn(poll_loop(
            client,
            interval,
            sample_tx,
            cancel_rx,
            Arc::clone(&error),
        ));

        Self {
            samples,
            cancel_tx,
            error,
            task,
        }
    }

    /// Next sample, or `None` once the watcher has terminated.
    pub async fn recv(&mut self) -> Option<Sample> {
        self.samples.recv().await
    }

    /// Ask the task to stop. Idempotent; never blocks.
    ///
    /// A sample already buffered in the channel may still be received.
    pub fn stop(&self) {
        // Full means a stop is already pending; Closed means the task is gone.
        let _ = self.cancel_tx.try_send(());
    }

    /// The error that terminated the task, if any.
    pub fn error(&self) -> Option<ArgusError> {
        self.error.lock().clone()
    }

    /// True once the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the task and wait for it to exit.
    ///
    /// Returns the terminal read error, if the task ended because of one.
    pub async fn shutdown(self) -> Result<()> {
        self.stop();
        let Self {
            samples,
            task,
            error,
            ..
        } = self;
        // Unblocks a task waiting on a full channel.
        drop(samples);
        task.await.map_err(|e| ArgusError::Watcher {
            message: e.to_string(),
        })?;
        let terminal = error.lock().take();
        terminal.map_or(Ok(()), Err)
    }
}

async fn poll_loop<R>(
    client: Arc<ArgusClient<R>>,
    interval: Duration,
    sample_tx: mpsc::Sender<Sample>,
    mut cancel_rx: mpsc::Receiver<()>,
    error_slot: Arc<Mutex<Option<ArgusError>>>,
) where
    R: SharedRegion + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_cycle: Option<u32> = None;

    debug!(interval_ms = interval.as_millis() as u64, "Watcher started");

    loop {
        tokio::select! {
            biased;
            _ = cancel_rx.recv() => {
                debug!("Watcher cancelled");
                break;
            }
            _ = ticker.tick() => {}
        }

        let current = client.cycle_counter();
        if last_cycle == Some(current) {
            trace!(cycle = current, "No new cycle");
            continue;
        }

        let reader = Arc::clone(&client);
        let sample = match tokio::task::spawn_blocking(move || reader.read()).await {
            Ok(Ok(sample)) => sample,
            Ok(Err(e)) => {
                error!(error = %e, "Watcher read failed");
                *error_slot.lock() = Some(e);
                break;
            }
            Err(e) => {
                let e = ArgusError::Watcher {
                    message: e.to_string(),
                };
                error!(error = %e, "Watcher read task failed");
                *error_slot.lock() = Some(e);
                break;
            }
        };

        // The peek can be torn; trust the locked read.
        if last_cycle == Some(sample.cycle_counter) {
            continue;
        }
        last_cycle = Some(sample.cycle_counter);

        tokio::select! {
            biased;
            _ = cancel_rx.recv() => {
                debug!("Watcher cancelled while delivering");
                break;
            }
            sent = sample_tx.send(sample) => {
                if sent.is_err() {
                    debug!("Watcher receiver dropped");
                    break;
                }
            }
        }
    }
}
