//! Periodic flushing of the log sink.

use std::time::Duration;
use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    sink::Flush,
};

/// Background task that flushes a sink on a fixed period.
///
/// The task lives as long as this handle: [`Flusher::stop`] ends it and waits
/// for it, dropping the handle ends it at the next wake-up. Either way the
/// sink is flushed one last time on the way out.
#[derive(Debug)]
pub struct Flusher {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Flusher {
    /// Spawns the flush loop on the current tokio runtime. The first flush
    /// happens one `period` after this call.
    ///
    /// Fails with [`Error::NoRuntime`] when called outside a runtime.
    pub fn start<F: Flush>(period: Duration, sink: F) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::InvalidInterval);
        }
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let first_tick = Instant::now() + period;
        let task = runtime.spawn(run(first_tick, period, sink, stop_rx));
        debug!(?period, "log flusher started");

        Ok(Self { stop_tx, task })
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the loop and waits for the final flush.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "log flusher task failed");
        }
    }
}

async fn run<F: Flush>(
    first_tick: Instant,
    period: Duration,
    sink: F,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => flush(&sink),
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    debug!("log flusher stopped");
    flush(&sink);
}

fn flush<F: Flush>(sink: &F) {
    if let Err(e) = sink.flush() {
        warn!(error = %e, "failed to flush log sink");
    }
}
