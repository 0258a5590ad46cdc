//! The background task that reconciles pending orders against the accrual system.
//!
//! Exactly one worker runs per server. Each tick runs to completion before the next one starts, and ticks that fall
//! behind are delayed rather than bursted. Stopping the worker takes effect at the next tick boundary.
use std::time::Duration;

use log::*;
use loyalty_engine::{AccrualAuthority, AccrualSyncApi, OrderManagement, SqliteDatabase};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::integrations::accrual::AccrualServiceClient;

const MIN_INTERVAL: Duration = Duration::from_millis(10);

pub struct AccrualWorker<B, A> {
    api: AccrualSyncApi<B, A>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl<B, A> AccrualWorker<B, A>
where
    B: OrderManagement,
    A: AccrualAuthority,
{
    pub fn new(api: AccrualSyncApi<B, A>, interval: Duration, shutdown: CancellationToken) -> Self {
        Self { api, interval: interval.max(MIN_INTERVAL), shutdown }
    }

    pub async fn run(self) {
        let Self { api, interval, shutdown } = self;
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🕰️ Accrual worker started. Polling every {interval:?}");
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {},
            }
            trace!("🕰️ Running accrual sync job");
            match api.run_tick().await {
                Ok(summary) if summary.advanced > 0 || summary.failed > 0 => {
                    info!(
                        "🕰️ Accrual sync: {} of {} pending orders advanced, {} failed. {} points credited",
                        summary.advanced, summary.pending, summary.failed, summary.credited
                    );
                },
                Ok(summary) => debug!("🕰️ Accrual sync: {} pending orders, none changed", summary.pending),
                Err(e) => error!("🕰️ Error running accrual sync job: {e}"),
            }
        }
        info!("🕰️ Accrual worker stopped");
    }
}

pub struct AccrualWorkerHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl AccrualWorkerHandle {
    /// Asks the worker to stop and waits for it. A tick that is already running is allowed to finish.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!("🕰️ Accrual worker did not shut down cleanly. {e}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Starts the accrual worker on the tokio runtime. Call [`AccrualWorkerHandle::stop`] to shut it down.
pub fn start_accrual_worker(
    db: SqliteDatabase,
    client: AccrualServiceClient,
    interval: Duration,
) -> AccrualWorkerHandle {
    let shutdown = CancellationToken::new();
    let worker = AccrualWorker::new(AccrualSyncApi::new(db, client), interval, shutdown.clone());
    let task = tokio::spawn(worker.run());
    AccrualWorkerHandle { shutdown, task }
}
