//! Periodic background sync.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::quotes::{QuoteService, SyncOutcome};
use crate::error::{Error, Result};
use crate::remote::RemoteSource;

/// Handle to a running auto-sync task.
///
/// The first pass runs one interval after start. Failed passes are logged
/// and retried on the next tick; ticks that land while a pass is still
/// running are skipped.
pub struct AutoSync {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl AutoSync {
    pub fn start<R>(service: QuoteService, remote: Arc<R>, interval: Duration) -> Self
    where
        R: RemoteSource + 'static,
    {
        Self::start_with(service, remote, interval, |_| {})
    }

    /// Start, calling `on_tick` with the result of every attempted pass.
    pub fn start_with<R, F>(
        service: QuoteService,
        remote: Arc<R>,
        interval: Duration,
        mut on_tick: F,
    ) -> Self
    where
        R: RemoteSource + 'static,
        F: FnMut(&Result<SyncOutcome>) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }

                tracing::debug!("Auto-sync tick: interval={}s", interval.as_secs());
                let result = service.sync(remote.as_ref()).await;
                match &result {
                    Ok(_) => {}
                    Err(Error::SyncInProgress) => {
                        tracing::debug!("Skipping auto-sync tick, previous pass still running");
                        continue;
                    }
                    Err(error) => {
                        tracing::warn!("Periodic sync failed, will retry: {error}");
                    }
                }
                on_tick(&result);
            }

            tracing::debug!("Auto-sync stopped");
        });

        Self {
            stop: Some(stop_tx),
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task and wait for an in-flight pass to finish.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(error) = (&mut self.handle).await {
            tracing::warn!("Auto-sync task ended abnormally: {error}");
        }
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        if self.stop.is_some() {
            self.handle.abort();
        }
    }
}
