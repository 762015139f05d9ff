//! Background expiration sweep

use super::SharedBackend;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to the periodic sweep task
///
/// Dropping the handle drops the stop sender, which also ends the loop.
pub(crate) struct CleanupTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Start sweeping `backend` every `interval`
    pub fn spawn(backend: SharedBackend, interval: Duration) -> Self {
        let (stop, mut stop_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let backend = backend.write().await;
                        match backend.expire_sweep().await {
                            Ok(0) => {}
                            Ok(removed) => {
                                tracing::debug!(backend = backend.name(), removed, "cache cleanup removed expired entries");
                            }
                            Err(e) => {
                                tracing::warn!(backend = backend.name(), error = %e, "cache cleanup error");
                            }
                        }
                    }
                }
            }
        });

        Self { stop, handle }
    }

    /// Signal the loop to stop and wait for it to finish
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "cache cleanup task ended abnormally");
        }
    }
}
