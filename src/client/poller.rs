//! Fixed-delay poll loop.
//!
//! Each tick runs to completion on the blocking pool (store I/O is synchronous)
//! before the delay timer is armed, so ticks of one client never overlap and a
//! slow store stretches the period instead of queueing ticks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::client::Shared;
use crate::sync::TickOutcome;

/// Handle to a running poll loop.
pub(crate) struct Poller {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Start the loop on the current runtime. The first tick runs immediately.
    pub(crate) fn spawn(shared: Arc<Shared>, delay: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticks: u64 = 0;
            loop {
                let tick_shared = shared.clone();
                match tokio::task::spawn_blocking(move || tick_shared.tick()).await {
                    Ok(Ok(TickOutcome::Merged { applied })) => {
                        debug!(tick = ticks, applied, "poll tick merged");
                    }
                    Ok(Ok(TickOutcome::Unchanged)) => {}
                    Ok(Err(e)) => warn!(tick = ticks, "poll tick skipped: {e}"),
                    Err(e) => warn!(tick = ticks, "poll tick panicked: {e}"),
                }
                ticks += 1;

                tokio::select! {
                    // Fires on an explicit stop and when the client is dropped.
                    _ = &mut shutdown_rx => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            debug!(ticks, "poll loop stopped");
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// True until the loop has been told to stop or has exited.
    pub(crate) fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
            && self
                .handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Ask the loop to exit after its current tick.
    pub(crate) fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Stop the loop and wait until it has exited.
    pub(crate) async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("poll loop ended abnormally: {e}");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
