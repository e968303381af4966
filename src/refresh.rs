// Refresh signal - process-wide "data source changed" notification
//
// Fired without payload by whoever mutates the upstream data set. One
// listener task per controller re-initializes every registered control,
// each independently and idempotently; a control's previously selected
// value is not preserved unless its config re-supplies it as `preselected`.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::controller::SelectController;

/// Broadcast capacity. Refresh signals carry no payload and coalesce
/// naturally; lagging receivers just refresh on the next signal.
const REFRESH_CHANNEL_CAPACITY: usize = 16;

/// Dispatchable refresh signal shared by any number of controls
#[derive(Clone)]
pub struct RefreshBus {
    tx: broadcast::Sender<()>,
}

impl RefreshBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(REFRESH_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Fire the signal. Safe to call with no listeners subscribed.
    pub fn fire(&self) {
        let count = self.tx.send(()).unwrap_or(0);
        tracing::debug!(listeners = count, "Refresh signal fired");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for RefreshBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectController {
    /// Subscribe this controller to a refresh bus. Installed once per
    /// controller lifetime; every fired signal re-runs `initialize` for
    /// each currently registered control with its stored config.
    pub fn listen_for_refresh(&self, bus: &RefreshBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let inner = self.inner.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(()) => {
                        // Snapshot configs first so re-initialization does
                        // not run under the registry lock.
                        let configs = inner.registry.lock().unwrap().configs();
                        tracing::info!(controls = configs.len(), "Refreshing registered controls");
                        for config in configs {
                            let control_id = config.control_id.clone();
                            if let Err(e) = inner.initialize(config) {
                                tracing::warn!(
                                    control_id = %control_id,
                                    error = %e,
                                    "Refresh re-initialization failed"
                                );
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Refresh listener lagged; coalescing signals");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
