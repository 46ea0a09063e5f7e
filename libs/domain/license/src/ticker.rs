// [libs/domain/license/src/ticker.rs]
//! The License Manager's background worker: an explicit task + watch
//! channel the composition root owns the lifetime of, following the
//! same pacemaker-loop shape as the engine's other background workers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use wbe_domain_models::license::{HardwareComponents, LicenseState};

use crate::manager::LicenseManager;
use crate::store::LicenseStore;

/// Handle returned by [`spawn_ticker`]. `state_rx` carries every state
/// the ticker observes; `shutdown` stops the loop within one tick
/// interval so shutdown never outlives one tick.
pub struct TickerHandle {
    pub state_rx: watch::Receiver<LicenseState>,
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl TickerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join.await;
    }
}

#[instrument(skip(manager, observed_hw))]
pub fn spawn_ticker<S>(manager: Arc<LicenseManager<S>>, observed_hw: HardwareComponents, initial_state: LicenseState) -> TickerHandle
where
    S: LicenseStore + Send + Sync + 'static,
{
    let (state_tx, state_rx) = watch::channel(initial_state);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let join = tokio::spawn(async move {
        loop {
            let floor_hours = manager.min_tick_interval_hours().max(1);
            let cadence_hours = manager.check_interval_hours().max(floor_hours);
            let cadence = Duration::from_secs((cadence_hours * 3600) as u64);

            tokio::select! {
                _ = tokio::time::sleep(cadence) => {}
                _ = shutdown_rx.changed() => {
                    info!("🕰️ [LICENSE_TICKER]: shutdown signal received, exiting.");
                    return;
                }
            }

            match manager.check(&observed_hw).await {
                Ok(state) => {
                    if state_tx.send(state).is_err() {
                        warn!("🕰️ [LICENSE_TICKER]: state channel has no receivers, exiting.");
                        return;
                    }
                }
                Err(fault) => warn!("🕰️ [LICENSE_TICKER]: check() failed: {}", fault),
            }
        }
    });

    TickerHandle { state_rx, shutdown_tx, join }
}
