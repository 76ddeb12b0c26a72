//! Background task keeping the degraded flag in line with backend health.

use std::time::Duration;

use tokio::{task::spawn_blocking, time::sleep};
use tracing::{info, warn};

use crate::state::SharedState;

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Check the backend once and flip degraded mode to match. Returns whether it is healthy.
pub fn probe(state: &SharedState) -> bool {
    match state.backend().health_check() {
        Ok(()) => {
            if state.is_degraded() {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
            true
        }
        Err(err) => {
            if state.is_degraded() {
                warn!(error = %err, "storage still unavailable");
            } else {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.update_degraded(true);
            }
            false
        }
    }
}

/// Poll the storage backend forever, backing off while it is unavailable.
///
/// Probes run on the blocking pool since backend health checks touch storage.
pub async fn run(state: SharedState) {
    let mut delay = INITIAL_DELAY;

    loop {
        let probe_state = state.clone();
        let healthy = spawn_blocking(move || probe(&probe_state))
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "storage probe task did not complete");
                false
            });

        if healthy {
            delay = INITIAL_DELAY;
            sleep(HEALTH_POLL_INTERVAL).await;
        } else {
            sleep(delay).await;
            delay = (delay * 2).min(MAX_DELAY);
        }
    }
}
