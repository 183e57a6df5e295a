use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{services::sse_events::broadcast_system_status, state::SharedState};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poll the slot store and keep the shared state in degraded mode while it is unreachable.
///
/// Runs until the task is aborted.
pub async fn run(state: SharedState) {
    let mut delay = INITIAL_DELAY;

    loop {
        match state.store().health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.set_degraded(false);
                    broadcast_system_status(&state, false);
                    state.persistent().reload_all().await;
                }
                delay = INITIAL_DELAY;
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                if state.is_degraded() {
                    warn!(error = %err, "storage still unavailable");
                } else {
                    warn!(error = %err, "storage health check failed; entering degraded mode");
                    state.set_degraded(true);
                    broadcast_system_status(&state, true);
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::slot_store::MemorySlotStore, services::question_source::DisabledQuestionSource,
        state::test_support::state_with,
    };

    #[tokio::test(start_paused = true)]
    async fn failing_store_toggles_degraded_mode() {
        let store = MemorySlotStore::new();
        let (state, _clock) = state_with(store.clone(), Arc::new(DisabledQuestionSource)).await;
        let mut degraded = state.degraded_watcher();
        let supervisor = tokio::spawn(run(state.clone()));

        store.set_failing(true);
        degraded.changed().await.unwrap();
        assert!(state.is_degraded());

        store.set_failing(false);
        degraded.changed().await.unwrap();
        assert!(!state.is_degraded());

        supervisor.abort();
    }
}
