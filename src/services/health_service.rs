use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Check the slot store and report whether the backend runs degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if let Err(err) = state.store().health_check().await {
        warn!(error = %err, "storage health check failed");
        return HealthResponse::degraded();
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
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

    #[tokio::test]
    async fn failing_store_reports_degraded() {
        let store = MemorySlotStore::new();
        let (state, _clock) = state_with(store.clone(), Arc::new(DisabledQuestionSource)).await;
        assert_eq!(health_status(&state).await.status, "ok");

        store.set_failing(true);
        assert_eq!(health_status(&state).await.status, "degraded");
    }
}
