use crate::{
    error::ServiceError,
    services::sse_events::broadcast_screen_changed,
    state::{SharedState, screen::ScreenEvent},
};

/// Execute a planned screen transition, then broadcast the resulting screen.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    state: &SharedState,
    event: ScreenEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let (res, next) = state.run_transition(event, work).await?;
    broadcast_screen_changed(state, next).await;
    Ok(res)
}
