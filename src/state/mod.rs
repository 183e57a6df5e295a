/// Injectable wall clock.
pub mod clock;
/// Quiz domain types.
pub mod game;
/// In-memory mirror of the persisted slots.
pub mod persistent;
/// Round session state machine.
pub mod round;
/// Screen router state machine.
pub mod screen;
mod sse;
/// Transition helpers that broadcast the new screen.
pub mod transitions;

use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::slot_store::SlotStore,
    error::ServiceError,
    services::{question_source::QuestionSource, round_service::ActiveRound, sse_events},
    state::{
        clock::Clock,
        game::Player,
        persistent::{PersistentState, StoreSubscription},
        screen::{Screen, ScreenEvent, ScreenRouter},
    },
};

pub use self::screen::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
pub use self::sse::SseHub;

/// Handle to the application state shared by every handler and task.
pub type SharedState = Arc<AppState>;
/// Upper bound for the side work of a screen transition.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);
const SSE_CAPACITY: usize = 64;

/// Central application state: persisted data, the screen router and the active round.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn SlotStore>,
    persistent: Arc<PersistentState>,
    clock: Arc<dyn Clock>,
    questions: Arc<dyn QuestionSource>,
    sse: SseHub,
    screen: RwLock<ScreenRouter>,
    player: RwLock<Option<Player>>,
    round: Mutex<Option<ActiveRound>>,
    quote: RwLock<String>,
    degraded: watch::Sender<bool>,
    subscription: StdMutex<Option<StoreSubscription>>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Load the persisted slots from `store` and build the shared state.
    pub async fn new(
        config: AppConfig,
        store: Arc<dyn SlotStore>,
        clock: Arc<dyn Clock>,
        questions: Arc<dyn QuestionSource>,
    ) -> SharedState {
        let persistent = Arc::new(PersistentState::load(store.clone()).await);
        let quote = config.random_quote();
        let (degraded_tx, _rx) = watch::channel(false);

        Arc::new(Self {
            config,
            store,
            persistent,
            clock,
            questions,
            sse: SseHub::new(SSE_CAPACITY),
            screen: RwLock::new(ScreenRouter::new()),
            player: RwLock::new(None),
            round: Mutex::new(None),
            quote: RwLock::new(quote),
            degraded: degraded_tx,
            subscription: StdMutex::new(None),
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Start mirroring external slot modifications, replacing any previous subscription.
    pub fn install_store_subscription(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let subscription = StoreSubscription::install(self.persistent.clone(), move |slot| {
            if let Some(state) = weak.upgrade() {
                sse_events::broadcast_store_changed(&state, slot);
            }
        });

        let mut guard = match self.subscription.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(subscription);
    }

    /// Stop mirroring external slot modifications.
    pub fn remove_store_subscription(&self) {
        let mut guard = match self.subscription.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take();
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Raw slot store backing [`Self::persistent`].
    pub fn store(&self) -> &Arc<dyn SlotStore> {
        &self.store
    }

    /// In-memory mirror of the persisted slots.
    pub fn persistent(&self) -> &Arc<PersistentState> {
        &self.persistent
    }

    /// Device-local clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Provider of question batches.
    pub fn questions(&self) -> &Arc<dyn QuestionSource> {
        &self.questions
    }

    /// Broadcast hub used for the SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Player who entered their name, if any.
    pub fn player(&self) -> &RwLock<Option<Player>> {
        &self.player
    }

    /// Round currently shown on the playing or finished screen.
    pub fn round(&self) -> &Mutex<Option<ActiveRound>> {
        &self.round
    }

    /// Motivational quote currently displayed.
    pub async fn quote(&self) -> String {
        self.quote.read().await.clone()
    }

    /// Draw a new motivational quote.
    pub async fn reroll_quote(&self) -> String {
        let quote = self.config.random_quote();
        *self.quote.write().await = quote.clone();
        quote
    }

    /// Current screen.
    pub async fn screen(&self) -> Screen {
        self.screen.read().await.screen()
    }

    /// Snapshot the router state.
    pub async fn snapshot(&self) -> Snapshot {
        self.screen.read().await.snapshot()
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only on change.
    pub fn set_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    async fn plan_transition(&self, event: ScreenEvent) -> Result<Plan, PlanError> {
        let mut router = self.screen.write().await;
        router.plan(event)
    }

    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<Screen, ApplyError> {
        let mut router = self.screen.write().await;
        router.apply(plan_id)
    }

    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut router = self.screen.write().await;
        router.abort(plan_id)
    }

    /// Plan `event`, run `work`, then apply the plan on success or abort it on failure.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: ScreenEvent,
        work: F,
    ) -> Result<(T, Screen), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::{
        dao::slot_store::MemorySlotStore,
        state::clock::FixedClock,
    };

    /// State over an in-memory store, a fixed clock and the given question source.
    pub async fn state_with(
        store: MemorySlotStore,
        questions: Arc<dyn QuestionSource>,
    ) -> (SharedState, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(datetime!(2026-10-19 09:00 +07:00)));
        let state = AppState::new(
            AppConfig::ephemeral_defaults(),
            Arc::new(store),
            clock.clone(),
            questions,
        )
        .await;
        (state, clock)
    }
}
