//! In-memory mirror of the persisted slots.
//!
//! Setters update memory first and then write the slot. Encoding and storage
//! failures are logged and swallowed so an active round never loses what it
//! already earned.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use time::Date;
use tokio::{
    sync::{RwLock, broadcast::error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    dao::{
        models::{DailyCompletions, PlayerProfiles, ProfileEntity, ScoreRecord},
        score_history::{self, HistoryFormat},
        slot_store::{Slot, SlotChange, SlotStore},
        storage::StorageError,
    },
    services::daily::{format_date, has_completed_daily},
};

/// Decoded contents of every slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistentData {
    /// Append-only score history, oldest first.
    pub scores: Vec<ScoreRecord>,
    /// Profile pictures by player name.
    pub profiles: PlayerProfiles,
    /// Last finished daily challenge by player name.
    pub daily_completions: DailyCompletions,
    /// Sound preference.
    pub muted: bool,
}

/// Slot-backed application data shared by every service.
pub struct PersistentState {
    store: Arc<dyn SlotStore>,
    data: RwLock<PersistentData>,
}

impl PersistentState {
    /// Read every slot, migrating a legacy score history in place.
    pub async fn load(store: Arc<dyn SlotStore>) -> Self {
        let state = Self {
            store,
            data: RwLock::new(PersistentData::default()),
        };

        for slot in Slot::ALL {
            let raw = match state.store.read(slot).await {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(slot = %slot, error = %err, "failed to read slot; using initial value");
                    None
                }
            };

            let repersist = {
                let mut data = state.data.write().await;
                replace_slot(&mut data, slot, raw.as_deref())
            };

            if repersist {
                let data = state.data.read().await;
                info!(
                    count = data.scores.len(),
                    "upgrading legacy score history to the versioned format"
                );
                state
                    .persist(Slot::Scores, score_history::encode(&data.scores))
                    .await;
            }
        }

        state
    }

    /// Copy of every slot.
    pub async fn snapshot(&self) -> PersistentData {
        self.data.read().await.clone()
    }

    /// Run `f` against every slot without cloning them.
    pub async fn with_data<R>(&self, f: impl FnOnce(&PersistentData) -> R) -> R {
        let data = self.data.read().await;
        f(&data)
    }

    /// Run `f` against the score history without cloning it.
    pub async fn with_scores<R>(&self, f: impl FnOnce(&[ScoreRecord]) -> R) -> R {
        let data = self.data.read().await;
        f(&data.scores)
    }

    /// Append a finished round to the history.
    pub async fn append_score(&self, record: ScoreRecord) {
        let mut data = self.data.write().await;
        data.scores.push(record);
        let encoded = score_history::encode(&data.scores);
        self.persist(Slot::Scores, encoded).await;
    }

    /// Profile stored for `name`.
    pub async fn profile(&self, name: &str) -> Option<ProfileEntity> {
        self.data.read().await.profiles.get(name).cloned()
    }

    /// Store the (already downscaled) picture for `name`.
    pub async fn set_profile_picture(&self, name: &str, picture: String) {
        let mut data = self.data.write().await;
        data.profiles.insert(
            name.to_string(),
            ProfileEntity {
                profile_picture: picture,
            },
        );
        let encoded = serde_json::to_string(&data.profiles);
        self.persist(Slot::Profiles, encoded).await;
    }

    /// Whether `name` already finished the daily challenge on `today`.
    pub async fn has_completed_daily(&self, name: &str, today: Date) -> bool {
        let data = self.data.read().await;
        has_completed_daily(&data.daily_completions, name, today)
    }

    /// Record that `name` finished the daily challenge on `date`.
    pub async fn mark_daily_completed(&self, name: &str, date: Date) {
        let mut data = self.data.write().await;
        data.daily_completions
            .insert(name.to_string(), format_date(date));
        let encoded = serde_json::to_string(&data.daily_completions);
        self.persist(Slot::DailyCompletions, encoded).await;
    }

    /// Current mute flag.
    pub async fn muted(&self) -> bool {
        self.data.read().await.muted
    }

    /// Persist the mute flag.
    pub async fn set_muted(&self, muted: bool) {
        let mut data = self.data.write().await;
        data.muted = muted;
        let encoded = serde_json::to_string(&data.muted);
        self.persist(Slot::Muted, encoded).await;
    }

    /// Replace one slot wholesale with a value written elsewhere.
    pub async fn apply_external(&self, change: SlotChange) {
        let mut data = self.data.write().await;
        replace_slot(&mut data, change.slot, change.value.as_deref());
        debug!(slot = %change.slot, "reloaded slot after external change");
    }

    /// Re-read every slot, used when change notifications were missed.
    pub async fn reload_all(&self) {
        for slot in Slot::ALL {
            match self.store.read(slot).await {
                Ok(raw) => {
                    let mut data = self.data.write().await;
                    replace_slot(&mut data, slot, raw.as_deref());
                }
                Err(err) => {
                    warn!(slot = %slot, error = %err, "failed to reload slot; keeping in-memory value")
                }
            }
        }
    }

    async fn persist(&self, slot: Slot, encoded: serde_json::Result<String>) {
        let value = match encoded {
            Ok(value) => value,
            Err(source) => {
                let err = StorageError::Encode { slot, source };
                error!(error = %err, "slot not persisted; keeping in-memory value");
                return;
            }
        };

        if let Err(err) = self.store.write(slot, value).await {
            error!(slot = %slot, error = %err, "slot write failed; keeping in-memory value");
        }
    }
}

/// Decode `raw` into the matching field, falling back to the initial value.
/// Returns `true` when the score history must be rewritten in the current format.
fn replace_slot(data: &mut PersistentData, slot: Slot, raw: Option<&str>) -> bool {
    match slot {
        Slot::Scores => {
            let Some(raw) = raw else {
                data.scores = Vec::new();
                return false;
            };
            let decoded = score_history::decode(raw);
            match decoded.format {
                HistoryFormat::Current | HistoryFormat::Legacy => {}
                HistoryFormat::Outdated { stored } => warn!(
                    stored,
                    current = score_history::CURRENT_SCORE_VERSION,
                    "score history version differs; loading as-is until a migration exists"
                ),
                HistoryFormat::Malformed => {
                    warn!("score history is malformed; starting from an empty history")
                }
            }
            let repersist = decoded.needs_repersist();
            data.scores = decoded.records;
            repersist
        }
        Slot::Profiles => {
            data.profiles = decode_or_default(slot, raw);
            false
        }
        Slot::DailyCompletions => {
            data.daily_completions = decode_or_default(slot, raw);
            false
        }
        Slot::Muted => {
            data.muted = decode_or_default(slot, raw);
            false
        }
    }
}

fn decode_or_default<T: DeserializeOwned + Default>(slot: Slot, raw: Option<&str>) -> T {
    let Some(raw) = raw else {
        return T::default();
    };
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(slot = %slot, error = %err, "failed to decode slot; using initial value");
            T::default()
        }
    }
}

/// Keeps the in-memory mirror in sync with external slot modifications.
///
/// Subscribes when created and stops listening when dropped.
pub struct StoreSubscription {
    task: JoinHandle<()>,
}

impl StoreSubscription {
    /// Start forwarding external changes into `persistent`, calling `on_change` after each reload.
    pub fn install<F>(persistent: Arc<PersistentState>, on_change: F) -> Self
    where
        F: Fn(Slot) + Send + 'static,
    {
        let mut rx = persistent.store.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        let slot = change.slot;
                        persistent.apply_external(change).await;
                        on_change(slot);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed slot change notifications; reloading every slot");
                        persistent.reload_all().await;
                        for slot in Slot::ALL {
                            on_change(slot);
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!("slot change channel closed; stopping sync");
                        break;
                    }
                }
            }
        });
        Self { task }
    }
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use super::*;
    use crate::{
        dao::slot_store::MemorySlotStore,
        state::game::{Difficulty, GameMode},
    };
    use time::macros::date;

    const LEGACY: &str = r#"[{"name":"Ali","score":60,"date":"2025-01-01T10:00:00.000Z","juz":[30],"difficulty":"Mudah","numberOfQuestions":5,"gameMode":"Pilihan Ganda"}]"#;

    fn record(name: &str, score: u32) -> ScoreRecord {
        ScoreRecord {
            name: name.into(),
            score,
            date: "2026-10-19T08:00:00+07:00".into(),
            juz: vec![1],
            difficulty: Difficulty::Easy,
            number_of_questions: 5,
            game_mode: GameMode::MultipleChoice,
            duration: Some(42),
        }
    }

    async fn load(store: &MemorySlotStore) -> PersistentState {
        PersistentState::load(Arc::new(store.clone())).await
    }

    #[tokio::test]
    async fn empty_store_loads_initial_values() {
        let store = MemorySlotStore::new();
        let state = load(&store).await;
        assert_eq!(state.snapshot().await, PersistentData::default());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn legacy_history_is_wrapped_and_repersisted_once() {
        let store = MemorySlotStore::new().with_slot(Slot::Scores, LEGACY);
        let state = load(&store).await;

        assert_eq!(store.write_count(), 1);
        let raw = store.raw(Slot::Scores).unwrap();
        let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored["version"], 1);
        assert_eq!(stored["data"][0]["name"], "Ali");
        assert_eq!(state.with_scores(|s| s.len()).await, 1);

        let again = load(&store).await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(again.with_scores(|s| s[0].score).await, 60);
    }

    #[tokio::test]
    async fn outdated_or_malformed_history_is_not_rewritten() {
        let store = MemorySlotStore::new()
            .with_slot(Slot::Scores, r#"{"version":0,"data":[]}"#)
            .with_slot(Slot::Profiles, "not json");
        let state = load(&store).await;
        assert_eq!(store.write_count(), 0);
        assert!(state.snapshot().await.profiles.is_empty());

        let store = MemorySlotStore::new().with_slot(Slot::Scores, "{{{");
        let state = load(&store).await;
        assert_eq!(store.write_count(), 0);
        assert_eq!(state.with_scores(|s| s.len()).await, 0);
    }

    #[tokio::test]
    async fn setters_write_their_slot() {
        let store = MemorySlotStore::new();
        let state = load(&store).await;

        state.append_score(record("Ali", 40)).await;
        state.set_profile_picture("Ali", "data:image/jpeg;base64,AAAA".into()).await;
        state.mark_daily_completed("Ali", date!(2026 - 10 - 19)).await;
        state.set_muted(true).await;

        assert_eq!(store.write_count(), 4);
        assert!(store.raw(Slot::Scores).unwrap().starts_with(r#"{"version":1"#));
        assert!(store.raw(Slot::Profiles).unwrap().contains("profilePicture"));
        assert_eq!(
            store.raw(Slot::DailyCompletions).as_deref(),
            Some(r#"{"Ali":"2026-10-19"}"#)
        );
        assert_eq!(store.raw(Slot::Muted).as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn failed_writes_still_update_memory() {
        let store = MemorySlotStore::new();
        let state = load(&store).await;
        store.set_failing(true);

        state.append_score(record("Ali", 20)).await;
        state.set_muted(true).await;

        assert_eq!(state.with_scores(|s| s.len()).await, 1);
        assert!(state.muted().await);
        assert!(store.raw(Slot::Scores).is_none());
    }

    #[tokio::test]
    async fn daily_gate_is_per_calendar_day() {
        let store = MemorySlotStore::new();
        let state = load(&store).await;
        state.mark_daily_completed("Ali", date!(2026 - 10 - 19)).await;

        assert!(state.has_completed_daily("Ali", date!(2026 - 10 - 19)).await);
        assert!(!state.has_completed_daily("Ali", date!(2026 - 10 - 20)).await);
        assert!(!state.has_completed_daily("Umar", date!(2026 - 10 - 19)).await);
    }

    #[tokio::test]
    async fn subscription_replaces_slots_wholesale() {
        let store = MemorySlotStore::new();
        let state = Arc::new(load(&store).await);
        state.set_muted(true).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let _subscription = StoreSubscription::install(state.clone(), move |slot| {
            recorder.lock().unwrap().push(slot);
        });

        store.external_write(Slot::DailyCompletions, r#"{"Umar":"2026-10-19"}"#);
        store.external_remove(Slot::Muted);

        for _ in 0..50 {
            if seen.lock().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Slot::DailyCompletions, Slot::Muted]
        );
        assert!(!state.muted().await);
        assert!(state.has_completed_daily("Umar", date!(2026 - 10 - 19)).await);
    }

    #[tokio::test]
    async fn dropping_subscription_stops_sync() {
        let store = MemorySlotStore::new();
        let state = Arc::new(load(&store).await);
        let subscription = StoreSubscription::install(state.clone(), |_| {});
        drop(subscription);
        tokio::task::yield_now().await;

        store.external_write(Slot::Muted, "true");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!state.muted().await);
    }
}
