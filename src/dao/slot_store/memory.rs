use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::broadcast;

use crate::dao::storage::{StorageError, StorageResult};

use super::{CHANGE_CHANNEL_CAPACITY, Slot, SlotChange, SlotStore};

/// Process-local slot store. Nothing survives a restart.
#[derive(Clone)]
pub struct MemorySlotStore {
    slots: Arc<DashMap<Slot, String>>,
    changes: broadcast::Sender<SlotChange>,
    writes: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl Default for MemorySlotStore {
    fn default() -> Self {
        let (changes, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            slots: Arc::new(DashMap::new()),
            changes,
            writes: Arc::new(AtomicUsize::new(0)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl MemorySlotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a slot without counting it as a write or notifying subscribers.
    pub fn with_slot(self, slot: Slot, value: impl Into<String>) -> Self {
        self.slots.insert(slot, value.into());
        self
    }

    /// Raw value currently held for `slot`.
    pub fn raw(&self, slot: Slot) -> Option<String> {
        self.slots.get(&slot).map(|entry| entry.value().clone())
    }

    /// Number of successful writes performed through [`SlotStore::write`].
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent writes and removals fail, simulating a full or broken backend.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Modify a slot as another window would, notifying subscribers.
    pub fn external_write(&self, slot: Slot, value: impl Into<String>) {
        let value = value.into();
        self.slots.insert(slot, value.clone());
        let _ = self.changes.send(SlotChange {
            slot,
            value: Some(value),
        });
    }

    /// Remove a slot as another window would, notifying subscribers.
    pub fn external_remove(&self, slot: Slot) {
        self.slots.remove(&slot);
        let _ = self.changes.send(SlotChange { slot, value: None });
    }

    fn check_failing(&self, slot: Slot) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                format!("memory store rejected write to `{slot}`"),
                io::Error::new(io::ErrorKind::StorageFull, "quota exceeded"),
            ));
        }
        Ok(())
    }
}

impl SlotStore for MemorySlotStore {
    fn read(&self, slot: Slot) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let value = self.raw(slot);
        Box::pin(async move { Ok(value) })
    }

    fn write(&self, slot: Slot, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_failing(slot)?;
            store.slots.insert(slot, value);
            store.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn remove(&self, slot: Slot) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_failing(slot)?;
            store.slots.remove(&slot);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<SlotChange> {
        self.changes.subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let failing = self.failing.load(Ordering::SeqCst);
        Box::pin(async move {
            if failing {
                return Err(StorageError::unavailable(
                    "memory store is rejecting writes".into(),
                    io::Error::new(io::ErrorKind::StorageFull, "quota exceeded"),
                ));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn own_writes_are_not_broadcast() {
        let store = MemorySlotStore::new();
        let mut rx = store.subscribe();

        store.write(Slot::Muted, "true".into()).await.unwrap();
        assert_eq!(store.read(Slot::Muted).await.unwrap().as_deref(), Some("true"));
        assert!(rx.try_recv().is_err());

        store.external_write(Slot::Muted, "false");
        let change = rx.recv().await.unwrap();
        assert_eq!(change.slot, Slot::Muted);
        assert_eq!(change.value.as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn failing_store_rejects_writes() {
        let store = MemorySlotStore::new();
        store.set_failing(true);
        assert!(store.write(Slot::Scores, "[]".into()).await.is_err());
        assert_eq!(store.write_count(), 0);
        assert!(store.raw(Slot::Scores).is_none());
    }
}
