/// File-backed slot store.
pub mod file;
/// In-memory slot store.
pub mod memory;

use std::fmt;

use futures::future::BoxFuture;
use tokio::sync::broadcast;

use crate::dao::storage::StorageResult;

pub use self::file::FileSlotStore;
pub use self::memory::MemorySlotStore;

/// Capacity of the external-change broadcast channel.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Independently persisted slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Versioned score history.
    Scores,
    /// Player profile pictures.
    Profiles,
    /// Daily-challenge completion markers.
    DailyCompletions,
    /// Mute flag.
    Muted,
}

impl Slot {
    /// Every slot, in load order.
    pub const ALL: [Slot; 4] = [
        Slot::Scores,
        Slot::Profiles,
        Slot::DailyCompletions,
        Slot::Muted,
    ];

    /// Storage key of the slot.
    pub fn key(self) -> &'static str {
        match self {
            Slot::Scores => "quran-game-scores",
            Slot::Profiles => "quran-game-profiles",
            Slot::DailyCompletions => "quran-game-daily-completions",
            Slot::Muted => "quran-game-muted",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A slot modified by someone other than this process' own writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    /// Slot that changed.
    pub slot: Slot,
    /// New raw text, `None` when the slot was removed.
    pub value: Option<String>,
}

/// Key-value persistence of the raw (JSON text) slot values.
pub trait SlotStore: Send + Sync {
    fn read(&self, slot: Slot) -> BoxFuture<'static, StorageResult<Option<String>>>;
    fn write(&self, slot: Slot, value: String) -> BoxFuture<'static, StorageResult<()>>;
    fn remove(&self, slot: Slot) -> BoxFuture<'static, StorageResult<()>>;
    /// Subscribe to external modifications. Writes made through this store are not echoed.
    fn subscribe(&self) -> broadcast::Receiver<SlotChange>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
