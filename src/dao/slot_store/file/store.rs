use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::{
    fs,
    sync::{Mutex, broadcast},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

use crate::dao::{
    slot_store::{CHANGE_CHANNEL_CAPACITY, Slot, SlotChange, SlotStore},
    storage::StorageResult,
};

use super::{
    config::FileStoreConfig,
    error::{FileStoreError, FileStoreResult},
};

/// Slot store keeping one JSON file per slot inside a data directory.
#[derive(Clone)]
pub struct FileSlotStore {
    inner: Arc<Inner>,
}

struct Inner {
    data_dir: PathBuf,
    poll_interval: Duration,
    /// Contents this process last read or wrote, used to spot foreign edits.
    known: DashMap<Slot, Option<String>>,
    /// Serializes own writes against the watcher scan.
    io_gate: Mutex<()>,
    changes: broadcast::Sender<SlotChange>,
}

/// Owns the background watcher; dropping it stops the polling task.
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl FileSlotStore {
    /// Create the data directory if needed and prime the known slot contents.
    pub async fn open(config: FileStoreConfig) -> FileStoreResult<Self> {
        fs::create_dir_all(&config.data_dir)
            .await
            .map_err(|source| FileStoreError::CreateDir {
                path: config.data_dir.clone(),
                source,
            })?;

        let (changes, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let store = Self {
            inner: Arc::new(Inner {
                data_dir: config.data_dir,
                poll_interval: config.poll_interval,
                known: DashMap::new(),
                io_gate: Mutex::new(()),
                changes,
            }),
        };

        for slot in Slot::ALL {
            let contents = read_optional(&store.path(slot)).await?;
            store.inner.known.insert(slot, contents);
        }

        Ok(store)
    }

    /// Start polling the data directory for modifications made by other processes.
    pub fn spawn_watcher(&self) -> WatchHandle {
        let store = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval(store.inner.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.scan().await;
            }
        });
        WatchHandle { task }
    }

    /// Compare every slot file with the known contents and broadcast differences.
    async fn scan(&self) {
        for slot in Slot::ALL {
            let _gate = self.inner.io_gate.lock().await;
            let current = match read_optional(&self.path(slot)).await {
                Ok(contents) => contents,
                Err(err) => {
                    warn!(slot = %slot, error = %err, "failed to scan slot file");
                    continue;
                }
            };

            let changed = self
                .inner
                .known
                .get(&slot)
                .map(|known| *known != current)
                .unwrap_or(true);
            if !changed {
                continue;
            }

            debug!(slot = %slot, "slot file modified externally");
            self.inner.known.insert(slot, current.clone());
            let _ = self.inner.changes.send(SlotChange {
                slot,
                value: current,
            });
        }
    }

    fn path(&self, slot: Slot) -> PathBuf {
        self.inner.data_dir.join(format!("{}.json", slot.key()))
    }

    async fn write_slot(&self, slot: Slot, value: String) -> FileStoreResult<()> {
        let path = self.path(slot);
        let tmp = path.with_extension("json.tmp");

        let _gate = self.inner.io_gate.lock().await;
        fs::write(&tmp, value.as_bytes())
            .await
            .map_err(|source| FileStoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| FileStoreError::Rename {
                path: path.clone(),
                source,
            })?;
        self.inner.known.insert(slot, Some(value));
        Ok(())
    }

    async fn remove_slot(&self, slot: Slot) -> FileStoreResult<()> {
        let path = self.path(slot);
        let _gate = self.inner.io_gate.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(FileStoreError::Remove { path, source }),
        }
        self.inner.known.insert(slot, None);
        Ok(())
    }

    async fn read_slot(&self, slot: Slot) -> FileStoreResult<Option<String>> {
        let _gate = self.inner.io_gate.lock().await;
        let contents = read_optional(&self.path(slot)).await?;
        self.inner.known.insert(slot, contents.clone());
        Ok(contents)
    }
}

/// Read a file, mapping "not found" to `None`.
async fn read_optional(path: &Path) -> FileStoreResult<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FileStoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl SlotStore for FileSlotStore {
    fn read(&self, slot: Slot) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        Box::pin(async move { store.read_slot(slot).await.map_err(Into::into) })
    }

    fn write(&self, slot: Slot, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.write_slot(slot, value).await.map_err(Into::into) })
    }

    fn remove(&self, slot: Slot) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.remove_slot(slot).await.map_err(Into::into) })
    }

    fn subscribe(&self) -> broadcast::Receiver<SlotChange> {
        self.inner.changes.subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let path = store.inner.data_dir.clone();
            let metadata = fs::metadata(&path)
                .await
                .map_err(|source| FileStoreError::Read {
                    path: path.clone(),
                    source,
                })?;
            if metadata.is_dir() {
                Ok(())
            } else {
                Err(FileStoreError::Read {
                    path,
                    source: std::io::Error::new(ErrorKind::NotADirectory, "not a directory"),
                }
                .into())
            }
        })
    }
}
