use std::{path::PathBuf, time::Duration};

/// Default directory holding the slot files.
const DEFAULT_DATA_DIR: &str = "data";
/// Default interval between two scans for external modifications.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Runtime configuration of the file-backed slot store.
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Directory holding one JSON file per slot.
    pub data_dir: PathBuf,
    /// Delay between two scans for foreign edits.
    pub poll_interval: Duration,
}

impl FileStoreConfig {
    /// Construct a configuration rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the external-change scan interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}
