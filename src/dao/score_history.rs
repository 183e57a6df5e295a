//! Codec for the versioned score-history slot.

use serde::Deserialize;

use crate::dao::models::{ScoreRecord, StoredScores};

/// Schema version written by this release.
pub const CURRENT_SCORE_VERSION: u32 = 1;

/// Shape the stored history was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFormat {
    /// Envelope tagged with [`CURRENT_SCORE_VERSION`].
    Current,
    /// Bare array written before versioning; must be wrapped and re-persisted.
    Legacy,
    /// Envelope tagged with another version; accepted as-is, pending a migration.
    Outdated {
        /// Version found in storage.
        stored: u32,
    },
    /// Unparseable payload; the history restarts empty.
    Malformed,
}

/// Result of decoding the raw slot text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHistory {
    /// Records in stored order.
    pub records: Vec<ScoreRecord>,
    /// Detected layout.
    pub format: HistoryFormat,
}

impl DecodedHistory {
    /// Only legacy arrays are rewritten on load.
    pub fn needs_repersist(&self) -> bool {
        matches!(self.format, HistoryFormat::Legacy)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHistory {
    Versioned(StoredScores),
    Legacy(Vec<ScoreRecord>),
}

/// Decode the raw text of the scores slot.
pub fn decode(raw: &str) -> DecodedHistory {
    match serde_json::from_str::<RawHistory>(raw) {
        Ok(RawHistory::Versioned(stored)) => {
            let format = if stored.version == CURRENT_SCORE_VERSION {
                HistoryFormat::Current
            } else {
                HistoryFormat::Outdated {
                    stored: stored.version,
                }
            };
            DecodedHistory {
                records: stored.data,
                format,
            }
        }
        Ok(RawHistory::Legacy(records)) => DecodedHistory {
            records,
            format: HistoryFormat::Legacy,
        },
        Err(_) => DecodedHistory {
            records: Vec::new(),
            format: HistoryFormat::Malformed,
        },
    }
}

/// Encode records in the current envelope.
pub fn encode(records: &[ScoreRecord]) -> serde_json::Result<String> {
    #[derive(serde::Serialize)]
    struct Envelope<'a> {
        version: u32,
        data: &'a [ScoreRecord],
    }

    serde_json::to_string(&Envelope {
        version: CURRENT_SCORE_VERSION,
        data: records,
    })
}
