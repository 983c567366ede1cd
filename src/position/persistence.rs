//! JSON persistence for the position store.
//!
//! The whole store lives in one file so active positions and history are
//! always written together. Writes go to a sibling temp file which is then
//! renamed over the target.
//!
//! Two sessions sharing one file are last-writer-wins: nothing here locks
//! the file or merges concurrent edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::position::model::{HistoryEntry, Position};
use crate::position::store::PositionStore;

/// Current on-disk format version
pub const STORE_VERSION: u32 = 1;

/// Default file name inside the data directory
pub const STORE_FILE_NAME: &str = "positions.json";

/// Errors from store persistence operations.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// IO error reading/writing file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File parsed but its contents break position invariants.
    #[error("corrupt store {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("unsupported store version {0}")]
    UnsupportedVersion(u32),
}

/// Format saved to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub active: Vec<Position>,
    pub history: Vec<HistoryEntry>,
}

impl StoreSnapshot {
    pub fn from_store(store: &PositionStore) -> Self {
        Self {
            version: STORE_VERSION,
            saved_at: Utc::now(),
            active: store.list_active().to_vec(),
            history: store.list_history().to_vec(),
        }
    }
}

/// A store file on disk
#[derive(Debug, Clone)]
pub struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `positions.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store, or an empty one if the file does not exist yet
    pub fn load(&self) -> Result<PositionStore, PersistenceError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No store file, starting empty");
            return Ok(PositionStore::new());
        }

        let file = File::open(&self.path)?;
        let snapshot: StoreSnapshot = serde_json::from_reader(BufReader::new(file))?;
        if snapshot.version != STORE_VERSION {
            return Err(PersistenceError::UnsupportedVersion(snapshot.version));
        }

        let store = PositionStore::from_parts(snapshot.active, snapshot.history).map_err(|e| {
            PersistenceError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;

        info!(
            path = %self.path.display(),
            active = store.active_count(),
            history = store.list_history().len(),
            "Loaded position store"
        );
        Ok(store)
    }

    /// Write the store atomically
    pub fn save(&self, store: &PositionStore) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let snapshot = StoreSnapshot::from_store(store);
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!(
            path = %self.path.display(),
            active = snapshot.active.len(),
            history = snapshot.history.len(),
            "Saved position store"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hedge::{HedgeCalculator, OptionType};
    use crate::position::{NewPosition, PositionUpdate};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn populated_store() -> PositionStore {
        let calc = HedgeCalculator::default();
        let mut store = PositionStore::new();
        for (strike, option_type) in [
            (dec!(72000), OptionType::Call),
            (dec!(65000.5), OptionType::Put),
            (dec!(80000), OptionType::Call),
        ] {
            store
                .create(
                    NewPosition {
                        underlying_symbol: "BTC".to_string(),
                        expiry: "29MAR".to_string(),
                        option_type,
                        strike,
                        size: dec!(0.1),
                        entry_delta: dec!(0.4321),
                        band: dec!(0.0038),
                    },
                    &calc,
                    Utc::now(),
                )
                .unwrap();
        }
        store
            .update(
                "BTC-29MAR-72000-C",
                PositionUpdate {
                    last_delta: Some(dec!(0.51234567)),
                    current_hedge: Some(dec!(0.051234567)),
                },
                Utc::now(),
            )
            .unwrap();
        store.close("BTC-29MAR-80000-C", Utc::now()).unwrap();
        store
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let file = StoreFile::in_dir(dir.path());
        let store = file.load().unwrap();
        assert_eq!(store.active_count(), 0);
        assert!(store.list_history().is_empty());
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = TempDir::new().unwrap();
        let file = StoreFile::in_dir(dir.path().join("nested"));
        let store = populated_store();

        file.save(&store).unwrap();
        let loaded = file.load().unwrap();

        assert_eq!(loaded, store);
        assert_eq!(
            loaded.get("BTC-29MAR-72000-C").unwrap().current_hedge.to_string(),
            "0.051234567"
        );
        assert!(!file.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_garbage_file_is_error() {
        let dir = TempDir::new().unwrap();
        let file = StoreFile::in_dir(dir.path());
        fs::write(file.path(), "{ not json").unwrap();
        assert!(matches!(file.load(), Err(PersistenceError::Json(_))));
    }

    #[test]
    fn test_invariant_violation_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let file = StoreFile::in_dir(dir.path());
        file.save(&populated_store()).unwrap();

        let raw = fs::read_to_string(file.path()).unwrap();
        fs::write(file.path(), raw.replace("\"0.4321\"", "\"1.4321\"")).unwrap();

        assert!(matches!(file.load(), Err(PersistenceError::Corrupt { .. })));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let dir = TempDir::new().unwrap();
        let file = StoreFile::in_dir(dir.path());
        fs::write(
            file.path(),
            r#"{"version": 9, "saved_at": "2026-01-01T00:00:00Z", "active": [], "history": []}"#,
        )
        .unwrap();
        assert!(matches!(file.load(), Err(PersistenceError::UnsupportedVersion(9))));
    }
}
