//! Durable storage for the controller state
//!
//! The state is a single `power_on,last_active` text record. Writes go
//! through a synced temporary file that is renamed over the target, so a
//! power loss leaves either the previous or the new record on disk.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// The persisted part of the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    /// Believed amplifier power, as of the last successful actuation
    pub power_on: bool,
    /// Seconds since the UNIX epoch when audio was last observed
    pub last_active: f64,
}

impl ControllerState {
    /// Fresh state: amplifier off, idle timer starting at `now`
    pub fn fresh(now: f64) -> Self {
        Self {
            power_on: false,
            last_active: now,
        }
    }

    fn encode(&self) -> String {
        format!("{},{}", self.power_on, self.last_active)
    }

    fn decode(record: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = record.trim().split(',').collect();
        let [power, timestamp] = fields.as_slice() else {
            return Err(ParseError::FieldCount(fields.len()));
        };

        let power_on = match power.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            other => return Err(ParseError::Power(other.to_string())),
        };

        let last_active: f64 = timestamp
            .trim()
            .parse()
            .map_err(|_| ParseError::Timestamp(timestamp.to_string()))?;
        if !last_active.is_finite() {
            return Err(ParseError::Timestamp(timestamp.to_string()));
        }

        Ok(Self {
            power_on,
            last_active,
        })
    }
}

/// Errors writing the state file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file has no parent directory: {0}")]
    NoParent(PathBuf),

    #[error("failed to write state file: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a state record is rejected on load
#[derive(Debug, thiserror::Error)]
enum ParseError {
    #[error("expected 2 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid power flag {0:?}")]
    Power(String),

    #[error("invalid timestamp {0:?}")]
    Timestamp(String),
}

/// File-backed store for [`ControllerState`]
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state, falling back to [`ControllerState::fresh`]
    ///
    /// Never fails: a missing, unreadable or malformed file yields the
    /// default state.
    pub fn load(&self, now: f64) -> ControllerState {
        let record = match std::fs::read_to_string(&self.path) {
            Ok(record) => record,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = ?self.path, "no state file, starting with amplifier off");
                return ControllerState::fresh(now);
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "state file unreadable, starting with amplifier off");
                return ControllerState::fresh(now);
            }
        };

        match ControllerState::decode(&record) {
            Ok(state) => {
                info!(
                    power = if state.power_on { "ON" } else { "OFF" },
                    "recovered state"
                );
                state
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "state file corrupt, starting with amplifier off");
                ControllerState::fresh(now)
            }
        }
    }

    /// Write the state and sync it to stable storage before returning
    pub fn save(&self, state: &ControllerState) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
            Some(dir) => dir,
            None => return Err(StoreError::NoParent(self.path.clone())),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(state.encode().as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        // Make the rename itself durable
        File::open(dir)?.sync_all()?;

        debug!(path = ?self.path, power_on = state.power_on, last_active = state.last_active, "state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> StateStore {
        StateStore::new(dir.path().join(".amp_state"))
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        for state in [
            ControllerState { power_on: true, last_active: 1_700_000_000.125 },
            ControllerState { power_on: false, last_active: 0.0 },
            ControllerState { power_on: true, last_active: 1e-7 },
            ControllerState { power_on: false, last_active: 1_712_345_678.987_654 },
        ] {
            store.save(&state).unwrap();
            assert_eq!(store.load(42.0), state);
        }
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = store_in(&dir).load(123.5);
        assert_eq!(state, ControllerState::fresh(123.5));
        assert!(!state.power_on);
    }

    #[test]
    fn test_corrupt_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        for garbage in ["", "tru", "true", "true,", "maybe,12.0", "true,abc", "true,1.0,2.0", "true,NaN", "\u{0}\u{1}"] {
            std::fs::write(store.path(), garbage).unwrap();
            assert_eq!(store.load(7.0), ControllerState::fresh(7.0), "record {garbage:?}");
        }
    }

    #[test]
    fn test_loads_capitalized_flags() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        std::fs::write(store.path(), "True,1712000000.5\n").unwrap();
        assert_eq!(
            store.load(0.0),
            ControllerState { power_on: true, last_active: 1712000000.5 }
        );

        std::fs::write(store.path(), "False,10").unwrap();
        assert_eq!(
            store.load(0.0),
            ControllerState { power_on: false, last_active: 10.0 }
        );
    }

    #[test]
    fn test_save_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&ControllerState { power_on: true, last_active: 1.0 }).unwrap();
        store.save(&ControllerState { power_on: false, last_active: 2.0 }).unwrap();

        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "false,2");
        // No temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("missing").join(".amp_state"));
        let result = store.save(&ControllerState::fresh(1.0));
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
