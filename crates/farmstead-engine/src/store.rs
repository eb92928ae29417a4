//! Persistence of the game state.
//!
//! A [`Store`] loads and saves one [`GameState`]. Saves are wrapped in a
//! versioned [`SaveEnvelope`] that records the BLAKE3 hash of the state, and
//! every load recomputes it. A mismatch is reported as
//! [`StoreError::IntegrityMismatch`] instead of handing partial data to the
//! simulation.
//!
//! [`JsonFileStore`] keeps the previous save as a backup and falls back to it
//! when the main file is missing or unreadable. [`MemoryStore`] holds the
//! encoded bytes in memory.
//!
//! # Example
//!
//! ```
//! use farmstead_engine::store::{MemoryStore, Store};
//! use farmstead_state::prelude::*;
//!
//! let mut store = MemoryStore::new();
//! assert!(store.load_state().unwrap().is_none());
//!
//! let state = GameState::new_game(&Tunables::default(), 1_700_000_000);
//! store.save_state(&state).unwrap();
//! assert_eq!(store.load_state().unwrap(), Some(state));
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use farmstead_state::state::{GameState, GameStateRecord, RecordError};

use crate::snapshot::state_hash;

/// Current envelope format.
pub const SAVE_FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failures of loading or saving.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A file could not be read, written or renamed.
    #[error("failed to access save file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The save is not valid JSON or does not match the envelope layout.
    #[error("failed to parse save data: {0}")]
    Json(#[from] serde_json::Error),

    /// The recorded hash does not match the decoded state.
    #[error("save integrity check failed: recorded {recorded} but computed {computed}")]
    IntegrityMismatch { recorded: String, computed: String },

    /// The envelope was written by an incompatible format version.
    #[error("unsupported save format version {found} (expected {expected})", expected = SAVE_FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },

    /// The decoded record cannot form a valid game state.
    #[error("saved state is invalid: {0}")]
    InvalidState(#[from] RecordError),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// On-disk wrapper around a saved state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    /// Unix seconds of the save, equal to the state's `last_update_epoch`.
    pub saved_at: i64,
    /// BLAKE3 hex digest of the state's canonical encoding.
    pub hash: String,
    pub state: GameState,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Deserialize)]
struct RawEnvelope {
    hash: String,
    state: GameStateRecord,
}

/// Encode `state` as a pretty-printed envelope.
pub fn encode(state: &GameState) -> Result<Vec<u8>, StoreError> {
    let envelope = SaveEnvelope {
        version: SAVE_FORMAT_VERSION,
        saved_at: state.last_update_epoch,
        hash: state_hash(state)?,
        state: state.clone(),
    };
    Ok(serde_json::to_vec_pretty(&envelope)?)
}

/// Decode and verify an envelope.
pub fn decode(bytes: &[u8]) -> Result<GameState, StoreError> {
    let probe: VersionProbe = serde_json::from_slice(bytes)?;
    if probe.version != SAVE_FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: probe.version,
        });
    }
    let raw: RawEnvelope = serde_json::from_slice(bytes)?;
    let state = GameState::try_from(raw.state)?;
    let computed = state_hash(&state)?;
    if computed != raw.hash {
        return Err(StoreError::IntegrityMismatch {
            recorded: raw.hash,
            computed,
        });
    }
    Ok(state)
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Loads and saves the single game state of a player.
pub trait Store {
    /// The saved state, or `None` when nothing has been saved yet.
    fn load_state(&self) -> Result<Option<GameState>, StoreError>;

    /// Replace the saved state.
    fn save_state(&mut self, state: &GameState) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// JSON save file with a backup of the previous save.
///
/// Writes go to a temporary sibling file that is then renamed over the main
/// file, so an interrupted save never leaves a truncated main file behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    backup_path: PathBuf,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

impl JsonFileStore {
    /// A store at `path` with its backup at `path` + `.bak`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = with_suffix(&path, ".bak");
        Self { path, backup_path }
    }

    /// A store with an explicit backup location.
    pub fn with_backup(path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    fn read(path: &Path) -> Result<Option<GameState>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => decode(&bytes).map(Some),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }
}

impl Store for JsonFileStore {
    fn load_state(&self) -> Result<Option<GameState>, StoreError> {
        let main_err = match Self::read(&self.path) {
            Ok(Some(state)) => {
                tracing::debug!(path = %self.path.display(), "save loaded");
                return Ok(Some(state));
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "save unreadable, trying backup");
                Some(err)
            }
        };

        match Self::read(&self.backup_path) {
            Ok(Some(state)) => {
                tracing::warn!(path = %self.backup_path.display(), "restored from backup");
                Ok(Some(state))
            }
            Ok(None) => main_err.map_or(Ok(None), Err),
            Err(backup_err) => Err(main_err.unwrap_or(backup_err)),
        }
    }

    fn save_state(&mut self, state: &GameState) -> Result<(), StoreError> {
        let bytes = encode(state)?;

        // Only a readable save is worth keeping as the backup.
        if matches!(Self::read(&self.path), Ok(Some(_))) {
            fs::copy(&self.path, &self.backup_path)
                .map_err(|err| StoreError::io(&self.backup_path, err))?;
        }

        let tmp = with_suffix(&self.path, ".tmp");
        fs::write(&tmp, &bytes).map_err(|err| StoreError::io(&tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| StoreError::io(&self.path, err))?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "save written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store holding the encoded envelope.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
    saves: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with raw bytes, valid or not.
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            saves: 0,
        }
    }

    /// The stored bytes, if any.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> u64 {
        self.saves
    }
}

impl Store for MemoryStore {
    fn load_state(&self) -> Result<Option<GameState>, StoreError> {
        self.bytes.as_deref().map(decode).transpose()
    }

    fn save_state(&mut self, state: &GameState) -> Result<(), StoreError> {
        self.bytes = Some(encode(state)?);
        self.saves += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
