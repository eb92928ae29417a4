//! BLAKE3 hashing of the game state.
//!
//! The hash covers the canonical JSON encoding of [`GameState`] (the flat
//! record with ordered lists), so two states hash equal exactly when they
//! persist to the same bytes. It is used to compare two ways of advancing
//! the same span and to check saved files for corruption.
//!
//! # Example
//!
//! ```
//! use farmstead_engine::snapshot::{state_hash, StateSnapshot};
//! use farmstead_state::prelude::*;
//!
//! let state = GameState::new_game(&Tunables::default(), 0);
//! let hash = state_hash(&state).unwrap();
//! assert_eq!(hash.len(), 64);
//!
//! let snapshot = StateSnapshot::capture(&state).unwrap();
//! assert_eq!(snapshot.hash, hash);
//! assert!(snapshot.verify().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use farmstead_state::state::GameState;

/// Canonical JSON bytes of `state`.
pub fn canonical_json(state: &GameState) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(state)
}

/// BLAKE3 hex digest (64 lowercase hex chars) of the canonical encoding.
pub fn state_hash(state: &GameState) -> Result<String, serde_json::Error> {
    let bytes = canonical_json(state)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ---------------------------------------------------------------------------
// StateSnapshot
// ---------------------------------------------------------------------------

/// A copy of the game state together with its hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: GameState,
    pub hash: String,
}

/// A snapshot whose recorded hash does not match its contents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("snapshot hash mismatch: recorded {recorded} but recomputed {computed}")]
pub struct HashMismatch {
    pub recorded: String,
    pub computed: String,
}

impl StateSnapshot {
    /// Clone `state` and hash it.
    pub fn capture(state: &GameState) -> Result<Self, serde_json::Error> {
        Ok(Self {
            hash: state_hash(state)?,
            state: state.clone(),
        })
    }

    /// Recompute the hash and compare it with the recorded one.
    pub fn verify(&self) -> Result<(), HashMismatch> {
        // A state that no longer encodes cannot match any recorded hash.
        let computed = state_hash(&self.state).unwrap_or_default();
        if computed == self.hash {
            Ok(())
        } else {
            Err(HashMismatch {
                recorded: self.hash.clone(),
                computed,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use farmstead_state::catalog::Tunables;

    #[test]
    fn equal_states_hash_equal() {
        let a = GameState::new_game(&Tunables::default(), 100);
        let b = GameState::new_game(&Tunables::default(), 100);
        assert_eq!(state_hash(&a).unwrap(), state_hash(&b).unwrap());
    }

    #[test]
    fn any_change_changes_the_hash() {
        let a = GameState::new_game(&Tunables::default(), 100);
        let mut b = a.clone();
        b.player.gold += 1;
        assert_ne!(state_hash(&a).unwrap(), state_hash(&b).unwrap());
    }

    #[test]
    fn hash_survives_a_json_round_trip() {
        let mut state = GameState::new_game(&Tunables::default(), 7);
        state.inventory.add(&"tomato_seed".into(), 10);
        let json = serde_json::to_string(&state).unwrap();
        let restored: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(state_hash(&state).unwrap(), state_hash(&restored).unwrap());
    }

    #[test]
    fn tampered_snapshot_fails_verification() {
        let state = GameState::new_game(&Tunables::default(), 0);
        let mut snapshot = StateSnapshot::capture(&state).unwrap();
        snapshot.state.player.gold = 1;
        let err = snapshot.verify().unwrap_err();
        assert_eq!(err.recorded, snapshot.hash);
        assert_ne!(err.computed, snapshot.hash);
    }
}
