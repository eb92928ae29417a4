//! Event journal for one farm operation.
//!
//! The [`EventJournal`] records every [`FarmEvent`] produced while the farm
//! advances or handles a player action. Each entry ([`JournalEntry`]) carries
//! a sequence number, the [`Cause`] that was current when it was recorded and
//! the simulated offset at which it happened, measured from the start of the
//! operation.
//!
//! Engines record into the journal; the driver clears it at the start of each
//! operation and hands the entries to listeners once the operation is done.
//!
//! # Query API
//!
//! - **Plot**: [`EventJournal::for_plot`]
//! - **Worker**: [`EventJournal::for_worker`]
//! - **Entity**: [`EventJournal::for_entity`]
//! - **Cause**: [`EventJournal::with_cause`]
//!
//! # Example
//!
//! ```
//! use farmstead_journal::prelude::*;
//! use farmstead_state::ids::PlotId;
//!
//! let mut journal = EventJournal::new();
//! journal.set_cause(Cause::Player);
//! journal.record(FarmEvent::PlotAdded { plot: PlotId(3) });
//!
//! assert_eq!(journal.len(), 1);
//! assert_eq!(journal.for_plot(PlotId(3)).count(), 1);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use farmstead_state::ids::{EntityInstanceId, PlotId, WorkerId};

use crate::event::{Cause, FarmEvent};

// ---------------------------------------------------------------------------
// JournalEntry
// ---------------------------------------------------------------------------

/// A recorded event with its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position of the entry within the operation, starting at zero.
    pub sequence: u64,
    /// Simulated time since the operation began.
    pub at: Duration,
    pub cause: Cause,
    pub event: FarmEvent,
}

// ---------------------------------------------------------------------------
// EventJournal
// ---------------------------------------------------------------------------

/// Accumulates [`JournalEntry`] values for one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
    cause: Cause,
    at: Duration,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl EventJournal {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cause: Cause::Player,
            at: Duration::ZERO,
        }
    }

    /// Drop every entry and rewind the clock. The cause is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.at = Duration::ZERO;
    }

    /// Set the cause attached to subsequently recorded events.
    pub fn set_cause(&mut self, cause: Cause) {
        self.cause = cause;
    }

    pub fn cause(&self) -> Cause {
        self.cause
    }

    /// Set the simulated offset attached to subsequently recorded events.
    pub fn set_clock(&mut self, at: Duration) {
        self.at = at;
    }

    /// Append an event under the current cause and clock.
    pub fn record(&mut self, event: FarmEvent) {
        let sequence = self.entries.len() as u64;
        tracing::trace!(sequence, cause = ?self.cause, ?event, "journal entry");
        self.entries.push(JournalEntry {
            sequence,
            at: self.at,
            cause: self.cause,
            event,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in recording order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn for_plot(&self, plot: PlotId) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .iter()
            .filter(move |e| e.event.plot() == Some(plot))
    }

    pub fn for_worker(&self, worker: WorkerId) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .iter()
            .filter(move |e| e.event.worker() == Some(worker))
    }

    pub fn for_entity(&self, entity: EntityInstanceId) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .iter()
            .filter(move |e| e.event.entity() == Some(entity))
    }

    pub fn with_cause(&self, cause: Cause) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| e.cause == cause)
    }

    /// Encode the entries as newline-delimited JSON.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
