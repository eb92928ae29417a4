//! Farmstead journal -- change notification for the farm simulation.
//!
//! Engines describe what they changed as [`FarmEvent`](event::FarmEvent)s
//! recorded into an [`EventJournal`](journal::EventJournal). The driver hands
//! the journal to registered [`FarmListener`](listener::FarmListener)s once an
//! operation completes, so every data flow is visible in function signatures.
//!
//! # Modules
//!
//! - [`event`]: the event vocabulary and the [`Cause`](event::Cause) tag.
//! - [`journal`]: per-operation record with query helpers.
//! - [`listener`]: observer trait and the listener registry.

#![deny(unsafe_code)]

pub mod event;
pub mod journal;
pub mod listener;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::event::{Cause, FarmEvent};
    pub use crate::journal::{EventJournal, JournalEntry};
    pub use crate::listener::{FarmListener, ListenerId, Listeners};
}
