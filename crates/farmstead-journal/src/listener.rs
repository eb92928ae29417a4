//! Observer interface for journal entries.
//!
//! Hosts register [`FarmListener`]s with the driver instead of subscribing to
//! global event buses. After every operation the driver passes the
//! operation's journal to [`Listeners::notify`], which forwards each entry to
//! every listener in registration order.

use crate::journal::{EventJournal, JournalEntry};

/// Receives journal entries after each farm operation.
pub trait FarmListener {
    fn on_event(&mut self, entry: &JournalEntry);
}

impl<F> FarmListener for F
where
    F: FnMut(&JournalEntry),
{
    fn on_event(&mut self, entry: &JournalEntry) {
        self(entry)
    }
}

/// Handle returned by [`Listeners::add`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registered listeners in registration order.
#[derive(Default)]
pub struct Listeners {
    next: u64,
    entries: Vec<(ListenerId, Box<dyn FarmListener>)>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Box<dyn FarmListener>) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.entries.push((id, listener));
        id
    }

    /// Unregister a listener. Returns `false` if the id is unknown.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forward every entry of `journal` to every listener.
    pub fn notify(&mut self, journal: &EventJournal) {
        if self.entries.is_empty() || journal.is_empty() {
            return;
        }
        for entry in journal.entries() {
            for (_, listener) in &mut self.entries {
                listener.on_event(entry);
            }
        }
    }
}
