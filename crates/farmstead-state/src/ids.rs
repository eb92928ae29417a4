//! Identifiers for plots, workers, entity instances and catalog kinds.
//!
//! Runtime identifiers ([`PlotId`], [`WorkerId`], [`EntityInstanceId`]) are
//! small integers so that every collection in
//! [`GameState`](crate::state::GameState) iterates in a stable, ascending
//! order. Catalog identifiers ([`ItemId`], [`EntityKindId`]) are opaque
//! strings owned by the external catalog.
//!
//! Entity instance ids come from an [`IdAllocator`] stored inside the game
//! state, so two simulations that start from the same state hand out the same
//! ids in the same order.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PlotId
// ---------------------------------------------------------------------------

/// Identifier of a placement plot. Plots are scanned in ascending id order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlotId(pub u32);

impl fmt::Debug for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlotId({})", self.0)
    }
}

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plot_{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// WorkerId
// ---------------------------------------------------------------------------

/// Identifier of a hired worker. Idle workers are served in ascending id order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub u32);

impl fmt::Debug for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkerId({})", self.0)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker_{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityInstanceId
// ---------------------------------------------------------------------------

/// Opaque unique key of a planted or placed entity.
///
/// Ids are never reused within one game: the allocator only moves forward.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityInstanceId(pub u64);

impl fmt::Debug for EntityInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityInstanceId({})", self.0)
    }
}

impl fmt::Display for EntityInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity_{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Catalog identifiers
// ---------------------------------------------------------------------------

/// Catalog key of an item kind (seed, product, animal, currency...).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({:?})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Catalog key of an entity kind (a plant or animal species).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKindId(pub String);

impl EntityKindId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EntityKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKindId({:?})", self.0)
    }
}

impl fmt::Display for EntityKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKindId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

// ---------------------------------------------------------------------------
// IdAllocator
// ---------------------------------------------------------------------------

/// Monotonic allocator for [`EntityInstanceId`]s.
///
/// Persisted with the game state. On load, [`IdAllocator::reserve_past`]
/// moves the cursor beyond any id already present so a hand-edited save can
/// never produce a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next unused id.
    pub fn allocate(&mut self) -> EntityInstanceId {
        let id = EntityInstanceId(self.next);
        self.next += 1;
        id
    }

    /// The id that the next [`allocate`](Self::allocate) call will return.
    pub fn peek(&self) -> EntityInstanceId {
        EntityInstanceId(self.next)
    }

    /// Ensure every future id is strictly greater than `id`.
    pub fn reserve_past(&mut self, id: EntityInstanceId) {
        if id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_hands_out_increasing_ids() {
        let mut alloc = IdAllocator::new();
        let ids: Vec<EntityInstanceId> = (0..5).map(|_| alloc.allocate()).collect();
        assert_eq!(ids[0], EntityInstanceId(0));
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(alloc.peek(), EntityInstanceId(5));
    }

    #[test]
    fn reserve_past_skips_existing_ids() {
        let mut alloc = IdAllocator::new();
        alloc.reserve_past(EntityInstanceId(41));
        assert_eq!(alloc.allocate(), EntityInstanceId(42));

        // Reserving below the cursor is a no-op.
        alloc.reserve_past(EntityInstanceId(3));
        assert_eq!(alloc.allocate(), EntityInstanceId(43));
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&PlotId(7)).unwrap();
        assert_eq!(json, "7");
        let item: ItemId = serde_json::from_str("\"tomato_seed\"").unwrap();
        assert_eq!(item, ItemId::from("tomato_seed"));
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(PlotId(2).to_string(), "plot_2");
        assert_eq!(WorkerId(0).to_string(), "worker_0");
        assert_eq!(EntityInstanceId(9).to_string(), "entity_9");
        assert_eq!(EntityKindId::from("milk_cow").to_string(), "milk_cow");
    }
}
