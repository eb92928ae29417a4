//! Planted or placed entity instances.
//!
//! An [`EntityInstance`] is plain data. The timers are advanced by the
//! lifecycle engine in `farmstead-engine`; this module only knows how to build
//! a fresh instance and answer questions about its current state.

use serde::{Deserialize, Serialize};

use crate::catalog::EntityKindDef;
use crate::ids::{EntityInstanceId, EntityKindId, PlotId};

// ---------------------------------------------------------------------------
// EntityState
// ---------------------------------------------------------------------------

/// Lifecycle stage of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    /// Waiting for the first production.
    Growing,
    /// Holding yield and still able to produce more.
    ReadyToHarvest,
    /// Holding yield that will be lost when the decay timer runs out.
    Decaying,
    /// Terminal. The owning plot removes dead entities.
    Dead,
}

impl EntityState {
    /// Whether a harvest may take yield from an entity in this state.
    pub fn accepts_harvest(self) -> bool {
        matches!(self, EntityState::ReadyToHarvest | EntityState::Decaying)
    }
}

// ---------------------------------------------------------------------------
// EntityInstance
// ---------------------------------------------------------------------------

/// One plant or animal on a plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInstance {
    pub id: EntityInstanceId,
    pub kind: EntityKindId,
    pub plot_id: PlotId,
    /// Slot within the plot, unique among the plot's entities.
    pub position_index: u32,
    pub state: EntityState,
    /// Number of productions so far. Never exceeds the kind's yield limit.
    pub yields_produced: u32,
    /// Produced but not yet harvested quantity.
    pub accumulated_yield: u64,
    /// Seconds until the next production.
    pub time_to_next_yield: f64,
    /// Seconds until the held yield rots.
    pub time_to_decay: f64,
    /// Unix seconds of the last save that included this entity.
    pub last_update_epoch: i64,
}

impl EntityInstance {
    /// A freshly planted entity with full timers.
    pub fn new(
        id: EntityInstanceId,
        kind: &EntityKindDef,
        plot_id: PlotId,
        position_index: u32,
        epoch: i64,
    ) -> Self {
        Self {
            id,
            kind: kind.id.clone(),
            plot_id,
            position_index,
            state: EntityState::Growing,
            yields_produced: 0,
            accumulated_yield: 0,
            time_to_next_yield: kind.production_time_secs,
            time_to_decay: kind.decay_time_secs,
            last_update_epoch: epoch,
        }
    }

    /// Holds yield in a state that accepts a harvest.
    pub fn is_harvestable(&self) -> bool {
        self.state.accepts_harvest() && self.accumulated_yield > 0
    }

    /// Still below the production limit of `kind`.
    pub fn can_produce(&self, kind: &EntityKindDef) -> bool {
        self.yields_produced < kind.total_yields_limit
    }

    pub fn is_dead(&self) -> bool {
        self.state == EntityState::Dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn cow() -> EntityKindDef {
        EntityKindDef {
            id: "milk_cow".into(),
            name: String::new(),
            category: Category::Animal,
            production_time_secs: 1800.0,
            base_yield: 1,
            total_yields_limit: 100,
            decay_time_secs: 3600.0,
            quantity_per_plot: 1,
            produced_item: "milk".into(),
        }
    }

    #[test]
    fn new_entity_starts_growing_with_full_timers() {
        let e = EntityInstance::new(EntityInstanceId(4), &cow(), PlotId(1), 0, 100);
        assert_eq!(e.state, EntityState::Growing);
        assert_eq!(e.time_to_next_yield, 1800.0);
        assert_eq!(e.time_to_decay, 3600.0);
        assert_eq!(e.accumulated_yield, 0);
        assert!(!e.is_harvestable());
        assert!(e.can_produce(&cow()));
    }

    #[test]
    fn harvestable_requires_yield_and_state() {
        let mut e = EntityInstance::new(EntityInstanceId(0), &cow(), PlotId(0), 0, 0);
        e.accumulated_yield = 2;
        assert!(!e.is_harvestable(), "growing entities are never harvestable");
        e.state = EntityState::Decaying;
        assert!(e.is_harvestable());
        e.accumulated_yield = 0;
        assert!(!e.is_harvestable());
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&EntityState::ReadyToHarvest).unwrap();
        assert_eq!(json, "\"ready_to_harvest\"");
    }
}
