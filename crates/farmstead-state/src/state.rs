//! The aggregate game state.
//!
//! [`GameState`] owns every plot, entity, worker and inventory count, plus the
//! player's wallet and the entity id allocator. It is the single unit handed
//! to the persistence layer. All collections are ordered maps keyed by id so
//! iteration order is deterministic.
//!
//! On the wire the state is a flat record with nested lists (see
//! [`GameStateRecord`]); decoding re-checks id uniqueness and moves the
//! allocator past every stored entity id.
//!
//! # Example
//!
//! ```
//! use farmstead_state::prelude::*;
//!
//! let state = GameState::new_game(&Tunables::default(), 0);
//! assert_eq!(state.plots().count(), 3);
//! assert_eq!(state.workers().count(), 1);
//! assert_eq!(state.player.gold, 1000);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{EntityKindDef, Tunables};
use crate::entity::EntityInstance;
use crate::ids::{EntityInstanceId, IdAllocator, ItemId, PlotId, WorkerId};
use crate::inventory::Inventory;
use crate::plot::Plot;
use crate::worker::WorkerInstance;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Wallet and upgrade level of the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub gold: u64,
    /// Lifetime gold earned from sales. Drives the win condition.
    pub earned_gold_total: u64,
    pub equipment_level: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            gold: 0,
            earned_gold_total: 0,
            equipment_level: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Aggregate root of the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "GameStateRecord", try_from = "GameStateRecord")]
pub struct GameState {
    /// Unix seconds at which the state was last saved.
    pub last_update_epoch: i64,
    pub player: Player,
    pub inventory: Inventory,
    plots: BTreeMap<PlotId, Plot>,
    entities: BTreeMap<EntityInstanceId, EntityInstance>,
    workers: BTreeMap<WorkerId, WorkerInstance>,
    ids: IdAllocator,
}

impl GameState {
    /// An empty state: no plots, workers or items.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new game seeded from the starting values in `tunables`.
    pub fn new_game(tunables: &Tunables, epoch: i64) -> Self {
        let start = &tunables.starting;
        let mut state = Self {
            last_update_epoch: epoch,
            player: Player {
                gold: start.gold,
                earned_gold_total: 0,
                equipment_level: start.equipment_level,
            },
            inventory: start
                .inventory
                .iter()
                .map(|(item, count)| (item.clone(), *count))
                .collect(),
            ..Self::default()
        };
        for _ in 0..start.plots {
            state.add_plot();
        }
        for _ in 0..start.workers {
            state.add_worker();
        }
        state
    }

    // -- Plots --------------------------------------------------------------

    pub fn plot(&self, id: PlotId) -> Option<&Plot> {
        self.plots.get(&id)
    }

    pub fn plot_mut(&mut self, id: PlotId) -> Option<&mut Plot> {
        self.plots.get_mut(&id)
    }

    /// Plots in ascending id order.
    pub fn plots(&self) -> impl Iterator<Item = &Plot> {
        self.plots.values()
    }

    pub fn plot_ids(&self) -> Vec<PlotId> {
        self.plots.keys().copied().collect()
    }

    /// Append a new `Empty` plot and return its id.
    pub fn add_plot(&mut self) -> PlotId {
        let id = self
            .plots
            .keys()
            .next_back()
            .map_or(PlotId(0), |last| PlotId(last.0 + 1));
        self.plots.insert(id, Plot::empty(id));
        id
    }

    /// Insert or replace a plot as given.
    pub fn insert_plot(&mut self, plot: Plot) {
        self.plots.insert(plot.id, plot);
    }

    // -- Entities -----------------------------------------------------------

    pub fn entity(&self, id: EntityInstanceId) -> Option<&EntityInstance> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityInstanceId) -> Option<&mut EntityInstance> {
        self.entities.get_mut(&id)
    }

    /// Entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityInstance> {
        self.entities.values()
    }

    pub fn entity_ids(&self) -> Vec<EntityInstanceId> {
        self.entities.keys().copied().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Entities on `plot` in ascending id order.
    pub fn entities_on_plot(&self, plot: PlotId) -> impl Iterator<Item = &EntityInstance> {
        self.entities.values().filter(move |e| e.plot_id == plot)
    }

    pub fn entity_ids_on_plot(&self, plot: PlotId) -> Vec<EntityInstanceId> {
        self.entities_on_plot(plot).map(|e| e.id).collect()
    }

    /// Create a fresh entity of `kind` at `position` on `plot`.
    ///
    /// Placement rules are not checked here; callers validate first.
    pub fn spawn_entity(
        &mut self,
        kind: &EntityKindDef,
        plot: PlotId,
        position: u32,
        epoch: i64,
    ) -> EntityInstanceId {
        let id = self.ids.allocate();
        self.entities
            .insert(id, EntityInstance::new(id, kind, plot, position, epoch));
        id
    }

    pub fn remove_entity(&mut self, id: EntityInstanceId) -> Option<EntityInstance> {
        self.entities.remove(&id)
    }

    /// The id the next spawned entity will receive.
    pub fn next_entity_id(&self) -> EntityInstanceId {
        self.ids.peek()
    }

    // -- Workers ------------------------------------------------------------

    pub fn worker(&self, id: WorkerId) -> Option<&WorkerInstance> {
        self.workers.get(&id)
    }

    pub fn worker_mut(&mut self, id: WorkerId) -> Option<&mut WorkerInstance> {
        self.workers.get_mut(&id)
    }

    /// Workers in ascending id order.
    pub fn workers(&self) -> impl Iterator<Item = &WorkerInstance> {
        self.workers.values()
    }

    pub fn workers_mut(&mut self) -> impl Iterator<Item = &mut WorkerInstance> {
        self.workers.values_mut()
    }

    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.workers.keys().copied().collect()
    }

    /// Hire a new idle worker and return its id.
    pub fn add_worker(&mut self) -> WorkerId {
        let id = self
            .workers
            .keys()
            .next_back()
            .map_or(WorkerId(0), |last| WorkerId(last.0 + 1));
        self.workers.insert(id, WorkerInstance::idle(id));
        id
    }

    /// The busy worker currently targeting `plot`, if any.
    pub fn worker_targeting(&self, plot: PlotId) -> Option<&WorkerInstance> {
        self.workers.values().find(|w| w.targets(plot))
    }

    // -- Persistence helpers -------------------------------------------------

    /// Stamp `epoch` on the state and on every entity and worker.
    pub fn stamp_epoch(&mut self, epoch: i64) {
        self.last_update_epoch = epoch;
        for entity in self.entities.values_mut() {
            entity.last_update_epoch = epoch;
        }
        for worker in self.workers.values_mut() {
            worker.last_update_epoch = epoch;
        }
    }
}

// ---------------------------------------------------------------------------
// Flat record
// ---------------------------------------------------------------------------

/// One inventory line in the flat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCount {
    pub item: ItemId,
    pub count: u64,
}

/// Persisted layout of a [`GameState`]: plain lists, no maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateRecord {
    pub last_update_epoch: i64,
    pub player: Player,
    pub plots: Vec<Plot>,
    pub entities: Vec<EntityInstance>,
    pub workers: Vec<WorkerInstance>,
    pub inventory: Vec<ItemCount>,
    pub next_entity_id: u64,
}

/// A record that cannot be turned back into a [`GameState`].
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("plot {0} appears more than once")]
    DuplicatePlot(PlotId),

    #[error("entity {0} appears more than once")]
    DuplicateEntity(EntityInstanceId),

    #[error("worker {0} appears more than once")]
    DuplicateWorker(WorkerId),

    #[error("player equipment level must be at least 1")]
    InvalidEquipmentLevel,
}

impl From<GameState> for GameStateRecord {
    fn from(state: GameState) -> Self {
        Self {
            last_update_epoch: state.last_update_epoch,
            player: state.player,
            plots: state.plots.into_values().collect(),
            entities: state.entities.into_values().collect(),
            workers: state.workers.into_values().collect(),
            inventory: state
                .inventory
                .iter()
                .map(|(item, count)| ItemCount {
                    item: item.clone(),
                    count,
                })
                .collect(),
            next_entity_id: state.ids.peek().0,
        }
    }
}

impl TryFrom<GameStateRecord> for GameState {
    type Error = RecordError;

    fn try_from(record: GameStateRecord) -> Result<Self, Self::Error> {
        if record.player.equipment_level == 0 {
            return Err(RecordError::InvalidEquipmentLevel);
        }

        let mut plots = BTreeMap::new();
        for plot in record.plots {
            if plots.contains_key(&plot.id) {
                return Err(RecordError::DuplicatePlot(plot.id));
            }
            plots.insert(plot.id, plot);
        }

        let mut ids = IdAllocator::new();
        if record.next_entity_id > 0 {
            ids.reserve_past(EntityInstanceId(record.next_entity_id - 1));
        }
        let mut entities = BTreeMap::new();
        for entity in record.entities {
            if entities.contains_key(&entity.id) {
                return Err(RecordError::DuplicateEntity(entity.id));
            }
            ids.reserve_past(entity.id);
            entities.insert(entity.id, entity);
        }

        let mut workers = BTreeMap::new();
        for worker in record.workers {
            if workers.contains_key(&worker.id) {
                return Err(RecordError::DuplicateWorker(worker.id));
            }
            workers.insert(worker.id, worker);
        }

        Ok(Self {
            last_update_epoch: record.last_update_epoch,
            player: record.player,
            inventory: record
                .inventory
                .into_iter()
                .map(|line| (line.item, line.count))
                .collect(),
            plots,
            entities,
            workers,
            ids,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
