//! Farm events and their causes.
//!
//! A [`FarmEvent`] describes one observable state change: an entity produced,
//! a plot emptied, a worker finished a task. Each event is recorded together
//! with a [`Cause`] naming what drove the change, so a listener can tell a
//! harvest triggered by the player from one completed by a worker during
//! offline catch-up.

use serde::{Deserialize, Serialize};

use farmstead_state::entity::EntityState;
use farmstead_state::ids::{EntityInstanceId, EntityKindId, ItemId, PlotId, WorkerId};
use farmstead_state::plot::PlotState;
use farmstead_state::worker::WorkerTask;

// ---------------------------------------------------------------------------
// Cause
// ---------------------------------------------------------------------------

/// What triggered a recorded change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    /// A live tick advanced the simulation.
    Tick,
    /// Offline catch-up replayed elapsed time.
    CatchUp,
    /// A direct call from the player or host (plant, harvest, buy...).
    Player,
    /// The consistency audit corrected stored state.
    Repair,
}

// ---------------------------------------------------------------------------
// FarmEvent
// ---------------------------------------------------------------------------

/// One observable change to the game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FarmEvent {
    /// An entity was planted or placed.
    EntityCreated {
        entity: EntityInstanceId,
        plot: PlotId,
        kind: EntityKindId,
        position: u32,
    },
    /// An entity completed a production cycle.
    EntityProduced {
        entity: EntityInstanceId,
        plot: PlotId,
        yields_produced: u32,
        accumulated_yield: u64,
    },
    /// An entity moved between lifecycle stages.
    EntityStateChanged {
        entity: EntityInstanceId,
        plot: PlotId,
        from: EntityState,
        to: EntityState,
    },
    /// Unharvested yield rotted away.
    YieldLost {
        entity: EntityInstanceId,
        plot: PlotId,
        amount: u64,
    },
    /// An entity left the farm, by death or explicit removal.
    EntityRemoved {
        entity: EntityInstanceId,
        plot: PlotId,
    },
    /// A plot changed occupancy.
    PlotStateChanged {
        plot: PlotId,
        from: PlotState,
        to: PlotState,
    },
    /// A plot was harvested and the adjusted amount credited.
    PlotHarvested {
        plot: PlotId,
        item: ItemId,
        base_amount: u64,
        adjusted_amount: u64,
    },
    /// A worker took on a task.
    WorkerAssigned {
        worker: WorkerId,
        plot: PlotId,
        task: WorkerTask,
    },
    /// A worker finished its task.
    WorkerCompleted {
        worker: WorkerId,
        plot: PlotId,
        task: WorkerTask,
    },
    /// A worker dropped its task without completing it.
    WorkerCancelled {
        worker: WorkerId,
        plot: Option<PlotId>,
        task: Option<WorkerTask>,
    },
    /// A busy worker was asked to take another task and ignored it.
    WorkerAlreadyBusy { worker: WorkerId },
    /// Items entered the inventory.
    ItemsAdded { item: ItemId, amount: u64 },
    /// Items left the inventory.
    ItemsRemoved { item: ItemId, amount: u64 },
    /// The player's gold balance changed.
    GoldChanged { delta: i64, balance: u64 },
    /// The equipment level went up.
    EquipmentUpgraded { level: u32 },
    /// A new plot was added.
    PlotAdded { plot: PlotId },
    /// A new worker was hired.
    WorkerHired { worker: WorkerId },
    /// The consistency audit corrected a plot or worker.
    Repaired {
        plot: Option<PlotId>,
        detail: String,
    },
}

impl FarmEvent {
    /// The plot this event concerns, if any.
    pub fn plot(&self) -> Option<PlotId> {
        match self {
            FarmEvent::EntityCreated { plot, .. }
            | FarmEvent::EntityProduced { plot, .. }
            | FarmEvent::EntityStateChanged { plot, .. }
            | FarmEvent::YieldLost { plot, .. }
            | FarmEvent::EntityRemoved { plot, .. }
            | FarmEvent::PlotStateChanged { plot, .. }
            | FarmEvent::PlotHarvested { plot, .. }
            | FarmEvent::WorkerAssigned { plot, .. }
            | FarmEvent::WorkerCompleted { plot, .. }
            | FarmEvent::PlotAdded { plot } => Some(*plot),
            FarmEvent::WorkerCancelled { plot, .. } | FarmEvent::Repaired { plot, .. } => *plot,
            _ => None,
        }
    }

    /// The worker this event concerns, if any.
    pub fn worker(&self) -> Option<WorkerId> {
        match self {
            FarmEvent::WorkerAssigned { worker, .. }
            | FarmEvent::WorkerCompleted { worker, .. }
            | FarmEvent::WorkerCancelled { worker, .. }
            | FarmEvent::WorkerAlreadyBusy { worker }
            | FarmEvent::WorkerHired { worker } => Some(*worker),
            _ => None,
        }
    }

    /// The entity this event concerns, if any.
    pub fn entity(&self) -> Option<EntityInstanceId> {
        match self {
            FarmEvent::EntityCreated { entity, .. }
            | FarmEvent::EntityProduced { entity, .. }
            | FarmEvent::EntityStateChanged { entity, .. }
            | FarmEvent::YieldLost { entity, .. }
            | FarmEvent::EntityRemoved { entity, .. } => Some(*entity),
            _ => None,
        }
    }
}
