//! Farmstead state -- data model of the farm simulation.
//!
//! This crate holds everything that gets persisted or looked up: identifiers,
//! the read-only [`Catalog`](catalog::Catalog), entity instances, plots,
//! workers, the inventory and the [`GameState`](state::GameState) aggregate
//! that owns them. Simulation logic lives in `farmstead-engine`; the types
//! here only guard their own local invariants (non-negative inventory, unique
//! ids, the plot back-reference).
//!
//! # Quick Start
//!
//! ```
//! use farmstead_state::prelude::*;
//!
//! let catalog = StaticCatalog::from_json_str(r#"{
//!     "entity_kinds": [{
//!         "id": "tomato_plant", "category": "plant",
//!         "production_time_secs": 600, "base_yield": 1,
//!         "total_yields_limit": 40, "decay_time_secs": 3600,
//!         "quantity_per_plot": 10, "produced_item": "tomato"
//!     }],
//!     "item_kinds": [
//!         { "id": "tomato", "sale_price": 5 },
//!         { "id": "tomato_seed", "purchase_price": 30, "grows_into": "tomato_plant" }
//!     ]
//! }"#).unwrap();
//!
//! let mut state = GameState::new_game(catalog.tunables(), 0);
//! state.inventory.add(&ItemId::from("tomato_seed"), 10);
//! assert_eq!(state.inventory.count(&ItemId::from("tomato_seed")), 10);
//! ```

#![deny(unsafe_code)]

pub mod catalog;
pub mod entity;
pub mod ids;
pub mod inventory;
pub mod plot;
pub mod state;
pub mod worker;

use ids::{EntityInstanceId, EntityKindId, ItemId, PlotId, WorkerId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Validation failures of farm operations.
///
/// Every fallible operation that returns this error has left the game state
/// untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FarmError {
    /// No plot with this id exists.
    #[error("plot {0} does not exist")]
    UnknownPlot(PlotId),

    /// No worker with this id exists.
    #[error("worker {0} does not exist")]
    UnknownWorker(WorkerId),

    /// The item id is not in the catalog.
    #[error("item '{0}' is not in the catalog")]
    UnknownItem(ItemId),

    /// The entity kind id is not in the catalog.
    #[error("entity kind '{0}' is not in the catalog")]
    UnknownEntityKind(EntityKindId),

    /// Another entity already sits at this position.
    #[error("position {position} on {plot} is already occupied")]
    PositionOccupied { plot: PlotId, position: u32 },

    /// The plot holds entities of a different kind.
    #[error("{plot} holds '{existing}', cannot add '{requested}'")]
    MixedKinds {
        plot: PlotId,
        existing: EntityKindId,
        requested: EntityKindId,
    },

    /// The plot already holds as many entities of this kind as allowed.
    #[error("{plot} already holds {limit} '{kind}'")]
    QuantityLimitReached {
        plot: PlotId,
        kind: EntityKindId,
        limit: u32,
    },

    /// No free position is left within the searched slots.
    #[error("{plot} has no free position in the first {max_slots} slots")]
    NoFreePosition { plot: PlotId, max_slots: u32 },

    /// No entity sits at this position.
    #[error("no entity at position {position} on {plot}")]
    NoEntityAtPosition { plot: PlotId, position: u32 },

    /// Planting needs an empty plot.
    #[error("{0} is not empty")]
    PlotNotEmpty(PlotId),

    /// Locked plots accept nothing.
    #[error("{0} is locked")]
    PlotLocked(PlotId),

    /// The item does not grow into an entity.
    #[error("item '{0}' cannot be planted or placed")]
    NotPlantable(ItemId),

    /// The item cannot be bought.
    #[error("item '{0}' is not for sale")]
    NotForSale(ItemId),

    /// Not enough of an item is held.
    #[error("need {required} '{item}' but only {available} held")]
    InsufficientInventory {
        item: ItemId,
        required: u64,
        available: u64,
    },

    /// Not enough gold is held.
    #[error("need {required} gold but only {available} held")]
    InsufficientGold { required: u64, available: u64 },

    /// The entity holds no yield in a harvestable state.
    #[error("{0} has nothing to harvest")]
    NotHarvestable(EntityInstanceId),

    /// No entity on the plot holds harvestable yield.
    #[error("{0} has nothing to harvest")]
    NothingToHarvest(PlotId),

    /// Every worker is busy.
    #[error("no idle worker is available")]
    NoIdleWorker,

    /// A busy worker already targets the plot.
    #[error("{plot} is already targeted by {worker}")]
    PlotAlreadyTargeted { plot: PlotId, worker: WorkerId },

    /// The inventory holds no item that can fill a plot.
    #[error("no plantable item is held in sufficient quantity")]
    NoPlantableItem,

    /// Amounts must be positive.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Game speed must lie between zero and the driver's maximum.
    #[error("invalid game speed {0}")]
    InvalidGameSpeed(f64),
}

pub use catalog::CatalogError;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::catalog::{
        Catalog, CatalogError, Category, Costs, EntityKindDef, ItemKindDef, StartingValues,
        StaticCatalog, Tunables,
    };
    pub use crate::entity::{EntityInstance, EntityState};
    pub use crate::ids::{EntityInstanceId, EntityKindId, IdAllocator, ItemId, PlotId, WorkerId};
    pub use crate::inventory::Inventory;
    pub use crate::plot::{Plot, PlotState};
    pub use crate::state::{GameState, GameStateRecord, ItemCount, Player, RecordError};
    pub use crate::worker::{WorkerInstance, WorkerState, WorkerTask};
    pub use crate::FarmError;
}
