//! Farmstead engine -- simulation core of the farm economy.
//!
//! This crate builds on [`farmstead_state`] and [`farmstead_journal`] to
//! provide the simulation: entity growth and decay, plot placement rules,
//! planting, the worker state machine and scheduler, harvesting with the
//! equipment bonus, and the cadence that replays elapsed time identically
//! for live ticks and offline catch-up. [`Farm`](farm::Farm) ties them
//! together with persistence and listeners.
//!
//! Engines are free functions over `&mut GameState`, `&dyn Catalog` and
//! `&mut EventJournal`; the driver is the only owner of the state.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use farmstead_engine::prelude::*;
//!
//! let catalog = StaticCatalog::from_json_str(r#"{
//!     "entity_kinds": [{
//!         "id": "strawberry_plant", "category": "plant",
//!         "production_time_secs": 30, "base_yield": 1,
//!         "total_yields_limit": 20, "decay_time_secs": 3600,
//!         "quantity_per_plot": 10, "produced_item": "strawberry"
//!     }],
//!     "item_kinds": [
//!         { "id": "strawberry", "sale_price": 6 },
//!         { "id": "strawberry_seed", "purchase_price": 40, "pack_size": 10,
//!           "grows_into": "strawberry_plant" }
//!     ],
//!     "tunables": { "worker_task_duration_secs": 10 }
//! }"#).unwrap();
//!
//! let mut farm = Farm::new_game(catalog, 0);
//! farm.buy_item(&ItemId::from("strawberry_seed"), 1).unwrap();
//!
//! // The worker plants at t=2, the plants produce at t=32 and the worker
//! // brings the strawberries in ten seconds later.
//! let report = farm.catch_up(44);
//! assert_eq!(report.tasks_completed, 2);
//! assert_eq!(farm.inventory_count(&ItemId::from("strawberry")), 10);
//!
//! farm.sell_item(&ItemId::from("strawberry"), 10).unwrap();
//! assert_eq!(farm.gold(), 1000 - 40 + 60);
//! ```

#![deny(unsafe_code)]

pub mod audit;
pub mod catch_up;
pub mod economy;
pub mod farm;
pub mod harvest;
pub mod lifecycle;
pub mod placement;
pub mod planting;
pub mod scheduler;
pub mod snapshot;
pub mod store;
pub mod timeline;
pub mod workers;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the state crate for convenience.
pub use farmstead_state;

/// Re-export the journal crate for convenience.
pub use farmstead_journal;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use farmstead_journal::prelude::*;
    pub use farmstead_state::prelude::*;

    pub use crate::audit::Repair;
    pub use crate::catch_up::AdvanceReport;
    pub use crate::farm::{Farm, LoadOutcome};
    pub use crate::harvest::Harvest;
    pub use crate::planting::Planting;
    pub use crate::scheduler::Assignment;
    pub use crate::snapshot::StateSnapshot;
    pub use crate::store::{JsonFileStore, MemoryStore, Store, StoreError};
    pub use crate::timeline::{Cadence, Process};
}
