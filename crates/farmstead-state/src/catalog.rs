//! Read-only catalog of entity kinds, item kinds and tunable constants.
//!
//! The simulation never mutates catalog data. It only reaches it through the
//! object-safe [`Catalog`] trait, so a host can back the catalog with whatever
//! definition source it likes. [`StaticCatalog`] is the bundled
//! implementation: definitions held in memory, loadable from JSON and
//! validated on construction.
//!
//! # JSON layout
//!
//! ```json
//! {
//!   "entity_kinds": [
//!     { "id": "tomato_plant", "category": "plant", "production_time_secs": 600,
//!       "base_yield": 1, "total_yields_limit": 40, "decay_time_secs": 3600,
//!       "quantity_per_plot": 10, "produced_item": "tomato" }
//!   ],
//!   "item_kinds": [
//!     { "id": "tomato", "sale_price": 5 },
//!     { "id": "tomato_seed", "purchase_price": 30, "grows_into": "tomato_plant" }
//!   ],
//!   "tunables": { "worker_task_duration_secs": 120 }
//! }
//! ```
//!
//! Every `tunables` field is optional and falls back to [`Tunables::default`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ids::{EntityKindId, ItemId};

// ---------------------------------------------------------------------------
// CatalogError
// ---------------------------------------------------------------------------

/// Errors produced while building or loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The catalog JSON is malformed.
    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two entity kinds share an id.
    #[error("duplicate entity kind '{0}'")]
    DuplicateEntityKind(EntityKindId),

    /// Two item kinds share an id.
    #[error("duplicate item kind '{0}'")]
    DuplicateItemKind(ItemId),

    /// An entity kind definition violates a numeric constraint.
    #[error("entity kind '{id}' is invalid: {reason}")]
    InvalidEntityKind { id: EntityKindId, reason: String },

    /// A definition references an id the catalog does not contain.
    #[error("'{from}' references unknown {kind} '{to}'")]
    UnknownReference {
        from: String,
        kind: &'static str,
        to: String,
    },

    /// A tunable is out of range.
    #[error("tunable '{name}' is invalid: {reason}")]
    InvalidTunable { name: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Broad category of an entity kind. Animals are milked, plants harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Plant,
    Animal,
}

fn one() -> u32 {
    1
}

/// Definition of a plant or animal species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityKindDef {
    pub id: EntityKindId,
    #[serde(default)]
    pub name: String,
    pub category: Category,
    /// Seconds between two productions.
    pub production_time_secs: f64,
    /// Items added to the accumulated yield per production.
    pub base_yield: u32,
    /// Maximum number of productions over the entity's life.
    pub total_yields_limit: u32,
    /// Seconds an unharvested yield survives before it rots.
    pub decay_time_secs: f64,
    /// Entities planted per plot, and seed items consumed by one planting.
    #[serde(default = "one")]
    pub quantity_per_plot: u32,
    /// Item credited on harvest.
    pub produced_item: ItemId,
}

impl EntityKindDef {
    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidEntityKind {
            id: self.id.clone(),
            reason: reason.to_owned(),
        };
        if !(self.production_time_secs > 0.0 && self.production_time_secs.is_finite()) {
            return Err(invalid("production_time_secs must be positive and finite"));
        }
        if !(self.decay_time_secs > 0.0 && self.decay_time_secs.is_finite()) {
            return Err(invalid("decay_time_secs must be positive and finite"));
        }
        if self.total_yields_limit == 0 {
            return Err(invalid("total_yields_limit must be at least 1"));
        }
        if self.quantity_per_plot == 0 {
            return Err(invalid("quantity_per_plot must be at least 1"));
        }
        Ok(())
    }
}

/// Definition of an item kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemKindDef {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    /// Gold received per unit sold.
    #[serde(default)]
    pub sale_price: u64,
    /// Gold paid per pack bought. `None` means the item is not for sale.
    #[serde(default)]
    pub purchase_price: Option<u64>,
    /// Units received per pack bought.
    #[serde(default = "one")]
    pub pack_size: u32,
    /// Entity kind this item is planted or placed as, if any.
    #[serde(default)]
    pub grows_into: Option<EntityKindId>,
}

// ---------------------------------------------------------------------------
// Tunables
// ---------------------------------------------------------------------------

/// Values a new game starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingValues {
    pub gold: u64,
    pub plots: u32,
    pub workers: u32,
    pub equipment_level: u32,
    pub inventory: BTreeMap<ItemId, u64>,
}

impl Default for StartingValues {
    fn default() -> Self {
        Self {
            gold: 1000,
            plots: 3,
            workers: 1,
            equipment_level: 1,
            inventory: BTreeMap::new(),
        }
    }
}

/// Gold prices of farm upgrades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Costs {
    pub hire_worker: u64,
    pub upgrade_equipment: u64,
    pub buy_plot: u64,
}

impl Default for Costs {
    fn default() -> Self {
        Self {
            hire_worker: 500,
            upgrade_equipment: 500,
            buy_plot: 500,
        }
    }
}

/// Numeric constants that drive the simulation.
///
/// All durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Fixed duration of every worker task, whatever the plot holds.
    pub worker_task_duration_secs: f64,
    /// Extra yield fraction per equipment level above 1.
    pub equipment_bonus_per_level: f64,
    /// Period of the entity-update process.
    pub entity_interval_secs: f64,
    /// Period of the worker-update process.
    pub worker_interval_secs: f64,
    /// Period of the task-assignment process.
    pub assignment_interval_secs: f64,
    /// Number of position slots searched for an automatic placement.
    pub max_plot_slots: u32,
    pub starting: StartingValues,
    pub costs: Costs,
    /// Lifetime earnings that win the game.
    pub win_condition_gold: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            worker_task_duration_secs: 120.0,
            equipment_bonus_per_level: 0.1,
            entity_interval_secs: 1.0,
            worker_interval_secs: 1.0,
            assignment_interval_secs: 2.0,
            max_plot_slots: 10,
            starting: StartingValues::default(),
            costs: Costs::default(),
            win_condition_gold: 1_000_000,
        }
    }
}

impl Tunables {
    /// Check every tunable against its allowed range.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let positive = |name: &'static str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(CatalogError::InvalidTunable {
                    name,
                    reason: format!("must be positive and finite, got {value}"),
                })
            }
        };
        positive("worker_task_duration_secs", self.worker_task_duration_secs)?;
        positive("entity_interval_secs", self.entity_interval_secs)?;
        positive("worker_interval_secs", self.worker_interval_secs)?;
        positive("assignment_interval_secs", self.assignment_interval_secs)?;

        for (name, value) in [
            ("entity_interval_secs", self.entity_interval_secs),
            ("worker_interval_secs", self.worker_interval_secs),
            ("assignment_interval_secs", self.assignment_interval_secs),
        ] {
            if value < 0.001 {
                return Err(CatalogError::InvalidTunable {
                    name,
                    reason: format!("must be at least one millisecond, got {value}"),
                });
            }
        }

        if !(self.equipment_bonus_per_level >= 0.0 && self.equipment_bonus_per_level.is_finite()) {
            return Err(CatalogError::InvalidTunable {
                name: "equipment_bonus_per_level",
                reason: format!(
                    "must be non-negative and finite, got {}",
                    self.equipment_bonus_per_level
                ),
            });
        }
        if self.max_plot_slots == 0 {
            return Err(CatalogError::InvalidTunable {
                name: "max_plot_slots",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.starting.equipment_level == 0 {
            return Err(CatalogError::InvalidTunable {
                name: "starting.equipment_level",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// Read-only lookup of definitions and tunables.
///
/// Implementations must be pure from the simulation's point of view: the same
/// id must always resolve to the same definition for the lifetime of a game.
pub trait Catalog {
    /// Look up an entity kind.
    fn entity_kind(&self, id: &EntityKindId) -> Option<&EntityKindDef>;

    /// Look up an item kind.
    fn item_kind(&self, id: &ItemId) -> Option<&ItemKindDef>;

    /// The simulation constants.
    fn tunables(&self) -> &Tunables;
}

// ---------------------------------------------------------------------------
// StaticCatalog
// ---------------------------------------------------------------------------

/// On-disk shape of a catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    entity_kinds: Vec<EntityKindDef>,
    #[serde(default)]
    item_kinds: Vec<ItemKindDef>,
    #[serde(default)]
    tunables: Tunables,
}

/// In-memory [`Catalog`] with validated definitions.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entity_kinds: BTreeMap<EntityKindId, EntityKindDef>,
    item_kinds: BTreeMap<ItemId, ItemKindDef>,
    tunables: Tunables,
}

impl StaticCatalog {
    /// Build a catalog from definitions, validating every entry and every
    /// cross reference.
    pub fn new(
        entity_kinds: Vec<EntityKindDef>,
        item_kinds: Vec<ItemKindDef>,
        tunables: Tunables,
    ) -> Result<Self, CatalogError> {
        tunables.validate()?;

        let mut entity_map = BTreeMap::new();
        for def in entity_kinds {
            def.validate()?;
            if entity_map.contains_key(&def.id) {
                return Err(CatalogError::DuplicateEntityKind(def.id));
            }
            entity_map.insert(def.id.clone(), def);
        }

        let mut item_map = BTreeMap::new();
        for def in item_kinds {
            if item_map.contains_key(&def.id) {
                return Err(CatalogError::DuplicateItemKind(def.id));
            }
            item_map.insert(def.id.clone(), def);
        }

        for def in entity_map.values() {
            if !item_map.contains_key(&def.produced_item) {
                return Err(CatalogError::UnknownReference {
                    from: def.id.to_string(),
                    kind: "item",
                    to: def.produced_item.to_string(),
                });
            }
        }
        for def in item_map.values() {
            if let Some(kind) = &def.grows_into {
                if !entity_map.contains_key(kind) {
                    return Err(CatalogError::UnknownReference {
                        from: def.id.to_string(),
                        kind: "entity kind",
                        to: kind.to_string(),
                    });
                }
            }
        }
        for item in tunables.starting.inventory.keys() {
            if !item_map.contains_key(item) {
                return Err(CatalogError::UnknownReference {
                    from: "tunables.starting.inventory".to_owned(),
                    kind: "item",
                    to: item.to_string(),
                });
            }
        }

        Ok(Self {
            entity_kinds: entity_map,
            item_kinds: item_map,
            tunables,
        })
    }

    /// Parse and validate a catalog from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.entity_kinds, file.item_kinds, file.tunables)
    }

    /// Read, parse and validate a catalog file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            entity_kinds = catalog.entity_kinds.len(),
            item_kinds = catalog.item_kinds.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Iterate entity kinds in id order.
    pub fn entity_kinds(&self) -> impl Iterator<Item = &EntityKindDef> {
        self.entity_kinds.values()
    }

    /// Iterate item kinds in id order.
    pub fn item_kinds(&self) -> impl Iterator<Item = &ItemKindDef> {
        self.item_kinds.values()
    }
}

impl Catalog for StaticCatalog {
    fn entity_kind(&self, id: &EntityKindId) -> Option<&EntityKindDef> {
        self.entity_kinds.get(id)
    }

    fn item_kind(&self, id: &ItemId) -> Option<&ItemKindDef> {
        self.item_kinds.get(id)
    }

    fn tunables(&self) -> &Tunables {
        &self.tunables
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
