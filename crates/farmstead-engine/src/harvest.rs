//! Harvest and yield engine.
//!
//! Harvesting a plot takes the held yield of every harvestable entity on it,
//! sums the base amounts, and applies the equipment multiplier once to that
//! sum:
//!
//! ```text
//! adjusted = round(base * (1 + (equipment_level - 1) * bonus_per_level))
//! ```
//!
//! Rounding is half to even. Applying the bonus per entity would compound
//! rounding across entities, so it is never done.

use serde::{Deserialize, Serialize};

use farmstead_journal::event::FarmEvent;
use farmstead_journal::journal::EventJournal;
use farmstead_state::catalog::{Catalog, EntityKindDef};
use farmstead_state::ids::{EntityInstanceId, ItemId, PlotId};
use farmstead_state::state::GameState;
use farmstead_state::FarmError;

use crate::lifecycle;
use crate::placement;

/// Outcome of a successful plot harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harvest {
    pub plot: PlotId,
    pub item: ItemId,
    /// Sum of the entities' held yield before the bonus.
    pub base_amount: u64,
    /// Amount credited to the inventory.
    pub adjusted_amount: u64,
    /// Entities that died as a result and were removed.
    pub removed: Vec<EntityInstanceId>,
}

/// Yield multiplier for an equipment level.
pub fn equipment_multiplier(equipment_level: u32, bonus_per_level: f64) -> f64 {
    1.0 + f64::from(equipment_level.saturating_sub(1)) * bonus_per_level
}

/// Apply the equipment multiplier to a summed base amount.
pub fn adjusted_amount(base: u64, equipment_level: u32, bonus_per_level: f64) -> u64 {
    let scaled = base as f64 * equipment_multiplier(equipment_level, bonus_per_level);
    scaled.round_ties_even().max(0.0) as u64
}

/// Whether any entity on `plot` holds harvestable yield.
pub fn is_plot_harvestable(state: &GameState, plot: PlotId) -> bool {
    state.entities_on_plot(plot).any(|e| e.is_harvestable())
}

/// Harvest every entity on `plot` and credit the adjusted total.
///
/// # Errors
///
/// [`FarmError::UnknownPlot`] for a missing plot,
/// [`FarmError::NothingToHarvest`] when no entity holds harvestable yield and
/// [`FarmError::UnknownEntityKind`] when an entity's kind is missing from the
/// catalog. Nothing is mutated on error.
pub fn harvest_plot(
    state: &mut GameState,
    catalog: &dyn Catalog,
    plot: PlotId,
    journal: &mut EventJournal,
) -> Result<Harvest, FarmError> {
    state.plot(plot).ok_or(FarmError::UnknownPlot(plot))?;

    let mut targets: Vec<(EntityInstanceId, &EntityKindDef)> = Vec::new();
    for entity in state.entities_on_plot(plot).filter(|e| e.is_harvestable()) {
        let kind = catalog
            .entity_kind(&entity.kind)
            .ok_or_else(|| FarmError::UnknownEntityKind(entity.kind.clone()))?;
        targets.push((entity.id, kind));
    }
    let Some((_, first_kind)) = targets.first() else {
        return Err(FarmError::NothingToHarvest(plot));
    };
    let item = first_kind.produced_item.clone();

    let mut base_amount = 0u64;
    let mut dead = Vec::new();
    for (id, kind) in &targets {
        let Some(entity) = state.entity_mut(*id) else {
            continue;
        };
        let from = entity.state;
        base_amount += lifecycle::harvest_entity(entity, kind)?;
        if entity.state != from {
            journal.record(FarmEvent::EntityStateChanged {
                entity: *id,
                plot,
                from,
                to: entity.state,
            });
        }
        if entity.is_dead() {
            dead.push(*id);
        }
    }

    let tunables = catalog.tunables();
    let adjusted = adjusted_amount(
        base_amount,
        state.player.equipment_level,
        tunables.equipment_bonus_per_level,
    );
    state.inventory.add(&item, adjusted);
    journal.record(FarmEvent::PlotHarvested {
        plot,
        item: item.clone(),
        base_amount,
        adjusted_amount: adjusted,
    });
    if adjusted > 0 {
        journal.record(FarmEvent::ItemsAdded {
            item: item.clone(),
            amount: adjusted,
        });
    }

    placement::remove_entities(state, &dead, journal);

    tracing::debug!(
        plot = %plot,
        item = %item,
        base = base_amount,
        adjusted,
        removed = dead.len(),
        "plot harvested"
    );

    Ok(Harvest {
        plot,
        item,
        base_amount,
        adjusted_amount: adjusted,
        removed: dead,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
