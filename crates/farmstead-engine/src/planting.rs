//! Planting a plot from inventory.
//!
//! Planting consumes `quantity_per_plot` units of a seed-like item and fills
//! an empty plot with that many fresh entities at positions `0..n`. Every
//! check runs before the first mutation, so a failed planting leaves the
//! inventory and the plot exactly as they were.

use serde::{Deserialize, Serialize};

use farmstead_journal::event::FarmEvent;
use farmstead_journal::journal::EventJournal;
use farmstead_state::catalog::{Catalog, EntityKindDef};
use farmstead_state::ids::{EntityInstanceId, EntityKindId, ItemId, PlotId};
use farmstead_state::plot::PlotState;
use farmstead_state::state::GameState;
use farmstead_state::FarmError;

use crate::placement;

/// Outcome of a successful planting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planting {
    pub plot: PlotId,
    pub item: ItemId,
    pub kind: EntityKindId,
    pub entities: Vec<EntityInstanceId>,
}

/// Resolve the entity kind `item` grows into and check the plot can take it.
pub fn check_planting<'c>(
    state: &GameState,
    catalog: &'c dyn Catalog,
    plot: PlotId,
    item: &ItemId,
) -> Result<&'c EntityKindDef, FarmError> {
    let target = state.plot(plot).ok_or(FarmError::UnknownPlot(plot))?;
    match target.state {
        PlotState::Locked => return Err(FarmError::PlotLocked(plot)),
        PlotState::Occupied => return Err(FarmError::PlotNotEmpty(plot)),
        PlotState::Empty => {}
    }
    if state.entities_on_plot(plot).next().is_some() {
        return Err(FarmError::PlotNotEmpty(plot));
    }

    let item_def = catalog
        .item_kind(item)
        .ok_or_else(|| FarmError::UnknownItem(item.clone()))?;
    let kind_id = item_def
        .grows_into
        .as_ref()
        .ok_or_else(|| FarmError::NotPlantable(item.clone()))?;
    let kind = catalog
        .entity_kind(kind_id)
        .ok_or_else(|| FarmError::UnknownEntityKind(kind_id.clone()))?;

    let required = u64::from(kind.quantity_per_plot);
    let available = state.inventory.count(item);
    if available < required {
        return Err(FarmError::InsufficientInventory {
            item: item.clone(),
            required,
            available,
        });
    }
    Ok(kind)
}

/// Plant `item` on the empty `plot`.
pub fn plant(
    state: &mut GameState,
    catalog: &dyn Catalog,
    plot: PlotId,
    item: &ItemId,
    journal: &mut EventJournal,
) -> Result<Planting, FarmError> {
    let kind = check_planting(state, catalog, plot, item)?;
    let required = u64::from(kind.quantity_per_plot);

    state.inventory.remove(item, required)?;
    journal.record(FarmEvent::ItemsRemoved {
        item: item.clone(),
        amount: required,
    });

    let epoch = state.last_update_epoch;
    let mut entities = Vec::with_capacity(kind.quantity_per_plot as usize);
    for position in 0..kind.quantity_per_plot {
        let id = state.spawn_entity(kind, plot, position, epoch);
        journal.record(FarmEvent::EntityCreated {
            entity: id,
            plot,
            kind: kind.id.clone(),
            position,
        });
        entities.push(id);
    }
    if let Some(first) = entities.first() {
        placement::occupy_if_empty(state, plot, *first, journal);
    }

    tracing::debug!(plot = %plot, item = %item, kind = %kind.id, count = entities.len(), "plot planted");
    Ok(Planting {
        plot,
        item: item.clone(),
        kind: kind.id.clone(),
        entities,
    })
}
