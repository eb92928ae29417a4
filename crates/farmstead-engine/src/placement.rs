//! Plot and placement validation.
//!
//! A plot holds entities of a single kind, each at a unique position, at most
//! `quantity_per_plot` of them. [`check_placement`] applies the rules in a
//! fixed order so callers always see the first violated one:
//!
//! 1. the position is free,
//! 2. the entity kind exists,
//! 3. fewer than `quantity_per_plot` entities of that kind are on the plot,
//! 4. no entity of a different kind is on the plot.
//!
//! The module also owns plot bookkeeping after entities leave: the back
//! reference is repointed while entities remain, and the plot reverts to
//! `Empty` when the last one goes.

use farmstead_journal::event::FarmEvent;
use farmstead_journal::journal::EventJournal;
use farmstead_state::catalog::{Catalog, EntityKindDef};
use farmstead_state::ids::{EntityInstanceId, EntityKindId, PlotId};
use farmstead_state::plot::{Plot, PlotState};
use farmstead_state::state::GameState;
use farmstead_state::FarmError;

fn existing_plot(state: &GameState, plot: PlotId) -> Result<&Plot, FarmError> {
    let found = state.plot(plot).ok_or(FarmError::UnknownPlot(plot))?;
    if found.state == PlotState::Locked {
        return Err(FarmError::PlotLocked(plot));
    }
    Ok(found)
}

/// Validate placing one entity of `kind` at `position` on `plot`.
///
/// # Errors
///
/// [`FarmError::UnknownPlot`] or [`FarmError::PlotLocked`] when the plot
/// cannot take entities at all, otherwise the first violated placement rule.
pub fn check_placement<'c>(
    state: &GameState,
    catalog: &'c dyn Catalog,
    plot: PlotId,
    kind: &EntityKindId,
    position: u32,
) -> Result<&'c EntityKindDef, FarmError> {
    existing_plot(state, plot)?;

    if state
        .entities_on_plot(plot)
        .any(|e| e.position_index == position)
    {
        return Err(FarmError::PositionOccupied { plot, position });
    }

    let def = catalog
        .entity_kind(kind)
        .ok_or_else(|| FarmError::UnknownEntityKind(kind.clone()))?;

    let same_kind = state.entities_on_plot(plot).filter(|e| &e.kind == kind).count();
    if same_kind >= def.quantity_per_plot as usize {
        return Err(FarmError::QuantityLimitReached {
            plot,
            kind: kind.clone(),
            limit: def.quantity_per_plot,
        });
    }

    if let Some(other) = state.entities_on_plot(plot).find(|e| &e.kind != kind) {
        return Err(FarmError::MixedKinds {
            plot,
            existing: other.kind.clone(),
            requested: kind.clone(),
        });
    }

    Ok(def)
}

/// Whether one entity of `kind` may be placed at `position` on `plot`.
pub fn can_place(
    state: &GameState,
    catalog: &dyn Catalog,
    plot: PlotId,
    kind: &EntityKindId,
    position: u32,
) -> bool {
    check_placement(state, catalog, plot, kind, position).is_ok()
}

/// Lowest position in `0..max_slots` not taken on `plot`.
pub fn find_next_free_position(state: &GameState, plot: PlotId, max_slots: u32) -> Option<u32> {
    (0..max_slots).find(|slot| !state.entities_on_plot(plot).any(|e| e.position_index == *slot))
}

/// Place a single entity of `kind` on `plot`.
///
/// With `position` of `None` the lowest free slot within the catalog's
/// `max_plot_slots` is used.
pub fn place_entity(
    state: &mut GameState,
    catalog: &dyn Catalog,
    plot: PlotId,
    kind: &EntityKindId,
    position: Option<u32>,
    journal: &mut EventJournal,
) -> Result<EntityInstanceId, FarmError> {
    existing_plot(state, plot)?;
    let position = match position {
        Some(position) => position,
        None => {
            let max_slots = catalog.tunables().max_plot_slots;
            find_next_free_position(state, plot, max_slots)
                .ok_or(FarmError::NoFreePosition { plot, max_slots })?
        }
    };
    let def = check_placement(state, catalog, plot, kind, position)?;

    let epoch = state.last_update_epoch;
    let id = state.spawn_entity(def, plot, position, epoch);
    journal.record(FarmEvent::EntityCreated {
        entity: id,
        plot,
        kind: kind.clone(),
        position,
    });
    occupy_if_empty(state, plot, id, journal);
    tracing::debug!(plot = %plot, entity = %id, kind = %kind, position, "entity placed");
    Ok(id)
}

/// Remove the entity at `position` on `plot`.
pub fn remove_entity_at(
    state: &mut GameState,
    plot: PlotId,
    position: u32,
    journal: &mut EventJournal,
) -> Result<EntityInstanceId, FarmError> {
    state.plot(plot).ok_or(FarmError::UnknownPlot(plot))?;
    let id = state
        .entities_on_plot(plot)
        .find(|e| e.position_index == position)
        .map(|e| e.id)
        .ok_or(FarmError::NoEntityAtPosition { plot, position })?;
    remove_entities(state, &[id], journal);
    Ok(id)
}

pub(crate) fn occupy_if_empty(
    state: &mut GameState,
    plot: PlotId,
    entity: EntityInstanceId,
    journal: &mut EventJournal,
) {
    if let Some(p) = state.plot_mut(plot) {
        if p.state == PlotState::Empty {
            p.occupy(entity);
            journal.record(FarmEvent::PlotStateChanged {
                plot,
                from: PlotState::Empty,
                to: PlotState::Occupied,
            });
        } else if p.occupying_entity.is_none() {
            p.occupying_entity = Some(entity);
        }
    }
}

/// Remove `ids` from the state and fix up every plot they were on.
pub(crate) fn remove_entities(
    state: &mut GameState,
    ids: &[EntityInstanceId],
    journal: &mut EventJournal,
) {
    let mut plots = Vec::new();
    for id in ids {
        if let Some(entity) = state.remove_entity(*id) {
            journal.record(FarmEvent::EntityRemoved {
                entity: *id,
                plot: entity.plot_id,
            });
            if !plots.contains(&entity.plot_id) {
                plots.push(entity.plot_id);
            }
        }
    }
    for plot in plots {
        refresh_plot(state, plot, journal);
    }
}

/// Bring a plot's occupancy in line with the entities that remain on it.
///
/// Returns `true` when the plot was modified.
pub(crate) fn refresh_plot(state: &mut GameState, plot: PlotId, journal: &mut EventJournal) -> bool {
    let first = state.entities_on_plot(plot).next().map(|e| e.id);
    let dangling = state
        .plot(plot)
        .and_then(|p| p.occupying_entity)
        .map_or(true, |id| state.entity(id).map_or(true, |e| e.plot_id != plot));
    let Some(p) = state.plot_mut(plot) else {
        return false;
    };

    match first {
        None if p.occupying_entity.is_some() || p.state == PlotState::Occupied => {
            let from = p.state;
            p.clear();
            if from != p.state {
                journal.record(FarmEvent::PlotStateChanged {
                    plot,
                    from,
                    to: p.state,
                });
            }
            tracing::debug!(plot = %plot, "plot emptied");
            true
        }
        None => false,
        Some(first) if p.state == PlotState::Empty => {
            p.occupy(first);
            journal.record(FarmEvent::PlotStateChanged {
                plot,
                from: PlotState::Empty,
                to: PlotState::Occupied,
            });
            true
        }
        Some(first) if dangling => {
            p.occupying_entity = Some(first);
            true
        }
        Some(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use farmstead_state::catalog::{Category, ItemKindDef, StaticCatalog, Tunables};

    fn catalog() -> StaticCatalog {
        let plant = |id: &str, item: &str, qty: u32| EntityKindDef {
            id: id.into(),
            name: String::new(),
            category: Category::Plant,
            production_time_secs: 600.0,
            base_yield: 1,
            total_yields_limit: 40,
            decay_time_secs: 3600.0,
            quantity_per_plot: qty,
            produced_item: item.into(),
        };
        let item = |id: &str| ItemKindDef {
            id: id.into(),
            name: String::new(),
            sale_price: 5,
            purchase_price: None,
            pack_size: 1,
            grows_into: None,
        };
        StaticCatalog::new(
            vec![plant("tomato_plant", "tomato", 3), plant("blueberry_plant", "blueberry", 3)],
            vec![item("tomato"), item("blueberry")],
            Tunables::default(),
        )
        .unwrap()
    }

    fn setup() -> (GameState, StaticCatalog, EventJournal) {
        let mut state = GameState::new();
        state.add_plot();
        (state, catalog(), EventJournal::new())
    }

    #[test]
    fn first_placement_occupies_the_plot() {
        let (mut state, catalog, mut journal) = setup();
        let id = place_entity(&mut state, &catalog, PlotId(0), &"tomato_plant".into(), None, &mut journal)
            .unwrap();
        let plot = state.plot(PlotId(0)).unwrap();
        assert_eq!(plot.state, PlotState::Occupied);
        assert_eq!(plot.occupying_entity, Some(id));
    }

    #[test]
    fn rules_are_checked_in_order() {
        let (mut state, catalog, mut journal) = setup();
        let tomato: EntityKindId = "tomato_plant".into();
        place_entity(&mut state, &catalog, PlotId(0), &tomato, Some(0), &mut journal).unwrap();

        // Occupied position wins over an unknown kind.
        let err = check_placement(&state, &catalog, PlotId(0), &"pumpkin".into(), 0).unwrap_err();
        assert_eq!(err, FarmError::PositionOccupied { plot: PlotId(0), position: 0 });

        let err = check_placement(&state, &catalog, PlotId(0), &"pumpkin".into(), 1).unwrap_err();
        assert_eq!(err, FarmError::UnknownEntityKind("pumpkin".into()));

        let err = check_placement(&state, &catalog, PlotId(0), &"blueberry_plant".into(), 1).unwrap_err();
        assert!(matches!(err, FarmError::MixedKinds { .. }));
    }

    #[test]
    fn quantity_limit_is_enforced() {
        let (mut state, catalog, mut journal) = setup();
        let tomato: EntityKindId = "tomato_plant".into();
        for _ in 0..3 {
            place_entity(&mut state, &catalog, PlotId(0), &tomato, None, &mut journal).unwrap();
        }
        assert!(!can_place(&state, &catalog, PlotId(0), &tomato, 5));
        let err = place_entity(&mut state, &catalog, PlotId(0), &tomato, None, &mut journal).unwrap_err();
        assert!(matches!(err, FarmError::QuantityLimitReached { limit: 3, .. }));
        assert_eq!(state.entity_count(), 3);
    }

    #[test]
    fn next_free_position_fills_gaps_first() {
        let (mut state, catalog, mut journal) = setup();
        let tomato: EntityKindId = "tomato_plant".into();
        place_entity(&mut state, &catalog, PlotId(0), &tomato, Some(0), &mut journal).unwrap();
        place_entity(&mut state, &catalog, PlotId(0), &tomato, Some(2), &mut journal).unwrap();
        assert_eq!(find_next_free_position(&state, PlotId(0), 10), Some(1));
        assert_eq!(find_next_free_position(&state, PlotId(0), 1), None);
    }

    #[test]
    fn locked_and_missing_plots_are_rejected() {
        let (mut state, catalog, _) = setup();
        state.insert_plot(Plot::locked(PlotId(1)));
        let tomato: EntityKindId = "tomato_plant".into();
        assert_eq!(
            check_placement(&state, &catalog, PlotId(1), &tomato, 0).unwrap_err(),
            FarmError::PlotLocked(PlotId(1))
        );
        assert_eq!(
            check_placement(&state, &catalog, PlotId(9), &tomato, 0).unwrap_err(),
            FarmError::UnknownPlot(PlotId(9))
        );
    }

    #[test]
    fn removing_the_back_referenced_entity_repoints_the_plot() {
        let (mut state, catalog, mut journal) = setup();
        let tomato: EntityKindId = "tomato_plant".into();
        let a = place_entity(&mut state, &catalog, PlotId(0), &tomato, Some(0), &mut journal).unwrap();
        let b = place_entity(&mut state, &catalog, PlotId(0), &tomato, Some(1), &mut journal).unwrap();
        assert_eq!(state.plot(PlotId(0)).unwrap().occupying_entity, Some(a));

        remove_entity_at(&mut state, PlotId(0), 0, &mut journal).unwrap();
        assert_eq!(state.plot(PlotId(0)).unwrap().occupying_entity, Some(b));

        remove_entity_at(&mut state, PlotId(0), 1, &mut journal).unwrap();
        let plot = state.plot(PlotId(0)).unwrap();
        assert!(plot.is_empty());
        assert_eq!(plot.occupying_entity, None);
    }

    #[test]
    fn removing_from_empty_position_fails() {
        let (mut state, _, mut journal) = setup();
        assert_eq!(
            remove_entity_at(&mut state, PlotId(0), 4, &mut journal).unwrap_err(),
            FarmError::NoEntityAtPosition { plot: PlotId(0), position: 4 }
        );
    }
}
