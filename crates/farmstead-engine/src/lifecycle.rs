//! Entity lifecycle engine.
//!
//! Drives one entity through `Growing -> ReadyToHarvest -> Decaying -> Dead`.
//! Time always advances by the full `dt` and every comparison happens after
//! the decrement:
//!
//! - **Growing**: the production timer runs down. At zero the entity produces
//!   its first yield, becomes ready, and both timers restart.
//! - **ReadyToHarvest**: both timers run. The entity produces again whenever
//!   the production timer reaches zero and it is below its yield limit. Once
//!   the decay timer runs out or the limit is reached it starts decaying (if
//!   it holds yield) or dies (if it does not).
//! - **Decaying**: only the decay timer runs. At zero the held yield is lost
//!   and the entity dies.
//! - **Dead**: terminal. The owning plot removes it.
//!
//! [`harvest_entity`] is the other way out of a stage: it takes the held
//! yield and picks the next stage from what the entity can still produce.
//! It never applies the equipment bonus; see [`crate::harvest`].

use farmstead_journal::event::FarmEvent;
use farmstead_journal::journal::EventJournal;
use farmstead_state::catalog::{Catalog, EntityKindDef};
use farmstead_state::entity::{EntityInstance, EntityState};
use farmstead_state::ids::EntityInstanceId;
use farmstead_state::state::GameState;
use farmstead_state::FarmError;

use crate::placement;

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// What one [`advance`] call did to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: EntityState,
    pub to: EntityState,
    /// Productions completed during this step (zero or one).
    pub produced: u32,
    /// Yield lost to decay during this step.
    pub lost: u64,
}

impl Transition {
    /// The step produced, lost yield, or moved the entity to another stage.
    pub fn changed(&self) -> bool {
        self.from != self.to || self.produced > 0 || self.lost > 0
    }
}

fn produce(entity: &mut EntityInstance, kind: &EntityKindDef) {
    entity.yields_produced += 1;
    entity.accumulated_yield += u64::from(kind.base_yield);
    entity.time_to_next_yield = kind.production_time_secs;
}

/// Advance `entity` by `dt` seconds.
pub fn advance(entity: &mut EntityInstance, kind: &EntityKindDef, dt: f64) -> Transition {
    let from = entity.state;
    let mut produced = 0;
    let mut lost = 0;

    match entity.state {
        EntityState::Growing => {
            entity.time_to_next_yield -= dt;
            if entity.time_to_next_yield <= 0.0 && entity.can_produce(kind) {
                produce(entity, kind);
                produced += 1;
                entity.state = EntityState::ReadyToHarvest;
                entity.time_to_decay = kind.decay_time_secs;
            }
        }
        EntityState::ReadyToHarvest => {
            entity.time_to_next_yield -= dt;
            entity.time_to_decay -= dt;

            if entity.time_to_next_yield <= 0.0 && entity.can_produce(kind) {
                produce(entity, kind);
                produced += 1;
            }

            if entity.time_to_decay <= 0.0 || !entity.can_produce(kind) {
                if entity.accumulated_yield > 0 {
                    entity.state = EntityState::Decaying;
                    entity.time_to_decay = kind.decay_time_secs;
                } else {
                    entity.state = EntityState::Dead;
                }
            }
        }
        EntityState::Decaying => {
            entity.time_to_decay -= dt;
            if entity.time_to_decay <= 0.0 {
                lost = entity.accumulated_yield;
                entity.accumulated_yield = 0;
                entity.time_to_decay = 0.0;
                entity.state = EntityState::Dead;
            }
        }
        EntityState::Dead => {}
    }

    Transition {
        from,
        to: entity.state,
        produced,
        lost,
    }
}

/// Take the held yield from `entity`, returning the base amount.
///
/// # Errors
///
/// Returns [`FarmError::NotHarvestable`] when the entity is not ready or
/// decaying, or holds nothing. The entity is left untouched in that case.
pub fn harvest_entity(entity: &mut EntityInstance, kind: &EntityKindDef) -> Result<u64, FarmError> {
    if !entity.is_harvestable() {
        return Err(FarmError::NotHarvestable(entity.id));
    }

    let amount = entity.accumulated_yield;
    entity.accumulated_yield = 0;

    if entity.state == EntityState::Decaying && !entity.can_produce(kind) {
        entity.state = EntityState::Dead;
        entity.time_to_decay = 0.0;
        entity.time_to_next_yield = 0.0;
    } else {
        entity.time_to_decay = kind.decay_time_secs;
        entity.state = if entity.can_produce(kind) {
            EntityState::ReadyToHarvest
        } else {
            EntityState::Decaying
        };
    }
    Ok(amount)
}

// ---------------------------------------------------------------------------
// Entity update pass
// ---------------------------------------------------------------------------

/// Result of one entity-update event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPass {
    /// Entities whose timers were advanced.
    pub advanced: u64,
    /// Dead entities removed at the end of the pass.
    pub removed: Vec<EntityInstanceId>,
}

/// Advance every entity by `dt` in id order, then remove the dead ones.
///
/// Entities whose kind is missing from the catalog are skipped.
pub fn run_entity_pass(
    state: &mut GameState,
    catalog: &dyn Catalog,
    dt: f64,
    journal: &mut EventJournal,
) -> EntityPass {
    let mut pass = EntityPass::default();
    let mut dead = Vec::new();

    for id in state.entity_ids() {
        let Some(entity) = state.entity_mut(id) else {
            continue;
        };
        let Some(kind) = catalog.entity_kind(&entity.kind) else {
            tracing::warn!(entity = %id, kind = %entity.kind, "entity kind missing from catalog, skipping update");
            continue;
        };

        let step = advance(entity, kind, dt);
        pass.advanced += 1;

        if step.produced > 0 {
            journal.record(FarmEvent::EntityProduced {
                entity: id,
                plot: entity.plot_id,
                yields_produced: entity.yields_produced,
                accumulated_yield: entity.accumulated_yield,
            });
        }
        if step.lost > 0 {
            journal.record(FarmEvent::YieldLost {
                entity: id,
                plot: entity.plot_id,
                amount: step.lost,
            });
        }
        if step.from != step.to {
            tracing::debug!(entity = %id, from = ?step.from, to = ?step.to, "entity state changed");
            journal.record(FarmEvent::EntityStateChanged {
                entity: id,
                plot: entity.plot_id,
                from: step.from,
                to: step.to,
            });
        }
        if entity.is_dead() {
            dead.push(id);
        }
    }

    if !dead.is_empty() {
        placement::remove_entities(state, &dead, journal);
    }
    pass.removed = dead;
    pass
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use farmstead_state::catalog::Category;
    use farmstead_state::ids::PlotId;

    fn tomato_plant() -> EntityKindDef {
        EntityKindDef {
            id: "tomato_plant".into(),
            name: String::new(),
            category: Category::Plant,
            production_time_secs: 600.0,
            base_yield: 1,
            total_yields_limit: 40,
            decay_time_secs: 3600.0,
            quantity_per_plot: 10,
            produced_item: "tomato".into(),
        }
    }

    fn fresh(kind: &EntityKindDef) -> EntityInstance {
        EntityInstance::new(EntityInstanceId(0), kind, PlotId(0), 0, 0)
    }

    fn run(entity: &mut EntityInstance, kind: &EntityKindDef, seconds: u32) {
        for _ in 0..seconds {
            advance(entity, kind, 1.0);
        }
    }

    // -- 1. Growing ---------------------------------------------------------

    #[test]
    fn first_production_after_full_production_time() {
        let kind = tomato_plant();
        let mut e = fresh(&kind);

        run(&mut e, &kind, 599);
        assert_eq!(e.state, EntityState::Growing);
        assert_eq!(e.accumulated_yield, 0);

        let step = advance(&mut e, &kind, 1.0);
        assert!(step.changed());
        assert_eq!(step.produced, 1);
        assert_eq!(e.state, EntityState::ReadyToHarvest);
        assert_eq!(e.accumulated_yield, 1);
        assert_eq!(e.time_to_next_yield, 600.0);
        assert_eq!(e.time_to_decay, 3600.0);
    }

    #[test]
    fn quiet_steps_report_no_change() {
        let kind = tomato_plant();
        let mut e = fresh(&kind);
        let step = advance(&mut e, &kind, 1.0);
        assert!(!step.changed());
    }

    // -- 2. Ready -----------------------------------------------------------

    #[test]
    fn ready_entity_keeps_producing() {
        let kind = tomato_plant();
        let mut e = fresh(&kind);
        run(&mut e, &kind, 600 + 1200);
        assert_eq!(e.state, EntityState::ReadyToHarvest);
        assert_eq!(e.yields_produced, 3);
        assert_eq!(e.accumulated_yield, 3);
    }

    #[test]
    fn decay_timer_moves_ready_entity_to_decaying() {
        let kind = tomato_plant();
        let mut e = fresh(&kind);
        run(&mut e, &kind, 600 + 3600);
        // Productions at 600, 1200, ..., 4200.
        assert_eq!(e.state, EntityState::Decaying);
        assert_eq!(e.accumulated_yield, 7);
        assert_eq!(e.time_to_decay, 3600.0);
    }

    #[test]
    fn reaching_the_limit_starts_decay() {
        let mut kind = tomato_plant();
        kind.total_yields_limit = 1;
        let mut e = fresh(&kind);
        run(&mut e, &kind, 600);
        assert_eq!(e.state, EntityState::ReadyToHarvest);

        advance(&mut e, &kind, 1.0);
        assert_eq!(e.state, EntityState::Decaying);
        assert_eq!(e.yields_produced, 1);
    }

    #[test]
    fn ready_entity_with_nothing_held_dies_at_limit() {
        let mut kind = tomato_plant();
        kind.total_yields_limit = 1;
        let mut e = fresh(&kind);
        run(&mut e, &kind, 600);
        harvest_entity(&mut e, &kind).unwrap();
        assert_eq!(e.state, EntityState::Decaying);

        // A ready entity that is at its limit and holds nothing dies outright.
        e.state = EntityState::ReadyToHarvest;
        advance(&mut e, &kind, 1.0);
        assert_eq!(e.state, EntityState::Dead);
    }

    // -- 3. Decaying --------------------------------------------------------

    #[test]
    fn decay_loses_all_held_yield() {
        let kind = tomato_plant();
        let mut e = fresh(&kind);
        run(&mut e, &kind, 600 + 3600 + 3599);
        assert_eq!(e.state, EntityState::Decaying);

        let step = advance(&mut e, &kind, 1.0);
        assert_eq!(step.lost, 7);
        assert_eq!(e.state, EntityState::Dead);
        assert_eq!(e.accumulated_yield, 0);
    }

    #[test]
    fn dead_is_terminal() {
        let kind = tomato_plant();
        let mut e = fresh(&kind);
        e.state = EntityState::Dead;
        let before = e.clone();
        let step = advance(&mut e, &kind, 10_000.0);
        assert!(!step.changed());
        assert_eq!(e, before);
    }

    // -- 4. Harvest ---------------------------------------------------------

    #[test]
    fn harvest_returns_base_amount_and_stays_ready() {
        let kind = tomato_plant();
        let mut e = fresh(&kind);
        run(&mut e, &kind, 600);

        assert_eq!(harvest_entity(&mut e, &kind).unwrap(), 1);
        assert_eq!(e.accumulated_yield, 0);
        assert_eq!(e.state, EntityState::ReadyToHarvest);
        assert_eq!(e.time_to_decay, 3600.0);
    }

    #[test]
    fn harvesting_decaying_entity_that_can_produce_returns_it_to_ready() {
        let kind = tomato_plant();
        let mut e = fresh(&kind);
        run(&mut e, &kind, 600 + 3600);
        assert_eq!(e.state, EntityState::Decaying);

        assert_eq!(harvest_entity(&mut e, &kind).unwrap(), 7);
        assert_eq!(e.state, EntityState::ReadyToHarvest);
    }

    #[test]
    fn harvesting_spent_decaying_entity_kills_it() {
        let mut kind = tomato_plant();
        kind.total_yields_limit = 1;
        let mut e = fresh(&kind);
        run(&mut e, &kind, 601);
        assert_eq!(e.state, EntityState::Decaying);

        harvest_entity(&mut e, &kind).unwrap();
        assert_eq!(e.state, EntityState::Dead);
    }

    #[test]
    fn harvesting_growing_entity_fails_without_mutation() {
        let kind = tomato_plant();
        let mut e = fresh(&kind);
        let before = e.clone();
        let err = harvest_entity(&mut e, &kind).unwrap_err();
        assert_eq!(err, FarmError::NotHarvestable(EntityInstanceId(0)));
        assert_eq!(e, before);
    }
}
