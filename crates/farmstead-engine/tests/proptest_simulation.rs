//! Property tests for the simulation.
//!
//! These tests use `proptest` to drive small farms through random sequences
//! of ticks, catch-ups and player actions, and verify the invariants that
//! must hold after every step.

use std::time::Duration;

use farmstead_engine::prelude::*;
use proptest::prelude::*;

// -- Catalog ----------------------------------------------------------------

fn catalog(workers: u32) -> StaticCatalog {
    let mut tunables = Tunables {
        worker_task_duration_secs: 3.0,
        ..Tunables::default()
    };
    tunables.starting.workers = workers;
    tunables.starting.gold = 0;
    tunables.starting.inventory.insert("strawberry_seed".into(), 40);
    tunables.starting.inventory.insert("cow".into(), 5);

    StaticCatalog::new(
        vec![
            EntityKindDef {
                id: "strawberry_plant".into(),
                name: String::new(),
                category: Category::Plant,
                production_time_secs: 5.0,
                base_yield: 2,
                total_yields_limit: 3,
                decay_time_secs: 20.0,
                quantity_per_plot: 2,
                produced_item: "strawberry".into(),
            },
            EntityKindDef {
                id: "milk_cow".into(),
                name: String::new(),
                category: Category::Animal,
                production_time_secs: 7.0,
                base_yield: 1,
                total_yields_limit: 4,
                decay_time_secs: 15.0,
                quantity_per_plot: 1,
                produced_item: "milk".into(),
            },
        ],
        vec![
            ItemKindDef {
                id: "strawberry".into(),
                name: String::new(),
                sale_price: 6,
                purchase_price: None,
                pack_size: 1,
                grows_into: None,
            },
            ItemKindDef {
                id: "strawberry_seed".into(),
                name: String::new(),
                sale_price: 0,
                purchase_price: None,
                pack_size: 1,
                grows_into: Some("strawberry_plant".into()),
            },
            ItemKindDef {
                id: "milk".into(),
                name: String::new(),
                sale_price: 15,
                purchase_price: None,
                pack_size: 1,
                grows_into: None,
            },
            ItemKindDef {
                id: "cow".into(),
                name: String::new(),
                sale_price: 0,
                purchase_price: None,
                pack_size: 1,
                grows_into: Some("milk_cow".into()),
            },
        ],
        tunables,
    )
    .unwrap()
}

// -- Operations -------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Tick(u64),
    CatchUp(i64),
    Plant(u32, bool),
    Harvest(u32),
    Assign(u32),
    Cancel(u32),
    Remove(u32, u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..5_000u64).prop_map(Op::Tick),
        2 => (-5..120i64).prop_map(Op::CatchUp),
        1 => (0..4u32, any::<bool>()).prop_map(|(p, cow)| Op::Plant(p, cow)),
        1 => (0..4u32).prop_map(Op::Harvest),
        1 => (0..4u32).prop_map(Op::Assign),
        1 => (0..3u32).prop_map(Op::Cancel),
        1 => (0..4u32, 0..3u32).prop_map(|(p, pos)| Op::Remove(p, pos)),
    ]
}

fn apply(farm: &mut Farm<StaticCatalog>, op: &Op) {
    // Rejected actions are part of the exercise; only invariants matter.
    match op {
        Op::Tick(ms) => {
            farm.tick(Duration::from_millis(*ms));
        }
        Op::CatchUp(secs) => {
            farm.catch_up(*secs);
        }
        Op::Plant(plot, cow) => {
            let item = if *cow { "cow" } else { "strawberry_seed" };
            let _ = farm.plant(PlotId(*plot), &ItemId::from(item));
        }
        Op::Harvest(plot) => {
            let _ = farm.harvest_plot(PlotId(*plot));
        }
        Op::Assign(plot) => {
            let _ = farm.assign_worker(PlotId(*plot));
        }
        Op::Cancel(worker) => {
            let _ = farm.cancel_worker(WorkerId(*worker));
        }
        Op::Remove(plot, position) => {
            let _ = farm.remove_entity(PlotId(*plot), *position);
        }
    }
}

fn check_invariants(farm: &Farm<StaticCatalog>) -> Result<(), TestCaseError> {
    let state = farm.state();

    for entity in state.entities() {
        let kind = farm.catalog().entity_kind(&entity.kind).unwrap();
        prop_assert!(entity.yields_produced <= kind.total_yields_limit);
        prop_assert!(
            entity.state != EntityState::Dead || entity.accumulated_yield == 0,
            "dead entity {} still holds yield",
            entity.id
        );
        prop_assert!(!entity.is_dead(), "dead entity {} was not removed", entity.id);
        prop_assert!(state.plot(entity.plot_id).is_some());
    }

    for plot in state.plots() {
        let holders: Vec<_> = state.entities_on_plot(plot.id).collect();
        match plot.state {
            PlotState::Occupied => {
                prop_assert!(!holders.is_empty(), "{} occupied without entities", plot.id);
                let back = plot.occupying_entity.and_then(|id| state.entity(id));
                prop_assert!(back.is_some_and(|e| e.plot_id == plot.id));
                let first = &holders[0].kind;
                prop_assert!(holders.iter().all(|e| &e.kind == first), "mixed kinds on {}", plot.id);
            }
            PlotState::Empty => {
                prop_assert!(holders.is_empty(), "{} empty with entities", plot.id);
                prop_assert!(plot.occupying_entity.is_none());
            }
            PlotState::Locked => {}
        }

        let busy = state.workers().filter(|w| w.targets(plot.id)).count();
        prop_assert!(busy <= 1, "{} busy workers target {}", busy, plot.id);
    }

    for worker in state.workers() {
        if worker.is_idle() {
            prop_assert!(worker.assigned_task.is_none() && worker.target_plot.is_none());
        } else {
            prop_assert!(worker.assigned_task.is_some() && worker.target_plot.is_some());
        }
    }
    Ok(())
}

// -- Properties -------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Invariants hold after every step of a random session.
    #[test]
    fn invariants_hold_under_random_sessions(
        workers in 0..3u32,
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut farm = Farm::new_game(catalog(workers), 0);
        check_invariants(&farm)?;
        for op in &ops {
            apply(&mut farm, op);
            check_invariants(&farm)?;
        }
    }

    /// The audit finds nothing to repair in states the engines produce.
    #[test]
    fn engine_states_need_no_repair(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut farm = Farm::new_game(catalog(2), 0);
        for op in &ops {
            apply(&mut farm, op);
        }
        prop_assert!(farm.audit().is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// One catch-up over N seconds equals N one-second ticks.
    #[test]
    fn catch_up_equals_repeated_ticks(
        seconds in 0..1_500i64,
        workers in 0..3u32,
        prelude in prop::collection::vec(op_strategy(), 0..10),
    ) {
        // Both farms replay the same prelude so their cadences agree too.
        let mut offline = Farm::new_game(catalog(workers), 0);
        let mut live = Farm::new_game(catalog(workers), 0);
        for op in &prelude {
            apply(&mut offline, op);
            apply(&mut live, op);
        }
        prop_assert_eq!(offline.cadence(), live.cadence());

        let caught_up = offline.catch_up(seconds);

        let mut ticked = AdvanceReport::default();
        for _ in 0..seconds {
            ticked.merge(&live.tick(Duration::from_secs(1)));
        }

        prop_assert_eq!(offline.state(), live.state());
        prop_assert_eq!(offline.state_hash().unwrap(), live.state_hash().unwrap());
        prop_assert_eq!(caught_up.harvested, ticked.harvested);
        prop_assert_eq!(caught_up.tasks_completed, ticked.tasks_completed);
        prop_assert_eq!(caught_up.tasks_assigned, ticked.tasks_assigned);
        prop_assert_eq!(caught_up.events_processed, ticked.events_processed);
    }

    /// A zero or negative catch-up leaves the state bit for bit unchanged.
    #[test]
    fn non_positive_catch_up_is_a_no_op(
        seconds in -10_000..=0i64,
        prelude in prop::collection::vec(op_strategy(), 0..20),
    ) {
        let mut farm = Farm::new_game(catalog(1), 0);
        for op in &prelude {
            apply(&mut farm, op);
        }
        let before = farm.state_hash().unwrap();
        let report = farm.catch_up(seconds);
        prop_assert!(report.is_empty());
        prop_assert_eq!(farm.state_hash().unwrap(), before);
    }
}
