//! Replay of elapsed time through the simulation engines.
//!
//! Live ticks and offline catch-up share one path: [`advance`] asks the
//! [`Cadence`] for the events that fall inside the elapsed span and
//! dispatches each to its engine with that process's fixed interval as the
//! step. Within one instant, entity updates run before worker updates, which
//! run before the assignment pass, so effects only ever flow forward.
//!
//! Because the cadence carries the sub-interval remainder between calls,
//! replaying `N` seconds in one call gives the same state as replaying it in
//! any number of smaller pieces.
//!
//! # Example
//!
//! ```
//! use farmstead_engine::catch_up::catch_up;
//! use farmstead_journal::journal::EventJournal;
//! use farmstead_state::prelude::*;
//!
//! let catalog = StaticCatalog::default();
//! let mut state = GameState::new_game(catalog.tunables(), 0);
//! let mut journal = EventJournal::new();
//!
//! let report = catch_up(&mut state, &catalog, 10, &mut journal);
//! assert_eq!(report.entity_updates, 10);
//! assert_eq!(report.assignment_passes, 5);
//!
//! // Nothing elapsed, nothing happens.
//! let report = catch_up(&mut state, &catalog, 0, &mut journal);
//! assert!(report.is_empty());
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use farmstead_journal::journal::EventJournal;
use farmstead_state::catalog::Catalog;
use farmstead_state::ids::ItemId;
use farmstead_state::state::GameState;

use crate::lifecycle;
use crate::scheduler;
use crate::timeline::{Cadence, Process};
use crate::workers;

// ---------------------------------------------------------------------------
// AdvanceReport
// ---------------------------------------------------------------------------

/// Summary of one advance, live or offline.
///
/// The mutated [`GameState`] is the authoritative result; the report is for
/// display and for comparing two ways of advancing the same span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceReport {
    /// Simulated time covered.
    pub elapsed: Duration,
    pub events_processed: u64,
    pub entity_updates: u64,
    pub worker_updates: u64,
    pub assignment_passes: u64,
    pub tasks_completed: u64,
    pub tasks_assigned: u64,
    /// Items credited by completed tasks, per item.
    pub harvested: BTreeMap<ItemId, u64>,
    pub entities_removed: u64,
}

impl AdvanceReport {
    /// No event was processed.
    pub fn is_empty(&self) -> bool {
        self.events_processed == 0
    }

    /// Total items credited by completed tasks.
    pub fn total_harvested(&self) -> u64 {
        self.harvested.values().sum()
    }

    /// Fold `other` into this report.
    pub fn merge(&mut self, other: &AdvanceReport) {
        self.elapsed = self.elapsed.saturating_add(other.elapsed);
        self.events_processed += other.events_processed;
        self.entity_updates += other.entity_updates;
        self.worker_updates += other.worker_updates;
        self.assignment_passes += other.assignment_passes;
        self.tasks_completed += other.tasks_completed;
        self.tasks_assigned += other.tasks_assigned;
        for (item, amount) in &other.harvested {
            *self.harvested.entry(item.clone()).or_insert(0) += amount;
        }
        self.entities_removed += other.entities_removed;
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Replay `span` of elapsed time and move `cadence` past it.
///
/// The journal's clock is set to each event's offset before dispatch.
pub fn advance(
    state: &mut GameState,
    catalog: &dyn Catalog,
    cadence: &mut Cadence,
    span: Duration,
    journal: &mut EventJournal,
) -> AdvanceReport {
    let mut report = AdvanceReport {
        elapsed: span,
        ..AdvanceReport::default()
    };
    if span.is_zero() {
        return report;
    }

    let entity_dt = cadence.interval(Process::EntityUpdate).as_secs_f64();
    let worker_dt = cadence.interval(Process::WorkerUpdate).as_secs_f64();
    let timeline = cadence.timeline(span);

    for event in timeline {
        journal.set_clock(event.at);
        tracing::trace!(at = ?event.at, process = ?event.process, "replaying event");
        report.events_processed += 1;

        match event.process {
            Process::EntityUpdate => {
                let pass = lifecycle::run_entity_pass(state, catalog, entity_dt, journal);
                report.entity_updates += 1;
                report.entities_removed += pass.removed.len() as u64;
            }
            Process::WorkerUpdate => {
                let pass = workers::run_worker_pass(state, catalog, worker_dt, journal);
                report.worker_updates += 1;
                report.tasks_completed += pass.completed.len() as u64;
                report.entities_removed += pass.entities_removed;
                for (item, amount) in pass.harvested {
                    *report.harvested.entry(item).or_insert(0) += amount;
                }
            }
            Process::TaskAssignment => {
                let assigned = scheduler::run_assignment_pass(state, catalog, journal);
                report.assignment_passes += 1;
                report.tasks_assigned += assigned.len() as u64;
            }
        }
    }

    cadence.advance(span);
    report
}

/// Replay `elapsed_seconds` of offline time from a zeroed cadence.
///
/// This is a pure function of the state, the elapsed time and the catalog.
/// Calling it twice for the same absence applies the time twice. A
/// non-positive `elapsed_seconds` is a no-op with an empty report.
pub fn catch_up(
    state: &mut GameState,
    catalog: &dyn Catalog,
    elapsed_seconds: i64,
    journal: &mut EventJournal,
) -> AdvanceReport {
    let mut cadence = Cadence::from_tunables(catalog.tunables());
    let report = advance(state, catalog, &mut cadence, elapsed_span(elapsed_seconds), journal);
    if !report.is_empty() {
        tracing::info!(
            elapsed_secs = elapsed_seconds,
            events = report.events_processed,
            tasks_completed = report.tasks_completed,
            tasks_assigned = report.tasks_assigned,
            "offline catch-up finished"
        );
    }
    report
}

/// Whole seconds as a span; non-positive values become zero.
pub(crate) fn elapsed_span(elapsed_seconds: i64) -> Duration {
    u64::try_from(elapsed_seconds).map_or(Duration::ZERO, Duration::from_secs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use farmstead_state::catalog::{Category, EntityKindDef, ItemKindDef, StaticCatalog, Tunables};
    use farmstead_state::ids::{EntityKindId, PlotId};
    use farmstead_state::worker::WorkerTask;

    fn catalog() -> StaticCatalog {
        StaticCatalog::new(
            vec![EntityKindDef {
                id: "strawberry_plant".into(),
                name: String::new(),
                category: Category::Plant,
                production_time_secs: 30.0,
                base_yield: 1,
                total_yields_limit: 20,
                decay_time_secs: 3600.0,
                quantity_per_plot: 2,
                produced_item: "strawberry".into(),
            }],
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
                    purchase_price: Some(40),
                    pack_size: 10,
                    grows_into: Some(EntityKindId::from("strawberry_plant")),
                },
            ],
            Tunables {
                worker_task_duration_secs: 10.0,
                ..Tunables::default()
            },
        )
        .unwrap()
    }

    fn seeded_state(catalog: &StaticCatalog) -> GameState {
        let mut state = GameState::new_game(catalog.tunables(), 0);
        state.inventory.add(&"strawberry_seed".into(), 2);
        state
    }

    #[test]
    fn non_positive_elapsed_is_a_no_op() {
        let catalog = catalog();
        let mut state = seeded_state(&catalog);
        let before = state.clone();
        let mut journal = EventJournal::new();

        assert!(catch_up(&mut state, &catalog, 0, &mut journal).is_empty());
        assert!(catch_up(&mut state, &catalog, -60, &mut journal).is_empty());
        assert_eq!(state, before);
        assert!(journal.is_empty());
    }

    #[test]
    fn event_counts_follow_the_intervals() {
        let catalog = catalog();
        let mut state = seeded_state(&catalog);
        let mut journal = EventJournal::new();
        let report = catch_up(&mut state, &catalog, 61, &mut journal);
        assert_eq!(report.entity_updates, 61);
        assert_eq!(report.worker_updates, 61);
        assert_eq!(report.assignment_passes, 30);
        assert_eq!(report.events_processed, 152);
        assert_eq!(report.elapsed, Duration::from_secs(61));
    }

    #[test]
    fn workers_plant_then_harvest_while_offline() {
        let catalog = catalog();
        let mut state = seeded_state(&catalog);
        let mut journal = EventJournal::new();

        // Planted at t=2, first yield and harvest assignment at t=32, harvested at t=42.
        let report = catch_up(&mut state, &catalog, 44, &mut journal);
        assert_eq!(report.tasks_assigned, 2);
        assert_eq!(report.tasks_completed, 2);
        assert_eq!(report.harvested.get(&"strawberry".into()), Some(&2));
        assert_eq!(state.inventory.count(&"strawberry".into()), 2);
        assert_eq!(state.plot(PlotId(0)).unwrap().state, farmstead_state::plot::PlotState::Occupied);
        assert!(journal
            .entries()
            .iter()
            .any(|e| matches!(e.event, farmstead_journal::event::FarmEvent::WorkerCompleted { task: WorkerTask::Harvest, .. })));
    }

    #[test]
    fn split_advance_equals_single_advance() {
        let catalog = catalog();
        let mut once = seeded_state(&catalog);
        let mut split = once.clone();
        let mut journal = EventJournal::new();

        let whole = catch_up(&mut once, &catalog, 500, &mut journal);

        let mut cadence = Cadence::from_tunables(catalog.tunables());
        let mut merged = AdvanceReport::default();
        for _ in 0..500 {
            let step = advance(&mut split, &catalog, &mut cadence, Duration::from_secs(1), &mut journal);
            merged.merge(&step);
        }
        assert_eq!(once, split);
        assert_eq!(whole, merged);
    }

    #[test]
    fn merge_adds_harvest_per_item() {
        let mut a = AdvanceReport::default();
        a.harvested.insert("milk".into(), 2);
        let mut b = AdvanceReport::default();
        b.harvested.insert("milk".into(), 3);
        b.harvested.insert("tomato".into(), 1);
        a.merge(&b);
        assert_eq!(a.total_harvested(), 6);
        assert_eq!(a.harvested[&ItemId::from("milk")], 5);
    }
}
