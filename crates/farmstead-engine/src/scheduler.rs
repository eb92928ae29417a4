//! Task assignment.
//!
//! One assignment pass runs per scheduling interval over the workers that
//! are idle when it starts, in id order:
//!
//! 1. **Harvest pass.** Each idle worker takes the lowest-id plot that holds
//!    harvestable yield and is not targeted by any busy worker. The task is
//!    `Milk` when the plot holds animals and `Harvest` otherwise.
//! 2. **Plant pass.** Each worker still idle takes the lowest-id empty plot
//!    nobody targets, and the plot is planted right away with the most
//!    valuable item the inventory can fill a plot with. A planting that fails
//!    rolls the assignment back.
//!
//! Targets are re-checked against the current assignments immediately before
//! each commit, so no plot ever has two busy workers.

use serde::{Deserialize, Serialize};

use farmstead_journal::event::FarmEvent;
use farmstead_journal::journal::EventJournal;
use farmstead_state::catalog::{Catalog, Category};
use farmstead_state::ids::{ItemId, PlotId, WorkerId};
use farmstead_state::plot::PlotState;
use farmstead_state::state::GameState;
use farmstead_state::worker::WorkerTask;
use farmstead_state::FarmError;

use crate::harvest;
use crate::planting;
use crate::workers;

/// A committed assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub worker: WorkerId,
    pub plot: PlotId,
    pub task: WorkerTask,
    /// Item planted, for plant tasks.
    pub item: Option<ItemId>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Value of planting `item`: product sale price times lifetime yield.
fn planting_value(catalog: &dyn Catalog, item: &ItemId) -> Option<u64> {
    let kind_id = catalog.item_kind(item)?.grows_into.as_ref()?;
    let kind = catalog.entity_kind(kind_id)?;
    let price = catalog.item_kind(&kind.produced_item)?.sale_price;
    Some(
        price
            .saturating_mul(u64::from(kind.base_yield))
            .saturating_mul(u64::from(kind.total_yields_limit)),
    )
}

/// The held item that fills a plot and has the highest planting value.
///
/// Ties go to the item with the lowest id.
pub fn best_plantable_item(state: &GameState, catalog: &dyn Catalog) -> Option<ItemId> {
    let mut best: Option<(ItemId, u64)> = None;
    for (item, count) in state.inventory.iter() {
        let Some(kind) = catalog
            .item_kind(item)
            .and_then(|def| def.grows_into.as_ref())
            .and_then(|kind| catalog.entity_kind(kind))
        else {
            continue;
        };
        if count < u64::from(kind.quantity_per_plot) {
            continue;
        }
        let Some(value) = planting_value(catalog, item) else {
            continue;
        };
        if best.as_ref().map_or(true, |(_, top)| value > *top) {
            best = Some((item.clone(), value));
        }
    }
    best.map(|(item, _)| item)
}

/// Task kind for collecting yield from `plot`.
fn collect_task(state: &GameState, catalog: &dyn Catalog, plot: PlotId) -> WorkerTask {
    let entity = state
        .plot(plot)
        .and_then(|p| p.occupying_entity)
        .and_then(|id| state.entity(id))
        .or_else(|| state.entities_on_plot(plot).next());
    let animal = entity
        .and_then(|e| catalog.entity_kind(&e.kind))
        .is_some_and(|kind| kind.category == Category::Animal);
    if animal {
        WorkerTask::Milk
    } else {
        WorkerTask::Harvest
    }
}

fn is_targeted(state: &GameState, plot: PlotId) -> bool {
    state.worker_targeting(plot).is_some()
}

fn is_plantable_plot(state: &GameState, plot: PlotId) -> bool {
    state.plot(plot).is_some_and(|p| p.state == PlotState::Empty)
        && state.entities_on_plot(plot).next().is_none()
}

fn commit(
    state: &mut GameState,
    catalog: &dyn Catalog,
    worker: WorkerId,
    plot: PlotId,
    task: WorkerTask,
    journal: &mut EventJournal,
) -> bool {
    let duration = catalog.tunables().worker_task_duration_secs;
    let Some(w) = state.worker_mut(worker) else {
        return false;
    };
    if !workers::assign(w, task, plot, duration) {
        journal.record(FarmEvent::WorkerAlreadyBusy { worker });
        return false;
    }
    journal.record(FarmEvent::WorkerAssigned { worker, plot, task });
    tracing::debug!(worker = %worker, plot = %plot, task = %task, "worker assigned");
    true
}

fn rollback(state: &mut GameState, worker: WorkerId, journal: &mut EventJournal) {
    if let Some(w) = state.worker_mut(worker) {
        if let Some((task, plot)) = workers::cancel(w) {
            journal.record(FarmEvent::WorkerCancelled { worker, plot, task });
        }
    }
}

// ---------------------------------------------------------------------------
// Assignment pass
// ---------------------------------------------------------------------------

/// Run one assignment pass and return what was committed.
pub fn run_assignment_pass(
    state: &mut GameState,
    catalog: &dyn Catalog,
    journal: &mut EventJournal,
) -> Vec<Assignment> {
    let mut assigned = Vec::new();
    let mut idle: Vec<WorkerId> = state.workers().filter(|w| w.is_idle()).map(|w| w.id).collect();
    if idle.is_empty() {
        return assigned;
    }
    let plots = state.plot_ids();

    // Harvest pass.
    idle.retain(|&worker| {
        let Some(plot) = plots
            .iter()
            .copied()
            .find(|&p| harvest::is_plot_harvestable(state, p) && !is_targeted(state, p))
        else {
            return true;
        };
        let task = collect_task(state, catalog, plot);
        if commit(state, catalog, worker, plot, task, journal) {
            assigned.push(Assignment {
                worker,
                plot,
                task,
                item: None,
            });
            false
        } else {
            true
        }
    });

    // Plant pass.
    for worker in idle {
        let Some(item) = best_plantable_item(state, catalog) else {
            break;
        };
        let Some(plot) = plots
            .iter()
            .copied()
            .find(|&p| is_plantable_plot(state, p) && !is_targeted(state, p))
        else {
            break;
        };
        if !commit(state, catalog, worker, plot, WorkerTask::Plant, journal) {
            continue;
        }
        match planting::plant(state, catalog, plot, &item, journal) {
            Ok(_) => assigned.push(Assignment {
                worker,
                plot,
                task: WorkerTask::Plant,
                item: Some(item),
            }),
            Err(err) => {
                tracing::warn!(worker = %worker, plot = %plot, item = %item, error = %err, "planting failed, rolling back assignment");
                rollback(state, worker, journal);
            }
        }
    }

    assigned
}

// ---------------------------------------------------------------------------
// Manual assignment
// ---------------------------------------------------------------------------

fn check_target(state: &GameState, plot: PlotId) -> Result<WorkerId, FarmError> {
    let target = state.plot(plot).ok_or(FarmError::UnknownPlot(plot))?;
    if target.state == PlotState::Locked {
        return Err(FarmError::PlotLocked(plot));
    }
    if let Some(worker) = state.worker_targeting(plot) {
        return Err(FarmError::PlotAlreadyTargeted {
            plot,
            worker: worker.id,
        });
    }
    state
        .workers()
        .find(|w| w.is_idle())
        .map(|w| w.id)
        .ok_or(FarmError::NoIdleWorker)
}

/// Send the lowest-id idle worker to `plot`.
///
/// A plot with harvestable yield gets a harvest or milk task. An empty plot
/// is planted with the most valuable held item.
///
/// # Errors
///
/// Fails without mutation when the plot is missing, locked, already
/// targeted, when every worker is busy, when an occupied plot holds nothing
/// harvestable, or when no held item can fill an empty plot.
pub fn assign_worker(
    state: &mut GameState,
    catalog: &dyn Catalog,
    plot: PlotId,
    journal: &mut EventJournal,
) -> Result<Assignment, FarmError> {
    let worker = check_target(state, plot)?;

    if harvest::is_plot_harvestable(state, plot) {
        let task = collect_task(state, catalog, plot);
        if !commit(state, catalog, worker, plot, task, journal) {
            return Err(FarmError::NoIdleWorker);
        }
        return Ok(Assignment {
            worker,
            plot,
            task,
            item: None,
        });
    }
    if !is_plantable_plot(state, plot) {
        return Err(FarmError::NothingToHarvest(plot));
    }
    let item = best_plantable_item(state, catalog).ok_or(FarmError::NoPlantableItem)?;
    assign_worker_to_plant(state, catalog, plot, &item, journal)
}

/// Send the lowest-id idle worker to plant `item` on `plot`.
pub fn assign_worker_to_plant(
    state: &mut GameState,
    catalog: &dyn Catalog,
    plot: PlotId,
    item: &ItemId,
    journal: &mut EventJournal,
) -> Result<Assignment, FarmError> {
    let worker = check_target(state, plot)?;
    planting::check_planting(state, catalog, plot, item)?;

    if !commit(state, catalog, worker, plot, WorkerTask::Plant, journal) {
        return Err(FarmError::NoIdleWorker);
    }
    if let Err(err) = planting::plant(state, catalog, plot, item, journal) {
        rollback(state, worker, journal);
        return Err(err);
    }
    Ok(Assignment {
        worker,
        plot,
        task: WorkerTask::Plant,
        item: Some(item.clone()),
    })
}

/// Cancel a worker's task. Returns `false` when the worker was already idle.
pub fn cancel_worker(
    state: &mut GameState,
    worker: WorkerId,
    journal: &mut EventJournal,
) -> Result<bool, FarmError> {
    let w = state.worker_mut(worker).ok_or(FarmError::UnknownWorker(worker))?;
    match workers::cancel(w) {
        Some((task, plot)) => {
            tracing::debug!(worker = %worker, "worker task cancelled");
            journal.record(FarmEvent::WorkerCancelled { worker, plot, task });
            Ok(true)
        }
        None => Ok(false),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
