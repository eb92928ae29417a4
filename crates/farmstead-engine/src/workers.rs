//! Worker state machine.
//!
//! `Idle --assign--> Busy --(time_remaining <= 0)--> Idle`, emitting a
//! [`TaskResult`] on completion. [`cancel`] drops a task immediately with no
//! partial credit. Assigning a busy worker is ignored with a warning.
//!
//! Task duration is fixed at assignment time, whatever the target plot
//! holds: one task covers the plot's entire outstanding work.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use farmstead_journal::event::FarmEvent;
use farmstead_journal::journal::EventJournal;
use farmstead_state::catalog::Catalog;
use farmstead_state::ids::{ItemId, PlotId, WorkerId};
use farmstead_state::state::GameState;
use farmstead_state::worker::{WorkerInstance, WorkerState, WorkerTask};

use crate::harvest;

/// A completed worker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub worker: WorkerId,
    pub task: WorkerTask,
    pub plot: PlotId,
}

/// Put an idle worker on `task` at `plot` for `duration` seconds.
///
/// Returns `false` and leaves the worker untouched if it is already busy.
pub fn assign(worker: &mut WorkerInstance, task: WorkerTask, plot: PlotId, duration: f64) -> bool {
    if worker.is_busy() {
        tracing::warn!(
            worker = %worker.id,
            current = ?worker.assigned_task,
            requested = %task,
            plot = %plot,
            "worker is already busy, ignoring assignment"
        );
        return false;
    }
    worker.state = WorkerState::Busy;
    worker.assigned_task = Some(task);
    worker.target_plot = Some(plot);
    worker.time_remaining = duration;
    true
}

/// Advance a busy worker by `dt` seconds.
///
/// Returns the finished task when the remaining time runs out; the worker is
/// idle again afterwards.
pub fn update(worker: &mut WorkerInstance, dt: f64) -> Option<TaskResult> {
    if !worker.is_busy() {
        return None;
    }
    worker.time_remaining -= dt;
    if worker.time_remaining > 0.0 {
        return None;
    }

    let result = match (worker.assigned_task, worker.target_plot) {
        (Some(task), Some(plot)) => Some(TaskResult {
            worker: worker.id,
            task,
            plot,
        }),
        _ => None,
    };
    worker.reset();
    result
}

/// Force a worker back to idle, discarding progress.
///
/// Returns the dropped task and target, or `None` if the worker was idle.
pub fn cancel(worker: &mut WorkerInstance) -> Option<(Option<WorkerTask>, Option<PlotId>)> {
    if worker.is_idle() {
        return None;
    }
    let dropped = (worker.assigned_task, worker.target_plot);
    worker.reset();
    Some(dropped)
}

// ---------------------------------------------------------------------------
// Worker update pass
// ---------------------------------------------------------------------------

/// Result of one worker-update event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerPass {
    pub completed: Vec<TaskResult>,
    /// Items credited by completed harvest and milk tasks.
    pub harvested: BTreeMap<ItemId, u64>,
    pub entities_removed: u64,
}

/// Apply the effect of a finished task.
///
/// Harvest and milk tasks harvest the target plot. If the plot was emptied
/// or harvested by other means in the meantime, completion is a no-op.
pub fn complete_task(
    state: &mut GameState,
    catalog: &dyn Catalog,
    result: &TaskResult,
    pass: &mut WorkerPass,
    journal: &mut EventJournal,
) {
    journal.record(FarmEvent::WorkerCompleted {
        worker: result.worker,
        plot: result.plot,
        task: result.task,
    });

    if !result.task.collects_yield() {
        tracing::debug!(worker = %result.worker, plot = %result.plot, task = %result.task, "task completed");
        return;
    }
    if !harvest::is_plot_harvestable(state, result.plot) {
        tracing::debug!(
            worker = %result.worker,
            plot = %result.plot,
            task = %result.task,
            "task completed with nothing left to harvest"
        );
        return;
    }

    match harvest::harvest_plot(state, catalog, result.plot, journal) {
        Ok(harvest) => {
            tracing::debug!(
                worker = %result.worker,
                plot = %result.plot,
                task = %result.task,
                item = %harvest.item,
                amount = harvest.adjusted_amount,
                "task completed"
            );
            *pass.harvested.entry(harvest.item).or_insert(0) += harvest.adjusted_amount;
            pass.entities_removed += harvest.removed.len() as u64;
        }
        Err(err) => {
            tracing::warn!(worker = %result.worker, plot = %result.plot, error = %err, "harvest on task completion failed");
        }
    }
}

/// Advance every worker by `dt` in id order and apply finished tasks.
pub fn run_worker_pass(
    state: &mut GameState,
    catalog: &dyn Catalog,
    dt: f64,
    journal: &mut EventJournal,
) -> WorkerPass {
    let mut pass = WorkerPass::default();
    for id in state.worker_ids() {
        let Some(worker) = state.worker_mut(id) else {
            continue;
        };
        if let Some(result) = update(worker, dt) {
            complete_task(state, catalog, &result, &mut pass, journal);
            pass.completed.push(result);
        }
    }
    pass
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
