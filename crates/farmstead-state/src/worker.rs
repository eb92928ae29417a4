//! Hired workers.
//!
//! The data half of the worker state machine. Transitions (assign, update,
//! cancel) live in `farmstead_engine::workers`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{PlotId, WorkerId};

/// Whether a worker is free for a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Busy,
}

/// Kind of work a worker performs on its target plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerTask {
    Plant,
    Harvest,
    Milk,
}

impl WorkerTask {
    /// Harvest and milk tasks collect yield when they complete.
    pub fn collects_yield(self) -> bool {
        matches!(self, WorkerTask::Harvest | WorkerTask::Milk)
    }
}

impl fmt::Display for WorkerTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerTask::Plant => "plant",
            WorkerTask::Harvest => "harvest",
            WorkerTask::Milk => "milk",
        };
        f.write_str(name)
    }
}

/// A worker and its current assignment.
///
/// Idle exactly when `assigned_task` is `None` and `time_remaining` is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerInstance {
    pub id: WorkerId,
    pub state: WorkerState,
    pub assigned_task: Option<WorkerTask>,
    pub target_plot: Option<PlotId>,
    /// Seconds left on the current task.
    pub time_remaining: f64,
    /// Unix seconds of the last save that included this worker.
    pub last_update_epoch: i64,
}

impl WorkerInstance {
    pub fn idle(id: WorkerId) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            assigned_task: None,
            target_plot: None,
            time_remaining: 0.0,
            last_update_epoch: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == WorkerState::Idle
    }

    pub fn is_busy(&self) -> bool {
        self.state == WorkerState::Busy
    }

    /// Busy with a task on `plot`.
    pub fn targets(&self, plot: PlotId) -> bool {
        self.is_busy() && self.target_plot == Some(plot)
    }

    /// Drop any assignment and return to the idle state.
    pub fn reset(&mut self) {
        self.state = WorkerState::Idle;
        self.assigned_task = None;
        self.target_plot = None;
        self.time_remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_idle_invariant() {
        let mut w = WorkerInstance::idle(WorkerId(0));
        w.state = WorkerState::Busy;
        w.assigned_task = Some(WorkerTask::Milk);
        w.target_plot = Some(PlotId(2));
        w.time_remaining = 42.0;
        assert!(w.targets(PlotId(2)));

        w.reset();
        assert!(w.is_idle());
        assert_eq!(w.assigned_task, None);
        assert_eq!(w.target_plot, None);
        assert_eq!(w.time_remaining, 0.0);
        assert!(!w.targets(PlotId(2)));
    }

    #[test]
    fn only_harvest_and_milk_collect_yield() {
        assert!(WorkerTask::Harvest.collects_yield());
        assert!(WorkerTask::Milk.collects_yield());
        assert!(!WorkerTask::Plant.collects_yield());
    }
}
