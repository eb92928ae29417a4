//! Consistency audit of plots, entities and workers.
//!
//! Saved state can drift out of shape: a hand-edited file, a save written by
//! an older build, a plot whose last entity vanished. [`audit_plots`] walks
//! the state and corrects what it finds instead of refusing to load:
//!
//! - an occupied plot with no entities becomes `Empty`,
//! - a back-reference to a missing entity is repointed at the lowest
//!   remaining entity,
//! - an empty plot that still holds entities is marked `Occupied`,
//! - entities on a plot that does not exist are removed,
//! - workers targeting a missing plot, or in a half-idle state, are reset,
//! - a busy worker targeting a plot already claimed by a lower-id worker is
//!   reset.
//!
//! Every repair is logged at `warn` and journaled.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use farmstead_journal::event::FarmEvent;
use farmstead_journal::journal::EventJournal;
use farmstead_state::ids::{EntityInstanceId, PlotId, WorkerId};
use farmstead_state::plot::PlotState;
use farmstead_state::state::GameState;
use farmstead_state::worker::WorkerState;

use crate::placement;

/// One correction made by the audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Repair {
    EmptiedPlot { plot: PlotId },
    RepointedPlot { plot: PlotId, entity: EntityInstanceId },
    OccupiedPlot { plot: PlotId, entity: EntityInstanceId },
    RemovedOrphan { entity: EntityInstanceId, plot: PlotId },
    ResetWorker { worker: WorkerId },
}

impl Repair {
    fn plot(&self) -> Option<PlotId> {
        match self {
            Repair::EmptiedPlot { plot }
            | Repair::RepointedPlot { plot, .. }
            | Repair::OccupiedPlot { plot, .. }
            | Repair::RemovedOrphan { plot, .. } => Some(*plot),
            Repair::ResetWorker { .. } => None,
        }
    }
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repair::EmptiedPlot { plot } => write!(f, "{plot} was occupied with no entities, emptied"),
            Repair::RepointedPlot { plot, entity } => {
                write!(f, "{plot} pointed at a missing entity, repointed to {entity}")
            }
            Repair::OccupiedPlot { plot, entity } => {
                write!(f, "{plot} was empty but held entities, occupied by {entity}")
            }
            Repair::RemovedOrphan { entity, plot } => {
                write!(f, "{entity} referenced missing {plot}, removed")
            }
            Repair::ResetWorker { worker } => write!(f, "{worker} had an inconsistent task, reset"),
        }
    }
}

fn note(repair: Repair, repairs: &mut Vec<Repair>, journal: &mut EventJournal) {
    tracing::warn!(repair = %repair, "state repaired");
    journal.record(FarmEvent::Repaired {
        plot: repair.plot(),
        detail: repair.to_string(),
    });
    repairs.push(repair);
}

/// Correct inconsistencies and return what was changed.
pub fn audit_plots(state: &mut GameState, journal: &mut EventJournal) -> Vec<Repair> {
    let mut repairs = Vec::new();

    // Orphans first, so plot checks see only entities that will stay.
    let orphans: Vec<(EntityInstanceId, PlotId)> = state
        .entities()
        .filter(|e| state.plot(e.plot_id).is_none())
        .map(|e| (e.id, e.plot_id))
        .collect();
    for (entity, plot) in orphans {
        state.remove_entity(entity);
        note(Repair::RemovedOrphan { entity, plot }, &mut repairs, journal);
    }

    for plot in state.plot_ids() {
        let Some(before) = state.plot(plot).cloned() else {
            continue;
        };
        let mut scratch = EventJournal::new();
        if !placement::refresh_plot(state, plot, &mut scratch) {
            continue;
        }
        let Some(after) = state.plot(plot) else {
            continue;
        };
        let repair = match (before.state, after.occupying_entity) {
            (_, None) => Repair::EmptiedPlot { plot },
            (PlotState::Empty, Some(entity)) => Repair::OccupiedPlot { plot, entity },
            (_, Some(entity)) => Repair::RepointedPlot { plot, entity },
        };
        for entry in scratch.entries() {
            journal.record(entry.event.clone());
        }
        note(repair, &mut repairs, journal);
    }

    let mut claimed = BTreeSet::new();
    for worker in state.worker_ids() {
        let plot_missing = state
            .worker(worker)
            .and_then(|w| w.target_plot)
            .is_some_and(|p| state.plot(p).is_none());
        let Some(w) = state.worker_mut(worker) else {
            continue;
        };
        let half_idle = match w.state {
            WorkerState::Idle => {
                w.assigned_task.is_some() || w.target_plot.is_some() || w.time_remaining != 0.0
            }
            WorkerState::Busy => w.assigned_task.is_none() || w.target_plot.is_none(),
        };
        // Only one busy worker may target a plot; the lowest id keeps it.
        let duplicate = !plot_missing
            && !half_idle
            && w.is_busy()
            && w.target_plot.is_some_and(|p| !claimed.insert(p));
        if plot_missing || half_idle || duplicate {
            w.reset();
            note(Repair::ResetWorker { worker }, &mut repairs, journal);
        }
    }

    repairs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
