//! Placement plots.

use serde::{Deserialize, Serialize};

use crate::ids::{EntityInstanceId, PlotId};

/// Occupancy of a plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotState {
    Empty,
    Occupied,
    /// Not yet usable. Nothing can be planted or placed on a locked plot.
    Locked,
}

/// A slot that holds zero or more entities of a single kind.
///
/// `occupying_entity` is a back-reference for quick lookups of the plot's
/// kind; the entities themselves live in
/// [`GameState`](crate::state::GameState). A plot is `Empty` exactly when
/// `occupying_entity` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    pub id: PlotId,
    pub state: PlotState,
    pub occupying_entity: Option<EntityInstanceId>,
}

impl Plot {
    pub fn empty(id: PlotId) -> Self {
        Self {
            id,
            state: PlotState::Empty,
            occupying_entity: None,
        }
    }

    pub fn locked(id: PlotId) -> Self {
        Self {
            id,
            state: PlotState::Locked,
            occupying_entity: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state == PlotState::Empty
    }

    /// Mark the plot as holding entities, pointing the back-reference at
    /// `entity`.
    pub fn occupy(&mut self, entity: EntityInstanceId) {
        self.state = PlotState::Occupied;
        self.occupying_entity = Some(entity);
    }

    /// Revert to `Empty`. Locked plots stay locked.
    pub fn clear(&mut self) {
        if self.state != PlotState::Locked {
            self.state = PlotState::Empty;
        }
        self.occupying_entity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupy_and_clear_keep_back_reference_consistent() {
        let mut plot = Plot::empty(PlotId(0));
        assert!(plot.is_empty());

        plot.occupy(EntityInstanceId(3));
        assert_eq!(plot.state, PlotState::Occupied);
        assert_eq!(plot.occupying_entity, Some(EntityInstanceId(3)));

        plot.clear();
        assert!(plot.is_empty());
        assert_eq!(plot.occupying_entity, None);
    }

    #[test]
    fn clearing_a_locked_plot_keeps_it_locked() {
        let mut plot = Plot::locked(PlotId(5));
        plot.clear();
        assert_eq!(plot.state, PlotState::Locked);
    }
}
