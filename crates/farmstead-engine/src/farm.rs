//! The farm driver.
//!
//! [`Farm`] owns the [`GameState`], the catalog, the process [`Cadence`], the
//! [`EventJournal`] of the most recent operation and the registered
//! listeners. Every public operation follows the same shape:
//!
//! 1. The journal is cleared and tagged with the operation's [`Cause`].
//! 2. The engine function runs against the state.
//! 3. Listeners receive the journal entries.
//!
//! Live play calls [`Farm::tick`] with real elapsed time; a session that
//! resumes after an absence calls [`Farm::load_or_new`], which replays the
//! offline span exactly once. Both paths feed the same cadence, so a session
//! that mixes ticks and catch-ups ends on the same state as one that only
//! ticks.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use farmstead_engine::prelude::*;
//!
//! let mut farm = Farm::new_game(StaticCatalog::default(), 0);
//! assert_eq!(farm.gold(), 1000);
//!
//! let report = farm.tick(Duration::from_secs(4));
//! assert_eq!(report.entity_updates, 4);
//! assert_eq!(report.assignment_passes, 2);
//!
//! let mut store = MemoryStore::new();
//! farm.save(&mut store, 60).unwrap();
//!
//! let (farm, outcome) = Farm::load_or_new(&store, StaticCatalog::default(), 120);
//! assert!(matches!(outcome, LoadOutcome::Restored { .. }));
//! assert_eq!(farm.state().last_update_epoch, 120);
//! ```

use std::time::Duration;

use farmstead_journal::event::Cause;
use farmstead_journal::journal::EventJournal;
use farmstead_journal::listener::{FarmListener, ListenerId, Listeners};
use farmstead_state::catalog::Catalog;
use farmstead_state::entity::EntityInstance;
use farmstead_state::ids::{EntityInstanceId, EntityKindId, ItemId, PlotId, WorkerId};
use farmstead_state::plot::Plot;
use farmstead_state::state::GameState;
use farmstead_state::worker::WorkerInstance;
use farmstead_state::FarmError;

use crate::audit::{self, Repair};
use crate::catch_up::{self, AdvanceReport};
use crate::economy;
use crate::harvest::{self, Harvest};
use crate::placement;
use crate::planting::{self, Planting};
use crate::scheduler::{self, Assignment};
use crate::snapshot;
use crate::store::{Store, StoreError};
use crate::timeline::Cadence;

/// Fastest allowed live speed. One real second replays at most this many
/// simulated seconds.
pub const MAX_GAME_SPEED: f64 = 100.0;

// ---------------------------------------------------------------------------
// LoadOutcome
// ---------------------------------------------------------------------------

/// How [`Farm::load_or_new`] obtained its state.
#[derive(Debug)]
pub enum LoadOutcome {
    /// A saved game was loaded, repaired and caught up.
    Restored {
        report: AdvanceReport,
        repairs: Vec<Repair>,
    },
    /// Nothing was saved; a new game was started.
    Fresh,
    /// The save could not be loaded; a new game was started instead.
    Recovered { error: StoreError },
}

// ---------------------------------------------------------------------------
// Farm
// ---------------------------------------------------------------------------

/// Single owner of the simulation state.
pub struct Farm<C: Catalog> {
    state: GameState,
    catalog: C,
    cadence: Cadence,
    journal: EventJournal,
    listeners: Listeners,
    game_speed: f64,
}

impl<C: Catalog> std::fmt::Debug for Farm<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Farm")
            .field("state", &self.state)
            .field("cadence", &self.cadence)
            .field("journal_len", &self.journal.len())
            .field("listeners", &self.listeners)
            .field("game_speed", &self.game_speed)
            .finish()
    }
}

impl<C: Catalog> Farm<C> {
    /// Drive an existing state.
    pub fn with_state(state: GameState, catalog: C) -> Self {
        let cadence = Cadence::from_tunables(catalog.tunables());
        Self {
            state,
            catalog,
            cadence,
            journal: EventJournal::new(),
            listeners: Listeners::new(),
            game_speed: 1.0,
        }
    }

    /// Start a new game from the catalog's starting values.
    pub fn new_game(catalog: C, now: i64) -> Self {
        let state = GameState::new_game(catalog.tunables(), now);
        Self::with_state(state, catalog)
    }

    /// Load the saved game, repair it and replay the time since it was saved.
    ///
    /// A missing save starts a new game. A save that cannot be loaded is
    /// logged and also starts a new game; the error is returned in the
    /// outcome so the host can tell the player.
    pub fn load_or_new(store: &dyn Store, catalog: C, now: i64) -> (Self, LoadOutcome) {
        let state = match store.load_state() {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::info!(now, "no save found, starting a new game");
                return (Self::new_game(catalog, now), LoadOutcome::Fresh);
            }
            Err(error) => {
                tracing::warn!(error = %error, "save could not be loaded, starting a new game");
                return (
                    Self::new_game(catalog, now),
                    LoadOutcome::Recovered { error },
                );
            }
        };

        let elapsed = now.saturating_sub(state.last_update_epoch);
        let mut farm = Self::with_state(state, catalog);

        farm.begin(Cause::Repair);
        let repairs = audit::audit_plots(&mut farm.state, &mut farm.journal);

        // The audit's entries stay in the journal alongside the catch-up.
        farm.journal.set_cause(Cause::CatchUp);
        let report = catch_up::advance(
            &mut farm.state,
            &farm.catalog,
            &mut farm.cadence,
            catch_up::elapsed_span(elapsed),
            &mut farm.journal,
        );
        farm.state.stamp_epoch(now);
        farm.finish();

        tracing::info!(
            elapsed_secs = elapsed,
            repairs = repairs.len(),
            events = report.events_processed,
            "game loaded"
        );
        (farm, LoadOutcome::Restored { report, repairs })
    }

    /// Stamp `now` on the state and write it to `store`.
    ///
    /// On failure the state keeps its previous epoch, so the unsaved span is
    /// still replayed on the next load.
    pub fn save(&mut self, store: &mut dyn Store, now: i64) -> Result<(), StoreError> {
        let mut stamped = self.state.clone();
        stamped.stamp_epoch(now);
        store.save_state(&stamped)?;
        self.state = stamped;
        tracing::info!(now, "game saved");
        Ok(())
    }

    // -- Operation plumbing -------------------------------------------------

    fn begin(&mut self, cause: Cause) {
        self.journal.clear();
        self.journal.set_cause(cause);
    }

    fn finish(&mut self) {
        self.listeners.notify(&self.journal);
    }

    fn act<T>(
        &mut self,
        cause: Cause,
        op: impl FnOnce(&mut GameState, &dyn Catalog, &mut EventJournal) -> T,
    ) -> T {
        self.begin(cause);
        let catalog: &dyn Catalog = &self.catalog;
        let result = op(&mut self.state, catalog, &mut self.journal);
        self.finish();
        result
    }

    // -- Time ---------------------------------------------------------------

    /// Advance live play by `dt` of real time, scaled by the game speed.
    pub fn tick(&mut self, dt: Duration) -> AdvanceReport {
        let span = if self.game_speed == 1.0 {
            dt
        } else {
            Duration::try_from_secs_f64(dt.as_secs_f64() * self.game_speed)
                .unwrap_or(Duration::MAX)
        };
        self.begin(Cause::Tick);
        let report = catch_up::advance(
            &mut self.state,
            &self.catalog,
            &mut self.cadence,
            span,
            &mut self.journal,
        );
        self.finish();
        report
    }

    /// Replay `elapsed_seconds` of offline time. Never scaled by game speed.
    ///
    /// Non-positive values are a no-op. Replaying the same absence twice
    /// applies it twice.
    pub fn catch_up(&mut self, elapsed_seconds: i64) -> AdvanceReport {
        self.begin(Cause::CatchUp);
        let report = catch_up::advance(
            &mut self.state,
            &self.catalog,
            &mut self.cadence,
            catch_up::elapsed_span(elapsed_seconds),
            &mut self.journal,
        );
        self.finish();
        if !report.is_empty() {
            tracing::info!(
                elapsed_secs = elapsed_seconds,
                events = report.events_processed,
                tasks_completed = report.tasks_completed,
                "catch-up finished"
            );
        }
        report
    }

    pub fn game_speed(&self) -> f64 {
        self.game_speed
    }

    /// Scale subsequent ticks. Zero pauses live play.
    ///
    /// # Errors
    ///
    /// [`FarmError::InvalidGameSpeed`] unless `0.0 <= speed <= MAX_GAME_SPEED`.
    pub fn set_game_speed(&mut self, speed: f64) -> Result<(), FarmError> {
        if !(0.0..=MAX_GAME_SPEED).contains(&speed) {
            return Err(FarmError::InvalidGameSpeed(speed));
        }
        self.game_speed = speed;
        Ok(())
    }

    // -- Player actions -----------------------------------------------------

    /// Plant `item` on the empty `plot`.
    pub fn plant(&mut self, plot: PlotId, item: &ItemId) -> Result<Planting, FarmError> {
        self.act(Cause::Player, |s, c, j| planting::plant(s, c, plot, item, j))
    }

    /// Place one entity of `kind`, at `position` or the next free slot.
    pub fn place_entity(
        &mut self,
        plot: PlotId,
        kind: &EntityKindId,
        position: Option<u32>,
    ) -> Result<EntityInstanceId, FarmError> {
        self.act(Cause::Player, |s, c, j| {
            placement::place_entity(s, c, plot, kind, position, j)
        })
    }

    /// Remove the entity at `position` on `plot`.
    pub fn remove_entity(
        &mut self,
        plot: PlotId,
        position: u32,
    ) -> Result<EntityInstanceId, FarmError> {
        self.act(Cause::Player, |s, _, j| {
            placement::remove_entity_at(s, plot, position, j)
        })
    }

    /// Harvest `plot` by hand.
    pub fn harvest_plot(&mut self, plot: PlotId) -> Result<Harvest, FarmError> {
        self.act(Cause::Player, |s, c, j| harvest::harvest_plot(s, c, plot, j))
    }

    /// Send an idle worker to `plot`.
    pub fn assign_worker(&mut self, plot: PlotId) -> Result<Assignment, FarmError> {
        self.act(Cause::Player, |s, c, j| scheduler::assign_worker(s, c, plot, j))
    }

    /// Send an idle worker to plant `item` on `plot`.
    pub fn assign_worker_to_plant(
        &mut self,
        plot: PlotId,
        item: &ItemId,
    ) -> Result<Assignment, FarmError> {
        self.act(Cause::Player, |s, c, j| {
            scheduler::assign_worker_to_plant(s, c, plot, item, j)
        })
    }

    /// Cancel a worker's task. Returns `false` when it was already idle.
    pub fn cancel_worker(&mut self, worker: WorkerId) -> Result<bool, FarmError> {
        self.act(Cause::Player, |s, _, j| scheduler::cancel_worker(s, worker, j))
    }

    pub fn sell_item(&mut self, item: &ItemId, amount: u64) -> Result<u64, FarmError> {
        self.act(Cause::Player, |s, c, j| economy::sell_item(s, c, item, amount, j))
    }

    pub fn buy_item(&mut self, item: &ItemId, packs: u64) -> Result<u64, FarmError> {
        self.act(Cause::Player, |s, c, j| economy::buy_item(s, c, item, packs, j))
    }

    pub fn hire_worker(&mut self) -> Result<WorkerId, FarmError> {
        self.act(Cause::Player, economy::hire_worker)
    }

    pub fn buy_plot(&mut self) -> Result<PlotId, FarmError> {
        self.act(Cause::Player, economy::buy_plot)
    }

    pub fn upgrade_equipment(&mut self) -> Result<u32, FarmError> {
        self.act(Cause::Player, economy::upgrade_equipment)
    }

    /// Run the consistency audit now.
    pub fn audit(&mut self) -> Vec<Repair> {
        self.act(Cause::Repair, |s, _, j| audit::audit_plots(s, j))
    }

    // -- Listeners ----------------------------------------------------------

    pub fn add_listener(&mut self, listener: impl FarmListener + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    // -- Queries ------------------------------------------------------------

    pub fn plot(&self, plot: PlotId) -> Option<&Plot> {
        self.state.plot(plot)
    }

    pub fn plots(&self) -> impl Iterator<Item = &Plot> {
        self.state.plots()
    }

    pub fn entities_on_plot(&self, plot: PlotId) -> impl Iterator<Item = &EntityInstance> {
        self.state.entities_on_plot(plot)
    }

    pub fn entity(&self, entity: EntityInstanceId) -> Option<&EntityInstance> {
        self.state.entity(entity)
    }

    pub fn worker(&self, worker: WorkerId) -> Option<&WorkerInstance> {
        self.state.worker(worker)
    }

    pub fn workers(&self) -> impl Iterator<Item = &WorkerInstance> {
        self.state.workers()
    }

    pub fn inventory_count(&self, item: &ItemId) -> u64 {
        self.state.inventory.count(item)
    }

    pub fn gold(&self) -> u64 {
        self.state.player.gold
    }

    pub fn equipment_level(&self) -> u32 {
        self.state.player.equipment_level
    }

    pub fn has_won(&self) -> bool {
        economy::has_won(&self.state, self.catalog.tunables())
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    /// Entries recorded by the most recent operation.
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    /// BLAKE3 hex digest of the current state.
    pub fn state_hash(&self) -> Result<String, serde_json::Error> {
        snapshot::state_hash(&self.state)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
