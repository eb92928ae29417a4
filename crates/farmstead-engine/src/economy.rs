//! Gold, trading and farm upgrades.
//!
//! Every action validates the catalog entry, the amount and the player's
//! balance before touching the state, so an `Err` leaves gold, inventory,
//! plots and workers unchanged.

use farmstead_journal::event::FarmEvent;
use farmstead_journal::journal::EventJournal;
use farmstead_state::catalog::{Catalog, Tunables};
use farmstead_state::ids::{ItemId, PlotId, WorkerId};
use farmstead_state::state::GameState;
use farmstead_state::FarmError;

fn to_delta(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

fn debit(state: &mut GameState, cost: u64, journal: &mut EventJournal) -> Result<(), FarmError> {
    let available = state.player.gold;
    if available < cost {
        return Err(FarmError::InsufficientGold {
            required: cost,
            available,
        });
    }
    state.player.gold = available - cost;
    if cost > 0 {
        journal.record(FarmEvent::GoldChanged {
            delta: -to_delta(cost),
            balance: state.player.gold,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Trading
// ---------------------------------------------------------------------------

/// Sell `amount` units of `item` at its sale price. Returns the gold earned.
pub fn sell_item(
    state: &mut GameState,
    catalog: &dyn Catalog,
    item: &ItemId,
    amount: u64,
    journal: &mut EventJournal,
) -> Result<u64, FarmError> {
    if amount == 0 {
        return Err(FarmError::InvalidAmount);
    }
    let def = catalog
        .item_kind(item)
        .ok_or_else(|| FarmError::UnknownItem(item.clone()))?;
    let earned = def.sale_price.saturating_mul(amount);

    state.inventory.remove(item, amount)?;
    journal.record(FarmEvent::ItemsRemoved {
        item: item.clone(),
        amount,
    });

    let player = &mut state.player;
    player.gold = player.gold.saturating_add(earned);
    player.earned_gold_total = player.earned_gold_total.saturating_add(earned);
    if earned > 0 {
        journal.record(FarmEvent::GoldChanged {
            delta: to_delta(earned),
            balance: player.gold,
        });
    }
    tracing::debug!(item = %item, amount, earned, "items sold");
    Ok(earned)
}

/// Buy `packs` packs of `item`. Returns the number of units received.
pub fn buy_item(
    state: &mut GameState,
    catalog: &dyn Catalog,
    item: &ItemId,
    packs: u64,
    journal: &mut EventJournal,
) -> Result<u64, FarmError> {
    if packs == 0 {
        return Err(FarmError::InvalidAmount);
    }
    let def = catalog
        .item_kind(item)
        .ok_or_else(|| FarmError::UnknownItem(item.clone()))?;
    let price = def
        .purchase_price
        .ok_or_else(|| FarmError::NotForSale(item.clone()))?;
    let cost = price.saturating_mul(packs);
    let units = u64::from(def.pack_size).saturating_mul(packs);

    debit(state, cost, journal)?;
    state.inventory.add(item, units);
    journal.record(FarmEvent::ItemsAdded {
        item: item.clone(),
        amount: units,
    });
    tracing::debug!(item = %item, packs, units, cost, "items bought");
    Ok(units)
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// Hire one more worker at the configured cost.
pub fn hire_worker(
    state: &mut GameState,
    catalog: &dyn Catalog,
    journal: &mut EventJournal,
) -> Result<WorkerId, FarmError> {
    debit(state, catalog.tunables().costs.hire_worker, journal)?;
    let worker = state.add_worker();
    journal.record(FarmEvent::WorkerHired { worker });
    tracing::debug!(worker = %worker, "worker hired");
    Ok(worker)
}

/// Buy one more empty plot at the configured cost.
pub fn buy_plot(
    state: &mut GameState,
    catalog: &dyn Catalog,
    journal: &mut EventJournal,
) -> Result<PlotId, FarmError> {
    debit(state, catalog.tunables().costs.buy_plot, journal)?;
    let plot = state.add_plot();
    journal.record(FarmEvent::PlotAdded { plot });
    tracing::debug!(plot = %plot, "plot bought");
    Ok(plot)
}

/// Raise the equipment level by one. Returns the new level.
pub fn upgrade_equipment(
    state: &mut GameState,
    catalog: &dyn Catalog,
    journal: &mut EventJournal,
) -> Result<u32, FarmError> {
    debit(state, catalog.tunables().costs.upgrade_equipment, journal)?;
    let player = &mut state.player;
    player.equipment_level = player.equipment_level.saturating_add(1);
    journal.record(FarmEvent::EquipmentUpgraded {
        level: player.equipment_level,
    });
    tracing::debug!(level = player.equipment_level, "equipment upgraded");
    Ok(player.equipment_level)
}

/// Lifetime earnings have reached the win threshold.
pub fn has_won(state: &GameState, tunables: &Tunables) -> bool {
    state.player.earned_gold_total >= tunables.win_condition_gold
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use farmstead_state::catalog::{ItemKindDef, StaticCatalog};

    fn catalog() -> StaticCatalog {
        StaticCatalog::new(
            Vec::new(),
            vec![
                ItemKindDef {
                    id: "milk".into(),
                    name: String::new(),
                    sale_price: 15,
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
                    grows_into: None,
                },
            ],
            Tunables::default(),
        )
        .unwrap()
    }

    fn state() -> GameState {
        GameState::new_game(&Tunables::default(), 0)
    }

    // -- 1. Trading --

    #[test]
    fn selling_credits_gold_and_lifetime_earnings() {
        let catalog = catalog();
        let mut state = state();
        state.inventory.add(&"milk".into(), 4);
        let mut journal = EventJournal::new();

        let earned = sell_item(&mut state, &catalog, &"milk".into(), 3, &mut journal).unwrap();
        assert_eq!(earned, 45);
        assert_eq!(state.player.gold, 1045);
        assert_eq!(state.player.earned_gold_total, 45);
        assert_eq!(state.inventory.count(&"milk".into()), 1);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn selling_more_than_held_changes_nothing() {
        let catalog = catalog();
        let mut state = state();
        state.inventory.add(&"milk".into(), 2);
        let before = state.clone();
        let mut journal = EventJournal::new();

        let err = sell_item(&mut state, &catalog, &"milk".into(), 3, &mut journal).unwrap_err();
        assert!(matches!(err, FarmError::InsufficientInventory { required: 3, available: 2, .. }));
        assert_eq!(state, before);
        assert_eq!(
            sell_item(&mut state, &catalog, &"milk".into(), 0, &mut journal),
            Err(FarmError::InvalidAmount)
        );
    }

    #[test]
    fn buying_packs_debits_gold() {
        let catalog = catalog();
        let mut state = state();
        let mut journal = EventJournal::new();

        let units = buy_item(&mut state, &catalog, &"strawberry_seed".into(), 2, &mut journal).unwrap();
        assert_eq!(units, 20);
        assert_eq!(state.player.gold, 920);
        assert_eq!(state.inventory.count(&"strawberry_seed".into()), 20);
        assert_eq!(state.player.earned_gold_total, 0);
    }

    #[test]
    fn products_without_price_are_not_for_sale() {
        let catalog = catalog();
        let mut state = state();
        let mut journal = EventJournal::new();
        assert_eq!(
            buy_item(&mut state, &catalog, &"milk".into(), 1, &mut journal),
            Err(FarmError::NotForSale("milk".into()))
        );
        assert_eq!(
            buy_item(&mut state, &catalog, &"gold".into(), 1, &mut journal),
            Err(FarmError::UnknownItem("gold".into()))
        );
    }

    // -- 2. Upgrades --

    #[test]
    fn upgrades_cost_gold_until_it_runs_out() {
        let catalog = catalog();
        let mut state = state();
        let mut journal = EventJournal::new();

        let worker = hire_worker(&mut state, &catalog, &mut journal).unwrap();
        assert_eq!(worker, WorkerId(1));
        let plot = buy_plot(&mut state, &catalog, &mut journal).unwrap();
        assert_eq!(plot, PlotId(3));
        assert!(state.plot(plot).unwrap().is_empty());
        assert_eq!(state.player.gold, 0);

        let before = state.clone();
        assert_eq!(
            upgrade_equipment(&mut state, &catalog, &mut journal),
            Err(FarmError::InsufficientGold {
                required: 500,
                available: 0
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn equipment_level_goes_up_by_one() {
        let catalog = catalog();
        let mut state = state();
        let mut journal = EventJournal::new();
        assert_eq!(upgrade_equipment(&mut state, &catalog, &mut journal), Ok(2));
        assert_eq!(state.player.equipment_level, 2);
    }

    #[test]
    fn win_condition_uses_lifetime_earnings() {
        let tunables = Tunables {
            win_condition_gold: 100,
            ..Tunables::default()
        };
        let mut state = state();
        assert!(!has_won(&state, &tunables));
        state.player.earned_gold_total = 100;
        state.player.gold = 0;
        assert!(has_won(&state, &tunables));
    }
}
