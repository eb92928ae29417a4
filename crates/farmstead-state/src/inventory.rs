//! Item counts held by the player.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;
use crate::FarmError;

/// Mapping from item kind to a non-negative count.
///
/// Items whose count drops to zero are removed from the map, so iteration
/// only ever visits items the player actually holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: BTreeMap<ItemId, u64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count held of `item`, zero when absent.
    pub fn count(&self, item: &ItemId) -> u64 {
        self.items.get(item).copied().unwrap_or(0)
    }

    pub fn has(&self, item: &ItemId, amount: u64) -> bool {
        self.count(item) >= amount
    }

    /// Add `amount` of `item`. Adding zero is a no-op.
    pub fn add(&mut self, item: &ItemId, amount: u64) {
        if amount == 0 {
            return;
        }
        let slot = self.items.entry(item.clone()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Remove `amount` of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::InsufficientInventory`] and leaves the inventory
    /// untouched when fewer than `amount` are held.
    pub fn remove(&mut self, item: &ItemId, amount: u64) -> Result<(), FarmError> {
        let held = self.count(item);
        if held < amount {
            return Err(FarmError::InsufficientInventory {
                item: item.clone(),
                required: amount,
                available: held,
            });
        }
        if held == amount {
            self.items.remove(item);
        } else if let Some(slot) = self.items.get_mut(item) {
            *slot = held - amount;
        }
        Ok(())
    }

    /// Iterate held items in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, u64)> {
        self.items.iter().map(|(id, count)| (id, *count))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<(ItemId, u64)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (ItemId, u64)>>(iter: T) -> Self {
        let mut inventory = Inventory::new();
        for (item, count) in iter {
            inventory.add(&item, count);
        }
        inventory
    }
}
