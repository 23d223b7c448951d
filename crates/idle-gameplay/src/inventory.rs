//! Inventory system.
//!
//! A character's inventory is an ordered list of item instances. Same-kind
//! instances keep insertion order so that "remove first" is deterministic.

use std::collections::BTreeMap;

use idle_common::InstanceId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, Ingredient, ItemKind};
use crate::loot::{LootResolver, Rarity, StatBlock, StatKind};

/// Inventory error types.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Not enough items
    #[error("Not enough {item}: need {needed}, have {have}")]
    NotEnough {
        /// Item kind
        item: ItemKind,
        /// Amount needed
        needed: u32,
        /// Amount available
        have: u32,
    },
    /// No instance of the kind
    #[error("No {0} in inventory")]
    KindNotFound(ItemKind),
    /// No instance with the id
    #[error("Item instance {0} not in inventory")]
    InstanceNotFound(InstanceId),
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// A single owned item.
///
/// Rarity and stats never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInstance {
    /// Item kind
    #[serde(rename = "id")]
    pub kind: ItemKind,
    /// Quality grade
    pub rarity: Rarity,
    /// Process-unique id
    pub instance_id: InstanceId,
    /// Rolled bonus stats (equipment above base tier only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatBlock>,
}

impl ItemInstance {
    /// Creates an instance with a fresh id.
    #[must_use]
    pub fn new(kind: ItemKind, rarity: Rarity, stats: Option<StatBlock>) -> Self {
        Self {
            kind,
            rarity,
            instance_id: InstanceId::new(),
            stats,
        }
    }

    /// Rolled value of a bonus stat, zero when absent.
    #[must_use]
    pub fn stat(&self, stat: StatKind) -> i64 {
        self.stats
            .as_ref()
            .and_then(|s| s.get(&stat).copied())
            .unwrap_or(0)
    }
}

/// An inventory container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<ItemInstance>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory holding the given instances in order.
    #[must_use]
    pub fn from_items(items: Vec<ItemInstance>) -> Self {
        Self { items }
    }

    /// Creates a new instance of `kind` and appends it.
    ///
    /// An unspecified rarity is rolled by the resolver.
    pub fn add(
        &mut self,
        catalog: &Catalog,
        loot: &mut LootResolver,
        kind: &ItemKind,
        rarity: Option<Rarity>,
    ) -> &ItemInstance {
        let item = loot.create_item(catalog, kind, rarity);
        self.push(item)
    }

    /// Appends an existing instance (ownership moves in).
    pub fn push(&mut self, item: ItemInstance) -> &ItemInstance {
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    /// Removes and returns the first instance of `kind`.
    pub fn remove_first(&mut self, kind: &ItemKind) -> InventoryResult<ItemInstance> {
        let index = self
            .items
            .iter()
            .position(|item| &item.kind == kind)
            .ok_or_else(|| InventoryError::KindNotFound(kind.clone()))?;
        Ok(self.items.remove(index))
    }

    /// Removes and returns a specific instance.
    pub fn remove_instance(&mut self, id: InstanceId) -> InventoryResult<ItemInstance> {
        let index = self
            .items
            .iter()
            .position(|item| item.instance_id == id)
            .ok_or(InventoryError::InstanceNotFound(id))?;
        Ok(self.items.remove(index))
    }

    /// Looks up a specific instance.
    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&ItemInstance> {
        self.items.iter().find(|item| item.instance_id == id)
    }

    /// Number of instances of `kind`.
    #[must_use]
    pub fn count(&self, kind: &ItemKind) -> u32 {
        self.items.iter().filter(|item| &item.kind == kind).count() as u32
    }

    /// Checks if the inventory holds at least `n` of `kind`.
    #[must_use]
    pub fn has_at_least(&self, kind: &ItemKind, n: u32) -> bool {
        self.count(kind) >= n
    }

    /// How many times the ingredient list can be paid in full.
    ///
    /// An empty ingredient list is unbounded.
    #[must_use]
    pub fn max_affordable(&self, ingredients: &[Ingredient]) -> u32 {
        per_kind(ingredients)
            .into_iter()
            .map(|(item, quantity)| self.count(item) / quantity.max(1))
            .min()
            .unwrap_or(u32::MAX)
    }

    /// Removes `times` full sets of ingredients, or nothing at all.
    ///
    /// Repeated entries for one kind are summed before checking.
    pub fn consume(&mut self, ingredients: &[Ingredient], times: u32) -> InventoryResult<()> {
        let totals = per_kind(ingredients);
        for (&item, &quantity) in &totals {
            let needed = quantity.saturating_mul(times);
            let have = self.count(item);
            if have < needed {
                return Err(InventoryError::NotEnough {
                    item: item.clone(),
                    needed,
                    have,
                });
            }
        }
        for (item, quantity) in totals {
            for _ in 0..quantity.saturating_mul(times) {
                self.remove_first(item)?;
            }
        }
        Ok(())
    }

    /// Number of instances held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the inventory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates instances in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemInstance> + '_ {
        self.items.iter()
    }
}

/// Total quantity per kind across an ingredient list.
fn per_kind(ingredients: &[Ingredient]) -> BTreeMap<&ItemKind, u32> {
    let mut totals = BTreeMap::new();
    for ingredient in ingredients {
        let total: &mut u32 = totals.entry(&ingredient.item).or_default();
        *total = total.saturating_add(ingredient.quantity);
    }
    totals
}
