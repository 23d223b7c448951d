//! Loot resolution.
//!
//! This module provides:
//! - Rarity grades and bonus stat kinds
//! - Weighted rarity rolls
//! - Stat-block generation for equipment
//! - Item instance creation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

use crate::catalog::{Catalog, ItemKind, RarityTier};
use crate::equipment::EquipmentSlot;
use crate::inventory::ItemInstance;

/// Quality grade of an item instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rarity {
    /// Base tier
    Common,
    /// Tier 2
    Uncommon,
    /// Tier 3
    Rare,
    /// Tier 4
    Epic,
    /// Tier 5
    Legendary,
}

impl Rarity {
    /// Display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Bonus stats that equipment can roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    /// +1 damage per point
    Strength,
    /// Half a point of dodge and crit chance per point
    Agility,
    /// Two points of crit damage per point
    Intelligence,
    /// Flat maximum HP
    MaxHealth,
    /// Percent chance to avoid an enemy attack
    Dodge,
    /// Percent chance to crit
    CritChance,
    /// Percent bonus damage on crit
    CritDamage,
    /// Flat heal per landed hit
    LifeOnHit,
    /// Percent chance to halve an enemy hit
    Block,
}

/// Rolled bonus stats, keyed by stat.
pub type StatBlock = BTreeMap<StatKind, i64>;

/// Random source for everything loot related.
#[derive(Debug, Clone)]
pub struct LootResolver {
    rng: fastrand::Rng,
}

impl Default for LootResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LootResolver {
    /// Creates a resolver seeded from the OS.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Creates a deterministic resolver.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Picks a tier with probability proportional to its weight.
    ///
    /// Falls back to the first (lowest) tier if floating-point rounding
    /// walks off the end of the table.
    pub fn roll_rarity(&mut self, tiers: &[RarityTier]) -> Rarity {
        let fallback = tiers.first().map_or(Rarity::Common, |t| t.rarity);
        let total: f64 = tiers.iter().map(|t| t.weight.max(0.0)).sum();
        if total <= 0.0 {
            return fallback;
        }

        let mut roll = self.rng.f64() * total;
        for tier in tiers {
            let weight = tier.weight.max(0.0);
            if roll < weight {
                return tier.rarity;
            }
            roll -= weight;
        }
        fallback
    }

    /// Rolls bonus stats for equipment in `slot` at `rarity`.
    ///
    /// Returns `None` when the rarity grants no stats or the slot has no pool.
    /// Stats are drawn without replacement; a pool smaller than the count is
    /// taken whole.
    pub fn generate_stats(
        &mut self,
        catalog: &Catalog,
        slot: EquipmentSlot,
        rarity: Rarity,
    ) -> Option<StatBlock> {
        let count = catalog.stat_count(rarity) as usize;
        if count == 0 {
            return None;
        }

        let mut available = catalog.stat_pool(slot).to_vec();
        let mut block = StatBlock::new();
        while block.len() < count && !available.is_empty() {
            let range = available.swap_remove(self.rng.usize(..available.len()));
            let value = self.rng.i64(range.min..=range.max);
            *block.entry(range.stat).or_insert(0) += value;
        }

        if block.is_empty() {
            None
        } else {
            Some(block)
        }
    }

    /// Creates a fresh item instance.
    ///
    /// Gathered resources are always base tier. Otherwise an unspecified
    /// rarity is rolled; equipment above base tier gets a stat block.
    pub fn create_item(
        &mut self,
        catalog: &Catalog,
        kind: &ItemKind,
        rarity: Option<Rarity>,
    ) -> ItemInstance {
        let rarity = if catalog.is_gathered_resource(kind) {
            catalog.base_rarity()
        } else {
            rarity.unwrap_or_else(|| self.roll_rarity(&catalog.rarities))
        };

        let stats = match catalog.equipment_slot(kind) {
            Some(slot) if rarity != catalog.base_rarity() => {
                self.generate_stats(catalog, slot, rarity)
            }
            _ => None,
        };

        trace!("Created {} ({}) stats={:?}", kind, rarity, stats);
        ItemInstance::new(kind.clone(), rarity, stats)
    }
}
