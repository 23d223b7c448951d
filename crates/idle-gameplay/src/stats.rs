//! Effective combat stats.
//!
//! This module provides:
//! - `CombatStats`, the aggregated stat sheet of a character
//! - Aggregation of class base values, equipment and rolled bonuses
//! - Derived-stat formulas for strength, agility and intelligence

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::character::Character;
use crate::loot::StatKind;

/// Damage per point of strength.
pub const DAMAGE_PER_STRENGTH: i64 = 1;

/// Dodge and crit chance per point of agility.
pub const EVASION_PER_AGILITY: f64 = 0.5;

/// Crit damage per point of intelligence.
pub const CRIT_DAMAGE_PER_INTELLIGENCE: f64 = 2.0;

/// Aggregated stat sheet of a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatStats {
    /// Damage per hit before defense.
    pub damage: i64,
    /// Flat defense.
    pub defense: i64,
    /// Bonus maximum HP on top of the class base.
    pub max_health: i64,
    /// Strength.
    pub strength: i64,
    /// Agility.
    pub agility: i64,
    /// Intelligence.
    pub intelligence: i64,
    /// Dodge chance in percent.
    pub dodge: i64,
    /// Crit chance in percent.
    pub crit_chance: i64,
    /// Crit bonus damage in percent.
    pub crit_damage: i64,
    /// Heal per landed hit.
    pub life_on_hit: i64,
    /// Block chance in percent.
    pub block: i64,
}

impl CombatStats {
    /// Adds a rolled bonus stat.
    pub fn add(&mut self, stat: StatKind, value: i64) {
        let field = match stat {
            StatKind::Strength => &mut self.strength,
            StatKind::Agility => &mut self.agility,
            StatKind::Intelligence => &mut self.intelligence,
            StatKind::MaxHealth => &mut self.max_health,
            StatKind::Dodge => &mut self.dodge,
            StatKind::CritChance => &mut self.crit_chance,
            StatKind::CritDamage => &mut self.crit_damage,
            StatKind::LifeOnHit => &mut self.life_on_hit,
            StatKind::Block => &mut self.block,
        };
        *field += value;
    }

    fn apply_derived(&mut self) {
        self.damage += self.strength * DAMAGE_PER_STRENGTH;
        let evasion = (self.agility as f64 * EVASION_PER_AGILITY).floor() as i64;
        self.dodge += evasion;
        self.crit_chance += evasion;
        self.crit_damage += (self.intelligence as f64 * CRIT_DAMAGE_PER_INTELLIGENCE).floor() as i64;
    }
}

/// Computes the effective stats of a character from class and equipment.
#[must_use]
pub fn compute_stats(character: &Character, catalog: &Catalog) -> CombatStats {
    let mut stats = CombatStats {
        damage: catalog
            .class_base(character.class)
            .map_or(0, |c| c.base_damage),
        ..CombatStats::default()
    };

    for (_, item) in character.equipment.equipped() {
        let Some(base) = catalog.equipment_base(&item.kind) else {
            continue;
        };
        let multiplier = catalog.rarity_multiplier(item.rarity);
        stats.damage += (base.damage as f64 * multiplier).ceil() as i64;
        stats.defense += (base.defense as f64 * multiplier).ceil() as i64;

        for (&stat, &value) in item.stats.iter().flatten() {
            stats.add(stat, value);
        }
    }

    stats.apply_derived();
    stats
}

/// Maximum HP: class base plus aggregated max-health bonuses.
#[must_use]
pub fn max_hp(character: &Character, catalog: &Catalog) -> i64 {
    let base = catalog.class_base(character.class).map_or(0, |c| c.base_hp);
    base + compute_stats(character, catalog).max_health
}
