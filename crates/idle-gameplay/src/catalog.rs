//! Static game data.
//!
//! This module provides:
//! - Item kind identifiers
//! - Gathering activities and processing recipes
//! - Rarity tiers, stat pools, equipment base stats
//! - Enemy archetypes and class base stats
//! - Validation for catalogs loaded from external files
//!
//! The catalog is read-only once constructed; every engine borrows it.

use idle_common::{seconds, Millis};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::character::CharacterClass;
use crate::equipment::EquipmentSlot;
use crate::loot::{Rarity, StatKind};
use crate::progression::SkillKind;

/// Sell value used when an item kind has none configured.
pub const DEFAULT_SELL_VALUE: u64 = 1;

/// Sell value used for equipment whose recipe has none configured.
pub const DEFAULT_EQUIPMENT_SELL_VALUE: u64 = 10;

// ============================================================================
// Errors
// ============================================================================

/// Catalog validation errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Activity with a zero-length cycle
    #[error("Activity {0} has zero duration")]
    ZeroDuration(ItemKind),
    /// Recipe ingredient with zero quantity
    #[error("Recipe {recipe} requires zero of {item}")]
    ZeroIngredient {
        /// Recipe identifier
        recipe: ItemKind,
        /// Ingredient with zero quantity
        item: ItemKind,
    },
    /// Recipe ingredient that nothing produces
    #[error("Recipe {recipe} requires unknown item {item}")]
    UnknownIngredient {
        /// Recipe identifier
        recipe: ItemKind,
        /// Unknown ingredient
        item: ItemKind,
    },
    /// Recipe listing one ingredient more than once
    #[error("Recipe {recipe} lists {item} more than once")]
    DuplicateIngredient {
        /// Recipe identifier
        recipe: ItemKind,
        /// Repeated ingredient
        item: ItemKind,
    },
    /// Same identifier registered twice
    #[error("Duplicate catalog id: {0}")]
    DuplicateId(ItemKind),
    /// Rarity table unusable
    #[error("Rarity table must be non-empty with positive total weight")]
    InvalidRarityTable,
    /// Stat range with min above max
    #[error("Stat {stat:?} range {min}..={max} is empty")]
    InvalidStatRange {
        /// Stat concerned
        stat: StatKind,
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },
    /// No enemy archetypes
    #[error("Catalog has no enemy archetypes")]
    NoEnemies,
    /// Missing class base stats
    #[error("Missing base stats for class {0:?}")]
    MissingClass(CharacterClass),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// ============================================================================
// Item kinds
// ============================================================================

/// Identifier of an item kind and of the activity that produces it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKind(String);

impl ItemKind {
    /// Creates an item kind from its catalog key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the catalog key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Activities
// ============================================================================

/// A looping gathering activity yielding one base-tier resource per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatheringActivity {
    /// Activity id; also the kind of the gathered resource
    pub id: ItemKind,
    /// Display name of the activity
    pub name: String,
    /// Display name of the resource
    pub resource_name: String,
    /// Skill trained
    pub skill: SkillKind,
    /// Cycle length in milliseconds
    pub duration_ms: Millis,
    /// XP per cycle
    pub xp: u64,
    /// Shop price per unit
    #[serde(default = "default_sell_value")]
    pub sell_value: u64,
}

/// One ingredient of a processing recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Item consumed
    pub item: ItemKind,
    /// Quantity consumed per cycle
    pub quantity: u32,
}

impl Ingredient {
    /// Creates a new ingredient requirement.
    #[must_use]
    pub fn new(item: impl Into<ItemKind>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
        }
    }
}

/// A crafting recipe run as a processing activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecipe {
    /// Recipe id; also the kind of the produced item
    pub id: ItemKind,
    /// Display name of the activity
    pub name: String,
    /// Display name of the product
    pub resource_name: String,
    /// Skill trained
    pub skill: SkillKind,
    /// Cycle length in milliseconds
    pub duration_ms: Millis,
    /// XP per produced unit
    pub xp: u64,
    /// Materials consumed per unit
    pub requires: Vec<Ingredient>,
    /// Slot the product equips into, if it is equipment
    #[serde(default)]
    pub equipment_slot: Option<EquipmentSlot>,
    /// Shop price of a base-tier unit
    #[serde(default)]
    pub sell_value: Option<u64>,
}

impl ProcessingRecipe {
    /// Creates a new recipe builder.
    #[must_use]
    pub fn builder(id: &str, name: &str, skill: SkillKind) -> RecipeBuilder {
        RecipeBuilder::new(id, name, skill)
    }

    /// Whether the product is equipment (and therefore rolls rarity).
    #[must_use]
    pub fn yields_equipment(&self) -> bool {
        self.equipment_slot.is_some()
    }
}

/// Builder for processing recipes.
#[derive(Debug)]
pub struct RecipeBuilder {
    recipe: ProcessingRecipe,
}

impl RecipeBuilder {
    fn new(id: &str, name: &str, skill: SkillKind) -> Self {
        Self {
            recipe: ProcessingRecipe {
                id: ItemKind::new(id),
                name: name.to_string(),
                resource_name: name.to_string(),
                skill,
                duration_ms: seconds(5),
                xp: 0,
                requires: Vec::new(),
                equipment_slot: None,
                sell_value: None,
            },
        }
    }

    /// Sets the product display name.
    #[must_use]
    pub fn product(mut self, name: &str) -> Self {
        self.recipe.resource_name = name.to_string();
        self
    }

    /// Sets the cycle length in seconds.
    #[must_use]
    pub const fn duration_secs(mut self, secs: u64) -> Self {
        self.recipe.duration_ms = seconds(secs);
        self
    }

    /// Sets the XP per cycle.
    #[must_use]
    pub const fn xp(mut self, xp: u64) -> Self {
        self.recipe.xp = xp;
        self
    }

    /// Adds an ingredient requirement.
    #[must_use]
    pub fn ingredient(mut self, item: &str, quantity: u32) -> Self {
        self.recipe.requires.push(Ingredient::new(item, quantity));
        self
    }

    /// Marks the product as equipment for a slot.
    #[must_use]
    pub const fn equipment(mut self, slot: EquipmentSlot) -> Self {
        self.recipe.equipment_slot = Some(slot);
        self
    }

    /// Sets the sell value.
    #[must_use]
    pub const fn sell_value(mut self, value: u64) -> Self {
        self.recipe.sell_value = Some(value);
        self
    }

    /// Builds the recipe.
    #[must_use]
    pub fn build(self) -> ProcessingRecipe {
        self.recipe
    }
}

// ============================================================================
// Items, rarity, enemies, classes
// ============================================================================

/// A rarity grade with its weight and value scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityTier {
    /// Grade
    pub rarity: Rarity,
    /// Display name
    pub name: String,
    /// Multiplier applied to base stats and sell value
    pub multiplier: f64,
    /// Relative drop weight
    pub weight: f64,
    /// Number of bonus stats rolled
    pub stat_count: u32,
}

/// Candidate bonus stat with its inclusive roll range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRange {
    /// Stat
    pub stat: StatKind,
    /// Lowest roll
    pub min: i64,
    /// Highest roll
    pub max: i64,
}

impl StatRange {
    const fn new(stat: StatKind, min: i64, max: i64) -> Self {
        Self { stat, min, max }
    }
}

/// Bonus stat candidates for one equipment slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatPool {
    /// Slot
    pub slot: EquipmentSlot,
    /// Candidates
    pub stats: Vec<StatRange>,
}

/// Base combat stats of an equipment item before rarity scaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentBase {
    /// Item kind
    pub item: ItemKind,
    /// Flat damage
    pub damage: i64,
    /// Flat defense
    pub defense: i64,
}

/// An enemy template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyArchetype {
    /// Display name
    pub name: String,
    /// HP scaling
    pub hp_multiplier: f64,
    /// Damage scaling
    pub damage_multiplier: f64,
    /// Defense scaling
    pub defense_multiplier: f64,
    /// Gold paid on defeat before the level bonus
    pub gold_reward: u64,
}

/// Base stats of a character class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBase {
    /// Class
    pub class: CharacterClass,
    /// Display name
    pub name: String,
    /// Base maximum HP
    pub base_hp: i64,
    /// Base damage
    pub base_damage: i64,
}

fn default_sell_value() -> u64 {
    DEFAULT_SELL_VALUE
}

// ============================================================================
// Catalog
// ============================================================================

/// All static game data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Class base stats
    pub classes: Vec<ClassBase>,
    /// Rarity tiers, lowest (base) tier first
    pub rarities: Vec<RarityTier>,
    /// Bonus stat pools per slot
    pub stat_pools: Vec<StatPool>,
    /// Base stats of equippable items
    pub equipment: Vec<EquipmentBase>,
    /// Enemy archetypes, weakest first
    pub enemies: Vec<EnemyArchetype>,
    /// Gathering activities
    pub gathering: Vec<GatheringActivity>,
    /// Processing recipes
    pub processing: Vec<ProcessingRecipe>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// Looks up a gathering activity.
    #[must_use]
    pub fn gathering(&self, id: &ItemKind) -> Option<&GatheringActivity> {
        self.gathering.iter().find(|a| &a.id == id)
    }

    /// Looks up a processing recipe.
    #[must_use]
    pub fn recipe(&self, id: &ItemKind) -> Option<&ProcessingRecipe> {
        self.processing.iter().find(|r| &r.id == id)
    }

    /// Whether an item kind is a raw gathered resource.
    #[must_use]
    pub fn is_gathered_resource(&self, kind: &ItemKind) -> bool {
        self.gathering(kind).is_some()
    }

    /// Slot an item kind equips into, if any.
    #[must_use]
    pub fn equipment_slot(&self, kind: &ItemKind) -> Option<EquipmentSlot> {
        self.recipe(kind).and_then(|r| r.equipment_slot)
    }

    /// Base combat stats of an equipment item kind.
    #[must_use]
    pub fn equipment_base(&self, kind: &ItemKind) -> Option<&EquipmentBase> {
        self.equipment.iter().find(|e| &e.item == kind)
    }

    /// Configured sell value of an item kind, if it is known at all.
    #[must_use]
    pub fn sell_value(&self, kind: &ItemKind) -> Option<u64> {
        if let Some(activity) = self.gathering(kind) {
            return Some(activity.sell_value);
        }
        self.recipe(kind)
            .map(|r| r.sell_value.unwrap_or(DEFAULT_SELL_VALUE))
    }

    /// The lowest rarity tier.
    #[must_use]
    pub fn base_rarity(&self) -> Rarity {
        self.rarities.first().map_or(Rarity::Common, |t| t.rarity)
    }

    /// Looks up a rarity tier.
    #[must_use]
    pub fn rarity_tier(&self, rarity: Rarity) -> Option<&RarityTier> {
        self.rarities.iter().find(|t| t.rarity == rarity)
    }

    /// Numeric multiplier of a rarity (1.0 when unknown).
    #[must_use]
    pub fn rarity_multiplier(&self, rarity: Rarity) -> f64 {
        self.rarity_tier(rarity).map_or(1.0, |t| t.multiplier)
    }

    /// Number of bonus stats a rarity rolls (0 when unknown).
    #[must_use]
    pub fn stat_count(&self, rarity: Rarity) -> u32 {
        self.rarity_tier(rarity).map_or(0, |t| t.stat_count)
    }

    /// Bonus stat candidates for a slot (empty when the slot has none).
    #[must_use]
    pub fn stat_pool(&self, slot: EquipmentSlot) -> &[StatRange] {
        self.stat_pools
            .iter()
            .find(|p| p.slot == slot)
            .map_or(&[], |p| p.stats.as_slice())
    }

    /// Base stats of a class.
    #[must_use]
    pub fn class_base(&self, class: CharacterClass) -> Option<&ClassBase> {
        self.classes.iter().find(|c| c.class == class)
    }

    /// Validates a catalog loaded from an external source.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.rarities.is_empty() || self.rarities.iter().map(|t| t.weight).sum::<f64>() <= 0.0 {
            return Err(CatalogError::InvalidRarityTable);
        }
        if self.enemies.is_empty() {
            return Err(CatalogError::NoEnemies);
        }
        for class in CharacterClass::ALL {
            if self.class_base(class).is_none() {
                return Err(CatalogError::MissingClass(class));
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        let ids = self
            .gathering
            .iter()
            .map(|a| (&a.id, a.duration_ms))
            .chain(self.processing.iter().map(|r| (&r.id, r.duration_ms)));
        for (id, duration) in ids {
            if !seen.insert(id) {
                return Err(CatalogError::DuplicateId(id.clone()));
            }
            if duration == 0 {
                return Err(CatalogError::ZeroDuration(id.clone()));
            }
        }

        for recipe in &self.processing {
            let mut listed = std::collections::BTreeSet::new();
            for ingredient in &recipe.requires {
                if !listed.insert(&ingredient.item) {
                    return Err(CatalogError::DuplicateIngredient {
                        recipe: recipe.id.clone(),
                        item: ingredient.item.clone(),
                    });
                }
                if ingredient.quantity == 0 {
                    return Err(CatalogError::ZeroIngredient {
                        recipe: recipe.id.clone(),
                        item: ingredient.item.clone(),
                    });
                }
                if !seen.contains(&ingredient.item) {
                    return Err(CatalogError::UnknownIngredient {
                        recipe: recipe.id.clone(),
                        item: ingredient.item.clone(),
                    });
                }
            }
        }

        for range in self.stat_pools.iter().flat_map(|p| p.stats.iter()) {
            if range.min > range.max {
                return Err(CatalogError::InvalidStatRange {
                    stat: range.stat,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        Ok(())
    }

    /// The built-in game data.
    #[must_use]
    pub fn standard() -> Self {
        use EquipmentSlot as Slot;
        use StatKind as S;

        let tier = |rarity: Rarity, multiplier: f64, weight: f64, stat_count: u32| RarityTier {
            rarity,
            name: rarity.display_name().to_string(),
            multiplier,
            weight,
            stat_count,
        };
        let class = |class: CharacterClass, base_hp: i64, base_damage: i64| ClassBase {
            class,
            name: class.display_name().to_string(),
            base_hp,
            base_damage,
        };
        let enemy = |name: &str, hp: f64, damage: f64, defense: f64, gold: u64| EnemyArchetype {
            name: name.to_string(),
            hp_multiplier: hp,
            damage_multiplier: damage,
            defense_multiplier: defense,
            gold_reward: gold,
        };
        let gather = |id: &str, name: &str, resource: &str, skill: SkillKind, sell: u64| {
            GatheringActivity {
                id: ItemKind::new(id),
                name: name.to_string(),
                resource_name: resource.to_string(),
                skill,
                duration_ms: seconds(5),
                xp: 10,
                sell_value: sell,
            }
        };
        let gear = |item: &str, damage: i64, defense: i64| EquipmentBase {
            item: ItemKind::new(item),
            damage,
            defense,
        };

        Self {
            classes: vec![
                class(CharacterClass::Warrior, 150, 12),
                class(CharacterClass::Ranger, 100, 15),
                class(CharacterClass::Mage, 80, 20),
            ],
            rarities: vec![
                tier(Rarity::Common, 1.0, 60.0, 0),
                tier(Rarity::Uncommon, 1.25, 25.0, 1),
                tier(Rarity::Rare, 1.5, 10.0, 2),
                tier(Rarity::Epic, 2.0, 4.0, 3),
                tier(Rarity::Legendary, 2.5, 1.0, 4),
            ],
            stat_pools: vec![
                StatPool {
                    slot: Slot::Weapon,
                    stats: vec![
                        StatRange::new(S::Strength, 2, 8),
                        StatRange::new(S::CritChance, 3, 12),
                        StatRange::new(S::CritDamage, 10, 40),
                        StatRange::new(S::LifeOnHit, 1, 5),
                    ],
                },
                StatPool {
                    slot: Slot::Head,
                    stats: vec![
                        StatRange::new(S::MaxHealth, 10, 30),
                        StatRange::new(S::Dodge, 2, 8),
                        StatRange::new(S::Intelligence, 1, 5),
                    ],
                },
                StatPool {
                    slot: Slot::Chest,
                    stats: vec![
                        StatRange::new(S::MaxHealth, 15, 50),
                        StatRange::new(S::Block, 3, 10),
                        StatRange::new(S::Strength, 1, 4),
                    ],
                },
                StatPool {
                    slot: Slot::Legs,
                    stats: vec![
                        StatRange::new(S::MaxHealth, 12, 40),
                        StatRange::new(S::Dodge, 2, 8),
                        StatRange::new(S::Agility, 1, 5),
                    ],
                },
                StatPool {
                    slot: Slot::Gloves,
                    stats: vec![
                        StatRange::new(S::CritChance, 2, 8),
                        StatRange::new(S::Agility, 2, 6),
                        StatRange::new(S::Strength, 1, 4),
                    ],
                },
                StatPool {
                    slot: Slot::Boots,
                    stats: vec![
                        StatRange::new(S::Dodge, 3, 12),
                        StatRange::new(S::Agility, 2, 6),
                        StatRange::new(S::MaxHealth, 8, 25),
                    ],
                },
            ],
            equipment: vec![
                gear("stoneSword", 5, 0),
                gear("stonePickaxe", 0, 0),
                gear("leatherHelmet", 0, 2),
                gear("leatherChestplate", 0, 4),
                gear("leatherLeggings", 0, 3),
                gear("leatherGloves", 0, 1),
                gear("leatherBoots", 0, 2),
            ],
            enemies: vec![
                enemy("Goblin", 1.0, 0.8, 0.5, 5),
                enemy("Wolf", 0.9, 1.0, 0.3, 6),
                enemy("Orc", 1.3, 1.0, 0.8, 8),
                enemy("Troll", 1.5, 0.9, 1.0, 10),
                enemy("Skeleton", 0.8, 1.1, 0.4, 7),
                enemy("Ogre", 1.7, 1.2, 1.2, 12),
                enemy("Dragon", 2.0, 1.5, 1.5, 20),
            ],
            gathering: vec![
                gather("sticks", "Gather Sticks", "Sticks", SkillKind::Woodcutting, 1),
                gather("minnows", "Catch Minnows", "Minnows", SkillKind::Fishing, 2),
                gather("stones", "Gather Stones", "Stones", SkillKind::Mining, 1),
                gather("rabbitSkin", "Hunt Rabbit", "Rabbit Skin", SkillKind::Hunting, 3),
            ],
            processing: vec![
                ProcessingRecipe::builder("cookedMinnows", "Cook Minnows", SkillKind::Cooking)
                    .product("Cooked Minnows")
                    .xp(15)
                    .ingredient("minnows", 1)
                    .sell_value(5)
                    .build(),
                ProcessingRecipe::builder("stoneSword", "Forge Stone Sword", SkillKind::Forging)
                    .product("Stone Sword")
                    .duration_secs(10)
                    .xp(25)
                    .ingredient("sticks", 1)
                    .ingredient("stones", 2)
                    .equipment(Slot::Weapon)
                    .sell_value(10)
                    .build(),
                ProcessingRecipe::builder("stonePickaxe", "Forge Stone Pickaxe", SkillKind::Forging)
                    .product("Stone Pickaxe")
                    .duration_secs(10)
                    .xp(25)
                    .ingredient("sticks", 1)
                    .ingredient("stones", 2)
                    .equipment(Slot::Tool)
                    .sell_value(10)
                    .build(),
                ProcessingRecipe::builder("leather", "Craft Leather", SkillKind::Leatherworking)
                    .product("Leather")
                    .xp(15)
                    .ingredient("rabbitSkin", 2)
                    .sell_value(8)
                    .build(),
                ProcessingRecipe::builder(
                    "leatherHelmet",
                    "Craft Leather Helmet",
                    SkillKind::Leatherworking,
                )
                .product("Leather Helmet")
                .duration_secs(8)
                .xp(20)
                .ingredient("leather", 2)
                .equipment(Slot::Head)
                .sell_value(20)
                .build(),
                ProcessingRecipe::builder(
                    "leatherChestplate",
                    "Craft Leather Chestplate",
                    SkillKind::Leatherworking,
                )
                .product("Leather Chestplate")
                .duration_secs(10)
                .xp(25)
                .ingredient("leather", 4)
                .equipment(Slot::Chest)
                .sell_value(40)
                .build(),
                ProcessingRecipe::builder(
                    "leatherLeggings",
                    "Craft Leather Leggings",
                    SkillKind::Leatherworking,
                )
                .product("Leather Leggings")
                .duration_secs(8)
                .xp(20)
                .ingredient("leather", 3)
                .equipment(Slot::Legs)
                .sell_value(30)
                .build(),
                ProcessingRecipe::builder(
                    "leatherGloves",
                    "Craft Leather Gloves",
                    SkillKind::Leatherworking,
                )
                .product("Leather Gloves")
                .duration_secs(6)
                .xp(15)
                .ingredient("leather", 1)
                .equipment(Slot::Gloves)
                .sell_value(15)
                .build(),
                ProcessingRecipe::builder(
                    "leatherBoots",
                    "Craft Leather Boots",
                    SkillKind::Leatherworking,
                )
                .product("Leather Boots")
                .duration_secs(6)
                .xp(15)
                .ingredient("leather", 2)
                .equipment(Slot::Boots)
                .sell_value(20)
                .build(),
            ],
        }
    }
}
