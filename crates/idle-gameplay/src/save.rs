//! Roster encoding and load-time normalization.
//!
//! Stored rosters may come from older builds: missing skills, missing slots,
//! missing gold, item ids that are not integers, or an inventory stored as a
//! `{kind: count}` map. `decode_roster` repairs all of it once, producing fully
//! populated `Character` records, and reserves every loaded instance id so
//! fresh ids never collide.

use idle_common::{CharacterId, InstanceId, Millis, PersistenceError, PersistenceResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::activity::{ActivityKind, ActivitySnapshot};
use crate::catalog::{Catalog, ItemKind};
use crate::character::{default_skills, Character, CharacterClass, Roster};
use crate::equipment::{Equipment, EquipmentSlot};
use crate::inventory::{Inventory, ItemInstance};
use crate::loot::{LootResolver, Rarity, StatBlock, StatKind};
use crate::progression::{SkillKind, SkillProgress};

// ============================================================================
// Stored shapes
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRoster {
    #[serde(default)]
    characters: Vec<Value>,
    #[serde(default)]
    current_character_id: Option<CharacterId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCharacter {
    id: CharacterId,
    #[serde(default)]
    name: String,
    class: CharacterClass,
    level: Option<u32>,
    hp: Option<i64>,
    #[serde(rename = "maxHP")]
    max_hp: Option<i64>,
    experience: Option<u64>,
    gold: Option<u64>,
    created_at: Option<Millis>,
    skills: Option<BTreeMap<String, StoredSkill>>,
    inventory: Option<StoredInventory>,
    equipment: Option<BTreeMap<String, Option<StoredItem>>>,
    current_activity: Option<StoredActivity>,
}

#[derive(Debug, Deserialize)]
struct StoredSkill {
    level: Option<u32>,
    xp: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredInventory {
    Items(Vec<StoredItem>),
    Counts(BTreeMap<ItemKind, u32>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredItem {
    id: ItemKind,
    rarity: Option<Value>,
    instance_id: Option<Value>,
    stats: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredActivity {
    activity_id: ItemKind,
    activity_type: ActivityKind,
    start_time: Millis,
    duration: Millis,
    quantity: Option<u32>,
    completed: Option<u32>,
}

/// Parses a string-keyed value into an enum, `None` if unknown.
fn parse_key<T: DeserializeOwned>(key: &str) -> Option<T> {
    serde_json::from_value(Value::String(key.to_string())).ok()
}

fn stored_id(item: &StoredItem) -> Option<InstanceId> {
    item.instance_id
        .as_ref()
        .and_then(Value::as_u64)
        .map(InstanceId::from_raw)
        .filter(|id| id.is_valid())
}

// ============================================================================
// Normalization
// ============================================================================

/// Most instances a single legacy `{kind: count}` entry expands into.
pub const MAX_MIGRATED_STACK: u32 = 10_000;

/// Counts repairs made while loading, for the load log line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    /// Characters loaded
    pub characters: usize,
    /// Character records dropped as unreadable
    pub dropped: usize,
    /// Missing fields filled with defaults
    pub fields_filled: usize,
    /// Item ids replaced (non-integer or duplicate)
    pub ids_reassigned: usize,
    /// Instances created from a legacy count map
    pub items_migrated: usize,
}

struct Normalizer<'a> {
    catalog: &'a Catalog,
    loot: &'a mut LootResolver,
    seen: BTreeSet<InstanceId>,
    report: RepairReport,
}

impl Normalizer<'_> {
    fn fill<T>(&mut self, value: Option<T>, default: T) -> T {
        value.unwrap_or_else(|| {
            self.report.fields_filled += 1;
            default
        })
    }

    fn item(&mut self, stored: StoredItem) -> ItemInstance {
        let instance_id = match stored_id(&stored) {
            Some(id) if self.seen.insert(id) => id,
            _ => {
                self.report.ids_reassigned += 1;
                let id = InstanceId::new();
                self.seen.insert(id);
                id
            }
        };
        let rarity = stored
            .rarity
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_key::<Rarity>)
            .unwrap_or_else(|| self.catalog.base_rarity());
        let stats: Option<StatBlock> = stored.stats.map(|raw| {
            raw.iter()
                .filter_map(|(k, v)| Some((parse_key::<StatKind>(k)?, v.as_i64()?)))
                .collect()
        });
        ItemInstance {
            kind: stored.id,
            rarity,
            instance_id,
            stats: stats.filter(|s| !s.is_empty()),
        }
    }

    fn inventory(&mut self, stored: Option<StoredInventory>) -> Inventory {
        match stored {
            None => {
                self.report.fields_filled += 1;
                Inventory::new()
            }
            Some(StoredInventory::Items(items)) => {
                Inventory::from_items(items.into_iter().map(|i| self.item(i)).collect())
            }
            Some(StoredInventory::Counts(counts)) => {
                let mut inventory = Inventory::new();
                for (kind, count) in counts {
                    let rarity = if self.catalog.equipment_slot(&kind).is_some() {
                        None
                    } else {
                        Some(self.catalog.base_rarity())
                    };
                    if count > MAX_MIGRATED_STACK {
                        warn!("Capping legacy stack of {} {} at {}", count, kind, MAX_MIGRATED_STACK);
                    }
                    for _ in 0..count.min(MAX_MIGRATED_STACK) {
                        let item = self.loot.create_item(self.catalog, &kind, rarity);
                        self.seen.insert(item.instance_id);
                        inventory.push(item);
                        self.report.items_migrated += 1;
                    }
                }
                inventory
            }
        }
    }

    fn character(&mut self, stored: StoredCharacter) -> Character {
        let base_hp = self.catalog.class_base(stored.class).map_or(0, |c| c.base_hp);

        let mut skills = default_skills();
        match stored.skills {
            Some(raw) => {
                let mut restored = 0;
                for (key, skill) in raw {
                    if let Some(kind) = parse_key::<SkillKind>(&key) {
                        restored += 1;
                        skills.insert(
                            kind,
                            SkillProgress {
                                level: skill.level.unwrap_or(1).max(1),
                                xp: skill.xp.unwrap_or(0),
                            },
                        );
                    }
                }
                self.report.fields_filled += SkillKind::ALL.len().saturating_sub(restored);
            }
            None => self.report.fields_filled += 1,
        }

        let equipment = match stored.equipment {
            Some(raw) => {
                let mut slots = BTreeMap::new();
                for (key, item) in raw {
                    if let Some(slot) = parse_key::<EquipmentSlot>(&key) {
                        slots.insert(slot, item.map(|i| self.item(i)));
                    }
                }
                self.report.fields_filled += EquipmentSlot::ALL.len().saturating_sub(slots.len());
                Equipment::from_slots(slots)
            }
            None => {
                self.report.fields_filled += 1;
                Equipment::new()
            }
        };

        let inventory = self.inventory(stored.inventory);
        let current_activity = stored.current_activity.and_then(|a| {
            if a.duration == 0 {
                warn!("Dropping activity {} with zero duration", a.activity_id);
                return None;
            }
            let quantity = a.quantity.unwrap_or(1).max(1);
            Some(ActivitySnapshot {
                kind: a.activity_type,
                activity_id: a.activity_id,
                start_time: a.start_time,
                duration: a.duration,
                quantity,
                completed: a.completed.unwrap_or(0).min(quantity),
            })
        });

        let name = if stored.name.trim().is_empty() {
            self.report.fields_filled += 1;
            format!("Adventurer {}", stored.id.raw())
        } else {
            stored.name
        };

        Character {
            id: stored.id,
            name,
            class: stored.class,
            level: self.fill(stored.level, 1),
            hp: self.fill(stored.hp, base_hp),
            max_hp: self.fill(stored.max_hp, base_hp),
            experience: self.fill(stored.experience, 0),
            gold: self.fill(stored.gold, 0),
            created_at: self.fill(stored.created_at, 0),
            skills,
            inventory,
            equipment,
            current_activity,
        }
    }
}

/// Collects every integer instance id in the stored characters.
fn loaded_ids(characters: &[StoredCharacter]) -> impl Iterator<Item = InstanceId> + '_ {
    characters.iter().flat_map(|c| {
        let listed: Vec<InstanceId> = match &c.inventory {
            Some(StoredInventory::Items(items)) => items.iter().filter_map(stored_id).collect(),
            _ => Vec::new(),
        };
        let worn: Vec<InstanceId> = c
            .equipment
            .iter()
            .flat_map(|slots| slots.values().flatten())
            .filter_map(stored_id)
            .collect();
        listed.into_iter().chain(worn)
    })
}

/// Decodes and repairs a stored roster.
///
/// Fails only when the blob is not a roster at all; individual unreadable
/// character records are dropped with a warning.
pub fn decode_roster(
    blob: &str,
    catalog: &Catalog,
    loot: &mut LootResolver,
) -> PersistenceResult<(Roster, RepairReport)> {
    let stored: StoredRoster =
        serde_json::from_str(blob).map_err(|e| PersistenceError::Corrupted(e.to_string()))?;

    let mut report = RepairReport::default();
    let mut parsed = Vec::with_capacity(stored.characters.len());
    for raw in stored.characters {
        match serde_json::from_value::<StoredCharacter>(raw) {
            Ok(character) => parsed.push(character),
            Err(e) => {
                warn!("Dropping unreadable character record: {}", e);
                report.dropped += 1;
            }
        }
    }

    if let Some(max) = loaded_ids(&parsed).max() {
        InstanceId::reserve(max);
    }

    let mut normalizer = Normalizer {
        catalog,
        loot,
        seen: BTreeSet::new(),
        report,
    };
    let mut characters: Vec<Character> = Vec::with_capacity(parsed.len());
    for stored in parsed {
        if characters.iter().any(|c| c.id == stored.id) {
            warn!("Dropping duplicate character {}", stored.id);
            normalizer.report.dropped += 1;
            continue;
        }
        characters.push(normalizer.character(stored));
    }

    let mut report = normalizer.report;
    report.characters = characters.len();
    info!(
        "Loaded {} characters ({} fields filled, {} ids reassigned, {} items migrated, {} dropped)",
        report.characters,
        report.fields_filled,
        report.ids_reassigned,
        report.items_migrated,
        report.dropped
    );
    Ok((
        Roster::from_characters(characters, stored.current_character_id),
        report,
    ))
}

/// Encodes a roster for storage.
pub fn encode_roster(roster: &Roster) -> PersistenceResult<String> {
    serde_json::to_string(roster).map_err(|e| PersistenceError::Serialization(e.to_string()))
}
