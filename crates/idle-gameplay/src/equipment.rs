//! Equipment slots and equip/unequip operations.
//!
//! Items move between the inventory and a slot; they are never copied. Every
//! operation validates first and only then moves anything, so a rejected
//! call leaves the character untouched.

use idle_common::InstanceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Catalog, ItemKind};
use crate::character::Character;
use crate::inventory::ItemInstance;

/// Equipment error types.
#[derive(Debug, Error)]
pub enum EquipError {
    /// Instance is not in the inventory
    #[error("Item instance {0} not in inventory")]
    InstanceNotFound(InstanceId),
    /// No instance of the kind in the inventory
    #[error("No {0} in inventory")]
    KindNotFound(ItemKind),
    /// Item kind cannot be equipped
    #[error("{0} is not equipment")]
    NotEquipment(ItemKind),
    /// Item belongs in another slot
    #[error("{item} goes in the {expected} slot, not {requested}")]
    WrongSlot {
        /// Item kind
        item: ItemKind,
        /// Slot the item fits
        expected: EquipmentSlot,
        /// Slot requested
        requested: EquipmentSlot,
    },
    /// Nothing to unequip
    #[error("Nothing equipped in the {0} slot")]
    SlotEmpty(EquipmentSlot),
}

/// Result type for equipment operations.
pub type EquipResult<T> = Result<T, EquipError>;

/// Body slots an item can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentSlot {
    /// Weapon
    Weapon,
    /// Gathering tool
    Tool,
    /// Helmet
    Head,
    /// Body armor
    Chest,
    /// Leggings
    Legs,
    /// Gloves
    Gloves,
    /// Boots
    Boots,
}

impl EquipmentSlot {
    /// Every slot.
    pub const ALL: [Self; 7] = [
        Self::Weapon,
        Self::Tool,
        Self::Head,
        Self::Chest,
        Self::Legs,
        Self::Gloves,
        Self::Boots,
    ];

    /// Display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Weapon => "Weapon",
            Self::Tool => "Tool",
            Self::Head => "Head",
            Self::Chest => "Chest",
            Self::Legs => "Legs",
            Self::Gloves => "Gloves",
            Self::Boots => "Boots",
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Slot map of a character. Every slot is always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, Option<ItemInstance>>,
}

impl Default for Equipment {
    fn default() -> Self {
        Self {
            slots: EquipmentSlot::ALL.iter().map(|&slot| (slot, None)).collect(),
        }
    }
}

impl Equipment {
    /// Creates an empty slot map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a slot map from possibly incomplete stored slots.
    #[must_use]
    pub fn from_slots(stored: BTreeMap<EquipmentSlot, Option<ItemInstance>>) -> Self {
        let mut equipment = Self::default();
        for (slot, item) in stored {
            equipment.slots.insert(slot, item);
        }
        equipment
    }

    /// Item in a slot.
    #[must_use]
    pub fn get(&self, slot: EquipmentSlot) -> Option<&ItemInstance> {
        self.slots.get(&slot).and_then(Option::as_ref)
    }

    /// Puts an item in a slot, returning whatever was there.
    pub fn put(&mut self, slot: EquipmentSlot, item: ItemInstance) -> Option<ItemInstance> {
        self.slots.insert(slot, Some(item)).flatten()
    }

    /// Empties a slot.
    pub fn take(&mut self, slot: EquipmentSlot) -> Option<ItemInstance> {
        self.slots.get_mut(&slot).and_then(Option::take)
    }

    /// Iterates occupied slots.
    pub fn equipped(&self) -> impl Iterator<Item = (EquipmentSlot, &ItemInstance)> + '_ {
        self.slots
            .iter()
            .filter_map(|(&slot, item)| item.as_ref().map(|i| (slot, i)))
    }
}

/// Equips a specific inventory instance into `slot`.
///
/// A previously equipped item goes back to the inventory.
pub fn equip_instance(
    character: &mut Character,
    catalog: &Catalog,
    id: InstanceId,
    slot: EquipmentSlot,
) -> EquipResult<()> {
    let item = character
        .inventory
        .get(id)
        .ok_or(EquipError::InstanceNotFound(id))?;
    let expected = catalog
        .equipment_slot(&item.kind)
        .ok_or_else(|| EquipError::NotEquipment(item.kind.clone()))?;
    if expected != slot {
        return Err(EquipError::WrongSlot {
            item: item.kind.clone(),
            expected,
            requested: slot,
        });
    }

    let item = character
        .inventory
        .remove_instance(id)
        .map_err(|_| EquipError::InstanceNotFound(id))?;
    debug!("{} equips {} ({}) in {}", character.name, item.kind, item.rarity, slot);
    if let Some(previous) = character.equipment.put(slot, item) {
        character.inventory.push(previous);
    }
    Ok(())
}

/// Equips the first inventory instance of `kind` into its slot.
pub fn equip_first(character: &mut Character, catalog: &Catalog, kind: &ItemKind) -> EquipResult<()> {
    let slot = catalog
        .equipment_slot(kind)
        .ok_or_else(|| EquipError::NotEquipment(kind.clone()))?;
    let id = character
        .inventory
        .iter()
        .find(|item| &item.kind == kind)
        .map(|item| item.instance_id)
        .ok_or_else(|| EquipError::KindNotFound(kind.clone()))?;
    equip_instance(character, catalog, id, slot)
}

/// Returns the item in `slot` to the inventory.
pub fn unequip(character: &mut Character, slot: EquipmentSlot) -> EquipResult<()> {
    let item = character
        .equipment
        .take(slot)
        .ok_or(EquipError::SlotEmpty(slot))?;
    debug!("{} unequips {} from {}", character.name, item.kind, slot);
    character.inventory.push(item);
    Ok(())
}
