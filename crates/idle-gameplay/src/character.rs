//! Characters and the roster.
//!
//! This module provides:
//! - Character classes
//! - The `Character` record with skills, inventory, equipment and activity
//! - The `Roster` of playable characters with a fixed slot count

use idle_common::{CharacterId, Millis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::activity::ActivitySnapshot;
use crate::catalog::Catalog;
use crate::equipment::Equipment;
use crate::inventory::Inventory;
use crate::progression::{SkillKind, SkillProgress};

/// Maximum number of characters in a roster.
pub const MAX_CHARACTER_SLOTS: usize = 3;

/// Roster error types.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Blank character name
    #[error("Character name cannot be empty")]
    EmptyName,
    /// No free slot
    #[error("Roster is full ({0} characters)")]
    Full(usize),
    /// Unknown character
    #[error("Character {0} not found")]
    NotFound(CharacterId),
}

/// Result type for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;

/// Playable classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CharacterClass {
    /// High HP, low damage
    Warrior,
    /// Balanced
    Ranger,
    /// Low HP, high damage
    Mage,
}

impl CharacterClass {
    /// Every class.
    pub const ALL: [Self; 3] = [Self::Warrior, Self::Ranger, Self::Mage];

    /// Display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Warrior => "Warrior",
            Self::Ranger => "Ranger",
            Self::Mage => "Mage",
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A playable character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Roster id
    pub id: CharacterId,
    /// Display name
    pub name: String,
    /// Class
    pub class: CharacterClass,
    /// Character level
    pub level: u32,
    /// Current HP
    pub hp: i64,
    /// Maximum HP
    #[serde(rename = "maxHP")]
    pub max_hp: i64,
    /// Character experience
    pub experience: u64,
    /// Gold held
    pub gold: u64,
    /// Creation time
    pub created_at: Millis,
    /// Every skill, always fully populated
    pub skills: BTreeMap<SkillKind, SkillProgress>,
    /// Items held
    pub inventory: Inventory,
    /// Items worn
    pub equipment: Equipment,
    /// Running activity, if any
    pub current_activity: Option<ActivitySnapshot>,
}

impl Character {
    /// Creates a level 1 character with every skill and slot initialized.
    #[must_use]
    pub fn new(
        id: CharacterId,
        name: impl Into<String>,
        class: CharacterClass,
        catalog: &Catalog,
        now: Millis,
    ) -> Self {
        let base_hp = catalog.class_base(class).map_or(0, |c| c.base_hp);
        Self {
            id,
            name: name.into(),
            class,
            level: 1,
            hp: base_hp,
            max_hp: base_hp,
            experience: 0,
            gold: 0,
            created_at: now,
            skills: default_skills(),
            inventory: Inventory::new(),
            equipment: Equipment::new(),
            current_activity: None,
        }
    }

    /// Progress of a skill.
    #[must_use]
    pub fn skill(&self, skill: SkillKind) -> SkillProgress {
        self.skills.get(&skill).copied().unwrap_or_default()
    }

    /// Grants skill XP and logs level-ups. Returns levels gained.
    pub fn grant_skill_xp(&mut self, skill: SkillKind, xp: u64) -> u32 {
        let progress = self.skills.entry(skill).or_default();
        let levels = progress.apply_xp(xp);
        if levels > 0 {
            info!(
                "{} reached {} level {} (+{})",
                self.name, skill, progress.level, levels
            );
        }
        levels
    }
}

/// Fresh progress for every skill.
#[must_use]
pub fn default_skills() -> BTreeMap<SkillKind, SkillProgress> {
    SkillKind::ALL
        .iter()
        .map(|&skill| (skill, SkillProgress::default()))
        .collect()
}

/// The set of playable characters and which one is being played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    characters: Vec<Character>,
    current_character_id: Option<CharacterId>,
    #[serde(skip, default = "default_max_slots")]
    max_slots: usize,
}

fn default_max_slots() -> usize {
    MAX_CHARACTER_SLOTS
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            characters: Vec::new(),
            current_character_id: None,
            max_slots: MAX_CHARACTER_SLOTS,
        }
    }

    /// Creates a roster from already normalized characters.
    #[must_use]
    pub fn from_characters(characters: Vec<Character>, current: Option<CharacterId>) -> Self {
        let current = current.filter(|id| characters.iter().any(|c| c.id == *id));
        Self {
            characters,
            current_character_id: current,
            max_slots: MAX_CHARACTER_SLOTS,
        }
    }

    /// Creates a character in a free slot.
    pub fn create(
        &mut self,
        name: &str,
        class: CharacterClass,
        catalog: &Catalog,
        now: Millis,
    ) -> RosterResult<CharacterId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if self.characters.len() >= self.max_slots {
            return Err(RosterError::Full(self.max_slots));
        }

        let highest = self.characters.iter().map(|c| c.id.raw()).max().unwrap_or(0);
        let next = highest
            .checked_add(1)
            .or_else(|| (1..).find(|n| self.get(CharacterId::new(*n)).is_none()))
            .unwrap_or(1);
        let id = CharacterId::new(next);
        self.characters
            .push(Character::new(id, name, class, catalog, now));
        info!("Created {} the {} ({})", name, class, id);
        Ok(id)
    }

    /// Deletes a character, clearing the current selection if it was the one.
    pub fn delete(&mut self, id: CharacterId) -> RosterResult<Character> {
        let index = self
            .characters
            .iter()
            .position(|c| c.id == id)
            .ok_or(RosterError::NotFound(id))?;
        if self.current_character_id == Some(id) {
            self.current_character_id = None;
        }
        let removed = self.characters.remove(index);
        info!("Deleted {} ({})", removed.name, id);
        Ok(removed)
    }

    /// Looks up a character.
    #[must_use]
    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Looks up a character mutably.
    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    /// Marks a character as the one being played.
    pub fn select(&mut self, id: CharacterId) -> RosterResult<()> {
        if self.get(id).is_none() {
            return Err(RosterError::NotFound(id));
        }
        self.current_character_id = Some(id);
        Ok(())
    }

    /// Id of the character being played.
    #[must_use]
    pub const fn current_id(&self) -> Option<CharacterId> {
        self.current_character_id
    }

    /// The character being played.
    #[must_use]
    pub fn current(&self) -> Option<&Character> {
        self.current_character_id.and_then(|id| self.get(id))
    }

    /// The character being played, mutably.
    pub fn current_mut(&mut self) -> Option<&mut Character> {
        let id = self.current_character_id?;
        self.get_mut(id)
    }

    /// All characters in creation order.
    #[must_use]
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// All characters, mutably.
    pub fn characters_mut(&mut self) -> &mut [Character] {
        &mut self.characters
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Maximum number of characters.
    #[must_use]
    pub const fn max_slots(&self) -> usize {
        self.max_slots
    }
}
