//! # Idle Gameplay
//!
//! Gameplay systems for Idle Quest.
//!
//! This crate provides the time-driven simulation core:
//! - Static catalog (activities, recipes, rarities, stat pools, enemies, classes)
//! - Skill progression and the XP curve
//! - Loot resolution (rarity rolls, stat blocks)
//! - Inventory of item instances
//! - Equipment slots and stat aggregation
//! - Timed activities with live ticking and offline catch-up
//! - Dual-timer combat
//! - Shop, roster, and load-time normalization of stored rosters
//!
//! Nothing here performs I/O or reads the clock; every time-dependent call
//! takes `now` explicitly.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod activity;
pub mod catalog;
pub mod character;
pub mod combat;
pub mod equipment;
pub mod inventory;
pub mod loot;
pub mod progression;
pub mod save;
pub mod shop;
pub mod stats;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::activity::*;
    pub use crate::catalog::*;
    pub use crate::character::*;
    pub use crate::combat::*;
    pub use crate::equipment::*;
    pub use crate::inventory::*;
    pub use crate::loot::*;
    pub use crate::progression::*;
    pub use crate::save::*;
    pub use crate::shop::*;
    pub use crate::stats::*;
}

pub use prelude::*;
