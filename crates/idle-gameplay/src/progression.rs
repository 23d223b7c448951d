//! Skill progression.
//!
//! This module provides:
//! - The skill roster every character carries
//! - The XP curve (`xp_required`)
//! - XP application with multi-level carry-over

use serde::{Deserialize, Serialize};
use std::fmt;

/// XP needed to advance from level 1 to level 2.
pub const BASE_XP: f64 = 100.0;

/// Growth factor of the XP curve per level.
pub const XP_GROWTH: f64 = 1.5;

/// Trainable non-combat skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillKind {
    /// Gathering sticks.
    Woodcutting,
    /// Catching fish.
    Fishing,
    /// Gathering stones.
    Mining,
    /// Hunting for skins.
    Hunting,
    /// Cooking food.
    Cooking,
    /// Forging tools and weapons.
    Forging,
    /// Working leather into armor.
    Leatherworking,
}

impl SkillKind {
    /// Every skill, in display order.
    pub const ALL: [Self; 7] = [
        Self::Woodcutting,
        Self::Fishing,
        Self::Mining,
        Self::Hunting,
        Self::Cooking,
        Self::Forging,
        Self::Leatherworking,
    ];

    /// Display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Woodcutting => "Woodcutting",
            Self::Fishing => "Fishing",
            Self::Mining => "Mining",
            Self::Hunting => "Hunting",
            Self::Cooking => "Cooking",
            Self::Forging => "Forging",
            Self::Leatherworking => "Leatherworking",
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// XP required to reach `level` from the previous one.
///
/// `floor(100 × 1.5^(level-1))`. Levels below 1 are treated as 1.
#[must_use]
pub fn xp_required(level: u32) -> u64 {
    let exponent = level.max(1) - 1;
    (BASE_XP * XP_GROWTH.powi(exponent as i32)).floor() as u64
}

/// Level and carried XP of one skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProgress {
    /// Current level (starts at 1).
    pub level: u32,
    /// XP accumulated toward the next level.
    pub xp: u64,
}

impl Default for SkillProgress {
    fn default() -> Self {
        Self { level: 1, xp: 0 }
    }
}

impl SkillProgress {
    /// Creates progress at a given level with no carried XP.
    #[must_use]
    pub const fn at_level(level: u32) -> Self {
        Self { level, xp: 0 }
    }

    /// XP needed to reach the next level.
    #[must_use]
    pub fn xp_to_next(&self) -> u64 {
        xp_required(self.level + 1)
    }

    /// Fraction of the way to the next level (0.0-1.0).
    #[must_use]
    pub fn level_progress(&self) -> f64 {
        (self.xp as f64 / self.xp_to_next() as f64).clamp(0.0, 1.0)
    }

    /// Adds XP and applies every level-up it pays for.
    ///
    /// Returns the number of levels gained.
    pub fn apply_xp(&mut self, gained: u64) -> u32 {
        self.xp = self.xp.saturating_add(gained);
        let mut levels = 0;
        loop {
            let needed = self.xp_to_next();
            if self.xp < needed {
                break;
            }
            self.xp -= needed;
            self.level += 1;
            levels += 1;
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_xp_curve_values() {
        assert_eq!(xp_required(1), 100);
        assert_eq!(xp_required(2), 150);
        assert_eq!(xp_required(3), 225);
        assert_eq!(xp_required(4), 337);
        assert_eq!(xp_required(5), 506);
    }

    #[test]
    fn test_single_level_up() {
        let mut skill = SkillProgress::default();
        assert_eq!(skill.apply_xp(140), 0);
        assert_eq!(skill.apply_xp(20), 1);
        assert_eq!(skill, SkillProgress { level: 2, xp: 10 });
    }

    #[test]
    fn test_multiple_level_ups_in_one_grant() {
        let mut skill = SkillProgress::default();
        // 150 (→2) + 225 (→3) + 337 (→4) = 712
        let levels = skill.apply_xp(712 + 5);
        assert_eq!(levels, 3);
        assert_eq!(skill.level, 4);
        assert_eq!(skill.xp, 5);
    }

    #[test]
    fn test_exact_threshold_levels() {
        let mut skill = SkillProgress::default();
        assert_eq!(skill.apply_xp(150), 1);
        assert_eq!(skill.xp, 0);
    }

    proptest! {
        #[test]
        fn prop_xp_required_formula_and_monotonic(level in 1u32..40) {
            let expected = (100.0 * 1.5f64.powi(level as i32 - 1)).floor() as u64;
            prop_assert_eq!(xp_required(level), expected);
            prop_assert!(xp_required(level + 1) > xp_required(level));
        }

        #[test]
        fn prop_batch_grant_equals_split_grants(grants in proptest::collection::vec(0u64..500, 1..30)) {
            let mut batched = SkillProgress::default();
            let mut split = SkillProgress::default();
            batched.apply_xp(grants.iter().sum());
            for g in &grants {
                split.apply_xp(*g);
            }
            prop_assert_eq!(batched, split);
            prop_assert!(batched.xp < batched.xp_to_next());
        }
    }
}
