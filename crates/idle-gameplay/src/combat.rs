//! Timed combat encounters.
//!
//! This module provides:
//! - Combat tuning (`CombatConfig`)
//! - Encounter state with independent player and enemy attack timers
//! - Enemy generation scaled by the victory count
//! - Attack resolution (dodge, block, crit, defense, life on hit)
//! - A typed combat log
//!
//! Each tick evaluates the player timer, then the enemy timer. Both can fire
//! in the same tick. An enemy killed by the player's swing does not strike
//! back in that tick.

use idle_common::{elapsed_since, Millis};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Catalog, EnemyArchetype};
use crate::character::Character;
use crate::stats::{compute_stats, max_hp};

/// Combat error types.
#[derive(Debug, Error)]
pub enum CombatError {
    /// Start requested while a fight is running or awaiting reset
    #[error("Combat must be reset before starting again")]
    NotIdle,
    /// Retreat requested with no fight running
    #[error("No combat in progress")]
    NotActive,
    /// Catalog has no enemies to fight
    #[error("No enemy archetypes available")]
    NoEnemies,
}

/// Result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;

// ============================================================================
// Configuration
// ============================================================================

/// Combat tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Player attack interval (ms)
    pub player_attack_interval_ms: Millis,
    /// Enemy attack interval (ms)
    pub enemy_attack_interval_ms: Millis,
    /// Extra wait before a fresh enemy's first swing (ms)
    pub enemy_first_attack_delay_ms: Millis,
    /// Pause between a victory and the next enemy (ms)
    pub next_enemy_delay_ms: Millis,
    /// Enemy HP before scaling
    pub enemy_base_hp: f64,
    /// Enemy damage before scaling
    pub enemy_base_damage: f64,
    /// Enemy defense before scaling
    pub enemy_base_defense: f64,
    /// HP growth per enemy level
    pub hp_scaling: f64,
    /// Damage growth per enemy level
    pub damage_scaling: f64,
    /// Defense growth per enemy level
    pub defense_scaling: f64,
    /// Victories per unlocked archetype
    pub archetype_step: u32,
    /// Victories per enemy level
    pub level_step: u32,
    /// Victories after which weaker archetypes are mixed back in
    pub variety_threshold: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            player_attack_interval_ms: 2_000,
            enemy_attack_interval_ms: 2_500,
            enemy_first_attack_delay_ms: 500,
            next_enemy_delay_ms: 1_000,
            enemy_base_hp: 50.0,
            enemy_base_damage: 5.0,
            enemy_base_defense: 0.0,
            hp_scaling: 0.3,
            damage_scaling: 0.2,
            defense_scaling: 0.15,
            archetype_step: 5,
            level_step: 3,
            variety_threshold: 10,
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// How a fight ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CombatOutcome {
    /// Player HP reached zero
    Defeat,
    /// Player walked away
    Retreat,
}

/// Lifecycle of the encounter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CombatPhase {
    /// Not fighting
    #[default]
    Idle,
    /// Fighting
    Active,
    /// Ended; must be reset before the next fight
    Ended(CombatOutcome),
}

/// Final tally of a fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatSummary {
    /// How it ended
    pub outcome: CombatOutcome,
    /// Enemies defeated
    pub victories: u32,
    /// Gold earned
    pub gold_earned: u64,
}

/// Player side of a fight, snapshotted at start.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCombatant {
    /// Current HP (may dip below zero before the defeat check)
    pub hp: i64,
    /// Maximum HP
    pub max_hp: i64,
    /// Damage per hit
    pub damage: i64,
    /// Defense
    pub defense: i64,
    /// Dodge chance (%)
    pub dodge: i64,
    /// Crit chance (%)
    pub crit_chance: i64,
    /// Crit bonus damage (%)
    pub crit_damage: i64,
    /// Heal per landed hit
    pub life_on_hit: i64,
    /// Block chance (%)
    pub block: i64,
    /// Attack interval
    pub attack_interval: Millis,
    /// Time of the last swing
    pub last_attack: Millis,
}

/// Enemy side of a fight.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    /// Archetype name
    pub name: String,
    /// Index into the catalog's archetypes
    pub archetype: usize,
    /// Level
    pub level: u32,
    /// Current HP (may dip below zero before the defeat check)
    pub hp: i64,
    /// Maximum HP
    pub max_hp: i64,
    /// Damage per hit
    pub damage: i64,
    /// Defense
    pub defense: i64,
    /// Gold paid on defeat
    pub gold_reward: u64,
    /// Attack interval
    pub attack_interval: Millis,
    /// Time of the last swing
    pub last_attack: Millis,
}

/// Combat log categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LogKind {
    /// Narration
    Info,
    /// Player hit
    Player,
    /// Enemy hit or arrival
    Enemy,
    /// Player crit
    Crit,
    /// Player dodged
    Dodge,
    /// Player blocked
    Block,
    /// Life on hit
    Heal,
    /// Enemy defeated
    Victory,
    /// Player defeated
    Defeat,
}

/// One combat log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatLogEntry {
    /// When it happened
    pub at: Millis,
    /// Category
    pub kind: LogKind,
    /// Text
    pub message: String,
}

/// Full state of an encounter. Lives only for the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatState {
    /// Lifecycle
    pub phase: CombatPhase,
    /// Player side
    pub player: PlayerCombatant,
    /// Current enemy; `None` between a victory and the next spawn
    pub enemy: Option<Enemy>,
    /// When the next enemy appears
    pub next_enemy_at: Option<Millis>,
    /// Enemies defeated this fight
    pub victories: u32,
    /// Gold earned this fight
    pub gold_earned: u64,
    /// Append-only log
    pub log: Vec<CombatLogEntry>,
}

impl CombatState {
    /// Whether a fight is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == CombatPhase::Active
    }

    /// Player HP for display, never below zero.
    #[must_use]
    pub fn player_hp_display(&self) -> i64 {
        self.player.hp.max(0)
    }

    /// Enemy HP for display, never below zero.
    #[must_use]
    pub fn enemy_hp_display(&self) -> Option<i64> {
        self.enemy.as_ref().map(|e| e.hp.max(0))
    }

    /// Fraction of the player's attack interval elapsed (0.0-1.0).
    #[must_use]
    pub fn player_attack_progress(&self, now: Millis) -> f64 {
        timer_progress(self.player.last_attack, self.player.attack_interval, now)
    }

    /// Fraction of the enemy's attack interval elapsed (0.0-1.0).
    #[must_use]
    pub fn enemy_attack_progress(&self, now: Millis) -> f64 {
        self.enemy
            .as_ref()
            .map_or(0.0, |e| timer_progress(e.last_attack, e.attack_interval, now))
    }

    /// Tally of an ended fight.
    #[must_use]
    pub fn summary(&self) -> Option<CombatSummary> {
        match self.phase {
            CombatPhase::Ended(outcome) => Some(CombatSummary {
                outcome,
                victories: self.victories,
                gold_earned: self.gold_earned,
            }),
            _ => None,
        }
    }

    fn push_log(&mut self, at: Millis, kind: LogKind, message: String) {
        self.log.push(CombatLogEntry { at, kind, message });
    }
}

fn timer_progress(last: Millis, interval: Millis, now: Millis) -> f64 {
    if interval == 0 {
        return 1.0;
    }
    (elapsed_since(last, now) as f64 / interval as f64).min(1.0)
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatTick {
    /// The player swung
    pub player_attacked: bool,
    /// The enemy swung
    pub enemy_attacked: bool,
    /// Gold from an enemy defeated this tick
    pub victory_gold: Option<u64>,
    /// Set when the fight ended this tick
    pub ended: Option<CombatOutcome>,
}

// ============================================================================
// Engine
// ============================================================================

/// Resolves encounters against the catalog's enemies.
#[derive(Debug, Clone, Copy)]
pub struct CombatEngine<'a> {
    catalog: &'a Catalog,
    config: &'a CombatConfig,
}

impl<'a> CombatEngine<'a> {
    /// Creates an engine.
    #[must_use]
    pub const fn new(catalog: &'a Catalog, config: &'a CombatConfig) -> Self {
        Self { catalog, config }
    }

    /// Starts a fight, snapshotting the character's current stats.
    pub fn start(
        &self,
        state: &mut CombatState,
        character: &mut Character,
        rng: &mut fastrand::Rng,
        now: Millis,
    ) -> CombatResult<()> {
        if state.phase != CombatPhase::Idle {
            return Err(CombatError::NotIdle);
        }
        if self.catalog.enemies.is_empty() {
            return Err(CombatError::NoEnemies);
        }

        let stats = compute_stats(character, self.catalog);
        let max_hp = max_hp(character, self.catalog);
        character.max_hp = max_hp;
        character.hp = max_hp;

        *state = CombatState {
            phase: CombatPhase::Active,
            player: PlayerCombatant {
                hp: max_hp,
                max_hp,
                damage: stats.damage,
                defense: stats.defense,
                dodge: stats.dodge,
                crit_chance: stats.crit_chance,
                crit_damage: stats.crit_damage,
                life_on_hit: stats.life_on_hit,
                block: stats.block,
                attack_interval: self.config.player_attack_interval_ms,
                last_attack: now,
            },
            ..CombatState::default()
        };
        info!("{} enters combat ({} hp, {} dmg)", character.name, max_hp, stats.damage);
        state.push_log(now, LogKind::Info, "You venture into the wilderness...".to_string());
        self.spawn_enemy(state, rng, now);
        Ok(())
    }

    /// Builds the enemy for the current victory count.
    #[must_use]
    pub fn generate_enemy(&self, victories: u32, rng: &mut fastrand::Rng, now: Millis) -> Option<Enemy> {
        let cfg = self.config;
        let last = self.catalog.enemies.len().checked_sub(1)?;
        let unlocked = ((victories / cfg.archetype_step.max(1)) as usize).min(last);
        let index = if victories > cfg.variety_threshold {
            rng.usize(0..=unlocked)
        } else {
            unlocked
        };
        let archetype: &EnemyArchetype = &self.catalog.enemies[index];

        let level = 1 + victories / cfg.level_step.max(1);
        let growth = |scaling: f64| 1.0 + f64::from(level - 1) * scaling;
        let max_hp = (cfg.enemy_base_hp * archetype.hp_multiplier * growth(cfg.hp_scaling)).floor() as i64;

        Some(Enemy {
            name: archetype.name.clone(),
            archetype: index,
            level,
            hp: max_hp,
            max_hp,
            damage: (cfg.enemy_base_damage * archetype.damage_multiplier * growth(cfg.damage_scaling)).floor()
                as i64,
            defense: (cfg.enemy_base_defense * archetype.defense_multiplier * growth(cfg.defense_scaling))
                .floor() as i64,
            gold_reward: archetype.gold_reward,
            attack_interval: cfg.enemy_attack_interval_ms,
            last_attack: now + cfg.enemy_first_attack_delay_ms,
        })
    }

    fn spawn_enemy(&self, state: &mut CombatState, rng: &mut fastrand::Rng, now: Millis) {
        state.next_enemy_at = None;
        state.player.last_attack = now;
        if let Some(enemy) = self.generate_enemy(state.victories, rng, now) {
            debug!("Spawned level {} {}", enemy.level, enemy.name);
            state.push_log(
                now,
                LogKind::Enemy,
                format!("A Level {} {} appears!", enemy.level, enemy.name),
            );
            state.enemy = Some(enemy);
        }
    }

    /// Advances both attack timers.
    pub fn tick(
        &self,
        state: &mut CombatState,
        character: &mut Character,
        rng: &mut fastrand::Rng,
        now: Millis,
    ) -> CombatTick {
        let mut result = CombatTick::default();
        if !state.is_active() {
            return result;
        }

        if state.enemy.is_none() {
            if state.next_enemy_at.is_some_and(|at| now >= at) {
                self.spawn_enemy(state, rng, now);
            }
            return result;
        }

        if elapsed_since(state.player.last_attack, now) >= state.player.attack_interval {
            state.player.last_attack = now;
            result.player_attacked = true;
            if let Some(gold) = self.player_attack(state, character, rng, now) {
                result.victory_gold = Some(gold);
                return result;
            }
        }

        let enemy_ready = state
            .enemy
            .as_ref()
            .is_some_and(|e| now >= e.last_attack && now - e.last_attack >= e.attack_interval);
        if enemy_ready {
            if let Some(enemy) = state.enemy.as_mut() {
                enemy.last_attack = now;
            }
            result.enemy_attacked = true;
            if self.enemy_attack(state, rng, now) {
                state.phase = CombatPhase::Ended(CombatOutcome::Defeat);
                character.hp = 0;
                info!(
                    "{} was defeated after {} victories ({} gold)",
                    character.name, state.victories, state.gold_earned
                );
                result.ended = Some(CombatOutcome::Defeat);
            }
        }

        result
    }

    /// Player swing. Returns the gold paid if the enemy died.
    fn player_attack(
        &self,
        state: &mut CombatState,
        character: &mut Character,
        rng: &mut fastrand::Rng,
        now: Millis,
    ) -> Option<u64> {
        let player = &state.player;
        let is_crit = roll(rng, player.crit_chance);
        let mut raw = player.damage;
        if is_crit {
            raw = raw * (100 + player.crit_damage) / 100;
        }
        let life_on_hit = player.life_on_hit;

        let enemy = state.enemy.as_mut()?;
        let damage = mitigate(raw, enemy.defense);
        enemy.hp -= damage;
        let enemy_dead = enemy.hp <= 0;

        if is_crit {
            state.push_log(now, LogKind::Crit, format!("CRITICAL HIT! You deal {damage} damage!"));
        } else {
            state.push_log(now, LogKind::Player, format!("You deal {damage} damage!"));
        }

        if life_on_hit > 0 {
            state.player.hp = (state.player.hp + life_on_hit).min(state.player.max_hp);
            state.push_log(now, LogKind::Heal, format!("Recovered {life_on_hit} HP"));
        }

        if !enemy_dead {
            return None;
        }

        let enemy = state.enemy.take()?;
        let gold = enemy.gold_reward + u64::from(enemy.level);
        state.victories += 1;
        state.gold_earned += gold;
        character.gold += gold;
        state.next_enemy_at = Some(now + self.config.next_enemy_delay_ms);
        info!(
            "{} defeated a level {} {} (+{} gold, {} victories)",
            character.name, enemy.level, enemy.name, gold, state.victories
        );
        state.push_log(now, LogKind::Victory, format!("Victory! You earned {gold} gold!"));
        Some(gold)
    }

    /// Enemy swing. Returns true if the player died.
    fn enemy_attack(&self, state: &mut CombatState, rng: &mut fastrand::Rng, now: Millis) -> bool {
        let Some(enemy) = state.enemy.as_ref() else {
            return false;
        };
        let (name, mut raw) = (enemy.name.clone(), enemy.damage);

        if roll(rng, state.player.dodge) {
            state.push_log(now, LogKind::Dodge, "You dodged the attack!".to_string());
            return false;
        }
        if roll(rng, state.player.block) {
            raw /= 2;
            state.push_log(
                now,
                LogKind::Block,
                format!("You blocked the attack! Damage reduced to {raw}"),
            );
        }

        let damage = mitigate(raw, state.player.defense);
        state.player.hp -= damage;
        state.push_log(now, LogKind::Enemy, format!("{name} deals {damage} damage!"));

        if state.player.hp <= 0 {
            state.push_log(
                now,
                LogKind::Defeat,
                format!("You were defeated by a {name}."),
            );
            return true;
        }
        false
    }

    /// Walks away from a running fight.
    pub fn retreat(&self, state: &mut CombatState, now: Millis) -> CombatResult<CombatSummary> {
        if !state.is_active() {
            return Err(CombatError::NotActive);
        }
        state.phase = CombatPhase::Ended(CombatOutcome::Retreat);
        state.push_log(now, LogKind::Info, "You retreated safely.".to_string());
        info!(
            "Retreated after {} victories ({} gold)",
            state.victories, state.gold_earned
        );
        Ok(CombatSummary {
            outcome: CombatOutcome::Retreat,
            victories: state.victories,
            gold_earned: state.gold_earned,
        })
    }

    /// Clears the encounter back to idle.
    pub fn reset(&self, state: &mut CombatState) {
        *state = CombatState::default();
    }
}

/// Percent roll: `uniform[0, 100) < chance`.
fn roll(rng: &mut fastrand::Rng, chance: i64) -> bool {
    rng.f64() * 100.0 < chance as f64
}

/// Defense at half effectiveness; every landed hit does at least 1.
#[must_use]
pub fn mitigate(raw: i64, defense: i64) -> i64 {
    (raw - defense / 2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterClass;
    use idle_common::CharacterId;

    const T0: Millis = 1_000_000;

    fn setup(class: CharacterClass) -> (Catalog, CombatConfig, Character) {
        let catalog = Catalog::standard();
        let character = Character::new(CharacterId::new(1), "Vex", class, &catalog, 0);
        (catalog, CombatConfig::default(), character)
    }

    #[test]
    fn test_mitigate() {
        assert_eq!(mitigate(12, 10), 7);
        assert_eq!(mitigate(12, 11), 7);
        assert_eq!(mitigate(3, 40), 1);
        assert_eq!(mitigate(0, 0), 1);
    }

    #[test]
    fn test_first_enemy_and_timers() {
        let (catalog, config, mut c) = setup(CharacterClass::Warrior);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);

        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        let enemy = state.enemy.as_ref().expect("spawned");
        assert_eq!(enemy.name, "Goblin");
        assert_eq!(enemy.level, 1);
        assert_eq!(enemy.max_hp, 50);
        assert_eq!(enemy.damage, 4);
        assert_eq!(enemy.last_attack, T0 + 500);
        assert_eq!(state.player.last_attack, T0);
        assert_eq!(state.player.max_hp, 150);
        assert_eq!(state.log.first().map(|e| e.kind), Some(LogKind::Info));
    }

    #[test]
    fn test_start_requires_idle() {
        let (catalog, config, mut c) = setup(CharacterClass::Mage);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);

        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        assert!(matches!(
            engine.start(&mut state, &mut c, &mut rng, T0),
            Err(CombatError::NotIdle)
        ));
        engine.retreat(&mut state, T0).expect("retreat");
        assert!(matches!(
            engine.start(&mut state, &mut c, &mut rng, T0),
            Err(CombatError::NotIdle)
        ));
        engine.reset(&mut state);
        assert!(engine.start(&mut state, &mut c, &mut rng, T0).is_ok());
    }

    #[test]
    fn test_enemy_scaling() {
        let (catalog, config, _) = setup(CharacterClass::Warrior);
        let engine = CombatEngine::new(&catalog, &config);
        let mut rng = fastrand::Rng::with_seed(1);

        // 7 victories: Wolf (index 1), level 3.
        let wolf = engine.generate_enemy(7, &mut rng, T0).expect("enemy");
        assert_eq!(wolf.name, "Wolf");
        assert_eq!(wolf.level, 3);
        // floor(50 × 0.9 × 1.6) = 72, floor(5 × 1.0 × 1.4) = 7
        assert_eq!(wolf.max_hp, 72);
        assert_eq!(wolf.damage, 7);
        assert_eq!(wolf.defense, 0);

        let mut tuned = config.clone();
        tuned.enemy_base_defense = 10.0;
        let engine = CombatEngine::new(&catalog, &tuned);
        // 10 victories: Orc, level 4, floor(10 × 0.8 × 1.45) = 11
        let orc = engine.generate_enemy(10, &mut rng, T0).expect("enemy");
        assert_eq!(orc.name, "Orc");
        assert_eq!(orc.defense, 11);
    }

    #[test]
    fn test_variety_stays_within_unlocked() {
        let (catalog, config, _) = setup(CharacterClass::Warrior);
        let engine = CombatEngine::new(&catalog, &config);
        let mut rng = fastrand::Rng::with_seed(42);

        for victories in 11..60 {
            let unlocked = ((victories / 5) as usize).min(catalog.enemies.len() - 1);
            for _ in 0..20 {
                let enemy = engine.generate_enemy(victories, &mut rng, T0).expect("enemy");
                assert!(enemy.archetype <= unlocked);
            }
        }
        let orc = engine.generate_enemy(10, &mut rng, T0);
        assert_eq!(orc.map(|e| e.archetype), Some(2));
    }

    #[test]
    fn test_damage_against_defense_scenario() {
        let (catalog, config, mut c) = setup(CharacterClass::Warrior);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.defense = 10;
            enemy.hp = 100;
            enemy.max_hp = 100;
        }

        let tick = engine.tick(&mut state, &mut c, &mut rng, T0 + 1_999);
        assert!(!tick.player_attacked);
        let tick = engine.tick(&mut state, &mut c, &mut rng, T0 + 2_000);
        assert!(tick.player_attacked);
        assert!(!tick.enemy_attacked);
        assert_eq!(state.enemy_hp_display(), Some(93));
        assert_eq!(state.player.last_attack, T0 + 2_000);
    }

    #[test]
    fn test_same_tick_double_elapse() {
        let (catalog, config, mut c) = setup(CharacterClass::Warrior);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.hp = 1_000;
        }

        // Player due at T0+2000, enemy at T0+3000; a late tick fires both.
        let tick = engine.tick(&mut state, &mut c, &mut rng, T0 + 3_200);
        assert!(tick.player_attacked);
        assert!(tick.enemy_attacked);
        let kinds: Vec<LogKind> = state.log.iter().map(|e| e.kind).collect();
        let player_pos = kinds.iter().position(|k| *k == LogKind::Player);
        let enemy_pos = kinds.iter().rposition(|k| *k == LogKind::Enemy);
        assert!(player_pos < enemy_pos, "player swings first");
        assert_eq!(state.player.hp, 150 - 4);
        assert_eq!(state.enemy.as_ref().map(|e| e.last_attack), Some(T0 + 3_200));
    }

    #[test]
    fn test_killing_blow_skips_enemy_swing() {
        let (catalog, config, mut c) = setup(CharacterClass::Mage);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.hp = 5;
        }

        let tick = engine.tick(&mut state, &mut c, &mut rng, T0 + 3_000);
        assert!(tick.player_attacked);
        assert!(!tick.enemy_attacked);
        // Goblin: 5 gold + level 1
        assert_eq!(tick.victory_gold, Some(6));
        assert_eq!(state.victories, 1);
        assert_eq!(c.gold, 6);
        assert!(state.enemy.is_none());
        assert_eq!(state.next_enemy_at, Some(T0 + 4_000));
        assert_eq!(state.player.hp, 80);
    }

    #[test]
    fn test_no_attacks_until_next_spawn() {
        let (catalog, config, mut c) = setup(CharacterClass::Mage);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.hp = 1;
        }
        engine.tick(&mut state, &mut c, &mut rng, T0 + 2_000);
        let log_len = state.log.len();

        let idle = engine.tick(&mut state, &mut c, &mut rng, T0 + 2_900);
        assert_eq!(idle, CombatTick::default());
        assert_eq!(state.log.len(), log_len);

        engine.tick(&mut state, &mut c, &mut rng, T0 + 3_000);
        let enemy = state.enemy.as_ref().expect("respawned");
        assert_eq!(enemy.last_attack, T0 + 3_500);
        assert_eq!(state.player.last_attack, T0 + 3_000);
    }

    #[test]
    fn test_defeat_clamps_display_and_requires_reset() {
        let (catalog, config, mut c) = setup(CharacterClass::Mage);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        state.player.hp = 2;
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.hp = 1_000;
            enemy.damage = 30;
        }

        let tick = engine.tick(&mut state, &mut c, &mut rng, T0 + 3_000);
        assert_eq!(tick.ended, Some(CombatOutcome::Defeat));
        assert!(state.player.hp < 0);
        assert_eq!(state.player_hp_display(), 0);
        assert_eq!(state.log.last().map(|e| e.kind), Some(LogKind::Defeat));
        assert_eq!(
            state.summary(),
            Some(CombatSummary {
                outcome: CombatOutcome::Defeat,
                victories: 0,
                gold_earned: 0
            })
        );

        let after = engine.tick(&mut state, &mut c, &mut rng, T0 + 10_000);
        assert_eq!(after, CombatTick::default());
        assert!(matches!(engine.retreat(&mut state, T0), Err(CombatError::NotActive)));
    }

    #[test]
    fn test_crit_and_life_on_hit() {
        let (catalog, config, mut c) = setup(CharacterClass::Ranger);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        state.player.crit_chance = 100;
        state.player.crit_damage = 50;
        state.player.life_on_hit = 3;
        state.player.hp = 99;
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.hp = 1_000;
        }

        engine.tick(&mut state, &mut c, &mut rng, T0 + 2_000);
        // floor(15 × 150 / 100) = 22
        assert_eq!(state.enemy_hp_display(), Some(1_000 - 22));
        assert_eq!(state.player.hp, 100, "heal capped at max");
        assert!(state.log.iter().any(|e| e.kind == LogKind::Crit));
        assert!(state.log.iter().any(|e| e.kind == LogKind::Heal));
    }

    #[test]
    fn test_dodge_and_block() {
        let (catalog, config, mut c) = setup(CharacterClass::Warrior);
        let engine = CombatEngine::new(&catalog, &config);
        let mut rng = fastrand::Rng::with_seed(1);

        let mut state = CombatState::default();
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        state.player.dodge = 100;
        state.player.last_attack = T0 + 10_000;
        engine.tick(&mut state, &mut c, &mut rng, T0 + 3_000);
        assert_eq!(state.player.hp, 150);
        assert_eq!(state.log.last().map(|e| e.kind), Some(LogKind::Dodge));

        engine.reset(&mut state);
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        state.player.block = 100;
        state.player.last_attack = T0 + 10_000;
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.damage = 9;
        }
        engine.tick(&mut state, &mut c, &mut rng, T0 + 3_000);
        // floor(9 / 2) = 4
        assert_eq!(state.player.hp, 146);
        assert!(state.log.iter().any(|e| e.kind == LogKind::Block));
    }

    #[test]
    fn test_retreat_keeps_rewards() {
        let (catalog, config, mut c) = setup(CharacterClass::Mage);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.hp = 1;
        }
        engine.tick(&mut state, &mut c, &mut rng, T0 + 2_000);

        let summary = engine.retreat(&mut state, T0 + 2_100).expect("retreat");
        assert_eq!(summary.outcome, CombatOutcome::Retreat);
        assert_eq!(summary.victories, 1);
        assert_eq!(summary.gold_earned, 6);
        assert_eq!(c.gold, 6);
    }

    #[test]
    fn test_attack_progress() {
        let (catalog, config, mut c) = setup(CharacterClass::Mage);
        let engine = CombatEngine::new(&catalog, &config);
        let mut state = CombatState::default();
        let mut rng = fastrand::Rng::with_seed(1);
        engine.start(&mut state, &mut c, &mut rng, T0).expect("start");
        assert!((state.player_attack_progress(T0 + 1_000) - 0.5).abs() < f64::EPSILON);
        assert!(state.enemy_attack_progress(T0 + 400).abs() < f64::EPSILON);
        assert!((state.player_attack_progress(T0 + 9_000) - 1.0).abs() < f64::EPSILON);
    }
}
