//! Timed activities.
//!
//! This module provides:
//! - `ActivitySnapshot`, the persisted state of a running activity
//! - `ActivityEngine` with start/stop, live `tick` and offline `catch_up`
//! - Progress views for presentation
//!
//! A character runs at most one activity. Both the live and the offline path
//! advance the cycle start by whole durations, so replaying an absence in one
//! batch leaves exactly the state that ticking through it would have.

use idle_common::{elapsed_since, Millis};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Ingredient, ItemKind};
use crate::character::Character;
use crate::loot::{LootResolver, Rarity};
use crate::progression::SkillKind;

/// Activity error types.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// No such activity in the catalog
    #[error("Unknown {kind} activity: {id}")]
    UnknownActivity {
        /// Kind looked up
        kind: ActivityKind,
        /// Id looked up
        id: ItemKind,
    },
    /// Inventory cannot pay for a single cycle
    #[error("Not enough materials for {0}")]
    Unaffordable(ItemKind),
}

/// Result type for activity operations.
pub type ActivityResult<T> = Result<T, ActivityError>;

/// The two families of timed activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    /// Loops forever, one raw resource per cycle
    Gathering,
    /// Consumes materials, stops after `quantity` products
    Processing,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gathering => f.write_str("gathering"),
            Self::Processing => f.write_str("processing"),
        }
    }
}

/// State of a running activity.
///
/// `completed <= quantity` and `duration > 0` hold for every snapshot the
/// engine creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    /// Gathering or processing
    #[serde(rename = "activityType")]
    pub kind: ActivityKind,
    /// Catalog id
    pub activity_id: ItemKind,
    /// Start of the current cycle
    pub start_time: Millis,
    /// Cycle length
    pub duration: Millis,
    /// Target count (1 for gathering)
    pub quantity: u32,
    /// Cycles finished so far (processing only)
    pub completed: u32,
}

impl ActivitySnapshot {
    /// Whether this snapshot runs the given activity.
    #[must_use]
    pub fn is(&self, kind: ActivityKind, id: &ItemKind) -> bool {
        self.kind == kind && &self.activity_id == id
    }
}

/// Why an activity ended on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Processing produced its full quantity
    Completed,
    /// Processing ran out of materials
    MaterialsMissing,
    /// The snapshot refers to something the catalog no longer has
    UnknownActivity,
}

/// How a start request was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new activity is running with this target quantity
    Started {
        /// Target quantity after clamping
        quantity: u32,
    },
    /// The same activity was already running; nothing changed
    AlreadyRunning,
}

/// One completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Activity that completed
    pub activity_id: ItemKind,
    /// Skill trained
    pub skill: SkillKind,
    /// XP granted
    pub xp: u64,
    /// Skill levels gained
    pub levels_gained: u32,
    /// Whether the activity ended with this cycle
    pub finished: bool,
}

/// Result of a live tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No activity
    Idle,
    /// Cycle still in progress
    Waiting,
    /// A cycle completed
    CycleCompleted(CycleReport),
    /// The activity stopped without producing
    Stopped(StopReason),
}

/// Result of an offline catch-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchUpReport {
    /// Activity replayed
    pub activity_id: ItemKind,
    /// Full cycles that fit in the absence
    pub cycles_elapsed: u64,
    /// Cycles actually applied
    pub cycles_applied: u64,
    /// Total XP granted
    pub xp: u64,
    /// Skill levels gained
    pub levels_gained: u32,
    /// Set when the activity ended during the absence
    pub stopped: Option<StopReason>,
}

/// Progress of the running activity, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityProgress {
    /// Activity id
    pub activity_id: ItemKind,
    /// Gathering or processing
    pub kind: ActivityKind,
    /// Fraction of the current cycle (0.0-1.0)
    pub fraction: f64,
    /// Time into the current cycle
    pub elapsed_ms: Millis,
    /// Cycle length
    pub duration_ms: Millis,
    /// Cycles finished
    pub completed: u32,
    /// Target count
    pub quantity: u32,
}

/// What a catalog entry yields per cycle.
struct CycleYield<'a> {
    skill: SkillKind,
    xp: u64,
    requires: &'a [Ingredient],
}

/// Drives the single activity of a character.
#[derive(Debug, Clone, Copy)]
pub struct ActivityEngine<'c> {
    catalog: &'c Catalog,
}

impl<'c> ActivityEngine<'c> {
    /// Creates an engine over a catalog.
    #[must_use]
    pub const fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    fn cycle_yield(&self, kind: ActivityKind, id: &ItemKind) -> Option<(CycleYield<'c>, Millis)> {
        match kind {
            ActivityKind::Gathering => self.catalog.gathering(id).map(|a| {
                (
                    CycleYield {
                        skill: a.skill,
                        xp: a.xp,
                        requires: &[],
                    },
                    a.duration_ms,
                )
            }),
            ActivityKind::Processing => self.catalog.recipe(id).map(|r| {
                (
                    CycleYield {
                        skill: r.skill,
                        xp: r.xp,
                        requires: &r.requires,
                    },
                    r.duration_ms,
                )
            }),
        }
    }

    /// Starts an activity, superseding any other running one.
    ///
    /// Processing quantity is clamped to what the inventory can pay for; a
    /// recipe that cannot be paid even once is rejected without any change.
    pub fn start(
        &self,
        character: &mut Character,
        kind: ActivityKind,
        id: &ItemKind,
        requested: u32,
        now: Millis,
    ) -> ActivityResult<StartOutcome> {
        if character
            .current_activity
            .as_ref()
            .is_some_and(|s| s.is(kind, id))
        {
            return Ok(StartOutcome::AlreadyRunning);
        }

        let (yields, duration) = self
            .cycle_yield(kind, id)
            .ok_or_else(|| ActivityError::UnknownActivity {
                kind,
                id: id.clone(),
            })?;

        let quantity = match kind {
            ActivityKind::Gathering => 1,
            ActivityKind::Processing => {
                let affordable = character.inventory.max_affordable(yields.requires);
                if affordable == 0 {
                    debug!("{} cannot afford {}", character.name, id);
                    return Err(ActivityError::Unaffordable(id.clone()));
                }
                requested.max(1).min(affordable)
            }
        };

        info!("{} started {} {} x{}", character.name, kind, id, quantity);
        character.current_activity = Some(ActivitySnapshot {
            kind,
            activity_id: id.clone(),
            start_time: now,
            duration,
            quantity,
            completed: 0,
        });
        Ok(StartOutcome::Started { quantity })
    }

    /// Stops whatever is running.
    pub fn stop(&self, character: &mut Character) -> Option<ActivitySnapshot> {
        let stopped = character.current_activity.take();
        if let Some(snapshot) = &stopped {
            info!("{} stopped {}", character.name, snapshot.activity_id);
        }
        stopped
    }

    /// Advances the running activity by at most one cycle.
    pub fn tick(&self, character: &mut Character, loot: &mut LootResolver, now: Millis) -> TickOutcome {
        let Some(snapshot) = character.current_activity.clone() else {
            return TickOutcome::Idle;
        };
        let Some((yields, _)) = self.cycle_yield(snapshot.kind, &snapshot.activity_id) else {
            return self.halt(character, StopReason::UnknownActivity);
        };
        if snapshot.duration == 0 {
            return self.halt(character, StopReason::UnknownActivity);
        }
        if elapsed_since(snapshot.start_time, now) < snapshot.duration {
            return TickOutcome::Waiting;
        }

        if snapshot.kind == ActivityKind::Processing
            && character.inventory.consume(yields.requires, 1).is_err()
        {
            return self.halt(character, StopReason::MaterialsMissing);
        }

        character
            .inventory
            .add(self.catalog, loot, &snapshot.activity_id, self.product_rarity(&snapshot));
        let levels_gained = character.grant_skill_xp(yields.skill, yields.xp);

        let mut next = snapshot;
        next.start_time += next.duration;
        let finished = match next.kind {
            ActivityKind::Gathering => false,
            ActivityKind::Processing => {
                next.completed += 1;
                next.completed >= next.quantity
            }
        };
        debug!(
            "{} completed {} ({}/{})",
            character.name, next.activity_id, next.completed, next.quantity
        );

        let report = CycleReport {
            activity_id: next.activity_id.clone(),
            skill: yields.skill,
            xp: yields.xp,
            levels_gained,
            finished,
        };
        if finished {
            info!("{} finished {} x{}", character.name, next.activity_id, next.quantity);
            character.current_activity = None;
        } else {
            character.current_activity = Some(next);
        }
        TickOutcome::CycleCompleted(report)
    }

    /// Replays every cycle that fit in the time since the cycle started.
    ///
    /// Returns `None` when nothing is running or no full cycle has elapsed.
    pub fn catch_up(
        &self,
        character: &mut Character,
        loot: &mut LootResolver,
        now: Millis,
    ) -> Option<CatchUpReport> {
        let snapshot = character.current_activity.clone()?;
        let Some((yields, _)) = self.cycle_yield(snapshot.kind, &snapshot.activity_id) else {
            warn!(
                "{} had unknown activity {}; stopping",
                character.name, snapshot.activity_id
            );
            character.current_activity = None;
            return Some(CatchUpReport {
                activity_id: snapshot.activity_id,
                cycles_elapsed: 0,
                cycles_applied: 0,
                xp: 0,
                levels_gained: 0,
                stopped: Some(StopReason::UnknownActivity),
            });
        };
        if snapshot.duration == 0 {
            character.current_activity = None;
            return None;
        }

        let elapsed = elapsed_since(snapshot.start_time, now);
        let cycles = elapsed / snapshot.duration;
        if cycles == 0 {
            return None;
        }

        let (applied, stopped) = match snapshot.kind {
            ActivityKind::Gathering => (cycles, None),
            ActivityKind::Processing => {
                let remaining = snapshot.quantity.saturating_sub(snapshot.completed);
                let affordable = character.inventory.max_affordable(yields.requires);
                let applied = cycles
                    .min(u64::from(affordable))
                    .min(u64::from(remaining));
                let stopped = if snapshot.completed + applied as u32 >= snapshot.quantity {
                    Some(StopReason::Completed)
                } else if applied < cycles {
                    Some(StopReason::MaterialsMissing)
                } else {
                    None
                };
                (applied, stopped)
            }
        };

        if applied > 0 && character.inventory.consume(yields.requires, applied as u32).is_err() {
            // max_affordable bounds `applied`, so this only trips on a broken inventory.
            warn!("{} could not pay for {} cycles", character.name, applied);
            character.current_activity = None;
            return None;
        }
        let rarity = self.product_rarity(&snapshot);
        for _ in 0..applied {
            character
                .inventory
                .add(self.catalog, loot, &snapshot.activity_id, rarity);
        }
        let xp = yields.xp.saturating_mul(applied);
        let levels_gained = character.grant_skill_xp(yields.skill, xp);

        info!(
            "{} caught up {} cycles of {} ({} elapsed, {} xp)",
            character.name, applied, snapshot.activity_id, cycles, xp
        );

        if let Some(reason) = stopped {
            debug!("{} stopped {} during absence: {:?}", character.name, snapshot.activity_id, reason);
            character.current_activity = None;
        } else {
            let mut next = snapshot.clone();
            next.start_time = now - elapsed % next.duration;
            if next.kind == ActivityKind::Processing {
                next.completed += applied as u32;
            }
            character.current_activity = Some(next);
        }

        Some(CatchUpReport {
            activity_id: snapshot.activity_id,
            cycles_elapsed: cycles,
            cycles_applied: applied,
            xp,
            levels_gained,
            stopped,
        })
    }

    /// Progress of the running activity at `now`.
    #[must_use]
    pub fn progress(&self, character: &Character, now: Millis) -> Option<ActivityProgress> {
        let snapshot = character.current_activity.as_ref()?;
        let elapsed = elapsed_since(snapshot.start_time, now).min(snapshot.duration);
        let fraction = if snapshot.duration == 0 {
            1.0
        } else {
            elapsed as f64 / snapshot.duration as f64
        };
        Some(ActivityProgress {
            activity_id: snapshot.activity_id.clone(),
            kind: snapshot.kind,
            fraction,
            elapsed_ms: elapsed,
            duration_ms: snapshot.duration,
            completed: snapshot.completed,
            quantity: snapshot.quantity,
        })
    }

    /// Rarity passed to item creation: base tier unless the product is
    /// equipment, which rolls.
    fn product_rarity(&self, snapshot: &ActivitySnapshot) -> Option<Rarity> {
        match snapshot.kind {
            ActivityKind::Processing if self.catalog.equipment_slot(&snapshot.activity_id).is_some() => None,
            _ => Some(self.catalog.base_rarity()),
        }
    }

    fn halt(&self, character: &mut Character, reason: StopReason) -> TickOutcome {
        if let Some(snapshot) = character.current_activity.take() {
            info!("{} stopped {}: {:?}", character.name, snapshot.activity_id, reason);
        }
        TickOutcome::Stopped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterClass;
    use crate::inventory::ItemInstance;
    use idle_common::{seconds, CharacterId};
    use proptest::prelude::*;

    const T0: Millis = 1_700_000_000_000;

    fn setup() -> (Catalog, Character) {
        let catalog = Catalog::standard();
        let character = Character::new(CharacterId::new(1), "Tess", CharacterClass::Ranger, &catalog, T0);
        (catalog, character)
    }

    fn give(character: &mut Character, kind: &str, n: u32) {
        for _ in 0..n {
            character
                .inventory
                .push(ItemInstance::new(ItemKind::new(kind), Rarity::Common, None));
        }
    }

    fn kind(id: &str) -> ItemKind {
        ItemKind::new(id)
    }

    #[test]
    fn test_start_gathering_and_idempotent_restart() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);

        let outcome = engine
            .start(&mut c, ActivityKind::Gathering, &kind("sticks"), 50, T0)
            .expect("start");
        assert_eq!(outcome, StartOutcome::Started { quantity: 1 });

        let again = engine
            .start(&mut c, ActivityKind::Gathering, &kind("sticks"), 1, T0 + 3_000)
            .expect("start");
        assert_eq!(again, StartOutcome::AlreadyRunning);
        assert_eq!(c.current_activity.as_ref().map(|s| s.start_time), Some(T0));
    }

    #[test]
    fn test_start_unknown_activity() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        assert!(matches!(
            engine.start(&mut c, ActivityKind::Gathering, &kind("leather"), 1, T0),
            Err(ActivityError::UnknownActivity { .. })
        ));
        assert!(c.current_activity.is_none());
    }

    #[test]
    fn test_processing_start_clamps_and_rejects() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);

        assert!(matches!(
            engine.start(&mut c, ActivityKind::Processing, &kind("leather"), 3, T0),
            Err(ActivityError::Unaffordable(_))
        ));
        assert!(c.current_activity.is_none());

        give(&mut c, "rabbitSkin", 5);
        let outcome = engine
            .start(&mut c, ActivityKind::Processing, &kind("leather"), 10, T0)
            .expect("start");
        assert_eq!(outcome, StartOutcome::Started { quantity: 2 });
    }

    #[test]
    fn test_start_supersedes_other_activity() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        engine
            .start(&mut c, ActivityKind::Gathering, &kind("sticks"), 1, T0)
            .expect("start");
        engine
            .start(&mut c, ActivityKind::Gathering, &kind("stones"), 1, T0 + 10)
            .expect("start");
        let snapshot = c.current_activity.as_ref().expect("running");
        assert_eq!(snapshot.activity_id, kind("stones"));
        assert_eq!(snapshot.start_time, T0 + 10);
    }

    #[test]
    fn test_gathering_tick() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        engine
            .start(&mut c, ActivityKind::Gathering, &kind("minnows"), 1, T0)
            .expect("start");

        assert_eq!(engine.tick(&mut c, &mut loot, T0 + 4_999), TickOutcome::Waiting);
        let outcome = engine.tick(&mut c, &mut loot, T0 + 5_100);
        assert!(matches!(outcome, TickOutcome::CycleCompleted(CycleReport { finished: false, xp: 10, .. })));
        assert_eq!(c.inventory.count(&kind("minnows")), 1);
        assert_eq!(c.skill(SkillKind::Fishing).xp, 10);
        assert_eq!(c.current_activity.as_ref().map(|s| s.start_time), Some(T0 + 5_000));
        assert!(c.inventory.iter().all(|i| i.rarity == Rarity::Common));
    }

    #[test]
    fn test_idle_tick_and_stop() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        assert_eq!(engine.tick(&mut c, &mut loot, T0), TickOutcome::Idle);
        assert!(engine.stop(&mut c).is_none());

        engine
            .start(&mut c, ActivityKind::Gathering, &kind("sticks"), 1, T0)
            .expect("start");
        assert!(engine.stop(&mut c).is_some());
        assert_eq!(engine.tick(&mut c, &mut loot, T0 + 60_000), TickOutcome::Idle);
    }

    #[test]
    fn test_processing_ticks_to_completion() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        give(&mut c, "minnows", 2);
        engine
            .start(&mut c, ActivityKind::Processing, &kind("cookedMinnows"), 2, T0)
            .expect("start");

        let first = engine.tick(&mut c, &mut loot, T0 + 5_000);
        assert!(matches!(first, TickOutcome::CycleCompleted(CycleReport { finished: false, .. })));
        assert_eq!(c.current_activity.as_ref().map(|s| s.completed), Some(1));

        let second = engine.tick(&mut c, &mut loot, T0 + 10_000);
        assert!(matches!(second, TickOutcome::CycleCompleted(CycleReport { finished: true, .. })));
        assert!(c.current_activity.is_none());
        assert_eq!(c.inventory.count(&kind("cookedMinnows")), 2);
        assert_eq!(c.inventory.count(&kind("minnows")), 0);
        assert_eq!(c.skill(SkillKind::Cooking).xp, 30);
    }

    #[test]
    fn test_processing_stops_when_materials_vanish() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        give(&mut c, "rabbitSkin", 2);
        engine
            .start(&mut c, ActivityKind::Processing, &kind("leather"), 1, T0)
            .expect("start");

        c.inventory.remove_first(&kind("rabbitSkin")).expect("sell one");
        let outcome = engine.tick(&mut c, &mut loot, T0 + 5_000);
        assert_eq!(outcome, TickOutcome::Stopped(StopReason::MaterialsMissing));
        assert!(c.current_activity.is_none());
        assert_eq!(c.inventory.count(&kind("rabbitSkin")), 1);
        assert_eq!(c.inventory.count(&kind("leather")), 0);
    }

    #[test]
    fn test_repeated_ingredient_never_partially_consumed() {
        let (mut catalog, mut c) = setup();
        let leather = kind("leather");
        if let Some(recipe) = catalog.processing.iter_mut().find(|r| r.id == leather) {
            recipe.requires.push(Ingredient::new("rabbitSkin", 2));
        }
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);

        give(&mut c, "rabbitSkin", 3);
        assert!(matches!(
            engine.start(&mut c, ActivityKind::Processing, &leather, 1, T0),
            Err(ActivityError::Unaffordable(_))
        ));

        give(&mut c, "rabbitSkin", 1);
        engine
            .start(&mut c, ActivityKind::Processing, &leather, 1, T0)
            .expect("start");
        c.inventory.remove_first(&kind("rabbitSkin")).expect("sell one");
        let outcome = engine.tick(&mut c, &mut loot, T0 + 5_000);
        assert_eq!(outcome, TickOutcome::Stopped(StopReason::MaterialsMissing));
        assert_eq!(c.inventory.count(&kind("rabbitSkin")), 3);
        assert_eq!(c.inventory.count(&leather), 0);
    }

    #[test]
    fn test_equipment_recipe_rolls_rarity() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(3);
        give(&mut c, "leather", 40);
        engine
            .start(&mut c, ActivityKind::Processing, &kind("leatherGloves"), 40, T0)
            .expect("start");
        engine.catch_up(&mut c, &mut loot, T0 + seconds(6 * 40));

        assert_eq!(c.inventory.count(&kind("leatherGloves")), 40);
        assert!(c
            .inventory
            .iter()
            .any(|i| i.rarity != Rarity::Common));
    }

    #[test]
    fn test_gathering_catch_up_37_seconds() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        engine
            .start(&mut c, ActivityKind::Gathering, &kind("sticks"), 1, T0)
            .expect("start");

        let now = T0 + 37_000;
        let report = engine.catch_up(&mut c, &mut loot, now).expect("cycles elapsed");
        assert_eq!(report.cycles_applied, 7);
        assert_eq!(report.xp, 70);
        assert_eq!(report.stopped, None);
        assert_eq!(c.inventory.count(&kind("sticks")), 7);
        assert_eq!(c.current_activity.as_ref().map(|s| s.start_time), Some(now - 2_000));
    }

    #[test]
    fn test_processing_catch_up_limited_by_materials() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        give(&mut c, "rabbitSkin", 5);
        c.current_activity = Some(ActivitySnapshot {
            kind: ActivityKind::Processing,
            activity_id: kind("leather"),
            start_time: T0,
            duration: seconds(5),
            quantity: 10,
            completed: 0,
        });

        let report = engine
            .catch_up(&mut c, &mut loot, T0 + seconds(50))
            .expect("cycles elapsed");
        assert_eq!(report.cycles_elapsed, 10);
        assert_eq!(report.cycles_applied, 2);
        assert_eq!(report.stopped, Some(StopReason::MaterialsMissing));
        assert!(c.current_activity.is_none());
        assert_eq!(c.inventory.count(&kind("leather")), 2);
        assert_eq!(c.inventory.count(&kind("rabbitSkin")), 1);
    }

    #[test]
    fn test_processing_catch_up_completes_quantity() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        give(&mut c, "minnows", 10);
        engine
            .start(&mut c, ActivityKind::Processing, &kind("cookedMinnows"), 3, T0)
            .expect("start");

        let report = engine
            .catch_up(&mut c, &mut loot, T0 + seconds(60))
            .expect("cycles elapsed");
        assert_eq!(report.cycles_applied, 3);
        assert_eq!(report.stopped, Some(StopReason::Completed));
        assert_eq!(c.inventory.count(&kind("minnows")), 7);
    }

    #[test]
    fn test_processing_catch_up_partial_keeps_running() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        give(&mut c, "minnows", 10);
        engine
            .start(&mut c, ActivityKind::Processing, &kind("cookedMinnows"), 10, T0)
            .expect("start");

        engine.catch_up(&mut c, &mut loot, T0 + 12_500).expect("cycles elapsed");
        let snapshot = c.current_activity.as_ref().expect("still running");
        assert_eq!(snapshot.completed, 2);
        assert_eq!(snapshot.start_time, T0 + 10_000);
    }

    #[test]
    fn test_catch_up_before_first_cycle_is_noop() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        engine
            .start(&mut c, ActivityKind::Gathering, &kind("sticks"), 1, T0)
            .expect("start");
        assert!(engine.catch_up(&mut c, &mut loot, T0 + 4_000).is_none());
        assert_eq!(c.current_activity.as_ref().map(|s| s.start_time), Some(T0));
    }

    #[test]
    fn test_unknown_snapshot_is_stopped() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        let mut loot = LootResolver::with_seed(1);
        c.current_activity = Some(ActivitySnapshot {
            kind: ActivityKind::Gathering,
            activity_id: kind("moonstone"),
            start_time: T0,
            duration: 1_000,
            quantity: 1,
            completed: 0,
        });
        assert_eq!(
            engine.tick(&mut c, &mut loot, T0 + 5_000),
            TickOutcome::Stopped(StopReason::UnknownActivity)
        );
    }

    #[test]
    fn test_progress_view() {
        let (catalog, mut c) = setup();
        let engine = ActivityEngine::new(&catalog);
        assert!(engine.progress(&c, T0).is_none());
        engine
            .start(&mut c, ActivityKind::Gathering, &kind("stones"), 1, T0)
            .expect("start");
        let progress = engine.progress(&c, T0 + 2_500).expect("running");
        assert!((progress.fraction - 0.5).abs() < f64::EPSILON);
        assert_eq!(progress.elapsed_ms, 2_500);
        assert_eq!(progress.quantity, 1);
    }

    fn live_replay(
        engine: &ActivityEngine<'_>,
        c: &mut Character,
        loot: &mut LootResolver,
        now: Millis,
    ) {
        while let Some(snapshot) = c.current_activity.clone() {
            let boundary = snapshot.start_time + snapshot.duration;
            if boundary > now {
                break;
            }
            engine.tick(c, loot, boundary);
        }
        engine.tick(c, loot, now);
    }

    proptest! {
        #[test]
        fn prop_gathering_catch_up_matches_live(offline in 0u64..400_000, pre_xp in 0u64..300) {
            let (catalog, mut live) = setup();
            live.grant_skill_xp(SkillKind::Mining, pre_xp);
            let engine = ActivityEngine::new(&catalog);
            engine.start(&mut live, ActivityKind::Gathering, &kind("stones"), 1, T0).expect("start");
            let mut batch = live.clone();
            let now = T0 + offline;

            live_replay(&engine, &mut live, &mut LootResolver::with_seed(1), now);
            engine.catch_up(&mut batch, &mut LootResolver::with_seed(1), now);
            engine.tick(&mut batch, &mut LootResolver::with_seed(1), now);

            prop_assert_eq!(live.inventory.count(&kind("stones")), batch.inventory.count(&kind("stones")));
            prop_assert_eq!(live.skill(SkillKind::Mining), batch.skill(SkillKind::Mining));
            prop_assert_eq!(live.current_activity, batch.current_activity);
        }

        #[test]
        fn prop_processing_catch_up_matches_live(
            skins in 0u32..30,
            quantity in 1u32..15,
            offline in 0u64..120_000,
        ) {
            let (catalog, mut live) = setup();
            give(&mut live, "rabbitSkin", skins.max(2));
            let engine = ActivityEngine::new(&catalog);
            engine.start(&mut live, ActivityKind::Processing, &kind("leather"), quantity, T0).expect("start");
            // Materials can shrink after the start (e.g. sold).
            while live.inventory.count(&kind("rabbitSkin")) > skins {
                live.inventory.remove_first(&kind("rabbitSkin")).expect("present");
            }
            let mut batch = live.clone();
            let now = T0 + offline;

            live_replay(&engine, &mut live, &mut LootResolver::with_seed(1), now);
            engine.catch_up(&mut batch, &mut LootResolver::with_seed(1), now);
            engine.tick(&mut batch, &mut LootResolver::with_seed(1), now);

            prop_assert_eq!(live.inventory.count(&kind("leather")), batch.inventory.count(&kind("leather")));
            prop_assert_eq!(live.inventory.count(&kind("rabbitSkin")), batch.inventory.count(&kind("rabbitSkin")));
            prop_assert_eq!(live.skill(SkillKind::Leatherworking), batch.skill(SkillKind::Leatherworking));
            prop_assert_eq!(live.current_activity, batch.current_activity);
        }

        #[test]
        fn prop_processing_never_over_consumes(
            stones in 0u32..20,
            sticks in 0u32..20,
            quantity in 1u32..20,
            offline in 0u64..300_000,
        ) {
            let (catalog, mut c) = setup();
            give(&mut c, "stones", stones);
            give(&mut c, "sticks", sticks);
            let recipe = catalog.recipe(&kind("stoneSword")).expect("recipe").clone();
            let affordable = c.inventory.max_affordable(&recipe.requires);
            c.current_activity = Some(ActivitySnapshot {
                kind: ActivityKind::Processing,
                activity_id: kind("stoneSword"),
                start_time: T0,
                duration: recipe.duration_ms,
                quantity,
                completed: 0,
            });
            let engine = ActivityEngine::new(&catalog);
            let report = engine.catch_up(&mut c, &mut LootResolver::with_seed(4), T0 + offline);

            let cycles = offline / recipe.duration_ms;
            let expected = cycles.min(u64::from(affordable)).min(u64::from(quantity));
            let applied = report.map_or(0, |r| r.cycles_applied);
            prop_assert_eq!(applied, expected);
            prop_assert_eq!(u64::from(c.inventory.count(&kind("stones"))), u64::from(stones) - 2 * applied);
            prop_assert_eq!(u64::from(c.inventory.count(&kind("sticks"))), u64::from(sticks) - applied);
            prop_assert_eq!(u64::from(c.inventory.count(&kind("stoneSword"))), applied);
        }
    }
}
