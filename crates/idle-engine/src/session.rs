//! Game session.
//!
//! This module provides:
//! - The roster, catalog, RNG, and combat state of one running game
//! - Startup catch-up of every character and catch-up on character switch
//! - The live tick (activity, then combat) driven by the scheduler
//! - Save-after-change and periodic activity autosave
//!
//! Every mutating entry point acts on the presented character. Operations
//! that are rejected leave the roster untouched and return an error.

use idle_common::{elapsed_since, CharacterId, InstanceId, Millis};
use idle_gameplay::{
    equip_first, equip_instance, sell_instance, sell_item, unequip, ActivityEngine, ActivityError,
    ActivityKind, ActivityProgress, CatchUpReport, Catalog, Character, CharacterClass, CombatEngine,
    CombatError, CombatState, CombatSummary, CombatTick, EquipError, EquipmentSlot, ItemKind,
    LootResolver, Roster, RosterError, ShopError, StartOutcome, TickOutcome,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::persistence::{load_roster, save_roster, PersistenceGateway};

/// Session error types.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No character is being played
    #[error("No character selected")]
    NoCharacter,

    /// Roster operation rejected
    #[error(transparent)]
    Roster(#[from] RosterError),

    /// Activity operation rejected
    #[error(transparent)]
    Activity(#[from] ActivityError),

    /// Combat operation rejected
    #[error(transparent)]
    Combat(#[from] CombatError),

    /// Equipment operation rejected
    #[error(transparent)]
    Equip(#[from] EquipError),

    /// Shop operation rejected
    #[error(transparent)]
    Shop(#[from] ShopError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// What one live tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTick {
    /// Activity result for the presented character
    pub activity: TickOutcome,
    /// Combat result for the presented character
    pub combat: CombatTick,
    /// Whether the roster was written this tick
    pub saved: bool,
}

/// A running game.
pub struct GameSession<G: PersistenceGateway> {
    catalog: Catalog,
    config: EngineConfig,
    roster: Roster,
    loot: LootResolver,
    rng: fastrand::Rng,
    combat: CombatState,
    gateway: G,
    last_autosave: Millis,
}

impl<G: PersistenceGateway> GameSession<G> {
    /// Loads the roster, replays every character's time away, and saves once.
    pub fn open(config: EngineConfig, catalog: Catalog, mut gateway: G, now: Millis) -> Self {
        let (mut loot, rng) = match config.rng_seed {
            Some(seed) => (
                LootResolver::with_seed(seed),
                fastrand::Rng::with_seed(seed.wrapping_add(1)),
            ),
            None => (LootResolver::new(), fastrand::Rng::new()),
        };
        let roster = load_roster(&mut gateway, &catalog, &mut loot);

        let mut session = Self {
            catalog,
            config,
            roster,
            loot,
            rng,
            combat: CombatState::default(),
            gateway,
            last_autosave: now,
        };

        let reports = session.catch_up_all(now);
        info!(
            "Session opened with {} characters ({} caught up)",
            session.roster.len(),
            reports.len()
        );
        session.persist();
        session
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Static game data.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// All characters.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The presented character.
    #[must_use]
    pub fn current(&self) -> Option<&Character> {
        self.roster.current()
    }

    /// Combat state of the presented character.
    #[must_use]
    pub fn combat(&self) -> &CombatState {
        &self.combat
    }

    /// Underlying store.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Progress of the presented character's activity.
    #[must_use]
    pub fn activity_progress(&self, now: Millis) -> Option<ActivityProgress> {
        let character = self.roster.current()?;
        ActivityEngine::new(&self.catalog).progress(character, now)
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Creates a character and saves.
    pub fn create_character(
        &mut self,
        name: &str,
        class: CharacterClass,
        now: Millis,
    ) -> SessionResult<CharacterId> {
        let id = self.roster.create(name, class, &self.catalog, now)?;
        self.persist();
        Ok(id)
    }

    /// Deletes a character and saves.
    pub fn delete_character(&mut self, id: CharacterId) -> SessionResult<()> {
        let presented = self.roster.current_id() == Some(id);
        self.roster.delete(id)?;
        if presented {
            self.reset_combat();
        }
        self.persist();
        Ok(())
    }

    /// Presents a character after replaying the time it spent away.
    pub fn play_character(
        &mut self,
        id: CharacterId,
        now: Millis,
    ) -> SessionResult<Option<CatchUpReport>> {
        let switching = self.roster.current_id() != Some(id);
        self.roster.select(id)?;
        if switching {
            self.reset_combat();
        }

        let engine = ActivityEngine::new(&self.catalog);
        let report = self
            .roster
            .get_mut(id)
            .and_then(|character| engine.catch_up(character, &mut self.loot, now));
        if report.is_some() {
            self.persist();
        }
        self.last_autosave = now;
        Ok(report)
    }

    /// Replays time away for every character.
    pub fn catch_up_all(&mut self, now: Millis) -> Vec<(CharacterId, CatchUpReport)> {
        let engine = ActivityEngine::new(&self.catalog);
        let loot = &mut self.loot;
        self.roster
            .characters_mut()
            .iter_mut()
            .filter_map(|character| {
                let id = character.id;
                engine.catch_up(character, loot, now).map(|report| (id, report))
            })
            .collect()
    }

    // ========================================================================
    // Activities
    // ========================================================================

    /// Starts an activity for the presented character.
    pub fn start_activity(
        &mut self,
        kind: ActivityKind,
        id: &ItemKind,
        quantity: u32,
        now: Millis,
    ) -> SessionResult<StartOutcome> {
        let character = self.roster.current_mut().ok_or(SessionError::NoCharacter)?;
        let outcome = ActivityEngine::new(&self.catalog).start(character, kind, id, quantity, now)?;
        if outcome != StartOutcome::AlreadyRunning {
            self.last_autosave = now;
            self.persist();
        }
        Ok(outcome)
    }

    /// Stops the presented character's activity.
    pub fn stop_activity(&mut self) -> SessionResult<()> {
        let character = self.roster.current_mut().ok_or(SessionError::NoCharacter)?;
        if ActivityEngine::new(&self.catalog).stop(character).is_some() {
            self.persist();
        }
        Ok(())
    }

    // ========================================================================
    // Live tick
    // ========================================================================

    /// Advances the presented character's activity, then its fight.
    pub fn tick(&mut self, now: Millis) -> SessionTick {
        let Some(character) = self.roster.current_mut() else {
            return SessionTick {
                activity: TickOutcome::Idle,
                combat: CombatTick::default(),
                saved: false,
            };
        };

        let activity = ActivityEngine::new(&self.catalog).tick(character, &mut self.loot, now);
        let running = character.current_activity.is_some();
        let combat = CombatEngine::new(&self.catalog, &self.config.combat).tick(
            &mut self.combat,
            character,
            &mut self.rng,
            now,
        );

        let changed = matches!(
            activity,
            TickOutcome::CycleCompleted(_) | TickOutcome::Stopped(_)
        ) || combat.victory_gold.is_some()
            || combat.ended.is_some();
        let autosave_due =
            running && elapsed_since(self.last_autosave, now) >= self.config.autosave_interval_ms();

        let saved = if changed || autosave_due {
            if autosave_due {
                debug!("Autosave");
            }
            self.last_autosave = now;
            self.persist()
        } else {
            false
        };

        SessionTick {
            activity,
            combat,
            saved,
        }
    }

    // ========================================================================
    // Combat
    // ========================================================================

    /// Starts a fight for the presented character.
    pub fn start_combat(&mut self, now: Millis) -> SessionResult<()> {
        let character = self.roster.current_mut().ok_or(SessionError::NoCharacter)?;
        CombatEngine::new(&self.catalog, &self.config.combat).start(
            &mut self.combat,
            character,
            &mut self.rng,
            now,
        )?;
        Ok(())
    }

    /// Retreats from the running fight.
    pub fn retreat(&mut self, now: Millis) -> SessionResult<CombatSummary> {
        let summary =
            CombatEngine::new(&self.catalog, &self.config.combat).retreat(&mut self.combat, now)?;
        self.persist();
        Ok(summary)
    }

    /// Clears the fight back to idle.
    pub fn reset_combat(&mut self) {
        CombatEngine::new(&self.catalog, &self.config.combat).reset(&mut self.combat);
    }

    // ========================================================================
    // Equipment and shop
    // ========================================================================

    /// Equips an inventory instance into `slot`.
    pub fn equip(&mut self, id: InstanceId, slot: EquipmentSlot) -> SessionResult<()> {
        let character = self.roster.current_mut().ok_or(SessionError::NoCharacter)?;
        equip_instance(character, &self.catalog, id, slot)?;
        self.persist();
        Ok(())
    }

    /// Equips the first inventory instance of `kind`.
    pub fn equip_kind(&mut self, kind: &ItemKind) -> SessionResult<()> {
        let character = self.roster.current_mut().ok_or(SessionError::NoCharacter)?;
        equip_first(character, &self.catalog, kind)?;
        self.persist();
        Ok(())
    }

    /// Returns the item in `slot` to the inventory.
    pub fn unequip(&mut self, slot: EquipmentSlot) -> SessionResult<()> {
        let character = self.roster.current_mut().ok_or(SessionError::NoCharacter)?;
        unequip(character, slot)?;
        self.persist();
        Ok(())
    }

    /// Sells the first instance of `kind`.
    pub fn sell_item(&mut self, kind: &ItemKind) -> SessionResult<u64> {
        let character = self.roster.current_mut().ok_or(SessionError::NoCharacter)?;
        let gold = sell_item(character, &self.catalog, kind)?;
        self.persist();
        Ok(gold)
    }

    /// Sells one specific instance.
    pub fn sell_instance(&mut self, id: InstanceId) -> SessionResult<u64> {
        let character = self.roster.current_mut().ok_or(SessionError::NoCharacter)?;
        let gold = sell_instance(character, &self.catalog, id)?;
        self.persist();
        Ok(gold)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Writes the roster now. Returns whether the write succeeded.
    pub fn persist(&mut self) -> bool {
        save_roster(&mut self.gateway, &self.roster)
    }

    /// Drops the stored roster and starts over with an empty one.
    pub fn wipe(&mut self) {
        if let Err(e) = self.gateway.clear() {
            error!("Failed to clear save: {}", e);
        }
        self.roster = Roster::new();
        self.reset_combat();
        info!("Save wiped");
    }
}
