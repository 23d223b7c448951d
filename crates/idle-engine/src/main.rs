//! # Idle Quest
//!
//! Headless runner: loads the roster, replays offline time, then ticks the
//! presented character at the configured interval.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use idle_common::{now_millis, MILLIS_PER_SECOND};
use idle_engine::{resolve_catalog, EngineConfig, FileStore, GameSession, Ticker, CONFIG_FILE};
use idle_gameplay::{ActivityKind, CharacterClass, ItemKind, TickOutcome};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("idle=info".parse()?))
        .init();

    info!("Idle Quest starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = EngineConfig::load_from(&config_path);

    run(config)?;

    info!("Idle Quest shutdown complete");
    Ok(())
}

/// Opens the session and drives the live loop.
fn run(config: EngineConfig) -> Result<()> {
    let catalog = resolve_catalog(config.catalog_path.as_deref());
    let store = FileStore::new(&config.save_path);
    let run_for = config.run_for_secs.map(|s| s.saturating_mul(MILLIS_PER_SECOND));
    let mut ticker = Ticker::new(config.tick_interval_ms);

    let started = now_millis();
    let mut session = GameSession::open(config, catalog, store, started);

    let presented = session.roster().current_id().or_else(|| {
        session
            .roster()
            .characters()
            .first()
            .map(|character| character.id)
    });
    let id = match presented {
        Some(id) => id,
        None => {
            let id = session.create_character("Adventurer", CharacterClass::Warrior, started)?;
            info!("Created a starter character");
            id
        },
    };

    if let Some(report) = session.play_character(id, started)? {
        info!(
            "Welcome back: {} cycles of {} ({} XP)",
            report.cycles_applied, report.activity_id, report.xp
        );
    }
    if session.current().is_some_and(|c| c.current_activity.is_none()) {
        session.start_activity(ActivityKind::Gathering, &ItemKind::new("sticks"), 1, started)?;
    }

    loop {
        ticker.begin();
        let now = now_millis();

        let tick = session.tick(now);
        if let TickOutcome::CycleCompleted(report) = &tick.activity {
            debug!("{} cycle done (+{} XP)", report.activity_id, report.xp);
        }
        if let Some(progress) = session.activity_progress(now) {
            debug!(
                "{} {:.0}% ({}/{})",
                progress.activity_id,
                progress.fraction * 100.0,
                progress.completed,
                progress.quantity
            );
        }

        if run_for.is_some_and(|limit| now.saturating_sub(started) >= limit) {
            break;
        }
        ticker.sleep_remainder();
    }

    info!(
        "Ran {} ticks (avg {:.2} ms of work)",
        ticker.ticks(),
        ticker.average_work_ms()
    );
    session.persist();
    Ok(())
}
