//! # Idle Engine
//!
//! Runtime for Idle Quest.
//!
//! This crate ties the gameplay core to the outside world:
//! - Configuration from `idle.toml`
//! - Catalog overrides loaded from TOML
//! - Roster persistence behind the `PersistenceGateway` seam
//! - The game session (character switching, live tick, autosave)
//! - Fixed-interval tick pacing for the headless binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog_loader;
pub mod config;
pub mod persistence;
pub mod session;
pub mod timing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog_loader::*;
    pub use crate::config::*;
    pub use crate::persistence::*;
    pub use crate::session::*;
    pub use crate::timing::*;
}

pub use prelude::*;
