//! # Idle Common
//!
//! Common types, utilities, and shared abstractions for Idle Quest.
//!
//! This crate provides foundational types used across all subsystems:
//! - ID types (CharacterId, InstanceId)
//! - Wall-clock millisecond timestamps
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod time;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::time::*;
}

pub use prelude::*;
