//! Roster persistence.
//!
//! This module provides:
//! - The `PersistenceGateway` blob-store seam
//! - A file store with atomic writes (temp file + rename)
//! - An in-memory store for tests and ephemeral sessions
//! - Roster load/save helpers that repair on load and never propagate a
//!   failed write

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use idle_common::{PersistenceError, PersistenceResult};
use idle_gameplay::{decode_roster, encode_roster, Catalog, LootResolver, Roster};
use tracing::{debug, error, info, warn};

/// A key-value style store holding one roster blob.
pub trait PersistenceGateway {
    /// Reads the stored blob, `None` when nothing was ever saved.
    fn load(&mut self) -> PersistenceResult<Option<String>>;

    /// Replaces the stored blob.
    fn save(&mut self, blob: &str) -> PersistenceResult<()>;

    /// Removes the stored blob.
    fn clear(&mut self) -> PersistenceResult<()>;
}

// ============================================================================
// File store
// ============================================================================

/// Stores the roster as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store at `path`. Nothing is touched until the first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Save file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Performs atomic write (temp file + rename).
    fn atomic_write(&self, blob: &str) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(blob.as_bytes())?;
            writer.flush()?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            PersistenceError::Io(e)
        })?;

        debug!("Atomic write complete: {}", self.path.display());
        Ok(())
    }
}

impl PersistenceGateway for FileStore {
    fn load(&mut self) -> PersistenceResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, blob: &str) -> PersistenceResult<()> {
        self.atomic_write(blob)
    }

    fn clear(&mut self) -> PersistenceResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Cleared save {}", self.path.display());
                Ok(())
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Memory store
// ============================================================================

/// Keeps the blob in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<String>,
    saves: usize,
    fail_writes: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `blob`.
    #[must_use]
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
            ..Self::default()
        }
    }

    /// Makes every subsequent save fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Current blob.
    #[must_use]
    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Number of successful saves.
    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl PersistenceGateway for MemoryStore {
    fn load(&mut self) -> PersistenceResult<Option<String>> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &str) -> PersistenceResult<()> {
        if self.fail_writes {
            return Err(PersistenceError::Io(io::Error::other(
                "memory store is read-only",
            )));
        }
        self.blob = Some(blob.to_owned());
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> PersistenceResult<()> {
        self.blob = None;
        Ok(())
    }
}

// ============================================================================
// Roster helpers
// ============================================================================

/// Loads and repairs the roster.
///
/// Absent, unreadable, or unrepairable data yields an empty roster.
pub fn load_roster(
    gateway: &mut impl PersistenceGateway,
    catalog: &Catalog,
    loot: &mut LootResolver,
) -> Roster {
    let blob = match gateway.load() {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            info!("No saved roster, starting fresh");
            return Roster::new();
        },
        Err(e) => {
            error!("Failed to read saved roster: {}", e);
            return Roster::new();
        },
    };

    match decode_roster(&blob, catalog, loot) {
        Ok((roster, _)) => roster,
        Err(e) => {
            warn!("Saved roster unusable, starting fresh: {}", e);
            Roster::new()
        },
    }
}

/// Writes the roster. Failures are logged and reported, never retried.
pub fn save_roster(gateway: &mut impl PersistenceGateway, roster: &Roster) -> bool {
    let result = encode_roster(roster).and_then(|blob| gateway.save(&blob));
    match result {
        Ok(()) => {
            debug!("Saved roster ({} characters)", roster.len());
            true
        },
        Err(e) => {
            error!("Failed to save roster: {}", e);
            false
        },
    }
}
