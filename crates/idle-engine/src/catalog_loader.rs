//! Catalog asset loading.
//!
//! This module provides:
//! - Loading a full catalog from a TOML file
//! - Validation on load
//! - Fallback to the built-in catalog when no override is configured or the
//!   override is unusable

use std::fs;
use std::path::{Path, PathBuf};

use idle_gameplay::{Catalog, CatalogError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during catalog loading.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    /// File not found.
    #[error("Catalog file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read file.
    #[error("Failed to read catalog file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse catalog TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Parsed but inconsistent.
    #[error("Catalog validation error: {0}")]
    ValidationError(#[from] CatalogError),
}

/// Result type for catalog loading operations.
pub type CatalogLoadResult<T> = Result<T, CatalogLoadError>;

/// Loads and validates a catalog file.
pub fn load_catalog(path: impl AsRef<Path>) -> CatalogLoadResult<Catalog> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CatalogLoadError::NotFound(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;
    let catalog: Catalog = toml::from_str(&contents)?;
    catalog.validate()?;

    debug!(
        "Parsed catalog: {} gathering, {} processing, {} enemies, {} rarities",
        catalog.gathering.len(),
        catalog.processing.len(),
        catalog.enemies.len(),
        catalog.rarities.len()
    );
    Ok(catalog)
}

/// Resolves the catalog for a session.
///
/// Uses the override at `path` when given and valid, the built-in catalog
/// otherwise.
#[must_use]
pub fn resolve_catalog(path: Option<&Path>) -> Catalog {
    let Some(path) = path else {
        info!("Using built-in catalog");
        return Catalog::standard();
    };

    match load_catalog(path) {
        Ok(catalog) => {
            info!("Loaded catalog from {}", path.display());
            catalog
        },
        Err(e) => {
            warn!("{e}; falling back to built-in catalog");
            Catalog::standard()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idle_gameplay::{ItemKind, SkillKind};
    use tempfile::TempDir;

    const SMALL_CATALOG: &str = r#"
[[classes]]
class = "warrior"
name = "Warrior"
base_hp = 150
base_damage = 12

[[classes]]
class = "ranger"
name = "Ranger"
base_hp = 100
base_damage = 15

[[classes]]
class = "mage"
name = "Mage"
base_hp = 80
base_damage = 20

[[rarities]]
rarity = "common"
name = "Common"
multiplier = 1.0
weight = 3.0
stat_count = 0

[[rarities]]
rarity = "rare"
name = "Rare"
multiplier = 1.5
weight = 1.0
stat_count = 1

[[stat_pools]]
slot = "weapon"
stats = [{ stat = "strength", min = 1, max = 4 }]

[[equipment]]
item = "bronzeSword"
damage = 6
defense = 0

[[enemies]]
name = "Rat"
hp_multiplier = 0.5
damage_multiplier = 0.5
defense_multiplier = 0.0
gold_reward = 2

[[gathering]]
id = "copper"
name = "Mine Copper"
resource_name = "Copper"
skill = "mining"
duration_ms = 4000
xp = 12

[[processing]]
id = "bronzeSword"
name = "Forge Bronze Sword"
resource_name = "Bronze Sword"
skill = "forging"
duration_ms = 8000
xp = 30
equipment_slot = "weapon"
sell_value = 25
requires = [{ item = "copper", quantity = 3 }]
"#;

    fn write(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("catalog.toml");
        fs::write(&path, contents).expect("write catalog");
        path
    }

    #[test]
    fn test_parse_toml_catalog() {
        let dir = TempDir::new().expect("temp dir");
        let path = write(&dir, SMALL_CATALOG);

        let catalog = load_catalog(&path).expect("load");
        let copper = catalog.gathering(&ItemKind::new("copper")).expect("copper");
        assert_eq!(copper.skill, SkillKind::Mining);
        assert_eq!(copper.sell_value, 1);

        let sword = catalog.recipe(&ItemKind::new("bronzeSword")).expect("sword");
        assert!(sword.yields_equipment());
        assert_eq!(sword.requires[0].quantity, 3);
        assert_eq!(catalog.rarities.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_catalog("/nonexistent/catalog.toml"),
            Err(CatalogLoadError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_catalog_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let broken = SMALL_CATALOG.replace("duration_ms = 4000", "duration_ms = 0");
        let path = write(&dir, &broken);

        assert!(matches!(
            load_catalog(&path),
            Err(CatalogLoadError::ValidationError(CatalogError::ZeroDuration(_)))
        ));
    }

    #[test]
    fn test_resolve_falls_back_to_standard() {
        let dir = TempDir::new().expect("temp dir");
        let path = write(&dir, "this is not a catalog");

        assert_eq!(resolve_catalog(Some(path.as_path())), Catalog::standard());
        assert_eq!(resolve_catalog(None), Catalog::standard());
    }

    #[test]
    fn test_resolve_uses_override() {
        let dir = TempDir::new().expect("temp dir");
        let path = write(&dir, SMALL_CATALOG);

        let catalog = resolve_catalog(Some(path.as_path()));
        assert!(catalog.gathering(&ItemKind::new("copper")).is_some());
        assert!(catalog.gathering(&ItemKind::new("sticks")).is_none());
    }
}
