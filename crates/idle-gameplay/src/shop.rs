//! Selling items for gold.

use idle_common::InstanceId;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Catalog, ItemKind, DEFAULT_EQUIPMENT_SELL_VALUE, DEFAULT_SELL_VALUE};
use crate::character::Character;

/// Shop error types.
#[derive(Debug, Error)]
pub enum ShopError {
    /// The shop does not buy this kind
    #[error("Cannot sell unknown item {0}")]
    UnknownItem(ItemKind),
    /// No instance of the kind held
    #[error("No {0} to sell")]
    KindNotFound(ItemKind),
    /// Instance not held
    #[error("Item instance {0} not in inventory")]
    InstanceNotFound(InstanceId),
}

/// Result type for shop operations.
pub type ShopResult<T> = Result<T, ShopError>;

/// Sells the first held instance of `kind` at its flat price.
///
/// Returns the gold received.
pub fn sell_item(character: &mut Character, catalog: &Catalog, kind: &ItemKind) -> ShopResult<u64> {
    let price = catalog
        .sell_value(kind)
        .ok_or_else(|| ShopError::UnknownItem(kind.clone()))?;
    let price = if price == 0 { DEFAULT_SELL_VALUE } else { price };

    character
        .inventory
        .remove_first(kind)
        .map_err(|_| ShopError::KindNotFound(kind.clone()))?;
    character.gold += price;
    debug!("{} sold {} for {} gold", character.name, kind, price);
    Ok(price)
}

/// Sells a crafted instance at `ceil(sell value × rarity multiplier)`.
///
/// Returns the gold received.
pub fn sell_instance(character: &mut Character, catalog: &Catalog, id: InstanceId) -> ShopResult<u64> {
    let item = character
        .inventory
        .get(id)
        .ok_or(ShopError::InstanceNotFound(id))?;
    let recipe = catalog
        .recipe(&item.kind)
        .ok_or_else(|| ShopError::UnknownItem(item.kind.clone()))?;
    let base = recipe
        .sell_value
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_EQUIPMENT_SELL_VALUE);
    let price = (base as f64 * catalog.rarity_multiplier(item.rarity)).ceil() as u64;

    let item = character
        .inventory
        .remove_instance(id)
        .map_err(|_| ShopError::InstanceNotFound(id))?;
    character.gold += price;
    debug!(
        "{} sold {} {} for {} gold",
        character.name, item.rarity, item.kind, price
    );
    Ok(price)
}
