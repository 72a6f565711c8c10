//! Item display metadata: names, icons, rarities.
//!
//! The cost tree carries enough metadata per node to render a breakdown
//! without consulting an external item store. Metadata is supplied by the
//! caller as a [`MetadataTable`]; items missing from the table get
//! [`ItemMetadata::placeholder`] values rather than failing.

use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Item rarity tiers, lowest to highest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Junk,
    #[default]
    Basic,
    Fine,
    Masterwork,
    Rare,
    Exotic,
    Ascended,
    Legendary,
}

/// Display metadata for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub name: String,
    /// Render hint for the UI layer; opaque to this crate.
    pub icon: String,
    #[serde(default)]
    pub rarity: Rarity,
}

impl ItemMetadata {
    /// Metadata for an item the caller knows nothing about.
    pub fn placeholder(id: ItemId) -> Self {
        Self {
            name: format!("item #{}", id.0),
            icon: String::new(),
            rarity: Rarity::default(),
        }
    }
}

/// Item id to metadata mapping, supplied by the caller.
pub type MetadataTable = HashMap<ItemId, ItemMetadata>;

/// Look up metadata for `id`, falling back to a placeholder.
pub fn metadata_or_placeholder(table: &MetadataTable, id: ItemId) -> ItemMetadata {
    table
        .get(&id)
        .cloned()
        .unwrap_or_else(|| ItemMetadata::placeholder(id))
}
