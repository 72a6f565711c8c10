use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node in a cost tree arena.
    pub struct CostNodeId;
}

/// Identifies an item. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identifies a recipe in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a guild upgrade. Upgrade ids live in a separate numbering
/// space from item ids; a guild-upgrade ingredient is really an alias for
/// the recipe that unlocks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UpgradeId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_equality() {
        let a = ItemId(19675);
        let b = ItemId(19675);
        let c = ItemId(19721);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ItemId(0), "ori_ore");
        map.insert(ItemId(1), "ori_ingot");
        assert_eq!(map[&ItemId(0)], "ori_ore");
    }

    #[test]
    fn upgrade_and_item_ids_are_distinct_types() {
        // Same raw value, different meaning. The type system keeps the two
        // numbering spaces from being mixed up.
        let item = ItemId(42);
        let upgrade = UpgradeId(42);
        assert_eq!(item.0, upgrade.0);
    }
}
