//! The recipe catalog: raw recipes as fetched from the item store, plus the
//! lookup indexes the flattener needs to avoid linear scans.
//!
//! Recipes are immutable once loaded. The catalog builds two indexes up
//! front: output-item-id to recipe, and upgrade-id to the recipe that
//! produces that upgrade.

use crate::id::{ItemId, RecipeId, UpgradeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What kind of thing an ingredient refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientKind {
    /// A regular item; craftable if some recipe outputs it.
    Item,
    /// A wallet currency. Never expanded.
    Currency,
    /// A guild upgrade; an alias for the recipe that unlocks it.
    GuildUpgrade,
}

/// One ingredient slot of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: ItemId,
    pub kind: IngredientKind,
    pub count: u32,
}

impl Ingredient {
    pub fn item(id: ItemId, count: u32) -> Self {
        Self {
            id,
            kind: IngredientKind::Item,
            count,
        }
    }

    pub fn currency(id: ItemId, count: u32) -> Self {
        Self {
            id,
            kind: IngredientKind::Currency,
            count,
        }
    }

    pub fn guild_upgrade(id: ItemId, count: u32) -> Self {
        Self {
            id,
            kind: IngredientKind::GuildUpgrade,
            count,
        }
    }
}

/// Crafting disciplines that can learn a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    Armorsmith,
    Artificer,
    Chef,
    Huntsman,
    Jeweler,
    Leatherworker,
    Scribe,
    Tailor,
    Weaponsmith,
    /// Forge-style recipes with no discipline requirement.
    MysticForge,
}

/// A recipe as fetched from the backend store. Source of truth; immutable
/// once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecipe {
    pub id: RecipeId,
    pub output_item: ItemId,
    pub output_count: u32,
    pub ingredients: Vec<Ingredient>,
    /// Recipe that must be learned first (e.g. a refinement unlock).
    #[serde(default)]
    pub prerequisite: Option<RecipeId>,
    #[serde(default)]
    pub min_rating: u32,
    #[serde(default)]
    pub disciplines: Vec<Discipline>,
    /// Set when this recipe produces a guild upgrade rather than a plain item.
    #[serde(default)]
    pub upgrade_id: Option<UpgradeId>,
    #[serde(default)]
    pub daily_cap: Option<u32>,
    #[serde(default)]
    pub weekly_cap: Option<u32>,
}

/// The full set of known recipes, indexed by output item id and upgrade id.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<RawRecipe>,
    by_output: HashMap<ItemId, usize>,
    by_upgrade: HashMap<UpgradeId, usize>,
}

impl RecipeCatalog {
    /// Build a catalog from raw recipes. When two recipes output the same
    /// item the first wins; the backend store occasionally carries
    /// discovery-duplicate rows and dropping them is the right recovery.
    pub fn new(recipes: Vec<RawRecipe>) -> Self {
        let mut by_output = HashMap::with_capacity(recipes.len());
        let mut by_upgrade = HashMap::new();

        for (idx, recipe) in recipes.iter().enumerate() {
            if let Some(prev) = by_output.insert(recipe.output_item, idx) {
                by_output.insert(recipe.output_item, prev);
                tracing::debug!(
                    item = recipe.output_item.0,
                    recipe = recipe.id.0,
                    "duplicate recipe for output item, keeping first"
                );
            }
            if let Some(upgrade) = recipe.upgrade_id {
                by_upgrade.entry(upgrade).or_insert(idx);
            }
        }

        Self {
            recipes,
            by_output,
            by_upgrade,
        }
    }

    /// The recipe whose output is `item`, if any.
    pub fn recipe_for_item(&self, item: ItemId) -> Option<&RawRecipe> {
        self.by_output.get(&item).map(|&idx| &self.recipes[idx])
    }

    /// The recipe that produces guild upgrade `upgrade`, if any.
    pub fn recipe_for_upgrade(&self, upgrade: UpgradeId) -> Option<&RawRecipe> {
        self.by_upgrade.get(&upgrade).map(|&idx| &self.recipes[idx])
    }

    /// True if some recipe outputs `item`.
    pub fn is_craftable(&self, item: ItemId) -> bool {
        self.by_output.contains_key(&item)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawRecipe> {
        self.recipes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: u32, output: u32, ingredients: Vec<Ingredient>) -> RawRecipe {
        RawRecipe {
            id: RecipeId(id),
            output_item: ItemId(output),
            output_count: 1,
            ingredients,
            prerequisite: None,
            min_rating: 0,
            disciplines: vec![Discipline::Weaponsmith],
            upgrade_id: None,
            daily_cap: None,
            weekly_cap: None,
        }
    }

    #[test]
    fn index_by_output_item() {
        let catalog = RecipeCatalog::new(vec![
            recipe(1, 100, vec![Ingredient::item(ItemId(10), 2)]),
            recipe(2, 200, vec![Ingredient::item(ItemId(100), 3)]),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.recipe_for_item(ItemId(100)).unwrap().id,
            RecipeId(1)
        );
        assert!(catalog.recipe_for_item(ItemId(999)).is_none());
        assert!(catalog.is_craftable(ItemId(200)));
        assert!(!catalog.is_craftable(ItemId(10)));
    }

    #[test]
    fn duplicate_output_keeps_first() {
        let catalog = RecipeCatalog::new(vec![
            recipe(1, 100, vec![Ingredient::item(ItemId(10), 2)]),
            recipe(2, 100, vec![Ingredient::item(ItemId(11), 5)]),
        ]);

        assert_eq!(
            catalog.recipe_for_item(ItemId(100)).unwrap().id,
            RecipeId(1)
        );
    }

    #[test]
    fn index_by_upgrade_id() {
        let mut upgrade_recipe = recipe(3, 300, vec![Ingredient::item(ItemId(10), 1)]);
        upgrade_recipe.upgrade_id = Some(UpgradeId(55));

        let catalog = RecipeCatalog::new(vec![upgrade_recipe]);
        assert_eq!(
            catalog.recipe_for_upgrade(UpgradeId(55)).unwrap().id,
            RecipeId(3)
        );
        assert!(catalog.recipe_for_upgrade(UpgradeId(56)).is_none());
    }

    #[test]
    fn serde_defaults_for_optional_fields() {
        let json = r#"{
            "id": 7,
            "output_item": 42,
            "output_count": 5,
            "ingredients": [{"id": 10, "kind": "item", "count": 2}]
        }"#;
        let recipe: RawRecipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.output_count, 5);
        assert!(recipe.prerequisite.is_none());
        assert!(recipe.disciplines.is_empty());
        assert!(recipe.daily_cap.is_none());
    }
}
