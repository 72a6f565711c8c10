//! Serde data file structs for catalog, price, and decoration files.
//!
//! These structs define the on-disk format as it arrives from the backend
//! item/recipe store, which mirrors the upstream trading API: numeric ids,
//! `PascalCase` ingredient types, and per-side price objects. They are
//! deserialized from RON or JSON and then resolved into core types by the
//! loader.

use craftcost_core::catalog::{Discipline, Ingredient, IngredientKind, RawRecipe};
use craftcost_core::id::{ItemId, RecipeId, UpgradeId};
use craftcost_core::price::{Copper, Listing};
use serde::Deserialize;

fn default_one() -> u32 {
    1
}

// ===========================================================================
// Recipes
// ===========================================================================

/// One recipe row as stored by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub id: u32,
    pub output_item_id: u32,
    #[serde(default = "default_one")]
    pub output_item_count: u32,
    #[serde(default)]
    pub ingredients: Vec<IngredientData>,
    #[serde(default)]
    pub prerequisite_recipe_id: Option<u32>,
    #[serde(default)]
    pub min_rating: u32,
    #[serde(default)]
    pub disciplines: Vec<String>,
    #[serde(default)]
    pub output_upgrade_id: Option<u32>,
    #[serde(default)]
    pub daily_purchase_cap: Option<u32>,
    #[serde(default)]
    pub weekly_purchase_cap: Option<u32>,
}

/// One ingredient slot. The upstream store omits `type` for plain items.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientData {
    pub id: u32,
    pub count: u32,
    #[serde(rename = "type", default)]
    pub kind: IngredientKindData,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum IngredientKindData {
    #[default]
    Item,
    Currency,
    GuildUpgrade,
}

impl From<IngredientKindData> for IngredientKind {
    fn from(kind: IngredientKindData) -> Self {
        match kind {
            IngredientKindData::Item => IngredientKind::Item,
            IngredientKindData::Currency => IngredientKind::Currency,
            IngredientKindData::GuildUpgrade => IngredientKind::GuildUpgrade,
        }
    }
}

/// Parse a discipline name as the store spells it.
pub fn parse_discipline(name: &str) -> Option<Discipline> {
    match name {
        "Armorsmith" => Some(Discipline::Armorsmith),
        "Artificer" => Some(Discipline::Artificer),
        "Chef" => Some(Discipline::Chef),
        "Huntsman" => Some(Discipline::Huntsman),
        "Jeweler" => Some(Discipline::Jeweler),
        "Leatherworker" => Some(Discipline::Leatherworker),
        "Scribe" => Some(Discipline::Scribe),
        "Tailor" => Some(Discipline::Tailor),
        "Weaponsmith" => Some(Discipline::Weaponsmith),
        "MysticForge" => Some(Discipline::MysticForge),
        _ => None,
    }
}

impl RecipeData {
    /// Resolve this row into a core recipe. Fails on a discipline name the
    /// store should never emit.
    pub fn into_recipe(self) -> Result<RawRecipe, String> {
        let mut disciplines = Vec::with_capacity(self.disciplines.len());
        for name in &self.disciplines {
            match parse_discipline(name) {
                Some(d) => disciplines.push(d),
                None => return Err(name.clone()),
            }
        }
        Ok(RawRecipe {
            id: RecipeId(self.id),
            output_item: ItemId(self.output_item_id),
            output_count: self.output_item_count,
            ingredients: self
                .ingredients
                .into_iter()
                .map(|i| Ingredient {
                    id: ItemId(i.id),
                    kind: i.kind.into(),
                    count: i.count,
                })
                .collect(),
            prerequisite: self.prerequisite_recipe_id.map(RecipeId),
            min_rating: self.min_rating,
            disciplines,
            upgrade_id: self.output_upgrade_id.map(UpgradeId),
            daily_cap: self.daily_purchase_cap,
            weekly_cap: self.weekly_purchase_cap,
        })
    }
}

// ===========================================================================
// Prices
// ===========================================================================

/// One market listing row, trading-API shaped.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceData {
    pub id: u32,
    #[serde(default)]
    pub buys: Option<PriceSide>,
    #[serde(default)]
    pub sells: Option<PriceSide>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PriceSide {
    pub unit_price: Copper,
}

impl PriceData {
    pub fn into_entry(self) -> (ItemId, Listing) {
        (
            ItemId(self.id),
            Listing {
                buy: self.buys.map(|s| s.unit_price),
                sell: self.sells.map(|s| s.unit_price),
            },
        )
    }
}

// ===========================================================================
// Decorations
// ===========================================================================

/// One guild-decoration substitution: the upgrade maps onto an item.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DecorationData {
    pub upgrade_id: u32,
    pub item_id: u32,
}

// ===========================================================================
// Tests
// ===========================================================================
