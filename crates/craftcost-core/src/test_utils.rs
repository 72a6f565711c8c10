//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these
//! helpers are available in unit tests, integration tests, and benchmarks
//! (via the `test-utils` feature).

use crate::catalog::{Discipline, Ingredient, RawRecipe, RecipeCatalog};
use crate::id::{ItemId, RecipeId};
use crate::item::{ItemMetadata, MetadataTable, Rarity};
use crate::price::{Copper, Listing, PriceTable};

// ===========================================================================
// Item ids
// ===========================================================================

// Weaponsmithing chain.
pub fn ore() -> ItemId {
    ItemId(19701)
}
pub fn ingot() -> ItemId {
    ItemId(19684)
}
pub fn wood_log() -> ItemId {
    ItemId(19725)
}
pub fn plank() -> ItemId {
    ItemId(19712)
}
pub fn hilt() -> ItemId {
    ItemId(12852)
}
pub fn blade() -> ItemId {
    ItemId(12877)
}
pub fn sword() -> ItemId {
    ItemId(10702)
}

// Forge materials.
pub fn clover() -> ItemId {
    ItemId(19675)
}
pub fn coin() -> ItemId {
    ItemId(19976)
}
pub fn ecto() -> ItemId {
    ItemId(19721)
}
pub fn shard() -> ItemId {
    ItemId(20796)
}
pub fn stone() -> ItemId {
    ItemId(20799)
}

// ===========================================================================
// Recipe constructors
// ===========================================================================

/// A plain discipline recipe with the given ingredients.
pub fn recipe(id: u32, output: ItemId, output_count: u32, ingredients: Vec<Ingredient>) -> RawRecipe {
    RawRecipe {
        id: RecipeId(id),
        output_item: output,
        output_count,
        ingredients,
        prerequisite: None,
        min_rating: 0,
        disciplines: vec![Discipline::Weaponsmith],
        upgrade_id: None,
        daily_cap: None,
        weekly_cap: None,
    }
}

/// sword <- hilt + blade; hilt <- 2 plank; blade <- 3 ingot;
/// plank <- 2 log; ingot <- 2 ore.
pub fn weapon_catalog() -> RecipeCatalog {
    RecipeCatalog::new(vec![
        recipe(
            1,
            sword(),
            1,
            vec![Ingredient::item(hilt(), 1), Ingredient::item(blade(), 1)],
        ),
        recipe(2, hilt(), 1, vec![Ingredient::item(plank(), 2)]),
        recipe(3, blade(), 1, vec![Ingredient::item(ingot(), 3)]),
        recipe(4, plank(), 1, vec![Ingredient::item(wood_log(), 2)]),
        recipe(5, ingot(), 1, vec![Ingredient::item(ore(), 2)]),
    ])
}

/// The bulk clover forge recipe at the given tier (77 or 38 per craft).
pub fn clover_recipe(count: u32) -> RawRecipe {
    let mut r = recipe(
        9,
        clover(),
        count,
        vec![
            Ingredient::item(coin(), 1),
            Ingredient::item(ecto(), 1),
            Ingredient::currency(shard(), 1),
            Ingredient::item(stone(), 1),
        ],
    );
    r.disciplines = vec![Discipline::MysticForge];
    r
}

// ===========================================================================
// Price and metadata tables
// ===========================================================================

pub fn prices(entries: &[(ItemId, Copper, Copper)]) -> PriceTable {
    entries
        .iter()
        .map(|&(id, buy, sell)| (id, Listing::new(buy, sell)))
        .collect()
}

pub fn weapon_prices() -> PriceTable {
    prices(&[
        (ore(), 80, 75),
        (ingot(), 180, 160),
        (wood_log(), 30, 25),
        (plank(), 70, 60),
        (hilt(), 200, 150),
        (blade(), 600, 550),
        (sword(), 1500, 1200),
    ])
}

pub fn named(id: ItemId, name: &str) -> (ItemId, ItemMetadata) {
    (
        id,
        ItemMetadata {
            name: name.to_string(),
            icon: format!("{}.png", name.replace(' ', "_").to_lowercase()),
            rarity: Rarity::Fine,
        },
    )
}

pub fn weapon_metadata() -> MetadataTable {
    [
        named(ore(), "Iron Ore"),
        named(ingot(), "Iron Ingot"),
        named(wood_log(), "Elder Wood Log"),
        named(plank(), "Elder Wood Plank"),
        named(hilt(), "Small Sword Hilt"),
        named(blade(), "Iron Sword Blade"),
        named(sword(), "Iron Sword"),
    ]
    .into_iter()
    .collect()
}
