//! The graph flattener: turns the flat recipe catalog into per-item nested
//! component trees.
//!
//! A recipe's ingredient may itself be the output of another recipe,
//! possibly cyclically. Resolution recurses through the catalog carrying a
//! visited set of ancestor item ids along the current path. The set is
//! cloned per branch, never shared, so parallel branches cannot falsely
//! flag each other as cyclic.
//!
//! Cycle break is a first-class, logged, non-error outcome: crafting data
//! contains legitimate mutual-reference loops (the interchangeable essence
//! items convert into each other through forge recipes) that must not
//! recurse infinitely. A repeated ancestor id stays behind as an unexpanded
//! leaf. A fixed exclusion list additionally pins the known-reciprocal
//! pairs even when the current path is not literally cyclic.
//!
//! Resolved trees are memoized by output item id inside the [`Flattener`].
//! The memo is owned by the caller's flattener instance, not module state,
//! so independent catalogs can coexist; invalidation is an explicit
//! [`Flattener::clear`] when the underlying catalog is reloaded.

use crate::catalog::{Discipline, Ingredient, IngredientKind, RecipeCatalog};
use crate::id::{ItemId, RecipeId, UpgradeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Maps a guild upgrade onto the purchasable/craftable item backing it.
/// Some decorations have no unlock recipe but do correspond to an item.
pub type DecorationMap = HashMap<UpgradeId, ItemId>;

/// Item pairs that convert into each other through forge recipes.
/// Expanding one inside the other would just mirror the conversion loop,
/// so these stay unexpanded wherever the partner is already an ancestor.
const RECIPROCAL_PAIRS: [(ItemId, ItemId); 2] = [
    // Essences of luck: fine <-> masterwork, masterwork <-> rare.
    (ItemId(45175), ItemId(45176)),
    (ItemId(45176), ItemId(45177)),
];

fn reciprocal_partner_in(item: ItemId, ancestors: &HashSet<ItemId>) -> bool {
    RECIPROCAL_PAIRS.iter().any(|&(a, b)| {
        (item == a && ancestors.contains(&b)) || (item == b && ancestors.contains(&a))
    })
}

// ---------------------------------------------------------------------------
// Resolved tree model
// ---------------------------------------------------------------------------

/// A component left unexpanded: genuinely non-craftable (currency, raw
/// material) or deliberately cut (cycle, exclusion list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafComponent {
    pub id: ItemId,
    pub kind: IngredientKind,
    pub count: u32,
}

/// One resolved component: either a nested recipe tree or a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedComponent {
    Recipe(ResolvedNode),
    Leaf(LeafComponent),
}

impl ResolvedComponent {
    pub fn id(&self) -> ItemId {
        match self {
            ResolvedComponent::Recipe(node) => node.id,
            ResolvedComponent::Leaf(leaf) => leaf.id,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            ResolvedComponent::Recipe(node) => node.count,
            ResolvedComponent::Leaf(leaf) => leaf.count,
        }
    }
}

/// A recipe with every craftable component recursively replaced by that
/// component's own resolved tree.
///
/// `count` is edge-local: the quantity of this output consumed per craft of
/// the parent. Roots carry `count == 1`. Splicing a memoized tree under a
/// new parent overrides only `count`; the subtree is reused by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNode {
    pub id: ItemId,
    pub recipe: RecipeId,
    pub count: u32,
    pub output_count: u32,
    pub components: Vec<ResolvedComponent>,
    pub prerequisite: Option<RecipeId>,
    pub min_rating: u32,
    pub disciplines: Vec<Discipline>,
    pub upgrade_id: Option<UpgradeId>,
}

impl ResolvedNode {
    /// Depth-first check that `item` appears nowhere in this subtree below
    /// the root. Used by tests to assert the no-self-descendant invariant.
    pub fn contains_descendant(&self, item: ItemId) -> bool {
        self.components.iter().any(|c| match c {
            ResolvedComponent::Recipe(node) => node.id == item || node.contains_descendant(item),
            ResolvedComponent::Leaf(leaf) => leaf.id == item,
        })
    }
}

// ---------------------------------------------------------------------------
// Flattener
// ---------------------------------------------------------------------------

/// Resolves recipes into nested trees, memoizing by output item id.
#[derive(Debug, Default)]
pub struct Flattener {
    memo: HashMap<ItemId, ResolvedNode>,
}

impl Flattener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all memoized trees. Must be called when the underlying catalog
    /// changes; the memo does not observe catalog mutations.
    pub fn clear(&mut self) {
        self.memo.clear();
    }

    /// Number of memoized resolved trees.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Resolve every recipe in the catalog. Recipes whose component list
    /// resolves to empty (prerequisite-only rows with no ingredients)
    /// produce no explorable tree and are excluded from the result.
    pub fn flatten(
        &mut self,
        catalog: &RecipeCatalog,
        decorations: &DecorationMap,
    ) -> HashMap<ItemId, ResolvedNode> {
        let mut result = HashMap::with_capacity(catalog.len());
        for recipe in catalog.iter() {
            if let Some(node) = self.resolve(catalog, decorations, recipe.output_item) {
                result.insert(recipe.output_item, node);
            }
        }
        result
    }

    /// Resolve the recipe tree for a single output item. Returns `None`
    /// when no recipe outputs `item` or the recipe has no components.
    pub fn resolve(
        &mut self,
        catalog: &RecipeCatalog,
        decorations: &DecorationMap,
        item: ItemId,
    ) -> Option<ResolvedNode> {
        let ancestors = HashSet::new();
        self.resolve_inner(catalog, decorations, item, &ancestors)
    }

    fn resolve_inner(
        &mut self,
        catalog: &RecipeCatalog,
        decorations: &DecorationMap,
        item: ItemId,
        ancestors: &HashSet<ItemId>,
    ) -> Option<ResolvedNode> {
        if let Some(hit) = self.memo.get(&item) {
            return Some(hit.clone());
        }

        let recipe = catalog.recipe_for_item(item)?;
        if recipe.ingredients.is_empty() {
            return None;
        }

        // The path set for this node's components: every ancestor plus the
        // node itself. Cloned here, once per branch into the recursion.
        let mut path = ancestors.clone();
        path.insert(item);

        let components: Vec<ResolvedComponent> = recipe
            .ingredients
            .iter()
            .map(|ingredient| self.resolve_component(catalog, decorations, ingredient, &path))
            .collect();

        let node = ResolvedNode {
            id: item,
            recipe: recipe.id,
            count: 1,
            output_count: recipe.output_count,
            components,
            prerequisite: recipe.prerequisite,
            min_rating: recipe.min_rating,
            disciplines: recipe.disciplines.clone(),
            upgrade_id: recipe.upgrade_id,
        };
        self.memo.insert(item, node.clone());
        Some(node)
    }

    fn resolve_component(
        &mut self,
        catalog: &RecipeCatalog,
        decorations: &DecorationMap,
        ingredient: &Ingredient,
        path: &HashSet<ItemId>,
    ) -> ResolvedComponent {
        match ingredient.kind {
            IngredientKind::Currency => ResolvedComponent::Leaf(LeafComponent {
                id: ingredient.id,
                kind: IngredientKind::Currency,
                count: ingredient.count,
            }),
            IngredientKind::GuildUpgrade => {
                self.resolve_guild_upgrade(catalog, decorations, ingredient, path)
            }
            IngredientKind::Item => self
                .expand(catalog, decorations, ingredient.id, ingredient.count, path)
                .unwrap_or(ResolvedComponent::Leaf(LeafComponent {
                    id: ingredient.id,
                    kind: IngredientKind::Item,
                    count: ingredient.count,
                })),
        }
    }

    /// A guild-upgrade ingredient's id is an upgrade id, not an item id:
    /// it aliases the recipe that unlocks the upgrade. Failing that, some
    /// upgrades substitute through the decoration map onto a real item.
    fn resolve_guild_upgrade(
        &mut self,
        catalog: &RecipeCatalog,
        decorations: &DecorationMap,
        ingredient: &Ingredient,
        path: &HashSet<ItemId>,
    ) -> ResolvedComponent {
        let upgrade = UpgradeId(ingredient.id.0);

        if let Some(recipe) = catalog.recipe_for_upgrade(upgrade) {
            return self
                .expand(
                    catalog,
                    decorations,
                    recipe.output_item,
                    ingredient.count,
                    path,
                )
                .unwrap_or(ResolvedComponent::Leaf(LeafComponent {
                    id: ingredient.id,
                    kind: IngredientKind::GuildUpgrade,
                    count: ingredient.count,
                }));
        }

        if let Some(&item) = decorations.get(&upgrade) {
            return self
                .expand(catalog, decorations, item, ingredient.count, path)
                .unwrap_or(ResolvedComponent::Leaf(LeafComponent {
                    id: item,
                    kind: IngredientKind::Item,
                    count: ingredient.count,
                }));
        }

        ResolvedComponent::Leaf(LeafComponent {
            id: ingredient.id,
            kind: IngredientKind::GuildUpgrade,
            count: ingredient.count,
        })
    }

    /// Expand `item` into its resolved tree with this edge's `count`.
    /// Returns `None` when the item must stay a leaf: repeated ancestor
    /// (cycle break), excluded reciprocal pair, non-craftable, or a recipe
    /// with no components.
    fn expand(
        &mut self,
        catalog: &RecipeCatalog,
        decorations: &DecorationMap,
        item: ItemId,
        count: u32,
        path: &HashSet<ItemId>,
    ) -> Option<ResolvedComponent> {
        if path.contains(&item) {
            tracing::warn!(
                item = item.0,
                depth = path.len(),
                "cycle in recipe graph, leaving component unexpanded"
            );
            return None;
        }
        if reciprocal_partner_in(item, path) {
            tracing::debug!(
                item = item.0,
                "reciprocal pair exclusion, leaving component unexpanded"
            );
            return None;
        }

        let mut node = self.resolve_inner(catalog, decorations, item, path)?;
        node.count = count;
        Some(ResolvedComponent::Recipe(node))
    }
}

// ---------------------------------------------------------------------------
// Parallel flattening
// ---------------------------------------------------------------------------

/// Resolve every recipe in the catalog, fanning roots out across the rayon
/// thread pool. Each worker carries its own memo (discarded afterwards):
/// whole-catalog throughput is traded for per-root memo sharing.
#[cfg(feature = "parallel")]
pub fn flatten_parallel(
    catalog: &RecipeCatalog,
    decorations: &DecorationMap,
) -> HashMap<ItemId, ResolvedNode> {
    use rayon::prelude::*;

    let roots: Vec<ItemId> = catalog.iter().map(|r| r.output_item).collect();
    roots
        .into_par_iter()
        .filter_map(|item| {
            let mut local = Flattener::new();
            local
                .resolve(catalog, decorations, item)
                .map(|node| (item, node))
        })
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================
