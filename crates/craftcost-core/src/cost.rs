//! The cost propagation engine: arena-backed component trees carrying
//! per-node quantities and buy/sell/craft totals.
//!
//! Nodes live in a slotmap arena. Ownership edges run parent to children
//! only; the `parent` field is a plain arena key, a non-owning back
//! reference used for root-finding and mode propagation.
//!
//! [`CostTree::recalc`] mutates the tree in place, in order: absolute
//! quantities down, totals up. Trees are never shared between two
//! computations; the background worker round-trips a value copy.

use crate::id::{CostNodeId, ItemId, RecipeId};
use crate::item::{MetadataTable, Rarity, metadata_or_placeholder};
use crate::price::{Availability, Copper, PriceTable, UnitPrice, unit_price};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Fixed-ratio exemplar
// ---------------------------------------------------------------------------

/// The bulk mystic-clover forge recipe. Its four ingredient slots (coins,
/// ectoplasm, shards, philosopher's stones) do not share a uniform per-unit
/// ratio, so per-child quantities come from a fixed table keyed by the
/// recipe's own output count, one entry per crafting-bonus tier.
const BULK_CLOVER: ItemId = ItemId(19675);

/// Per-slot material totals for the two bulk tiers. Applied verbatim,
/// independent of the requested root quantity.
fn clover_tier(count: u32) -> Option<[u64; 4]> {
    match count {
        77 => Some([250, 250, 250, 1500]),
        38 => Some([38, 38, 38, 38]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Node model
// ---------------------------------------------------------------------------

/// Which cost basis a node contributes to its parent's craft total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMode {
    #[default]
    Buy,
    Sell,
    Crafted,
}

/// One node of a cost tree. `count` is the per-craft quantity from the
/// resolved recipe edge; everything from `count_total` down is derived by
/// [`CostTree::recalc`], never authoritative input. Crossing the worker
/// boundary goes through [`crate::serialize::WireNode`], not this type.
#[derive(Debug, Clone, PartialEq)]
pub struct CostNode {
    pub item: ItemId,
    pub name: String,
    pub icon: String,
    pub rarity: Rarity,
    pub count: u32,
    pub count_total: u64,
    pub buy_price: Option<Copper>,
    pub sell_price: Option<Copper>,
    pub craftable: bool,
    pub recipe: Option<RecipeId>,
    pub output_count: u32,
    pub mode: PriceMode,
    pub total_buy: Copper,
    pub total_sell: Copper,
    /// Defined iff the node is craftable with at least one child.
    pub total_crafted: Option<Copper>,
    /// `total_crafted` divided by `output_count`; same definedness.
    pub crafted_unit_price: Option<UnitPrice>,
    pub children: Vec<CostNodeId>,
    pub parent: Option<CostNodeId>,
}

impl CostNode {
    /// A leaf: bought or otherwise obtained, never crafted in this tree.
    pub fn leaf(item: ItemId, count: u32) -> Self {
        Self {
            item,
            name: String::new(),
            icon: String::new(),
            rarity: Rarity::default(),
            count,
            count_total: 0,
            buy_price: None,
            sell_price: None,
            craftable: false,
            recipe: None,
            output_count: 1,
            mode: PriceMode::default(),
            total_buy: 0,
            total_sell: 0,
            total_crafted: None,
            crafted_unit_price: None,
            children: Vec::new(),
            parent: None,
        }
    }

    /// A craftable node; children are attached through [`CostTree::add_child`].
    pub fn craftable(item: ItemId, count: u32, recipe: RecipeId, output_count: u32) -> Self {
        Self {
            craftable: true,
            recipe: Some(recipe),
            output_count,
            ..Self::leaf(item, count)
        }
    }

    pub fn with_prices(mut self, buy: Option<Copper>, sell: Option<Copper>) -> Self {
        self.buy_price = buy;
        self.sell_price = sell;
        self
    }

    fn is_unpriced(&self) -> bool {
        self.buy_price.is_none() && self.sell_price.is_none()
    }

    /// The total this node contributes to its parent's craft cost, selected
    /// by its own mode. A `Crafted` node without a craft total falls back
    /// to buying.
    pub fn contribution(&self) -> Copper {
        match self.mode {
            PriceMode::Buy => self.total_buy,
            PriceMode::Sell => self.total_sell,
            PriceMode::Crafted => self.total_crafted.unwrap_or(self.total_buy),
        }
    }
}

/// Root-level cost summary, also the worker response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootTotals {
    pub total_buy: Copper,
    pub total_sell: Copper,
    pub total_crafted: Option<Copper>,
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// An arena of cost nodes with a single root.
#[derive(Debug, Clone)]
pub struct CostTree {
    nodes: SlotMap<CostNodeId, CostNode>,
    root: CostNodeId,
    requested_quantity: u64,
}

impl CostTree {
    /// Start a tree from its root node.
    pub fn new(root: CostNode) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(root);
        Self {
            nodes,
            root,
            requested_quantity: 1,
        }
    }

    /// Attach `node` under `parent`. Returns the new node's arena key.
    pub fn add_child(&mut self, parent: CostNodeId, mut node: CostNode) -> CostNodeId {
        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        id
    }

    /// Build a priced cost tree from a resolved recipe tree.
    ///
    /// The root's `count` is the recipe's batch size: requesting quantity 1
    /// means one craft of the root recipe. Nested nodes keep their
    /// edge-local counts from resolution.
    pub fn from_resolved(
        resolved: &crate::flatten::ResolvedNode,
        prices: &PriceTable,
        metadata: &MetadataTable,
    ) -> Self {
        let mut root_node = node_from_resolved(resolved, prices, metadata);
        root_node.count = resolved.output_count.max(1);
        let mut tree = Self::new(root_node);
        let root = tree.root;
        for component in &resolved.components {
            attach_component(&mut tree, root, component, prices, metadata);
        }
        tree
    }

    pub fn root(&self) -> CostNodeId {
        self.root
    }

    /// The root node. Always present; a tree is constructed from its root.
    pub fn root_node(&self) -> &CostNode {
        &self.nodes[self.root]
    }

    pub fn get(&self, id: CostNodeId) -> Option<&CostNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: CostNodeId) -> Option<&mut CostNode> {
        self.nodes.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CostNodeId, &CostNode)> {
        self.nodes.iter()
    }

    /// The quantity the last recalc propagated from the root.
    pub fn requested_quantity(&self) -> u64 {
        self.requested_quantity
    }

    /// Follow parent links up to the root. Plain arena keys, so this is
    /// safe regardless of how the tree was assembled.
    pub fn root_of(&self, mut node: CostNodeId) -> CostNodeId {
        while let Some(parent) = self.nodes[node].parent {
            node = parent;
        }
        node
    }

    /// Root-level totals after a recalc.
    pub fn totals(&self) -> RootTotals {
        let root = &self.nodes[self.root];
        RootTotals {
            total_buy: root.total_buy,
            total_sell: root.total_sell,
            total_crafted: root.total_crafted,
        }
    }

    /// Overwrite every node's market prices from `prices`. The table is
    /// authoritative: items it does not list become unpriced.
    pub fn apply_prices(&mut self, prices: &PriceTable) {
        for (_, node) in self.nodes.iter_mut() {
            node.buy_price = prices.buy(node.item);
            node.sell_price = prices.sell(node.item);
        }
    }

    // -----------------------------------------------------------------------
    // Propagation
    // -----------------------------------------------------------------------

    /// Recompute quantities and totals for the whole tree, in place.
    pub fn recalc(&mut self, quantity: u64) {
        self.requested_quantity = quantity;
        self.recalc_node(self.root, None, None);
    }

    /// Like [`recalc`](Self::recalc), but on-hand stock reduces each node's
    /// required total before its children are scaled and before costing.
    pub fn recalc_adjusted(&mut self, quantity: u64, availability: &Availability) {
        self.requested_quantity = quantity;
        self.recalc_node(self.root, None, Some(availability));
    }

    /// Set a node's pricing mode and recompute from the tree root. A mode
    /// change can alter ancestor craft totals at every level, so the update
    /// is never localized.
    pub fn set_mode(&mut self, node: CostNodeId, mode: PriceMode) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        n.mode = mode;
        let root = self.root_of(node);
        self.recalc_node(root, None, None);
    }

    fn recalc_node(
        &mut self,
        id: CostNodeId,
        parent: Option<CostNodeId>,
        availability: Option<&Availability>,
    ) {
        self.nodes[id].parent = parent;

        // Step 1: absolute quantity at the root's requested scale.
        let count = self.nodes[id].count as u64;
        let raw_total = match parent {
            None => count.saturating_mul(self.requested_quantity),
            Some(p) => self.nodes[p].count_total.saturating_mul(count),
        };
        let item = self.nodes[id].item;
        self.nodes[id].count_total = stock_adjusted(item, raw_total, availability);

        let children: Vec<CostNodeId> = self.nodes[id].children.clone();

        // Fixed-ratio exemplar: per-child totals come from the tier table,
        // not the proportional rule, and recursion below them is skipped.
        let fixed_tier = if self.nodes[id].item == BULK_CLOVER {
            clover_tier(self.nodes[id].count)
        } else {
            None
        };

        if let Some(tier) = fixed_tier {
            for (slot, &child) in children.iter().enumerate() {
                let fixed_total = tier.get(slot).copied().unwrap_or_else(|| {
                    // Slots past the table scale proportionally as usual.
                    self.nodes[id].count_total * self.nodes[child].count as u64
                });
                let child_item = self.nodes[child].item;
                let total = stock_adjusted(child_item, fixed_total, availability);

                let node = &mut self.nodes[child];
                node.parent = Some(id);
                node.count_total = total;
                node.total_buy = price_times(node.buy_price, total);
                node.total_sell = price_times(node.sell_price, total);
                if !node.craftable || node.children.is_empty() {
                    node.total_crafted = None;
                    node.crafted_unit_price = None;
                }
            }
        } else {
            // Step 2: recurse.
            for &child in &children {
                self.recalc_node(child, Some(id), availability);
            }
        }

        // Step 3: buy/sell totals. The root (and the fixed-ratio node) sum
        // their children; any other node's own market price already
        // reflects the exact quantity it needs.
        let is_root = parent.is_none();
        if is_root || fixed_tier.is_some() {
            let buy = self.sum_children(&children, |n| n.total_buy);
            let sell = self.sum_children(&children, |n| n.total_sell);
            let node = &mut self.nodes[id];
            node.total_buy = buy;
            node.total_sell = sell;
        } else {
            let total = self.nodes[id].count_total;
            let node = &mut self.nodes[id];
            node.total_buy = price_times(node.buy_price, total);
            node.total_sell = price_times(node.sell_price, total);
        }

        // Step 4: craft total from children, selected per child mode.
        if self.nodes[id].craftable && !children.is_empty() {
            let crafted = self.sum_children(&children, CostNode::contribution);
            let output_count = self.nodes[id].output_count;
            let node = &mut self.nodes[id];
            node.total_crafted = Some(crafted);
            node.crafted_unit_price = Some(unit_price(crafted, output_count));

            // A craft-only node has no market of its own; its "market"
            // cost is definitionally its material cost.
            if self.nodes[id].is_unpriced() {
                let buy = self.sum_children(&children, |n| n.total_buy);
                let sell = self.sum_children(&children, |n| n.total_sell);
                let node = &mut self.nodes[id];
                node.total_buy = buy;
                node.total_sell = sell;
            }
        } else {
            let node = &mut self.nodes[id];
            node.total_crafted = None;
            node.crafted_unit_price = None;
        }
    }

    fn sum_children(&self, children: &[CostNodeId], f: impl Fn(&CostNode) -> Copper) -> Copper {
        children
            .iter()
            .fold(0, |acc, &c| acc.saturating_add(f(&self.nodes[c])))
    }

    // -----------------------------------------------------------------------
    // Material aggregation
    // -----------------------------------------------------------------------

    /// Aggregate the quantities the user actually has to obtain: walk the
    /// tree following `Crafted` decisions, collecting every node bought (or
    /// otherwise acquired) instead of crafted. Sorted by item id.
    pub fn shopping_list(&self) -> Vec<(ItemId, u64)> {
        let mut out: HashMap<ItemId, u64> = HashMap::new();
        self.collect_materials(self.root, true, &mut out);
        let mut list: Vec<(ItemId, u64)> = out.into_iter().collect();
        list.sort_by_key(|(id, _)| *id);
        list
    }

    fn collect_materials(&self, id: CostNodeId, is_root: bool, out: &mut HashMap<ItemId, u64>) {
        let node = &self.nodes[id];
        let descend = (is_root || node.mode == PriceMode::Crafted) && !node.children.is_empty();
        if descend {
            for &child in &node.children {
                self.collect_materials(child, false, out);
            }
        } else if node.count_total > 0 {
            *out.entry(node.item).or_insert(0) += node.count_total;
        }
    }
}

fn price_times(price: Option<Copper>, count_total: u64) -> Copper {
    let count = count_total.min(i64::MAX as u64) as i64;
    price.unwrap_or(0).saturating_mul(count)
}

fn stock_adjusted(item: ItemId, raw: u64, availability: Option<&Availability>) -> u64 {
    match availability {
        Some(stock) => raw.saturating_sub(stock.get(&item).copied().unwrap_or(0)),
        None => raw,
    }
}

// ---------------------------------------------------------------------------
// Building from resolved trees
// ---------------------------------------------------------------------------

fn node_from_resolved(
    resolved: &crate::flatten::ResolvedNode,
    prices: &PriceTable,
    metadata: &MetadataTable,
) -> CostNode {
    let meta = metadata_or_placeholder(metadata, resolved.id);
    CostNode {
        name: meta.name,
        icon: meta.icon,
        rarity: meta.rarity,
        ..CostNode::craftable(
            resolved.id,
            resolved.count,
            resolved.recipe,
            resolved.output_count,
        )
        .with_prices(prices.buy(resolved.id), prices.sell(resolved.id))
    }
}

fn attach_component(
    tree: &mut CostTree,
    parent: CostNodeId,
    component: &crate::flatten::ResolvedComponent,
    prices: &PriceTable,
    metadata: &MetadataTable,
) {
    use crate::flatten::ResolvedComponent;
    match component {
        ResolvedComponent::Recipe(node) => {
            let id = tree.add_child(parent, node_from_resolved(node, prices, metadata));
            for child in &node.components {
                attach_component(tree, id, child, prices, metadata);
            }
        }
        ResolvedComponent::Leaf(leaf) => {
            let meta = metadata_or_placeholder(metadata, leaf.id);
            let node = CostNode {
                name: meta.name,
                icon: meta.icon,
                rarity: meta.rarity,
                ..CostNode::leaf(leaf.id, leaf.count)
                    .with_prices(prices.buy(leaf.id), prices.sell(leaf.id))
            };
            tree.add_child(parent, node);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// root(count 1) -> child(count 3) -> grandchild(count 2).
    fn chain_tree() -> (CostTree, CostNodeId, CostNodeId) {
        let mut tree = CostTree::new(CostNode::craftable(ItemId(1), 1, RecipeId(1), 1));
        let child = tree.add_child(
            tree.root(),
            CostNode::craftable(ItemId(2), 3, RecipeId(2), 1).with_prices(Some(10), Some(8)),
        );
        let grandchild = tree.add_child(
            child,
            CostNode::leaf(ItemId(3), 2).with_prices(Some(4), Some(3)),
        );
        (tree, child, grandchild)
    }

    // -----------------------------------------------------------------------
    // Quantity propagation
    // -----------------------------------------------------------------------

    #[test]
    fn count_total_propagates_multiplicatively() {
        let (mut tree, child, grandchild) = chain_tree();
        tree.recalc(5);

        assert_eq!(tree.get(tree.root()).unwrap().count_total, 5);
        assert_eq!(tree.get(child).unwrap().count_total, 15);
        assert_eq!(tree.get(grandchild).unwrap().count_total, 30);
    }

    #[test]
    fn recalc_overwrites_previous_quantities() {
        let (mut tree, child, _) = chain_tree();
        tree.recalc(5);
        tree.recalc(2);
        assert_eq!(tree.get(tree.root()).unwrap().count_total, 2);
        assert_eq!(tree.get(child).unwrap().count_total, 6);
        assert_eq!(tree.requested_quantity(), 2);
    }

    // -----------------------------------------------------------------------
    // Buy/sell aggregation
    // -----------------------------------------------------------------------

    #[test]
    fn non_root_prices_its_own_quantity() {
        let (mut tree, child, grandchild) = chain_tree();
        tree.recalc(1);

        // child: 3 units at buy 10 / sell 8.
        assert_eq!(tree.get(child).unwrap().total_buy, 30);
        assert_eq!(tree.get(child).unwrap().total_sell, 24);
        // grandchild: 6 units at buy 4 / sell 3.
        assert_eq!(tree.get(grandchild).unwrap().total_buy, 24);
        assert_eq!(tree.get(grandchild).unwrap().total_sell, 18);
    }

    #[test]
    fn root_sums_children() {
        let mut tree = CostTree::new(
            CostNode::craftable(ItemId(1), 1, RecipeId(1), 1).with_prices(Some(999), Some(999)),
        );
        tree.add_child(
            tree.root(),
            CostNode::leaf(ItemId(2), 2).with_prices(Some(10), Some(7)),
        );
        tree.add_child(
            tree.root(),
            CostNode::leaf(ItemId(3), 1).with_prices(Some(5), Some(4)),
        );
        tree.recalc(1);

        // The root's own market price never enters its totals.
        let totals = tree.totals();
        assert_eq!(totals.total_buy, 25);
        assert_eq!(totals.total_sell, 18);
    }

    #[test]
    fn missing_price_contributes_zero() {
        let mut tree = CostTree::new(CostNode::craftable(ItemId(1), 1, RecipeId(1), 1));
        tree.add_child(tree.root(), CostNode::leaf(ItemId(2), 5));
        tree.add_child(
            tree.root(),
            CostNode::leaf(ItemId(3), 1).with_prices(Some(7), None),
        );
        tree.recalc(1);

        assert_eq!(tree.totals().total_buy, 7);
        assert_eq!(tree.totals().total_sell, 0);
    }

    // -----------------------------------------------------------------------
    // Craft totals and modes
    // -----------------------------------------------------------------------

    #[test]
    fn craft_total_selects_per_child_mode() {
        let mut tree = CostTree::new(CostNode::craftable(ItemId(1), 1, RecipeId(1), 1));
        let a = tree.add_child(
            tree.root(),
            CostNode::leaf(ItemId(2), 1).with_prices(Some(100), Some(90)),
        );
        let b = tree.add_child(
            tree.root(),
            CostNode::craftable(ItemId(3), 1, RecipeId(3), 1).with_prices(Some(50), Some(45)),
        );
        tree.add_child(b, CostNode::leaf(ItemId(4), 1).with_prices(Some(80), Some(60)));
        tree.recalc(1);

        // a in Buy mode (100) + b in Buy mode (50).
        assert_eq!(tree.get(tree.root()).unwrap().total_crafted, Some(150));
        let _ = a;

        // Toggling b to Crafted swaps in its craft total (80).
        tree.set_mode(b, PriceMode::Crafted);
        assert_eq!(tree.get(b).unwrap().total_crafted, Some(80));
        assert_eq!(tree.get(tree.root()).unwrap().total_crafted, Some(180));
    }

    #[test]
    fn sell_mode_contributes_sell_total() {
        let mut tree = CostTree::new(CostNode::craftable(ItemId(1), 1, RecipeId(1), 1));
        tree.add_child(
            tree.root(),
            CostNode::leaf(ItemId(2), 1).with_prices(Some(100), Some(90)),
        );
        let b = tree.add_child(
            tree.root(),
            CostNode::leaf(ItemId(3), 1).with_prices(Some(50), Some(45)),
        );
        tree.recalc(1);
        assert_eq!(tree.get(tree.root()).unwrap().total_crafted, Some(150));

        tree.set_mode(b, PriceMode::Sell);
        assert_eq!(tree.get(tree.root()).unwrap().total_crafted, Some(145));
    }

    #[test]
    fn crafted_mode_without_craft_total_falls_back_to_buy() {
        let mut tree = CostTree::new(CostNode::craftable(ItemId(1), 1, RecipeId(1), 1));
        let leaf = tree.add_child(
            tree.root(),
            CostNode::leaf(ItemId(2), 1).with_prices(Some(40), Some(30)),
        );
        tree.recalc(1);

        // A leaf can be toggled to Crafted, but it has no craft total;
        // the contribution defaults to its buy total.
        tree.set_mode(leaf, PriceMode::Crafted);
        assert_eq!(tree.get(tree.root()).unwrap().total_crafted, Some(40));
    }

    #[test]
    fn non_craftable_node_has_null_craft_totals() {
        let (mut tree, child, grandchild) = chain_tree();
        tree.recalc(3);

        assert!(tree.get(grandchild).unwrap().total_crafted.is_none());
        assert!(tree.get(grandchild).unwrap().crafted_unit_price.is_none());
        // The intermediate craftable node does have one.
        assert!(tree.get(child).unwrap().total_crafted.is_some());
    }

    #[test]
    fn craft_totals_reset_when_children_removed() {
        let mut tree = CostTree::new(CostNode::craftable(ItemId(1), 1, RecipeId(1), 1));
        let child = tree.add_child(
            tree.root(),
            CostNode::leaf(ItemId(2), 1).with_prices(Some(10), Some(9)),
        );
        tree.recalc(1);
        assert!(tree.get(tree.root()).unwrap().total_crafted.is_some());

        // Detach the only child; the craft total must become null again,
        // never a stale leftover.
        tree.get_mut(tree.root()).unwrap().children.clear();
        tree.get_mut(child).unwrap().parent = None;
        tree.recalc(1);
        assert!(tree.get(tree.root()).unwrap().total_crafted.is_none());
        assert!(tree.get(tree.root()).unwrap().crafted_unit_price.is_none());
    }

    #[test]
    fn crafted_unit_price_divides_by_output_count() {
        let mut tree = CostTree::new(CostNode::craftable(ItemId(1), 1, RecipeId(1), 5));
        tree.add_child(
            tree.root(),
            CostNode::leaf(ItemId(2), 1).with_prices(Some(150), Some(150)),
        );
        tree.recalc(1);

        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.total_crafted, Some(150));
        assert_eq!(root.crafted_unit_price, Some(UnitPrice::from_num(30)));
    }

    #[test]
    fn unpriced_craftable_inherits_children_market_totals() {
        let mut tree = CostTree::new(CostNode::craftable(ItemId(1), 1, RecipeId(1), 1));
        let dowel = tree.add_child(
            tree.root(),
            // No market listing of its own: an account-bound intermediate.
            CostNode::craftable(ItemId(2), 2, RecipeId(2), 1),
        );
        tree.add_child(
            dowel,
            CostNode::leaf(ItemId(3), 3).with_prices(Some(5), Some(4)),
        );
        tree.recalc(1);

        // dowel needs 2; its grandchild 6 units at 5/4.
        let dowel_node = tree.get(dowel).unwrap();
        assert_eq!(dowel_node.total_buy, 30, "material cost stands in for buy");
        assert_eq!(dowel_node.total_sell, 24);
        assert_eq!(dowel_node.total_crafted, Some(30));
    }

    // -----------------------------------------------------------------------
    // Fixed-ratio exemplar
    // -----------------------------------------------------------------------

    fn clover_tree(count: u32) -> (CostTree, Vec<CostNodeId>) {
        let mut tree =
            CostTree::new(CostNode::craftable(BULK_CLOVER, count, RecipeId(9), count));
        let slots = [
            (ItemId(19976), 2u32, 150, 140), // coins
            (ItemId(19721), 2, 30, 25),      // ectoplasm
            (ItemId(20796), 2, 0, 0),        // shards
            (ItemId(20799), 10, 2, 1),       // philosopher's stones
        ];
        let children = slots
            .iter()
            .map(|&(item, count, buy, sell)| {
                tree.add_child(
                    tree.root(),
                    CostNode::leaf(item, count).with_prices(Some(buy), Some(sell)),
                )
            })
            .collect();
        (tree, children)
    }

    #[test]
    fn bulk_tier_77_uses_fixed_table() {
        let (mut tree, children) = clover_tree(77);
        tree.recalc(5);

        let expected = [250u64, 250, 250, 1500];
        for (&child, &want) in children.iter().zip(expected.iter()) {
            assert_eq!(
                tree.get(child).unwrap().count_total,
                want,
                "fixed table is independent of requested quantity"
            );
        }
        // Child totals were computed from the fixed quantities.
        assert_eq!(tree.get(children[0]).unwrap().total_buy, 250 * 150);
        assert_eq!(tree.get(children[3]).unwrap().total_sell, 1500);
    }

    #[test]
    fn bulk_tier_38_uses_fixed_table() {
        let (mut tree, children) = clover_tree(38);
        tree.recalc(1);
        for &child in &children {
            assert_eq!(tree.get(child).unwrap().count_total, 38);
        }
    }

    #[test]
    fn bulk_tier_sums_children_for_root_totals() {
        let (mut tree, _) = clover_tree(77);
        tree.recalc(1);
        let totals = tree.totals();
        assert_eq!(totals.total_buy, 250 * 150 + 250 * 30 + 250 * 0 + 1500 * 2);
        assert_eq!(totals.total_sell, 250 * 140 + 250 * 25 + 250 * 0 + 1500 * 1);
    }

    #[test]
    fn other_clover_counts_scale_proportionally() {
        let (mut tree, children) = clover_tree(10);
        tree.recalc(1);
        // No tier for count 10: plain propagation applies.
        assert_eq!(tree.get(children[0]).unwrap().count_total, 20);
        assert_eq!(tree.get(children[3]).unwrap().count_total, 100);
    }

    // -----------------------------------------------------------------------
    // Availability adjustment
    // -----------------------------------------------------------------------

    #[test]
    fn on_hand_stock_reduces_requirements() {
        let (mut tree, child, grandchild) = chain_tree();
        let mut stock = Availability::new();
        stock.insert(ItemId(2), 5); // have 5 of the intermediate
        tree.recalc_adjusted(5, &stock);

        assert_eq!(tree.get(tree.root()).unwrap().count_total, 5);
        // 15 needed, 5 on hand.
        assert_eq!(tree.get(child).unwrap().count_total, 10);
        // Children scale from the reduced requirement.
        assert_eq!(tree.get(grandchild).unwrap().count_total, 20);
    }

    #[test]
    fn stock_never_drives_requirements_negative() {
        let (mut tree, child, grandchild) = chain_tree();
        let mut stock = Availability::new();
        stock.insert(ItemId(2), 1000);
        tree.recalc_adjusted(1, &stock);

        assert_eq!(tree.get(child).unwrap().count_total, 0);
        assert_eq!(tree.get(grandchild).unwrap().count_total, 0);
        assert_eq!(tree.get(child).unwrap().total_buy, 0);
    }

    // -----------------------------------------------------------------------
    // Parent links, shopping list
    // -----------------------------------------------------------------------

    #[test]
    fn root_of_walks_parent_links() {
        let (tree, _, grandchild) = chain_tree();
        assert_eq!(tree.root_of(grandchild), tree.root());
        assert_eq!(tree.root_of(tree.root()), tree.root());
    }

    #[test]
    fn set_mode_from_deep_node_recalcs_every_ancestor() {
        let (mut tree, child, grandchild) = chain_tree();
        tree.recalc(1);
        // child crafts from 6 grandchild units at buy 4 (24); in Buy mode
        // it still contributes its own market total (30) to the root.
        assert_eq!(tree.get(child).unwrap().total_crafted, Some(24));
        assert_eq!(tree.get(tree.root()).unwrap().total_crafted, Some(30));

        tree.set_mode(grandchild, PriceMode::Sell);
        // The grandchild's sell total (18) replaces its buy total (24) in
        // the child's craft cost, all the way up from a leaf toggle.
        assert_eq!(tree.get(child).unwrap().total_crafted, Some(18));
    }

    #[test]
    fn shopping_list_follows_craft_decisions() {
        let mut tree = CostTree::new(CostNode::craftable(ItemId(1), 1, RecipeId(1), 1));
        let ingot = tree.add_child(
            tree.root(),
            CostNode::craftable(ItemId(2), 2, RecipeId(2), 1).with_prices(Some(10), Some(8)),
        );
        tree.add_child(ingot, CostNode::leaf(ItemId(3), 3).with_prices(Some(2), Some(1)));
        tree.recalc(1);

        // Ingots default to Buy: they appear themselves.
        assert_eq!(tree.shopping_list(), vec![(ItemId(2), 2)]);

        // Crafting them swaps in their ore instead.
        tree.set_mode(ingot, PriceMode::Crafted);
        assert_eq!(tree.shopping_list(), vec![(ItemId(3), 6)]);
    }

    #[test]
    fn from_resolved_builds_priced_tree() {
        use crate::catalog::{Ingredient, RawRecipe, RecipeCatalog};
        use crate::flatten::{DecorationMap, Flattener};

        let catalog = RecipeCatalog::new(vec![
            RawRecipe {
                id: RecipeId(1),
                output_item: ItemId(100),
                output_count: 1,
                ingredients: vec![Ingredient::item(ItemId(20), 2)],
                prerequisite: None,
                min_rating: 400,
                disciplines: vec![],
                upgrade_id: None,
                daily_cap: None,
                weekly_cap: None,
            },
            RawRecipe {
                id: RecipeId(2),
                output_item: ItemId(20),
                output_count: 1,
                ingredients: vec![Ingredient::item(ItemId(10), 3)],
                prerequisite: None,
                min_rating: 0,
                disciplines: vec![],
                upgrade_id: None,
                daily_cap: None,
                weekly_cap: None,
            },
        ]);
        let mut flattener = Flattener::new();
        let resolved = flattener
            .resolve(&catalog, &DecorationMap::new(), ItemId(100))
            .unwrap();

        let mut prices = PriceTable::new();
        prices.insert(ItemId(20), crate::price::Listing::new(10, 8));
        prices.insert(ItemId(10), crate::price::Listing::new(2, 1));

        let mut tree = CostTree::from_resolved(&resolved, &prices, &MetadataTable::new());
        tree.recalc(5);

        assert_eq!(tree.len(), 3);
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.count_total, 5);
        assert!(root.craftable);
        // 10 ingots at 10 copper.
        assert_eq!(root.total_buy, 100);
        assert_eq!(root.total_crafted, Some(100));
    }
}
