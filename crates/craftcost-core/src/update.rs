//! The memoized tree update layer.
//!
//! Wraps quantity propagation and pricing behind a cache keyed by the root
//! item, the requested quantity, and the sorted entries of both the price
//! table and the availability map. Because keys are content-derived, a
//! price or availability change anywhere invalidates reuse for exactly
//! that parameter combination while leaving other cached combinations
//! (a previous quantity, say) intact. No explicit invalidation is needed;
//! [`UpdateCache::clear`] exists for symmetry and tests.
//!
//! A cache hit returns the previously computed tree untouched, behind the
//! same `Arc`. Callers must treat a returned tree as shared and immutable;
//! a caller that wants to mutate clones first.

use crate::cost::CostTree;
use crate::id::ItemId;
use crate::price::{Availability, Listing, PriceTable, sorted_availability};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything that affects an update's result, in sorted, hashable form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct UpdateKey {
    root_item: ItemId,
    quantity: u64,
    prices: Vec<(ItemId, Listing)>,
    availability: Vec<(ItemId, u64)>,
}

impl UpdateKey {
    fn new(
        root_item: ItemId,
        quantity: u64,
        prices: &PriceTable,
        availability: &Availability,
    ) -> Self {
        Self {
            root_item,
            quantity,
            prices: prices.sorted_entries(),
            availability: sorted_availability(availability),
        }
    }
}

/// Content-keyed cache of priced trees.
#[derive(Debug, Default)]
pub struct UpdateCache {
    entries: HashMap<UpdateKey, Arc<CostTree>>,
}

impl UpdateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price `tree` for `quantity` with the given market prices, reduced by
    /// on-hand stock. Returns the cached tree when nothing relevant
    /// changed; otherwise value-copies the input, recomputes, and caches.
    pub fn update_tree(
        &mut self,
        quantity: u64,
        tree: &CostTree,
        prices: &PriceTable,
        availability: &Availability,
    ) -> Arc<CostTree> {
        let key = UpdateKey::new(tree.root_node().item, quantity, prices, availability);
        if let Some(hit) = self.entries.get(&key) {
            return Arc::clone(hit);
        }

        let mut updated = tree.clone();
        updated.apply_prices(prices);
        updated.recalc_adjusted(quantity, availability);

        let updated = Arc::new(updated);
        self.entries.insert(key, Arc::clone(&updated));
        updated
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
