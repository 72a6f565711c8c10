//! Money types and the market price table.
//!
//! All totals are integer copper coins. The one genuinely fractional value
//! in the system, the per-unit cost of a crafted item, uses Q32.32
//! fixed-point so that repeated recomputation is bit-for-bit deterministic.
//!
//! A listing's `buy`/`sell` sides are `Option<Copper>`: an item the market
//! has never priced is representable distinctly from an item that trades at
//! zero. Aggregation treats a missing price as contributing zero, so a
//! partially priced tree still produces usable totals.

use crate::id::ItemId;
use fixed::types::I32F32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Integer copper coins. 10000 copper = 1 gold.
pub type Copper = i64;

/// Q32.32 fixed-point unit price (crafted cost divided by output count).
pub type UnitPrice = I32F32;

/// Compute a deterministic per-unit price. A zero divisor is treated as 1:
/// a recipe with no recorded output count produces one item per craft.
#[inline]
pub fn unit_price(total: Copper, output_count: u32) -> UnitPrice {
    let divisor = if output_count == 0 { 1 } else { output_count };
    let total = UnitPrice::checked_from_num(total).unwrap_or(UnitPrice::MAX);
    total / UnitPrice::from_num(divisor)
}

/// One item's market listing. Either side may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub buy: Option<Copper>,
    #[serde(default)]
    pub sell: Option<Copper>,
}

impl Listing {
    pub fn new(buy: Copper, sell: Copper) -> Self {
        Self {
            buy: Some(buy),
            sell: Some(sell),
        }
    }

    /// True when neither side of the listing is priced. Craft-only items
    /// (tokens, account-bound intermediates) have no market presence at all.
    pub fn is_unpriced(&self) -> bool {
        self.buy.is_none() && self.sell.is_none()
    }
}

/// Market prices keyed by item id, refreshed out-of-band and passed in
/// verbatim by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    entries: HashMap<ItemId, Listing>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ItemId, listing: Listing) {
        self.entries.insert(id, listing);
    }

    pub fn get(&self, id: ItemId) -> Option<Listing> {
        self.entries.get(&id).copied()
    }

    pub fn buy(&self, id: ItemId) -> Option<Copper> {
        self.entries.get(&id).and_then(|l| l.buy)
    }

    pub fn sell(&self, id: ItemId) -> Option<Copper> {
        self.entries.get(&id).and_then(|l| l.sell)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by item id. Cache keys are derived from this, so the
    /// result must not depend on hash-map iteration order.
    pub fn sorted_entries(&self) -> Vec<(ItemId, Listing)> {
        let mut entries: Vec<(ItemId, Listing)> =
            self.entries.iter().map(|(id, l)| (*id, *l)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}

impl FromIterator<(ItemId, Listing)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (ItemId, Listing)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// On-hand item counts supplied by the caller (e.g. a user inventory).
pub type Availability = HashMap<ItemId, u64>;

/// Availability entries sorted by item id, for stable cache keys.
pub fn sorted_availability(availability: &Availability) -> Vec<(ItemId, u64)> {
    let mut entries: Vec<(ItemId, u64)> =
        availability.iter().map(|(id, n)| (*id, *n)).collect();
    entries.sort_by_key(|(id, _)| *id);
    entries
}
