//! Craftcost Core -- crafting cost calculation over recipe graphs and
//! live market prices.
//!
//! Given a catalog of crafting recipes and a price table, this crate
//! answers: what is the cheapest way to obtain everything a crafted item
//! ultimately requires? Two algorithms cooperate:
//!
//! 1. **Flattening** -- the catalog is a directed graph (an ingredient may
//!    itself be craftable, possibly cyclically); [`flatten::Flattener`]
//!    unrolls it into per-item nested component trees, breaking cycles
//!    into leaves and memoizing resolved subtrees by output item id.
//! 2. **Cost propagation** -- [`cost::CostTree::recalc`] pushes a requested
//!    quantity down a tree and aggregates three competing cost bases
//!    (buy, sell, craft-from-children) back up it, per node, honoring each
//!    child's selected [`cost::PriceMode`].
//!
//! Around them sit [`update::UpdateCache`], a content-keyed memo so that
//! re-running an unchanged computation is free, and [`worker::CostWorker`],
//! which runs propagation on a background thread over the versioned wire
//! format in [`serialize`].
//!
//! # Key Types
//!
//! - [`catalog::RecipeCatalog`] -- immutable recipe set with output-item
//!   and upgrade indexes.
//! - [`flatten::ResolvedNode`] -- a recipe with craftable components
//!   recursively replaced by their own resolved trees.
//! - [`cost::CostTree`] -- slotmap arena of mutable cost nodes; parent
//!   links are non-owning arena keys.
//! - [`price::PriceTable`] -- market listings with optional sides, so
//!   "unpriced" stays distinguishable from "free".
//! - [`update::UpdateCache`] -- cache hit returns the identical `Arc`.
//! - [`worker::CostWorker`] -- request/response channel worker with
//!   cancel-by-discard semantics.

pub mod catalog;
pub mod cost;
pub mod flatten;
pub mod id;
pub mod item;
pub mod price;
pub mod serialize;
pub mod update;
pub mod worker;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
