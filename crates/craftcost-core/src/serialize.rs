//! Wire format for the background execution boundary.
//!
//! Exactly two message shapes cross the boundary: a [`CostRequest`] going
//! in and a [`CostResponse`] coming back. Payloads are bitcode-encoded with
//! a magic/version header validated before any payload field is trusted.
//!
//! Wire nodes are plain data: children nest by value and there are no
//! back references. The receiving side rebuilds an arena and reconstructs
//! parent links with [`tree_from_wire`]. Defensive decoding: a tree whose
//! children field is absent normalizes to an empty child list rather than
//! failing, so a partial tree is always renderable.

use crate::cost::{CostNode, CostTree, PriceMode, RootTotals};
use crate::id::{ItemId, RecipeId};
use crate::item::Rarity;
use crate::price::{Copper, UnitPrice};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a craftcost wire message.
pub const WIRE_MAGIC: u32 = 0xCC57_0001;

/// Current wire format version. Increment when breaking the format.
pub const WIRE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid magic number: expected 0x{WIRE_MAGIC:08X}, got 0x{0:08X}")]
    InvalidMagic(u32),
    #[error("message from future version {0} (this build supports up to {WIRE_VERSION})")]
    FutureVersion(u32),
    #[error("message carries no tree")]
    EmptyTree,
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Header prepended to every wire message. Enables format detection and
/// version checking before trusting the payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WireHeader {
    pub magic: u32,
    pub version: u32,
}

impl WireHeader {
    /// A header for the current wire version.
    pub fn new() -> Self {
        Self {
            magic: WIRE_MAGIC,
            version: WIRE_VERSION,
        }
    }

    /// Validate the header. Returns `Ok(())` if this build can decode the
    /// message.
    pub fn validate(&self) -> Result<(), WireError> {
        if self.magic != WIRE_MAGIC {
            return Err(WireError::InvalidMagic(self.magic));
        }
        if self.version > WIRE_VERSION {
            return Err(WireError::FutureVersion(self.version));
        }
        Ok(())
    }
}

impl Default for WireHeader {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Wire tree
// ---------------------------------------------------------------------------

fn default_output_count() -> u32 {
    1
}

/// One serialized cost node. Children nest by value; no parent references
/// cross the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub item: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub rarity: Rarity,
    pub count: u32,
    #[serde(default)]
    pub count_total: u64,
    #[serde(default)]
    pub buy_price: Option<Copper>,
    #[serde(default)]
    pub sell_price: Option<Copper>,
    #[serde(default)]
    pub craftable: bool,
    #[serde(default)]
    pub recipe: Option<RecipeId>,
    #[serde(default = "default_output_count")]
    pub output_count: u32,
    #[serde(default)]
    pub mode: PriceMode,
    #[serde(default)]
    pub total_buy: Copper,
    #[serde(default)]
    pub total_sell: Copper,
    #[serde(default)]
    pub total_crafted: Option<Copper>,
    #[serde(default)]
    pub crafted_unit_price: Option<UnitPrice>,
    /// Absent in a malformed message; normalized to empty.
    #[serde(default)]
    pub children: Vec<WireNode>,
}

/// Inbound message: a serialized tree plus the requested quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRequest {
    pub header: WireHeader,
    pub tree: Vec<WireNode>,
    pub quantity: u64,
}

/// Outbound message: the recomputed tree plus root-level totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostResponse {
    pub header: WireHeader,
    pub tree: Vec<WireNode>,
    pub totals: RootTotals,
}

// ---------------------------------------------------------------------------
// Tree <-> wire conversion
// ---------------------------------------------------------------------------

/// Serialize a cost tree into its wire form (a one-element root list).
pub fn tree_to_wire(tree: &CostTree) -> Vec<WireNode> {
    wire_node(tree, tree.root()).into_iter().collect()
}

/// `None` only for a dangling child key, which a well-formed arena never
/// contains; a dangling entry is skipped rather than escalated.
fn wire_node(tree: &CostTree, id: crate::id::CostNodeId) -> Option<WireNode> {
    let node = tree.get(id)?;
    Some(WireNode {
        item: node.item,
        name: node.name.clone(),
        icon: node.icon.clone(),
        rarity: node.rarity,
        count: node.count,
        count_total: node.count_total,
        buy_price: node.buy_price,
        sell_price: node.sell_price,
        craftable: node.craftable,
        recipe: node.recipe,
        output_count: node.output_count,
        mode: node.mode,
        total_buy: node.total_buy,
        total_sell: node.total_sell,
        total_crafted: node.total_crafted,
        crafted_unit_price: node.crafted_unit_price,
        children: node
            .children
            .iter()
            .filter_map(|&child| wire_node(tree, child))
            .collect(),
    })
}

/// Rebuild an arena-backed tree from wire form, reconstructing parent
/// links. Only the first root is used; the boundary carries one tree per
/// message.
pub fn tree_from_wire(roots: &[WireNode]) -> Result<CostTree, WireError> {
    let first = roots.first().ok_or(WireError::EmptyTree)?;
    let mut tree = CostTree::new(cost_node(first));
    let root = tree.root();
    for child in &first.children {
        attach(&mut tree, root, child);
    }
    Ok(tree)
}

fn attach(tree: &mut CostTree, parent: crate::id::CostNodeId, wire: &WireNode) {
    let id = tree.add_child(parent, cost_node(wire));
    for child in &wire.children {
        attach(tree, id, child);
    }
}

fn cost_node(wire: &WireNode) -> CostNode {
    CostNode {
        item: wire.item,
        name: wire.name.clone(),
        icon: wire.icon.clone(),
        rarity: wire.rarity,
        count: wire.count,
        count_total: wire.count_total,
        buy_price: wire.buy_price,
        sell_price: wire.sell_price,
        craftable: wire.craftable,
        recipe: wire.recipe,
        output_count: wire.output_count,
        mode: wire.mode,
        total_buy: wire.total_buy,
        total_sell: wire.total_sell,
        total_crafted: wire.total_crafted,
        crafted_unit_price: wire.crafted_unit_price,
        children: Vec::new(),
        parent: None,
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub fn encode_request(request: &CostRequest) -> Result<Vec<u8>, WireError> {
    bitcode::serialize(request).map_err(|e| WireError::Encode(e.to_string()))
}

pub fn decode_request(bytes: &[u8]) -> Result<CostRequest, WireError> {
    let request: CostRequest =
        bitcode::deserialize(bytes).map_err(|e| WireError::Decode(e.to_string()))?;
    request.header.validate()?;
    Ok(request)
}

pub fn encode_response(response: &CostResponse) -> Result<Vec<u8>, WireError> {
    bitcode::serialize(response).map_err(|e| WireError::Encode(e.to_string()))
}

pub fn decode_response(bytes: &[u8]) -> Result<CostResponse, WireError> {
    let response: CostResponse =
        bitcode::deserialize(bytes).map_err(|e| WireError::Decode(e.to_string()))?;
    response.header.validate()?;
    Ok(response)
}

// ===========================================================================
// Tests
// ===========================================================================
