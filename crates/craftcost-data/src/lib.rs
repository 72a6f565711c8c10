//! Craftcost Data -- file-based loading of recipe catalogs, price sheets,
//! and decoration maps.
//!
//! The backend store exports three kinds of files, in RON or JSON:
//! `recipes` (required), `prices`, and `decorations`. [`load_game_data`]
//! reads a directory of them into the core types the calculator consumes.

pub mod loader;
pub mod schema;

pub use loader::{
    DataLoadError, GameData, load_catalog_file, load_decorations_file, load_game_data,
    load_prices_file,
};
