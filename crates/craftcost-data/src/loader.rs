//! File loading pipeline: format detection, discovery, deserialization,
//! and resolution into core types.
//!
//! A data directory holds up to three files, each in RON or JSON:
//! `recipes` (required), `prices` (optional), and `decorations` (optional).
//! Format is detected from the extension; two files with the same base name
//! in different formats is an error rather than a silent pick.

use crate::schema::{DecorationData, PriceData, RecipeData};
use craftcost_core::catalog::RecipeCatalog;
use craftcost_core::flatten::DecorationMap;
use craftcost_core::id::{ItemId, UpgradeId};
use craftcost_core::price::PriceTable;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A recipe names a discipline the store should never emit.
    #[error("unknown discipline '{name}' in {file}")]
    UnknownDiscipline { file: PathBuf, name: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection and discovery
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Scan a directory for a data file with the given base name (without
/// extension). Returns `Ok(None)` if no file is found, or
/// `Err(ConflictingFormats)` if multiple formats exist for the same base.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Read a file and deserialize it according to its detected format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Everything a calculation session needs from disk.
#[derive(Debug)]
pub struct GameData {
    pub catalog: RecipeCatalog,
    pub prices: PriceTable,
    pub decorations: DecorationMap,
}

/// Load a catalog file (RON or JSON array of recipe rows).
pub fn load_catalog_file(path: &Path) -> Result<RecipeCatalog, DataLoadError> {
    let rows: Vec<RecipeData> = deserialize_file(path)?;
    let mut recipes = Vec::with_capacity(rows.len());
    for row in rows {
        let recipe = row
            .into_recipe()
            .map_err(|name| DataLoadError::UnknownDiscipline {
                file: path.to_path_buf(),
                name,
            })?;
        recipes.push(recipe);
    }
    Ok(RecipeCatalog::new(recipes))
}

/// Load a price sheet (RON or JSON array of listing rows).
pub fn load_prices_file(path: &Path) -> Result<PriceTable, DataLoadError> {
    let rows: Vec<PriceData> = deserialize_file(path)?;
    Ok(rows.into_iter().map(PriceData::into_entry).collect())
}

/// Load a decoration substitution map.
pub fn load_decorations_file(path: &Path) -> Result<DecorationMap, DataLoadError> {
    let rows: Vec<DecorationData> = deserialize_file(path)?;
    Ok(rows
        .into_iter()
        .map(|d| (UpgradeId(d.upgrade_id), ItemId(d.item_id)))
        .collect())
}

/// Load a full data directory: `recipes` is required, `prices` and
/// `decorations` default to empty when absent.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let recipes_path =
        find_data_file(dir, "recipes")?.ok_or_else(|| DataLoadError::MissingRequired {
            file: "recipes",
            dir: dir.to_path_buf(),
        })?;
    let catalog = load_catalog_file(&recipes_path)?;

    let prices = match find_data_file(dir, "prices")? {
        Some(path) => load_prices_file(&path)?,
        None => PriceTable::new(),
    };

    let decorations = match find_data_file(dir, "decorations")? {
        Some(path) => load_decorations_file(&path)?,
        None => DecorationMap::new(),
    };

    Ok(GameData {
        catalog,
        prices,
        decorations,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
