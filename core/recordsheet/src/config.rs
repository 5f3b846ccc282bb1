//! FILENAME: core/recordsheet/src/config.rs
//! Export/import settings. Every field has a default, so a JSON document only
//! needs to name what it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConvertError;

/// Where the pivot classification travels between classifier and pivoter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PivotMetadataMode {
    /// Handed to the pivoter directly.
    #[default]
    InMemory,
    /// Written as three rows above the source sheet's header, read back by
    /// the pivoter and stripped afterwards.
    EmbeddedRows,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Longest sheet name accepted, in characters.
    pub max_sheet_name_len: usize,
    /// Prepended to a pivot sheet's name to name its hidden source sheet.
    pub pivot_source_prefix: String,
    /// Stripped from a record type's name to derive a fallback sheet name on import.
    pub sheet_name_suffixes: Vec<String>,
    pub freeze_header: bool,
    pub hide_pivot_source: bool,
    pub pivot_metadata: PivotMetadataMode,
    pub temp_file_prefix: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig {
            max_sheet_name_len: 30,
            pivot_source_prefix: "source for ".to_string(),
            sheet_name_suffixes: vec!["RowHandler".to_string(), "Handler".to_string()],
            freeze_header: true,
            hide_pivot_source: true,
            pivot_metadata: PivotMetadataMode::InMemory,
            temp_file_prefix: "recordsheet-".to_string(),
        }
    }
}

impl SheetConfig {
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
