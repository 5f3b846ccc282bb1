//! FILENAME: core/persistence/src/lib.rs
//! Persistence Module
//!
//! Holds the in-memory workbook (named sheets over a shared style registry)
//! and saves/loads it in XLSX format.

mod error;
mod xlsx_reader;
mod xlsx_writer;

pub use error::PersistenceError;
pub use xlsx_reader::{load_xlsx, load_xlsx_from_bytes};
pub use xlsx_writer::{save_xlsx, to_xlsx_bytes, write_xlsx};

use grid::{CellStyle, CellValue, Grid, StyleRegistry};
use serde::{Deserialize, Serialize};

// ============================================================================
// METADATA SHEET NAME (used for persisting data XLSX cells cannot carry)
// ============================================================================

/// Hidden metadata sheet holding reference tokens.
/// This sheet is written during save and filtered out during load.
pub const META_SHEET_NAME: &str = "_recordsheet_meta";

/// Current layout version of the metadata sheet.
pub const META_VERSION: u32 = 2;

// ============================================================================
// WORKBOOK
// ============================================================================

/// Represents a complete workbook that can be saved/loaded
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// Styles shared by every sheet; cells refer to them by index.
    pub styles: StyleRegistry,
}

impl Workbook {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            styles: StyleRegistry::new(),
        }
    }

    /// Appends an empty sheet. Names are matched exactly.
    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Sheet, PersistenceError> {
        self.push_sheet(Sheet::new(name.to_string()))?;
        let last = self.sheets.len() - 1;
        Ok(&mut self.sheets[last])
    }

    /// Appends a sheet built outside the workbook.
    pub fn push_sheet(&mut self, sheet: Sheet) -> Result<(), PersistenceError> {
        if self.sheet_index(&sheet.name).is_some() {
            return Err(PersistenceError::DuplicateSheet(sheet.name));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Index of the `yyyy-mm-dd` date style, registering it on first use.
    pub fn date_style(&mut self) -> usize {
        self.styles.get_or_create(CellStyle::date())
    }
}

// ============================================================================
// SHEET
// ============================================================================

/// Rows/columns locked above and left of the scrolling area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezePane {
    pub rows: u32,
    pub cols: u16,
}

/// Represents a single worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub grid: Grid,
    pub freeze: Option<FreezePane>,
    pub hidden: bool,
}

impl Sheet {
    pub fn new(name: String) -> Self {
        Self {
            name,
            grid: Grid::new(),
            freeze: None,
            hidden: false,
        }
    }

    pub fn freeze_rows(&mut self, rows: u32) {
        self.freeze = Some(FreezePane { rows, cols: 0 });
    }
}

// ============================================================================
// SAVED REFERENCE (metadata sheet payload)
// ============================================================================

/// First row of the metadata sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaHeader {
    pub version: u32,
    pub references: usize,
}

/// The token behind one reference cell, stored as one JSON row.
///
/// The column is found again through `header`, the text of the sheet's first
/// row above the cell, so tokens follow their column when columns are moved.
/// A token is only re-attached while the cell still shows `display`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReference {
    pub sheet: String,
    pub row: u32,
    pub header: String,
    pub display: String,
    pub token: String,
}

impl SavedReference {
    /// Every reference cell of `workbook`, sheet by sheet in grid order.
    pub fn collect(workbook: &Workbook) -> Vec<SavedReference> {
        let mut references = Vec::new();
        for sheet in &workbook.sheets {
            let Some(header_row) = first_row(&sheet.grid) else {
                continue;
            };
            for ((row, col), cell) in sheet.grid.iter() {
                if let CellValue::Reference { display, token } = &cell.value {
                    references.push(SavedReference {
                        sheet: sheet.name.clone(),
                        row,
                        header: sheet.grid.value(header_row, col).display_value(),
                        display: display.clone(),
                        token: token.clone(),
                    });
                }
            }
        }
        references
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Index of the first row holding any cell.
pub(crate) fn first_row(grid: &Grid) -> Option<u32> {
    grid.iter().next().map(|((row, _), _)| row)
}
