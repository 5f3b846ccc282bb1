//! FILENAME: core/grid/src/cell.rs
//! PURPOSE: Defines the fundamental data structures for a single worksheet cell.
//! CONTEXT: This file contains the `Cell` struct and `CellValue` enum.
//! A cell carries one typed value plus an index into the shared StyleRegistry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The typed content of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    /// A handle to a domain object: rendered as `display`, resolved via `token`.
    Reference { display: String, token: String },
}

impl CellValue {
    /// True for cells that carry no user data. Empty text counts as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Short name of the cell kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Empty => "blank",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Boolean(_) => "boolean",
            CellValue::Date(_) => "date",
            CellValue::Reference { .. } => "reference",
        }
    }

    /// Returns the display value as a String.
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => {
                if *b { "TRUE" } else { "FALSE" }.to_string()
            }
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Reference { display, .. } => display.clone(),
        }
    }
}

/// The atomic unit of the worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub style_index: usize,
}

impl Cell {
    pub fn new() -> Self {
        Cell {
            value: CellValue::Empty,
            style_index: 0,
        }
    }

    pub fn new_number(num: f64) -> Self {
        Cell {
            value: CellValue::Number(num),
            style_index: 0,
        }
    }

    pub fn new_text(text: String) -> Self {
        Cell {
            value: CellValue::Text(text),
            style_index: 0,
        }
    }

    pub fn new_boolean(value: bool) -> Self {
        Cell {
            value: CellValue::Boolean(value),
            style_index: 0,
        }
    }

    /// Date cells need a date number format to be shown as dates,
    /// so the caller passes the index of a registered date style.
    pub fn new_date(date: NaiveDate, style_index: usize) -> Self {
        Cell {
            value: CellValue::Date(date),
            style_index,
        }
    }

    pub fn new_reference(display: String, token: String) -> Self {
        Cell {
            value: CellValue::Reference { display, token },
            style_index: 0,
        }
    }

    pub fn from_value(value: CellValue) -> Self {
        Cell {
            value,
            style_index: 0,
        }
    }

    pub fn with_style(mut self, style_index: usize) -> Self {
        self.style_index = style_index;
        self
    }

    pub fn display_value(&self) -> String {
        self.value.display_value()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}
