//! FILENAME: core/grid/src/lib.rs
//! PURPOSE: Main library entry point for the worksheet grid abstraction.
//! CONTEXT: Sheets contain rows, rows contain indexed cells, cells carry a
//! typed value and a style index. Re-exports public types for other crates.

pub mod cell;
pub mod coord;
pub mod date;
pub mod grid;
pub mod style;

// Re-export commonly used types at the crate root
pub use cell::{Cell, CellValue};
pub use coord::{coord_to_a1, index_to_col, CellCoord};
pub use date::serial_to_date;
pub use grid::{Grid, ShiftError};
pub use style::{CellStyle, NumberFormat, StyleRegistry, DATE_FORMAT};
