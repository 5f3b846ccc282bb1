//! FILENAME: core/grid/src/grid.rs
//! PURPOSE: Manages the collection of cells of one worksheet.
//! CONTEXT: This file defines the `Grid` struct which acts as the container
//! for all cell data. Storage is sparse and ordered by (row, col), so rows
//! and the cells within a row are always visited in reading order.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::cell::{Cell, CellValue};

static EMPTY: CellValue = CellValue::Empty;

/// Returned when a row shift would move cells above row 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftError {
    pub row: u32,
    pub offset: i64,
}

impl std::fmt::Display for ShiftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot shift row {} by {}: target is above the first row", self.row, self.offset)
    }
}

impl std::error::Error for ShiftError {}

/// The Grid struct holds the cells of a worksheet.
/// Row and Col are 0-based indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    /// Sparse storage: keys are (row, col), values are Cell instances.
    cells: BTreeMap<(u32, u32), Cell>,
}

impl Grid {
    /// Creates a new, empty Grid.
    pub fn new() -> Self {
        Grid {
            cells: BTreeMap::new(),
        }
    }

    /// Sets a cell at the specified coordinates.
    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        self.cells.insert((row, col), cell);
    }

    /// Retrieves a reference to a cell at the specified coordinates.
    /// Returns None if the cell is not stored.
    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// The value at the coordinates; missing cells read as `Empty`.
    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        self.cells.get(&(row, col)).map_or(&EMPTY, |c| &c.value)
    }

    /// Removes a cell from the grid (clearing it).
    pub fn clear_cell(&mut self, row: u32, col: u32) {
        self.cells.remove(&(row, col));
    }

    /// Iterates the stored cells of one row in column order.
    pub fn row(&self, row: u32) -> impl Iterator<Item = (u32, &Cell)> + '_ {
        self.cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|(&(_, col), cell)| (col, cell))
    }

    /// Distinct indices of rows holding at least one stored cell, ascending.
    pub fn row_indices(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = Vec::new();
        for &(row, _) in self.cells.keys() {
            if rows.last() != Some(&row) {
                rows.push(row);
            }
        }
        rows
    }

    /// Highest row index in use, or None for an empty grid.
    pub fn last_row(&self) -> Option<u32> {
        self.cells.keys().next_back().map(|&(row, _)| row)
    }

    /// Highest column index in use, or None for an empty grid.
    pub fn last_col(&self) -> Option<u32> {
        self.cells.keys().map(|&(_, col)| col).max()
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates every stored cell in reading order.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), &Cell)> + '_ {
        self.cells.iter().map(|(&pos, cell)| (pos, cell))
    }

    /// Removes every cell of a row. Other rows keep their indices.
    pub fn remove_row(&mut self, row: u32) {
        let cols: Vec<u32> = self.row(row).map(|(col, _)| col).collect();
        for col in cols {
            self.cells.remove(&(row, col));
        }
    }

    /// Moves rows `start..=end` by `offset` rows (negative moves up).
    /// Cells already present at the destination rows are overwritten.
    pub fn shift_rows(&mut self, start: u32, end: u32, offset: i64) -> Result<(), ShiftError> {
        if offset == 0 || start > end {
            return Ok(());
        }
        if i64::from(start) + offset < 0 {
            return Err(ShiftError { row: start, offset });
        }

        let moved: Vec<((u32, u32), Cell)> = {
            let keys: Vec<(u32, u32)> = self
                .cells
                .range((Bound::Included((start, 0)), Bound::Included((end, u32::MAX))))
                .map(|(&k, _)| k)
                .collect();
            keys.into_iter()
                .filter_map(|k| self.cells.remove(&k).map(|c| (k, c)))
                .collect()
        };

        // Clear destination rows that are not part of the moved block
        let dest_start = (i64::from(start) + offset) as u32;
        let dest_end = (i64::from(end) + offset) as u32;
        for row in dest_start..=dest_end {
            self.remove_row(row);
        }

        for ((row, col), cell) in moved {
            let target = (i64::from(row) + offset) as u32;
            self.cells.insert((target, col), cell);
        }
        Ok(())
    }
}
