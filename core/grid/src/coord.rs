//! FILENAME: core/grid/src/coord.rs
//! PURPOSE: Converts 0-based (row, col) indices to A1-style notation.
//! CONTEXT: Used to point at cells in diagnostics. Column 0 = "A",
//! 25 = "Z", 26 = "AA". Row 0 internally = row 1 in A1 notation.

/// A cell coordinate as (row, col) with 0-based indices.
pub type CellCoord = (u32, u32);

/// Converts a 0-based column index to a column string.
/// 0 -> "A", 1 -> "B", ..., 25 -> "Z", 26 -> "AA", 27 -> "AB", etc.
pub fn index_to_col(mut col_index: u32) -> String {
    let mut result = String::new();
    loop {
        let remainder = col_index % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if col_index < 26 {
            break;
        }
        col_index = col_index / 26 - 1;
    }
    result
}

/// Converts a 0-based (row, col) coordinate to an A1-style reference string.
/// (0, 0) -> "A1", (1, 1) -> "B2", (99, 26) -> "AA100"
pub fn coord_to_a1(coord: CellCoord) -> String {
    let (row, col) = coord;
    format!("{}{}", index_to_col(col), row + 1)
}
