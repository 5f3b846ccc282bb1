//! FILENAME: core/pivot-engine/src/metadata.rs
//! Pivot metadata rows.
//!
//! A source sheet that has to carry its own classification (for example when
//! it crosses a file boundary before being pivoted) gets three rows prepended
//! above its header:
//! - row 0: role tag per column ("row", "column", "value", "deco", "skip")
//! - row 1: declared order per column
//! - row 2: aggregation tag, only for value columns
//!
//! The header follows at row 3 and the data from row 4.

use grid::{Cell, CellValue, Grid};

use crate::definition::{
    AggregationType, PivotClassification, PivotFieldClassification, PivotRole,
};
use crate::engine::{pivot, PivotSummary};
use crate::error::PivotError;

/// Number of rows prepended by `embed_metadata`.
pub const METADATA_ROWS: u32 = 3;

const ROLE_ROW: u32 = 0;
const ORDER_ROW: u32 = 1;
const AGGREGATION_ROW: u32 = 2;

/// Shifts the flat sheet down and writes the classification above its header.
pub fn embed_metadata(grid: &mut Grid, classification: &PivotClassification) -> Result<(), PivotError> {
    if let Some(last) = grid.last_row() {
        grid.shift_rows(0, last, i64::from(METADATA_ROWS))?;
    }

    for (col, field) in classification.fields.iter().enumerate() {
        let col = col as u32;
        grid.set_cell(ROLE_ROW, col, Cell::new_text(field.role.tag().to_string()));
        grid.set_cell(ORDER_ROW, col, Cell::new_number(f64::from(field.order)));
        if let Some(aggregation) = field.aggregation {
            grid.set_cell(AGGREGATION_ROW, col, Cell::new_text(aggregation.tag().to_string()));
        }
    }
    Ok(())
}

/// Reconstructs the classification from the metadata rows and the header below them.
pub fn read_metadata(grid: &Grid, type_name: &str) -> Result<PivotClassification, PivotError> {
    if grid.row(ROLE_ROW).next().is_none() {
        return Err(PivotError::MissingMetadata);
    }

    let width = grid
        .row(METADATA_ROWS)
        .chain(grid.row(ROLE_ROW))
        .map(|(col, _)| col + 1)
        .max()
        .unwrap_or(0);

    let fields = (0..width)
        .map(|col| read_field(grid, col))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PivotClassification::new(type_name, fields))
}

fn read_field(grid: &Grid, col: u32) -> Result<PivotFieldClassification, PivotError> {
    let invalid = |reason: String| PivotError::InvalidMetadata { column: col, reason };
    let field_name = grid.value(METADATA_ROWS, col).display_value();

    let role = match grid.value(ROLE_ROW, col) {
        v if v.is_blank() => PivotRole::Skip,
        CellValue::Text(tag) => {
            PivotRole::from_tag(tag).ok_or_else(|| invalid(format!("unknown role '{}'", tag)))?
        }
        other => return Err(invalid(format!("role must be text, found {}", other.kind()))),
    };

    let order = match grid.value(ORDER_ROW, col) {
        v if v.is_blank() => 0,
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() <= f64::from(i32::MAX) => *n as i32,
        CellValue::Text(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| invalid(format!("order '{}' is not an integer", s)))?,
        other => return Err(invalid(format!("order '{}' is not an integer", other.display_value()))),
    };

    let aggregation = if role == PivotRole::Value {
        let tag = grid.value(AGGREGATION_ROW, col).display_value();
        if tag.is_empty() {
            return Err(invalid("value column has no aggregation".to_string()));
        }
        Some(
            AggregationType::from_tag(&tag)
                .ok_or_else(|| invalid(format!("unknown aggregation '{}'", tag)))?,
        )
    } else {
        None
    };

    Ok(PivotFieldClassification {
        field_name,
        role,
        order,
        aggregation,
    })
}

/// Removes the metadata rows and moves the header and data back to row 0.
pub fn strip_metadata(grid: &mut Grid) -> Result<(), PivotError> {
    for row in 0..METADATA_ROWS {
        grid.remove_row(row);
    }
    if let Some(last) = grid.last_row() {
        if last >= METADATA_ROWS {
            grid.shift_rows(METADATA_ROWS, last, -i64::from(METADATA_ROWS))?;
        }
    }
    Ok(())
}

/// Pivots a source sheet that carries its own metadata rows, then restores it.
/// The source is restored even when the pivot fails.
pub fn pivot_embedded(
    source: &mut Grid,
    type_name: &str,
    dest: &mut Grid,
) -> Result<PivotSummary, PivotError> {
    let result = read_metadata(source, type_name)
        .and_then(|classification| pivot(source, METADATA_ROWS, &classification, dest));
    strip_metadata(source)?;
    result
}
