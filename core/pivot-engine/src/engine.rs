//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - Turns a classified flat sheet into a grouped aggregation sheet.
//!
//! Algorithm:
//! 1. Resolve the row field, the column fields and the value fields (declared order)
//! 2. Stream the data rows below the header into the PivotCache
//! 3. Lay out the destination axes: row keys and column key tuples in first-seen order,
//!    each column key tuple crossed with every value field
//! 4. Write the header rows, then one row per row key with the finalized aggregates

use grid::{Cell, CellValue, Grid};

use crate::cache::{ColumnKey, PivotCache};
use crate::definition::{AggregationType, FieldIndex, PivotClassification, PivotRole};
use crate::error::PivotError;

/// Shape of a written pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotSummary {
    /// Header rows at the top of the destination (one per column field, plus the value row).
    pub header_rows: u32,
    /// Distinct row keys, one destination row each.
    pub row_keys: usize,
    /// Destination columns right of the label column.
    pub value_columns: usize,
}

/// One destination column: a column key tuple crossed with a value field.
#[derive(Debug, Clone, Copy)]
struct ValueColumn {
    key_pos: usize,
    value_pos: usize,
}

/// Runs one pivot over a source grid.
struct PivotCalculator<'a> {
    classification: &'a PivotClassification,
    row_field: FieldIndex,
    column_fields: Vec<FieldIndex>,
    value_fields: Vec<FieldIndex>,
    aggregations: Vec<AggregationType>,
}

impl<'a> PivotCalculator<'a> {
    fn new(classification: &'a PivotClassification) -> Result<Self, PivotError> {
        classification.validate()?;

        let row_field = classification.row_field().ok_or_else(|| PivotError::Validation {
            type_name: classification.type_name.clone(),
            rule: crate::error::ValidationRule::MissingRow,
        })?;
        let column_fields = classification.ordered(PivotRole::Column);
        let value_fields = classification.ordered(PivotRole::Value);
        let aggregations = value_fields
            .iter()
            .map(|&i| classification.fields[i].aggregation.unwrap_or_default())
            .collect();

        Ok(PivotCalculator {
            classification,
            row_field,
            column_fields,
            value_fields,
            aggregations,
        })
    }

    /// Reads every data row below `header_row` into a fresh cache.
    fn build_cache(&self, source: &Grid, header_row: u32) -> Result<PivotCache, PivotError> {
        let expected = self.classification.fields.len();
        let found = source
            .row(header_row)
            .map(|(col, _)| col as usize + 1)
            .max()
            .unwrap_or(0);
        if found != expected {
            return Err(PivotError::ShapeMismatch { expected, found });
        }

        let mut cache = PivotCache::new(self.column_fields.len(), self.value_fields.len());
        for row in source.row_indices().into_iter().filter(|&r| r > header_row) {
            let columns: Vec<Option<&Cell>> = self
                .column_fields
                .iter()
                .map(|&f| source.get_cell(row, f as u32))
                .collect();
            let values: Vec<&CellValue> = self
                .value_fields
                .iter()
                .map(|&f| source.value(row, f as u32))
                .collect();

            cache.add_record(source.get_cell(row, self.row_field as u32), &columns, &values);
        }
        Ok(cache)
    }

    fn write(&self, cache: &PivotCache, dest: &mut Grid) -> PivotSummary {
        let layout: Vec<ValueColumn> = (0..cache.column_keys().len())
            .flat_map(|key_pos| {
                (0..self.value_fields.len()).map(move |value_pos| ValueColumn { key_pos, value_pos })
            })
            .collect();

        // One header row per column field
        for (level, &field) in self.column_fields.iter().enumerate() {
            let row = level as u32;
            dest.set_cell(row, 0, self.name_cell(field));
            for (j, column) in layout.iter().enumerate() {
                let key: &ColumnKey = &cache.column_keys()[column.key_pos];
                if let Some(label) = cache.column_fields[level].label(key[level]) {
                    dest.set_cell(row, j as u32 + 1, label.clone());
                }
            }
        }

        // Row field name above the labels, value field names above the aggregates
        let value_header = self.column_fields.len() as u32;
        dest.set_cell(value_header, 0, self.name_cell(self.row_field));
        for (j, column) in layout.iter().enumerate() {
            let field = self.value_fields[column.value_pos];
            dest.set_cell(value_header, j as u32 + 1, self.name_cell(field));
        }

        let first_data_row = value_header + 1;
        for (row_pos, &row_id) in cache.row_keys().iter().enumerate() {
            let row = first_data_row + row_pos as u32;
            if let Some(label) = cache.row_field.label(row_id) {
                dest.set_cell(row, 0, label.clone());
            }

            for (j, column) in layout.iter().enumerate() {
                let aggregate = cache
                    .get_aggregate(row_pos, column.key_pos)
                    .and_then(|accs| accs[column.value_pos].compute(self.aggregations[column.value_pos]));
                // No contributions stay blank, never zero
                if let Some(n) = aggregate {
                    dest.set_cell(row, j as u32 + 1, Cell::new_number(n));
                }
            }
        }

        PivotSummary {
            header_rows: first_data_row,
            row_keys: cache.row_keys().len(),
            value_columns: layout.len(),
        }
    }

    fn name_cell(&self, field: FieldIndex) -> Cell {
        Cell::new_text(self.classification.fields[field].field_name.clone())
    }
}

/// Pivots `source` into `dest`.
///
/// `header_row` is the row holding the field names; every physical row below
/// it is a record. Column `i` of the source belongs to `classification.fields[i]`.
/// `dest` is expected to be empty; the pivot is written from A1.
pub fn pivot(
    source: &Grid,
    header_row: u32,
    classification: &PivotClassification,
    dest: &mut Grid,
) -> Result<PivotSummary, PivotError> {
    let calculator = PivotCalculator::new(classification)?;
    let cache = calculator.build_cache(source, header_row)?;
    Ok(calculator.write(&cache, dest))
}
