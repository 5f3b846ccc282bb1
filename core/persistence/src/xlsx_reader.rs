//! FILENAME: core/persistence/src/xlsx_reader.rs

use crate::{
    first_row, MetaHeader, PersistenceError, SavedReference, Sheet, Workbook, META_SHEET_NAME,
    META_VERSION,
};
use calamine::{open_workbook, open_workbook_from_rs, Data, Range, Reader, SheetVisible, Xlsx};
use chrono::NaiveDate;
use grid::{serial_to_date, Cell, CellValue, Grid};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

pub fn load_xlsx(path: &Path) -> Result<Workbook, PersistenceError> {
    let workbook: Xlsx<_> = open_workbook(path)?;
    read_workbook(workbook)
}

pub fn load_xlsx_from_bytes(bytes: &[u8]) -> Result<Workbook, PersistenceError> {
    let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    read_workbook(workbook)
}

fn read_workbook<RS: Read + Seek>(mut xlsx: Xlsx<RS>) -> Result<Workbook, PersistenceError> {
    let sheet_meta: Vec<(String, bool)> = xlsx
        .sheets_metadata()
        .iter()
        .map(|s| (s.name.clone(), !matches!(s.visible, SheetVisible::Visible)))
        .collect();

    if sheet_meta.is_empty() {
        return Err(PersistenceError::InvalidFormat(
            "Workbook contains no sheets".to_string(),
        ));
    }

    let mut workbook = Workbook::new();
    let date_style = workbook.date_style();
    let mut references = Vec::new();

    for (sheet_name, hidden) in &sheet_meta {
        let range = xlsx.worksheet_range(sheet_name)?;

        if sheet_name == META_SHEET_NAME {
            references = read_meta_sheet(&range)?;
            continue;
        }

        let mut sheet = Sheet::new(sheet_name.clone());
        sheet.hidden = *hidden;

        // The range starts at the first used cell, not necessarily at A1
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));

        for (row_idx, row) in range.rows().enumerate() {
            for (col_idx, data) in row.iter().enumerate() {
                let value = match data {
                    Data::Empty => continue,
                    Data::String(s) => CellValue::Text(s.clone()),
                    Data::Float(f) => CellValue::Number(*f),
                    Data::Int(i) => CellValue::Number(*i as f64),
                    Data::Bool(b) => CellValue::Boolean(*b),
                    Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
                    Data::DateTime(dt) => match serial_to_date(dt.as_f64()) {
                        Some(date) => CellValue::Date(date),
                        None => CellValue::Number(dt.as_f64()),
                    },
                    Data::DateTimeIso(s) => match s.get(..10).and_then(|d| d.parse::<NaiveDate>().ok()) {
                        Some(date) => CellValue::Date(date),
                        None => CellValue::Text(s.clone()),
                    },
                    Data::DurationIso(s) => CellValue::Text(s.clone()),
                };

                let style_index = if matches!(value, CellValue::Date(_)) { date_style } else { 0 };
                sheet.grid.set_cell(
                    row_offset + row_idx as u32,
                    col_offset + col_idx as u32,
                    Cell::from_value(value).with_style(style_index),
                );
            }
        }

        workbook.sheets.push(sheet);
    }

    apply_references(&mut workbook, references)?;
    Ok(workbook)
}

fn read_meta_sheet(range: &Range<Data>) -> Result<Vec<SavedReference>, PersistenceError> {
    let mut rows = range.rows().map(|row| match row.first() {
        Some(Data::String(s)) => Some(s.as_str()),
        _ => None,
    });

    let header: MetaHeader = match rows.next().flatten() {
        Some(json) => serde_json::from_str(json)?,
        None => return Ok(Vec::new()),
    };
    if header.version != META_VERSION {
        return Err(PersistenceError::InvalidFormat(format!(
            "unsupported metadata version {}",
            header.version
        )));
    }

    rows.flatten().map(SavedReference::from_json).collect()
}

/// Re-attaches saved tokens to the text cells written for references.
/// A token whose column or text can no longer be found leaves the cell as text.
fn apply_references(
    workbook: &mut Workbook,
    references: Vec<SavedReference>,
) -> Result<(), PersistenceError> {
    for reference in references {
        let sheet = workbook.sheet_mut(&reference.sheet).ok_or_else(|| {
            PersistenceError::InvalidFormat(format!(
                "metadata refers to missing sheet '{}'",
                reference.sheet
            ))
        })?;
        let Some(col) = locate_column(&sheet.grid, &reference) else {
            continue;
        };
        let Some(cell) = sheet.grid.get_cell(reference.row, col) else {
            continue;
        };
        if !matches!(&cell.value, CellValue::Text(text) if *text == reference.display) {
            continue;
        }

        let style = cell.style_index;
        sheet.grid.set_cell(
            reference.row,
            col,
            Cell::new_reference(reference.display, reference.token).with_style(style),
        );
    }
    Ok(())
}

/// The column whose first-row text is the reference's header; the
/// leftmost one when the header repeats.
fn locate_column(grid: &Grid, reference: &SavedReference) -> Option<u32> {
    let header_row = first_row(grid)?;
    grid.row(header_row)
        .filter(|(_, cell)| cell.display_value() == reference.header)
        .map(|(col, _)| col)
        .find(|&col| {
            grid.get_cell(reference.row, col)
                .is_some_and(|cell| cell.display_value() == reference.display)
        })
}
