//! FILENAME: core/persistence/src/xlsx_writer.rs

use crate::{MetaHeader, PersistenceError, SavedReference, Workbook, META_SHEET_NAME, META_VERSION};
use chrono::{Datelike, NaiveDate};
use grid::{CellStyle, CellValue, NumberFormat, DATE_FORMAT};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook as XlsxWorkbook};
use std::io::Write;
use std::path::Path;

pub fn save_xlsx(workbook: &Workbook, path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = build_xlsx(workbook)?;
    xlsx.save(path)?;
    Ok(())
}

pub fn to_xlsx_bytes(workbook: &Workbook) -> Result<Vec<u8>, PersistenceError> {
    let mut xlsx = build_xlsx(workbook)?;
    Ok(xlsx.save_to_buffer()?)
}

/// Encodes the workbook and writes the complete file to `writer`.
pub fn write_xlsx<W: Write>(workbook: &Workbook, writer: &mut W) -> Result<(), PersistenceError> {
    let bytes = to_xlsx_bytes(workbook)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

fn build_xlsx(workbook: &Workbook) -> Result<XlsxWorkbook, PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();

    // One Format per registered style, indexed like the registry
    let formats: Vec<Format> = workbook
        .styles
        .all_styles()
        .iter()
        .map(convert_style_to_format)
        .collect();

    for sheet in &workbook.sheets {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for ((row, col), cell) in sheet.grid.iter() {
            let col16 = column_number(col)?;
            let format = if cell.style_index > 0 && cell.style_index < formats.len() {
                Some(&formats[cell.style_index])
            } else {
                None
            };

            match &cell.value {
                CellValue::Empty => {}
                CellValue::Number(n) => {
                    if let Some(fmt) = format {
                        worksheet.write_number_with_format(row, col16, *n, fmt)?;
                    } else {
                        worksheet.write_number(row, col16, *n)?;
                    }
                }
                CellValue::Text(s) => {
                    if let Some(fmt) = format {
                        worksheet.write_string_with_format(row, col16, s, fmt)?;
                    } else {
                        worksheet.write_string(row, col16, s)?;
                    }
                }
                CellValue::Boolean(b) => {
                    if let Some(fmt) = format {
                        worksheet.write_boolean_with_format(row, col16, *b, fmt)?;
                    } else {
                        worksheet.write_boolean(row, col16, *b)?;
                    }
                }
                CellValue::Date(date) => {
                    let datetime = excel_date(date)?;
                    let style = workbook.styles.get(cell.style_index);
                    // A date without a date format would show as a bare serial
                    let fmt = match (&style.number_format, format) {
                        (NumberFormat::Date { .. }, Some(fmt)) => fmt.clone(),
                        _ => convert_style_to_format(style).set_num_format(DATE_FORMAT),
                    };
                    worksheet.write_datetime_with_format(row, col16, &datetime, &fmt)?;
                }
                // The token goes to the metadata sheet
                CellValue::Reference { display, .. } => {
                    if let Some(fmt) = format {
                        worksheet.write_string_with_format(row, col16, display, fmt)?;
                    } else {
                        worksheet.write_string(row, col16, display)?;
                    }
                }
            }
        }

        if let Some(freeze) = sheet.freeze {
            worksheet.set_freeze_panes(freeze.rows, freeze.cols)?;
        }
        if sheet.hidden {
            worksheet.set_hidden(true);
        }
    }

    let references = SavedReference::collect(workbook);
    if !references.is_empty() {
        write_meta_sheet(&mut xlsx, &references)?;
    }

    Ok(xlsx)
}

fn write_meta_sheet(
    xlsx: &mut XlsxWorkbook,
    references: &[SavedReference],
) -> Result<(), PersistenceError> {
    let worksheet = xlsx.add_worksheet();
    worksheet.set_name(META_SHEET_NAME)?;
    worksheet.set_hidden(true);

    let header = MetaHeader {
        version: META_VERSION,
        references: references.len(),
    };
    worksheet.write_string(0, 0, serde_json::to_string(&header)?)?;

    // One reference per row keeps every cell well below the XLSX text limit
    for (i, reference) in references.iter().enumerate() {
        worksheet.write_string(i as u32 + 1, 0, reference.to_json()?)?;
    }
    Ok(())
}

fn column_number(col: u32) -> Result<u16, PersistenceError> {
    u16::try_from(col)
        .map_err(|_| PersistenceError::InvalidFormat(format!("column index {} out of range", col)))
}

fn excel_date(date: &NaiveDate) -> Result<ExcelDateTime, PersistenceError> {
    let year = u16::try_from(date.year()).map_err(|_| {
        PersistenceError::InvalidFormat(format!("date {} cannot be stored in a worksheet", date))
    })?;
    Ok(ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)?)
}

fn convert_style_to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();

    if style.bold {
        format = format.set_bold();
    }

    match &style.number_format {
        NumberFormat::General => {}
        NumberFormat::Date { format: fmt } => {
            format = format.set_num_format(fmt);
        }
    }

    format
}
