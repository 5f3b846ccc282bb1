//! FILENAME: core/recordsheet/src/writer.rs
//! Sheet Writer: header row plus one row per record.

use grid::{Cell, CellStyle, StyleRegistry};
use persistence::Sheet;

use crate::catalog::PropertyCatalog;
use crate::config::SheetConfig;
use crate::error::ConvertError;
use crate::marshal::CellMarshaller;
use crate::record::{IdentityResolver, Record, RecordType};
use crate::log_debug;

pub struct SheetWriter<'a> {
    catalog: &'a PropertyCatalog,
    resolver: &'a dyn IdentityResolver,
    config: &'a SheetConfig,
}

impl<'a> SheetWriter<'a> {
    pub fn new(
        catalog: &'a PropertyCatalog,
        resolver: &'a dyn IdentityResolver,
        config: &'a SheetConfig,
    ) -> Self {
        SheetWriter { catalog, resolver, config }
    }

    /// Writes `records` into `sheet` from row 0 and returns the number of data rows.
    ///
    /// Row 0 holds the field names in catalog order; record `i` goes to row `i + 1`.
    /// Unset values leave their cell out.
    pub fn write(
        &self,
        sheet: &mut Sheet,
        styles: &mut StyleRegistry,
        records: &[Box<dyn Record>],
        record_type: &RecordType,
    ) -> Result<usize, ConvertError> {
        let fields = self.catalog.catalog(record_type)?;

        let header_style = styles.get_or_create(CellStyle::new().with_bold(true));
        for (col, field) in fields.iter().enumerate() {
            sheet
                .grid
                .set_cell(0, col as u32, Cell::new_text(field.name.clone()).with_style(header_style));
        }

        let marshaller = CellMarshaller::new(self.resolver, styles.get_or_create(CellStyle::date()));
        for (i, record) in records.iter().enumerate() {
            let row = i as u32 + 1;
            for (col, field) in fields.iter().enumerate() {
                let value = record.get(&field.id);
                if let Some(cell) = marshaller.to_cell(value.as_ref(), field)? {
                    sheet.grid.set_cell(row, col as u32, cell);
                }
            }
        }

        if self.config.freeze_header {
            sheet.freeze_rows(1);
        }

        log_debug!("EXPORT", "sheet '{}': {} rows of {}", sheet.name, records.len(), record_type.name);
        Ok(records.len())
    }
}
