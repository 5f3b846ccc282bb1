//! FILENAME: core/recordsheet/src/reader.rs
//! Sheet Reader: rebuilds records from a worksheet.
//!
//! The first physical row is the header. Header cells are bound to catalog
//! fields by name (then id), ignoring case, so columns may come in any order
//! and unknown columns are skipped. A data row without a single non-blank
//! bound value is not a record.

use grid::coord_to_a1;
use persistence::{Sheet, Workbook};
use std::collections::BTreeMap;

use crate::catalog::{find_field, FieldDescriptor, PropertyCatalog};
use crate::config::SheetConfig;
use crate::error::ConvertError;
use crate::marshal::CellMarshaller;
use crate::record::{IdentityResolver, Record, RecordMaterializer, RecordType};
use crate::{log_debug, log_info, log_warn};

pub struct SheetReader<'a> {
    catalog: &'a PropertyCatalog,
    resolver: &'a dyn IdentityResolver,
    materializer: &'a dyn RecordMaterializer,
    config: &'a SheetConfig,
}

impl<'a> SheetReader<'a> {
    pub fn new(
        catalog: &'a PropertyCatalog,
        resolver: &'a dyn IdentityResolver,
        materializer: &'a dyn RecordMaterializer,
        config: &'a SheetConfig,
    ) -> Self {
        SheetReader { catalog, resolver, materializer, config }
    }

    /// Sheet names tried for `record_type`, in order: the requested name
    /// (when non-empty), then the type name with the first matching
    /// configured suffix removed.
    pub fn candidate_sheet_names(&self, record_type: &RecordType, sheet_name: &str) -> Vec<String> {
        let mut names = Vec::new();
        if !sheet_name.is_empty() {
            names.push(sheet_name.to_string());
        }
        let derived = self
            .config
            .sheet_name_suffixes
            .iter()
            .find_map(|suffix| record_type.name.strip_suffix(suffix.as_str()))
            .filter(|stem| !stem.is_empty());
        if let Some(stem) = derived {
            if !names.iter().any(|n| n == stem) {
                names.push(stem.to_string());
            }
        }
        names
    }

    pub fn lookup_sheet<'w>(
        &self,
        workbook: &'w Workbook,
        record_type: &RecordType,
        sheet_name: &str,
    ) -> Result<&'w Sheet, ConvertError> {
        let candidates = self.candidate_sheet_names(record_type, sheet_name);
        match candidates.iter().find_map(|name| workbook.sheet(name)) {
            Some(sheet) => {
                log_info!("IMPORT", "reading {} from sheet '{}'", record_type.name, sheet.name);
                Ok(sheet)
            }
            None => Err(ConvertError::SheetNotFound { candidates }),
        }
    }

    /// Reads every record of `record_type` from the resolved sheet.
    ///
    /// Fails on the first row that cannot be imported, wrapping the cause in
    /// `ConvertError::RowImport` with the row's 0-based index. Nothing is
    /// returned for the rows before it.
    pub fn read(
        &self,
        workbook: &Workbook,
        record_type: &RecordType,
        sheet_name: &str,
    ) -> Result<Vec<Box<dyn Record>>, ConvertError> {
        let sheet = self.lookup_sheet(workbook, record_type, sheet_name)?;
        let fields = self.catalog.catalog(record_type)?;
        let marshaller = CellMarshaller::new(self.resolver, 0);

        let mut rows = sheet.grid.row_indices().into_iter();
        let Some(header_row) = rows.next() else {
            return Ok(Vec::new());
        };
        let bindings = self.bind_header(sheet, header_row, &fields);

        let mut records = Vec::new();
        for row in rows {
            let record = self
                .read_row(sheet, row, &bindings, record_type, &marshaller)
                .map_err(|e| ConvertError::RowImport { row, source: Box::new(e) })?;
            match record {
                Some(record) => records.push(record),
                None => log_debug!("IMPORT", "skipping blank row {}", row),
            }
        }

        log_info!("IMPORT", "imported {} {} records", records.len(), record_type.name);
        Ok(records)
    }

    /// Column index to field binding for the header row.
    fn bind_header<'f>(
        &self,
        sheet: &Sheet,
        header_row: u32,
        fields: &'f [FieldDescriptor],
    ) -> BTreeMap<u32, &'f FieldDescriptor> {
        let mut bindings: BTreeMap<u32, &FieldDescriptor> = BTreeMap::new();
        for (col, cell) in sheet.grid.row(header_row) {
            if cell.value.is_blank() {
                continue;
            }
            let header = cell.display_value();
            match find_field(fields, &header) {
                Some(index) => {
                    let field = &fields[index];
                    if let Some((&other, _)) = bindings.iter().find(|(_, f)| f.id == field.id) {
                        log_warn!(
                            "IMPORT",
                            "columns {} and {} both map to '{}'; the later one wins",
                            other,
                            col,
                            field.name
                        );
                    }
                    bindings.insert(col, field);
                }
                None => log_debug!(
                    "IMPORT",
                    "ignoring column {} ('{}')",
                    coord_to_a1((header_row, col)),
                    header
                ),
            }
        }
        bindings
    }

    fn read_row(
        &self,
        sheet: &Sheet,
        row: u32,
        bindings: &BTreeMap<u32, &FieldDescriptor>,
        record_type: &RecordType,
        marshaller: &CellMarshaller<'_>,
    ) -> Result<Option<Box<dyn Record>>, ConvertError> {
        let mut record: Option<Box<dyn Record>> = None;

        for (col, cell) in sheet.grid.row(row) {
            let Some(field) = bindings.get(&col) else {
                continue;
            };
            let Some(value) = marshaller.from_cell(&cell.value, field)? else {
                continue;
            };
            if record.is_none() {
                record = Some(self.materializer.new_transient(record_type)?);
            }
            if let Some(target) = record.as_mut() {
                target.set(&field.id, value)?;
            }
        }

        match record {
            Some(template) if self.materializer.requires_template(record_type) => {
                Ok(Some(self.materializer.new_from_template(record_type, template)?))
            }
            other => Ok(other),
        }
    }
}
