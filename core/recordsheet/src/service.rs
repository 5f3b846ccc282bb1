//! FILENAME: core/recordsheet/src/service.rs
//! Boundary operations: export to a temporary XLSX file, import from bytes.

use persistence::{load_xlsx_from_bytes, write_xlsx, Workbook};
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::catalog::PropertyCatalog;
use crate::config::SheetConfig;
use crate::coordinator::{WorkbookCoordinator, WorksheetContent, WorksheetSpec};
use crate::error::ConvertError;
use crate::reader::SheetReader;
use crate::record::{IdentityResolver, Record, RecordMaterializer, RecordType};
use crate::log_info;

/// Owns the catalog cache and the collaborators shared by every call.
pub struct RecordSheetService {
    config: SheetConfig,
    catalog: PropertyCatalog,
    resolver: Arc<dyn IdentityResolver>,
    materializer: Arc<dyn RecordMaterializer>,
}

impl RecordSheetService {
    pub fn new(resolver: Arc<dyn IdentityResolver>, materializer: Arc<dyn RecordMaterializer>) -> Self {
        RecordSheetService {
            config: SheetConfig::default(),
            catalog: PropertyCatalog::new(),
            resolver,
            materializer,
        }
    }

    pub fn with_config(mut self, config: SheetConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PropertyCatalog {
        &self.catalog
    }

    fn coordinator(&self) -> WorkbookCoordinator<'_> {
        WorkbookCoordinator::new(&self.catalog, self.resolver.as_ref(), &self.config)
    }

    fn reader(&self) -> SheetReader<'_> {
        SheetReader::new(
            &self.catalog,
            self.resolver.as_ref(),
            self.materializer.as_ref(),
            &self.config,
        )
    }

    /// One flat sheet per content. The file is deleted when the handle is dropped.
    pub fn export_flat(&self, contents: &[WorksheetContent]) -> Result<NamedTempFile, ConvertError> {
        let workbook = self.coordinator().build_flat(contents)?;
        self.write_temp(&workbook)
    }

    /// One pivot sheet plus its hidden source sheet per content.
    pub fn export_pivoted(&self, contents: &[WorksheetContent]) -> Result<NamedTempFile, ConvertError> {
        let workbook = self.coordinator().build_pivoted(contents)?;
        self.write_temp(&workbook)
    }

    pub fn import_typed(
        &self,
        record_type: &RecordType,
        sheet_name: &str,
        bytes: &[u8],
    ) -> Result<Vec<Box<dyn Record>>, ConvertError> {
        let workbook = load_xlsx_from_bytes(bytes)?;
        self.reader().read(&workbook, record_type, sheet_name)
    }

    /// Imports every spec from one file, in order. The first failure aborts the call.
    pub fn import_multiple(
        &self,
        specs: &[WorksheetSpec],
        bytes: &[u8],
    ) -> Result<Vec<Vec<Box<dyn Record>>>, ConvertError> {
        let workbook = load_xlsx_from_bytes(bytes)?;
        let reader = self.reader();
        specs
            .iter()
            .map(|spec| reader.read(&workbook, &spec.record_type, &spec.sheet_name))
            .collect()
    }

    /// A partly written file is removed when `file` is dropped on the error path.
    fn write_temp(&self, workbook: &Workbook) -> Result<NamedTempFile, ConvertError> {
        let mut file = tempfile::Builder::new()
            .prefix(&self.config.temp_file_prefix)
            .suffix(".xlsx")
            .tempfile()?;
        write_xlsx(workbook, file.as_file_mut())?;
        log_info!("EXPORT", "workbook written to {}", file.path().display());
        Ok(file)
    }
}
