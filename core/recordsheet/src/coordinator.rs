//! FILENAME: core/recordsheet/src/coordinator.rs
//! Workbook Coordinator: validates a batch of worksheet requests and builds
//! one workbook from them, flat or pivoted.

use grid::{Grid, StyleRegistry};
use persistence::{FreezePane, Sheet, Workbook};
use pivot_engine::{
    classify, embed_metadata, pivot, pivot_embedded, AnnotatedField, PivotClassification,
    PivotSummary,
};
use std::collections::HashSet;

use crate::catalog::PropertyCatalog;
use crate::config::{PivotMetadataMode, SheetConfig};
use crate::error::ConvertError;
use crate::record::{IdentityResolver, Record, RecordType};
use crate::writer::SheetWriter;
use crate::{log_debug, log_info};

/// Characters a worksheet name cannot contain.
const FORBIDDEN_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Which record type goes to which sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetSpec {
    pub record_type: RecordType,
    pub sheet_name: String,
}

impl WorksheetSpec {
    pub fn new(record_type: RecordType, sheet_name: &str) -> Self {
        WorksheetSpec {
            record_type,
            sheet_name: sheet_name.to_string(),
        }
    }
}

/// The records of one sheet.
#[derive(Debug)]
pub struct WorksheetContent {
    pub spec: WorksheetSpec,
    pub records: Vec<Box<dyn Record>>,
}

impl WorksheetContent {
    pub fn new(spec: WorksheetSpec, records: Vec<Box<dyn Record>>) -> Self {
        WorksheetContent { spec, records }
    }
}

pub struct WorkbookCoordinator<'a> {
    catalog: &'a PropertyCatalog,
    resolver: &'a dyn IdentityResolver,
    config: &'a SheetConfig,
}

impl<'a> WorkbookCoordinator<'a> {
    pub fn new(
        catalog: &'a PropertyCatalog,
        resolver: &'a dyn IdentityResolver,
        config: &'a SheetConfig,
    ) -> Self {
        WorkbookCoordinator { catalog, resolver, config }
    }

    /// One flat sheet per content, in order.
    pub fn build_flat(&self, contents: &[WorksheetContent]) -> Result<Workbook, ConvertError> {
        let names: Vec<String> = contents.iter().map(|c| c.spec.sheet_name.clone()).collect();
        self.validate_names(&names)?;
        for content in contents {
            self.catalog.catalog(&content.spec.record_type)?;
        }

        log_info!("EXPORT", "building flat workbook with {} sheets", contents.len());
        let writer = SheetWriter::new(self.catalog, self.resolver, self.config);
        let mut workbook = Workbook::new();
        for content in contents {
            let mut sheet = Sheet::new(content.spec.sheet_name.clone());
            writer.write(&mut sheet, &mut workbook.styles, &content.records, &content.spec.record_type)?;
            workbook.push_sheet(sheet)?;
        }
        Ok(workbook)
    }

    /// Per content: a visible pivot sheet followed by its source sheet,
    /// which holds the flat export the pivot was computed from.
    pub fn build_pivoted(&self, contents: &[WorksheetContent]) -> Result<Workbook, ConvertError> {
        let mut names: Vec<String> = contents.iter().map(|c| c.spec.sheet_name.clone()).collect();
        let source_names: Vec<String> = names.iter().map(|n| self.source_sheet_name(n)).collect();
        names.extend(source_names.iter().cloned());
        self.validate_names(&names)?;

        let classifications = contents
            .iter()
            .map(|c| self.classify(&c.spec.record_type))
            .collect::<Result<Vec<_>, _>>()?;

        log_info!("EXPORT", "building pivoted workbook with {} pivots", contents.len());
        let writer = SheetWriter::new(self.catalog, self.resolver, self.config);
        let mut workbook = Workbook::new();

        for ((content, classification), source_name) in
            contents.iter().zip(&classifications).zip(source_names)
        {
            let record_type = &content.spec.record_type;
            let mut source = Sheet::new(source_name);
            writer.write(&mut source, &mut workbook.styles, &content.records, record_type)?;

            let mut pivot_sheet = Sheet::new(content.spec.sheet_name.clone());
            let summary = self.pivot_source(&mut source.grid, classification, &mut pivot_sheet.grid)?;
            embolden_rows(&mut pivot_sheet.grid, summary.header_rows, &mut workbook.styles);

            if self.config.freeze_header {
                pivot_sheet.freeze = Some(FreezePane {
                    rows: summary.header_rows,
                    cols: 1,
                });
            }
            source.hidden = self.config.hide_pivot_source;

            log_info!(
                "PIVOT",
                "sheet '{}': {} row keys x {} value columns",
                pivot_sheet.name,
                summary.row_keys,
                summary.value_columns
            );
            workbook.push_sheet(pivot_sheet)?;
            workbook.push_sheet(source)?;
        }
        Ok(workbook)
    }

    /// Name of the sheet holding the flat export behind a pivot sheet,
    /// cut to the maximum sheet name length.
    pub fn source_sheet_name(&self, sheet_name: &str) -> String {
        format!("{}{}", self.config.pivot_source_prefix, sheet_name)
            .chars()
            .take(self.config.max_sheet_name_len)
            .collect()
    }

    /// Rejects empty, over-long, duplicate (ignoring case) names and names
    /// with characters a worksheet name cannot hold.
    pub fn validate_names(&self, names: &[String]) -> Result<(), ConvertError> {
        let mut seen = HashSet::new();
        for name in names {
            if name.is_empty() {
                return Err(ConvertError::Naming("Sheet name cannot be empty".to_string()));
            }
            if name.chars().count() > self.config.max_sheet_name_len {
                return Err(ConvertError::Naming(format!(
                    "Sheet name cannot exceed {} characters (invalid name: '{}')",
                    self.config.max_sheet_name_len, name
                )));
            }
            if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
                return Err(ConvertError::Naming(format!(
                    "Sheet name cannot contain '{}' (invalid name: '{}')",
                    c, name
                )));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ConvertError::Naming(format!(
                    "Sheet names must have distinct names (duplicate: '{}')",
                    name
                )));
            }
        }
        Ok(())
    }

    fn classify(&self, record_type: &RecordType) -> Result<PivotClassification, ConvertError> {
        let fields = self.catalog.catalog(record_type)?;
        let annotated: Vec<AnnotatedField<'_>> = fields
            .iter()
            .map(|f| AnnotatedField::new(&f.name, f.pivot))
            .collect();
        Ok(classify(&record_type.name, &annotated)?)
    }

    fn pivot_source(
        &self,
        source: &mut Grid,
        classification: &PivotClassification,
        dest: &mut Grid,
    ) -> Result<PivotSummary, ConvertError> {
        let summary = match self.config.pivot_metadata {
            PivotMetadataMode::InMemory => pivot(source, 0, classification, dest)?,
            PivotMetadataMode::EmbeddedRows => {
                embed_metadata(source, classification)?;
                log_debug!("PIVOT", "metadata rows embedded for {}", classification.type_name);
                pivot_embedded(source, &classification.type_name, dest)?
            }
        };
        Ok(summary)
    }
}

/// Makes every cell of the first `rows` rows bold, keeping its other formatting.
fn embolden_rows(grid: &mut Grid, rows: u32, styles: &mut StyleRegistry) {
    let header: Vec<((u32, u32), grid::Cell)> = grid
        .iter()
        .take_while(|((row, _), _)| *row < rows)
        .map(|(pos, cell)| (pos, cell.clone()))
        .collect();

    for ((row, col), cell) in header {
        let bold = styles.get(cell.style_index).clone().with_bold(true);
        let style = styles.get_or_create(bold);
        grid.set_cell(row, col, cell.with_style(style));
    }
}
