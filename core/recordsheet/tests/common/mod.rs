//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for record sheet integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use grid::{Cell, CellValue, Grid};
use persistence::{
    load_xlsx_from_bytes, to_xlsx_bytes, MetaHeader, SavedReference, META_SHEET_NAME, META_VERSION,
};
use recordsheet::{
    AggregationType, BookmarkResolver, DynamicRecord, FieldKind, FieldSpec, FieldType,
    FieldValue, MaterializerRegistry, ObjectRef, PivotAnnotation, Record, RecordError,
    RecordSheetService, RecordType, SheetConfig, WorksheetContent, WorksheetSpec,
};
use std::sync::Arc;

/// A service wired to an in-memory resolver and a materializer that knows `Sale`.
pub struct TestHarness {
    pub service: RecordSheetService,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(SheetConfig::default())
    }

    pub fn with_config(config: SheetConfig) -> Self {
        Self::with_resolver(CustomerFixture::resolver(), config)
    }

    pub fn with_resolver(resolver: BookmarkResolver, config: SheetConfig) -> Self {
        let mut materializer = MaterializerRegistry::new();
        materializer.register(SaleFixture::TYPE_NAME, || Box::new(Sale::default()));
        TestHarness {
            service: RecordSheetService::new(Arc::new(resolver), Arc::new(materializer))
                .with_config(config),
        }
    }

    /// Exports flat and returns the file's bytes.
    pub fn export_flat_bytes(&self, contents: &[WorksheetContent]) -> Vec<u8> {
        let file = self.service.export_flat(contents).unwrap();
        std::fs::read(file.path()).unwrap()
    }

    pub fn export_pivoted_bytes(&self, contents: &[WorksheetContent]) -> Vec<u8> {
        let file = self.service.export_pivoted(contents).unwrap();
        std::fs::read(file.path()).unwrap()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// CUSTOMERS (reference targets)
// ============================================================================

pub struct CustomerFixture;

impl CustomerFixture {
    pub fn acme() -> ObjectRef {
        ObjectRef::new("customer", "1", "ACME Corp")
    }

    pub fn globex() -> ObjectRef {
        ObjectRef::new("customer", "2", "Globex")
    }

    pub fn resolver() -> BookmarkResolver {
        let mut resolver = BookmarkResolver::new();
        resolver.register(Self::acme());
        resolver.register(Self::globex());
        resolver
    }
}

// ============================================================================
// ORDERS (one field of every type, as DynamicRecords)
// ============================================================================

pub struct OrderFixture;

impl OrderFixture {
    pub const TYPE_NAME: &'static str = "OrderRowHandler";

    pub fn record_type() -> RecordType {
        RecordType::new(Self::TYPE_NAME)
            .field(FieldSpec::data("number", "Order No", FieldType::Text))
            .field(FieldSpec::data("status", "Status", FieldType::Enum))
            .field(FieldSpec::data("quantity", "Quantity", FieldType::Integer))
            .field(FieldSpec::data("price", "Price", FieldType::Decimal))
            .field(FieldSpec::data("paid", "Paid", FieldType::Boolean))
            .field(FieldSpec::data("placed", "Placed", FieldType::Date))
            .field(FieldSpec::data("shipped", "Shipped", FieldType::DateTime))
            .field(FieldSpec::data("customer", "Customer", FieldType::Reference))
            .field(FieldSpec::data("internal", "Internal", FieldType::Text).hidden())
            .field(FieldSpec::data("total", "Total", FieldType::Decimal).with_kind(FieldKind::Derived))
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn order(number: &str, quantity: i64, price: f64, customer: ObjectRef) -> DynamicRecord {
        DynamicRecord::new(Self::TYPE_NAME)
            .with("number", FieldValue::Text(number.to_string()))
            .with("status", FieldValue::Text("OPEN".to_string()))
            .with("quantity", FieldValue::Integer(quantity))
            .with("price", FieldValue::Decimal(price))
            .with("paid", FieldValue::Boolean(quantity % 2 == 0))
            .with("placed", FieldValue::Date(Self::date(2024, 3, 1)))
            .with(
                "shipped",
                FieldValue::DateTime(Self::date(2024, 3, 4).and_hms_opt(0, 0, 0).unwrap()),
            )
            .with("customer", FieldValue::Reference(customer))
    }

    pub fn records() -> Vec<Box<dyn Record>> {
        vec![
            Box::new(Self::order("A-100", 3, 19.99, CustomerFixture::acme())),
            Box::new(Self::order("A-101", 12, 0.5, CustomerFixture::globex())),
            Box::new(
                DynamicRecord::new(Self::TYPE_NAME)
                    .with("number", FieldValue::Text("A-102".to_string()))
                    .with("quantity", FieldValue::Integer(-7)),
            ),
        ]
    }

    pub fn content(sheet_name: &str) -> WorksheetContent {
        WorksheetContent::new(WorksheetSpec::new(Self::record_type(), sheet_name), Self::records())
    }
}

// ============================================================================
// SALES (a concrete record with pivot annotations)
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sale {
    pub region: Option<String>,
    pub month: Option<String>,
    pub amount: Option<f64>,
    pub manager: Option<String>,
    pub comment: Option<String>,
}

impl Record for Sale {
    fn type_name(&self) -> &str {
        SaleFixture::TYPE_NAME
    }

    fn get(&self, field_id: &str) -> Option<FieldValue> {
        match field_id {
            "region" => self.region.clone().map(FieldValue::Text),
            "month" => self.month.clone().map(FieldValue::Text),
            "amount" => self.amount.map(FieldValue::Decimal),
            "manager" => self.manager.clone().map(FieldValue::Text),
            "comment" => self.comment.clone().map(FieldValue::Text),
            _ => None,
        }
    }

    fn set(&mut self, field_id: &str, value: FieldValue) -> Result<(), RecordError> {
        match (field_id, value) {
            ("region", FieldValue::Text(s)) => self.region = Some(s),
            ("month", FieldValue::Text(s)) => self.month = Some(s),
            ("amount", FieldValue::Decimal(n)) => self.amount = Some(n),
            ("manager", FieldValue::Text(s)) => self.manager = Some(s),
            ("comment", FieldValue::Text(s)) => self.comment = Some(s),
            (field, value) => {
                return Err(RecordError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("unexpected {} value", value.kind()),
                })
            }
        }
        Ok(())
    }
}

pub struct SaleFixture;

impl SaleFixture {
    pub const TYPE_NAME: &'static str = "Sale";

    pub fn record_type() -> RecordType {
        RecordType::new(Self::TYPE_NAME)
            .field(FieldSpec::data("region", "region", FieldType::Text).with_pivot(PivotAnnotation::Row))
            .field(
                FieldSpec::data("month", "month", FieldType::Text)
                    .with_pivot(PivotAnnotation::Column { order: 1 }),
            )
            .field(FieldSpec::data("amount", "amount", FieldType::Decimal).with_pivot(
                PivotAnnotation::Value { order: 1, aggregation: AggregationType::Sum },
            ))
            .field(
                FieldSpec::data("manager", "manager", FieldType::Text)
                    .with_pivot(PivotAnnotation::Decoration { order: 1 }),
            )
            .field(FieldSpec::data("comment", "comment", FieldType::Text))
    }

    pub fn sale(region: &str, month: &str, amount: f64) -> Sale {
        Sale {
            region: Some(region.to_string()),
            month: Some(month.to_string()),
            amount: Some(amount),
            manager: Some("Kim".to_string()),
            comment: None,
        }
    }

    /// E: Jan 10 + 5, Feb 3; W: Jan 2.
    pub fn records() -> Vec<Box<dyn Record>> {
        vec![
            Box::new(Self::sale("E", "Jan", 10.0)),
            Box::new(Self::sale("E", "Jan", 5.0)),
            Box::new(Self::sale("E", "Feb", 3.0)),
            Box::new(Self::sale("W", "Jan", 2.0)),
        ]
    }

    pub fn content(sheet_name: &str) -> WorksheetContent {
        WorksheetContent::new(WorksheetSpec::new(Self::record_type(), sheet_name), Self::records())
    }
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// Values of every field of `record_type`, in declaration order.
pub fn field_values(record: &dyn Record, record_type: &RecordType) -> Vec<Option<FieldValue>> {
    record_type.fields.iter().map(|f| record.get(&f.id)).collect()
}

/// Asserts both lists hold the same values for every exported field.
pub fn assert_same_records(actual: &[Box<dyn Record>], expected: &[Box<dyn Record>], record_type: &RecordType) {
    assert_eq!(actual.len(), expected.len(), "record count");
    let exported: Vec<&FieldSpec> = record_type
        .fields
        .iter()
        .filter(|f| f.kind == FieldKind::Data && f.visible)
        .collect();
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        for field in &exported {
            assert_eq!(a.get(&field.id), e.get(&field.id), "record {} field '{}'", i, field.id);
        }
    }
}

// ============================================================================
// EDITING EXPORTED FILES
// ============================================================================

/// Applies `edit` to one sheet of an exported file and saves it again with
/// the hidden reference rows left exactly as they were written, the way a
/// spreadsheet application saves a file it did not create.
pub fn edit_sheet(bytes: &[u8], sheet_name: &str, edit: impl FnOnce(&mut Grid)) -> Vec<u8> {
    let mut workbook = load_xlsx_from_bytes(bytes).unwrap();
    let references = SavedReference::collect(&workbook);

    // Plain text again, as the application sees it
    for sheet in &mut workbook.sheets {
        let reference_cells: Vec<((u32, u32), Cell)> = sheet
            .grid
            .iter()
            .filter(|(_, cell)| matches!(cell.value, CellValue::Reference { .. }))
            .map(|(pos, cell)| (pos, cell.clone()))
            .collect();
        for ((row, col), cell) in reference_cells {
            sheet
                .grid
                .set_cell(row, col, Cell::new_text(cell.display_value()).with_style(cell.style_index));
        }
    }
    edit(&mut workbook.sheet_mut(sheet_name).unwrap().grid);

    let meta = workbook.add_sheet(META_SHEET_NAME).unwrap();
    meta.hidden = true;
    let header = MetaHeader { version: META_VERSION, references: references.len() };
    meta.grid.set_cell(0, 0, Cell::new_text(serde_json::to_string(&header).unwrap()));
    for (i, reference) in references.iter().enumerate() {
        meta.grid.set_cell(i as u32 + 1, 0, Cell::new_text(reference.to_json().unwrap()));
    }
    to_xlsx_bytes(&workbook).unwrap()
}

/// Moves every cell of column `a` to column `b` and back.
pub fn swap_columns(grid: &mut Grid, a: u32, b: u32) {
    let cells: Vec<((u32, u32), Cell)> = grid.iter().map(|(pos, cell)| (pos, cell.clone())).collect();
    let mut swapped = Grid::new();
    for ((row, col), cell) in cells {
        let col = if col == a {
            b
        } else if col == b {
            a
        } else {
            col
        };
        swapped.set_cell(row, col, cell);
    }
    *grid = swapped;
}
