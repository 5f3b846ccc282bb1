//! FILENAME: core/recordsheet/tests/test_round_trip.rs
//! Integration tests for flat export followed by import.

mod common;

use common::{assert_same_records, field_values, OrderFixture, Sale, SaleFixture, TestHarness};
use grid::CellValue;
use persistence::load_xlsx_from_bytes;
use recordsheet::{
    DynamicRecord, FieldSpec, FieldType, FieldValue, RecordType, WorksheetContent, WorksheetSpec,
};

// ============================================================================
// ROUND TRIP
// ============================================================================

#[test]
fn test_flat_round_trip() {
    let harness = TestHarness::new();
    let bytes = harness.export_flat_bytes(&[OrderFixture::content("Orders")]);

    let imported = harness
        .service
        .import_typed(&OrderFixture::record_type(), "Orders", &bytes)
        .unwrap();

    assert_same_records(&imported, &OrderFixture::records(), &OrderFixture::record_type());
}

#[test]
fn test_hidden_and_derived_fields_are_not_exported() {
    let harness = TestHarness::new();
    let mut content = OrderFixture::content("Orders");
    content.records = vec![Box::new(
        OrderFixture::order("A-1", 1, 1.0, common::CustomerFixture::acme())
            .with("internal", FieldValue::Text("secret".to_string()))
            .with("total", FieldValue::Decimal(1.0)),
    )];
    let bytes = harness.export_flat_bytes(&[content]);

    let workbook = load_xlsx_from_bytes(&bytes).unwrap();
    let sheet = workbook.sheet("Orders").unwrap();
    let headers: Vec<String> = sheet.grid.row(0).map(|(_, c)| c.display_value()).collect();
    assert_eq!(
        headers,
        vec!["Order No", "Status", "Quantity", "Price", "Paid", "Placed", "Shipped", "Customer"]
    );

    let imported = harness
        .service
        .import_typed(&OrderFixture::record_type(), "Orders", &bytes)
        .unwrap();
    assert_eq!(imported[0].get("internal"), None);
    assert_eq!(imported[0].get("total"), None);
}

#[test]
fn test_flat_sheet_layout() {
    let harness = TestHarness::new();
    let bytes = harness.export_flat_bytes(&[OrderFixture::content("Orders")]);
    let workbook = load_xlsx_from_bytes(&bytes).unwrap();

    // The reference metadata sheet is consumed on load
    assert_eq!(workbook.sheet_names(), vec!["Orders"]);

    let sheet = workbook.sheet("Orders").unwrap();
    assert_eq!(sheet.grid.value(1, 0), &CellValue::Text("A-100".to_string()));
    assert_eq!(sheet.grid.value(1, 2), &CellValue::Number(3.0));
    assert_eq!(sheet.grid.value(1, 5), &CellValue::Date(OrderFixture::date(2024, 3, 1)));
    assert_eq!(
        sheet.grid.value(1, 7),
        &CellValue::Reference { display: "ACME Corp".to_string(), token: "customer:1".to_string() }
    );
    assert_eq!(sheet.grid.last_row(), Some(3));
    assert_eq!(sheet.grid.value(3, 0), &CellValue::Text("A-102".to_string()));
    assert!(sheet.grid.get_cell(3, 3).is_none());
    assert!(!sheet.hidden);
}

#[test]
fn test_date_time_keeps_only_the_date() {
    let harness = TestHarness::new();
    let mut content = OrderFixture::content("Orders");
    let shipped = OrderFixture::date(2024, 3, 4).and_hms_opt(17, 45, 0).unwrap();
    content.records = vec![Box::new(
        recordsheet::DynamicRecord::new(OrderFixture::TYPE_NAME)
            .with("shipped", FieldValue::DateTime(shipped)),
    )];
    let bytes = harness.export_flat_bytes(&[content]);

    let imported = harness
        .service
        .import_typed(&OrderFixture::record_type(), "Orders", &bytes)
        .unwrap();
    assert_eq!(
        imported[0].get("shipped"),
        Some(FieldValue::DateTime(OrderFixture::date(2024, 3, 4).and_hms_opt(0, 0, 0).unwrap()))
    );
}

#[test]
fn test_typed_records_come_back_as_their_type() {
    let harness = TestHarness::new();
    let bytes = harness.export_flat_bytes(&[SaleFixture::content("Sales")]);

    let imported = harness
        .service
        .import_typed(&SaleFixture::record_type(), "Sales", &bytes)
        .unwrap();

    let sales: Vec<Sale> = imported
        .into_iter()
        .map(|r| *r.downcast::<Sale>().unwrap())
        .collect();
    assert_eq!(sales[0], SaleFixture::sale("E", "Jan", 10.0));
    assert_eq!(sales[3], SaleFixture::sale("W", "Jan", 2.0));
}

#[test]
fn test_multiple_sheets_in_one_workbook() {
    let harness = TestHarness::new();
    let bytes = harness.export_flat_bytes(&[OrderFixture::content("Orders"), SaleFixture::content("Sales")]);

    let specs = [
        WorksheetSpec::new(SaleFixture::record_type(), "Sales"),
        WorksheetSpec::new(OrderFixture::record_type(), "Orders"),
    ];
    let imported = harness.service.import_multiple(&specs, &bytes).unwrap();

    assert_eq!(imported.len(), 2);
    assert_eq!(imported[0].len(), 4);
    assert_same_records(&imported[1], &OrderFixture::records(), &OrderFixture::record_type());
    assert_eq!(
        field_values(imported[0][2].as_ref(), &SaleFixture::record_type())[2],
        Some(FieldValue::Decimal(3.0))
    );
}

#[test]
fn test_export_file_is_removed_on_drop() {
    let harness = TestHarness::new();
    let file = harness.service.export_flat(&[OrderFixture::content("Orders")]).unwrap();
    let path = file.path().to_path_buf();

    assert!(path.exists());
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
    assert!(path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("recordsheet-")));

    drop(file);
    assert!(!path.exists());
}

#[test]
fn test_redefined_type_is_catalogued_again() {
    let harness = TestHarness::new();
    let one = RecordType::new("Item").field(FieldSpec::data("a", "A", FieldType::Text));
    let two = one.clone().field(FieldSpec::data("b", "B", FieldType::Integer));
    let item = || {
        DynamicRecord::new("Item")
            .with("a", FieldValue::Text("x".to_string()))
            .with("b", FieldValue::Integer(2))
    };
    let headers = |record_type: &RecordType| {
        let content = WorksheetContent::new(WorksheetSpec::new(record_type.clone(), "Items"), vec![Box::new(item())]);
        let workbook = load_xlsx_from_bytes(&harness.export_flat_bytes(&[content])).unwrap();
        let sheet = workbook.sheet("Items").unwrap();
        sheet.grid.row(0).map(|(_, c)| c.display_value()).collect::<Vec<String>>()
    };

    assert_eq!(headers(&one), vec!["A"]);
    assert_eq!(headers(&two), vec!["A", "B"]);

    let bytes = harness.export_flat_bytes(&[WorksheetContent::new(
        WorksheetSpec::new(two.clone(), "Items"),
        vec![Box::new(item())],
    )]);
    let imported = harness.service.import_typed(&two, "Items", &bytes).unwrap();
    assert_eq!(imported[0].get("b"), Some(FieldValue::Integer(2)));
}
