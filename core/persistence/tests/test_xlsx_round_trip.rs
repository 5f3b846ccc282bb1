//! FILENAME: core/persistence/tests/test_xlsx_round_trip.rs
//! Save/load round trips through real XLSX files.

use chrono::NaiveDate;
use grid::{Cell, CellStyle, CellValue};
use persistence::{
    load_xlsx, load_xlsx_from_bytes, save_xlsx, to_xlsx_bytes, MetaHeader, SavedReference, Workbook,
    META_SHEET_NAME, META_VERSION,
};

fn sample_workbook() -> Workbook {
    let mut workbook = Workbook::new();
    let date_style = workbook.date_style();
    let bold = workbook.styles.get_or_create(CellStyle::new().with_bold(true));

    let sheet = workbook.add_sheet("Orders").unwrap();
    sheet.grid.set_cell(0, 0, Cell::new_text("Order No".to_string()).with_style(bold));
    sheet.grid.set_cell(0, 1, Cell::new_text("Placed".to_string()).with_style(bold));
    sheet.grid.set_cell(0, 2, Cell::new_text("Customer".to_string()).with_style(bold));
    sheet.grid.set_cell(1, 0, Cell::new_text("A-1".to_string()));
    sheet.grid.set_cell(1, 1, Cell::new_date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(), date_style));
    sheet.grid.set_cell(1, 2, Cell::new_reference("ACME Corp".to_string(), "customer:1".to_string()));
    sheet.grid.set_cell(2, 0, Cell::new_number(-2.5));
    sheet.grid.set_cell(2, 1, Cell::new_boolean(true));
    sheet.freeze_rows(1);

    let hidden = workbook.add_sheet("Backing").unwrap();
    hidden.grid.set_cell(0, 0, Cell::new_reference("Globex".to_string(), "customer:2".to_string()));
    hidden.hidden = true;

    workbook
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.xlsx");
    save_xlsx(&sample_workbook(), &path).unwrap();

    let loaded = load_xlsx(&path).unwrap();
    assert_eq!(loaded.sheet_names(), vec!["Orders", "Backing"]);

    let grid = &loaded.sheet("Orders").unwrap().grid;
    assert_eq!(grid.value(0, 0), &CellValue::Text("Order No".to_string()));
    assert_eq!(
        grid.value(1, 1),
        &CellValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
    );
    assert_eq!(grid.value(2, 0), &CellValue::Number(-2.5));
    assert_eq!(grid.value(2, 1), &CellValue::Boolean(true));
    assert!(grid.get_cell(2, 2).is_none());
}

#[test]
fn test_references_and_visibility_survive() {
    let loaded = load_xlsx_from_bytes(&to_xlsx_bytes(&sample_workbook()).unwrap()).unwrap();

    assert!(loaded.sheet(META_SHEET_NAME).is_none());
    assert!(!loaded.sheet("Orders").unwrap().hidden);
    assert!(loaded.sheet("Backing").unwrap().hidden);

    assert_eq!(
        loaded.sheet("Orders").unwrap().grid.value(1, 2),
        &CellValue::Reference { display: "ACME Corp".to_string(), token: "customer:1".to_string() }
    );
    assert_eq!(
        loaded.sheet("Backing").unwrap().grid.value(0, 0),
        &CellValue::Reference { display: "Globex".to_string(), token: "customer:2".to_string() }
    );
}

/// The sample's Orders sheet as another application would save it after
/// moving the Customer column to the front: references are plain text again,
/// and the metadata rows are the ones written originally.
fn orders_with_customer_first(customer_cell: &str) -> Vec<u8> {
    let original = sample_workbook();
    let references = SavedReference::collect(&original);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_sheet("Orders").unwrap();
    sheet.grid.set_cell(0, 0, Cell::new_text("Customer".to_string()));
    sheet.grid.set_cell(0, 1, Cell::new_text("Placed".to_string()));
    sheet.grid.set_cell(0, 2, Cell::new_text("Order No".to_string()));
    sheet.grid.set_cell(1, 0, Cell::new_text(customer_cell.to_string()));
    sheet.grid.set_cell(1, 2, Cell::new_text("A-1".to_string()));
    workbook
        .add_sheet("Backing")
        .unwrap()
        .grid
        .set_cell(0, 0, Cell::new_text("Globex".to_string()));

    let meta = workbook.add_sheet(META_SHEET_NAME).unwrap();
    meta.hidden = true;
    let header = MetaHeader { version: META_VERSION, references: references.len() };
    meta.grid.set_cell(0, 0, Cell::new_text(serde_json::to_string(&header).unwrap()));
    for (i, reference) in references.iter().enumerate() {
        meta.grid.set_cell(i as u32 + 1, 0, Cell::new_text(reference.to_json().unwrap()));
    }
    to_xlsx_bytes(&workbook).unwrap()
}

#[test]
fn test_reference_follows_its_moved_column() {
    let loaded = load_xlsx_from_bytes(&orders_with_customer_first("ACME Corp")).unwrap();
    let grid = &loaded.sheet("Orders").unwrap().grid;

    assert_eq!(
        grid.value(1, 0),
        &CellValue::Reference { display: "ACME Corp".to_string(), token: "customer:1".to_string() }
    );
    assert_eq!(grid.value(1, 2), &CellValue::Text("A-1".to_string()));
    assert!(grid.get_cell(1, 1).is_none());
}

#[test]
fn test_overwritten_reference_stays_text() {
    let loaded = load_xlsx_from_bytes(&orders_with_customer_first("Initech")).unwrap();
    assert_eq!(
        loaded.sheet("Orders").unwrap().grid.value(1, 0),
        &CellValue::Text("Initech".to_string())
    );
    // Untouched sheets still get their tokens back
    assert_eq!(
        loaded.sheet("Backing").unwrap().grid.value(0, 0),
        &CellValue::Reference { display: "Globex".to_string(), token: "customer:2".to_string() }
    );
}

#[test]
fn test_plain_workbook_has_no_references() {
    let mut workbook = Workbook::new();
    workbook
        .add_sheet("Only")
        .unwrap()
        .grid
        .set_cell(3, 2, Cell::new_text("far away".to_string()));

    let loaded = load_xlsx_from_bytes(&to_xlsx_bytes(&workbook).unwrap()).unwrap();
    let grid = &loaded.sheet("Only").unwrap().grid;
    assert_eq!(grid.len(), 1);
    assert_eq!(grid.value(3, 2), &CellValue::Text("far away".to_string()));
}

#[test]
fn test_garbage_bytes_are_rejected() {
    assert!(load_xlsx_from_bytes(b"not a spreadsheet").is_err());
}
