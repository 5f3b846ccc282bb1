//! FILENAME: core/recordsheet/src/lib.rs
//! Record sheets: typed records to and from spreadsheet worksheets.
//!
//! Layers, leaves first:
//! - `record`: record types, field values and the collaborator traits
//! - `catalog`: which fields are exported, in which column
//! - `marshal`: field value <-> cell conversion
//! - `writer` / `reader`: one worksheet at a time
//! - `coordinator`: whole workbooks, flat or pivoted
//! - `service`: file and byte-buffer entry points

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod marshal;
pub mod reader;
pub mod record;
pub mod service;
pub mod writer;

pub use catalog::{find_field, FieldDescriptor, PropertyCatalog};
pub use config::{PivotMetadataMode, SheetConfig};
pub use coordinator::{WorkbookCoordinator, WorksheetContent, WorksheetSpec};
pub use error::{ConvertError, RecordError};
pub use marshal::CellMarshaller;
pub use reader::SheetReader;
pub use record::{
    AsAny, BookmarkResolver, DynamicRecord, FieldKind, FieldSpec, FieldType, FieldValue,
    IdentityResolver, MaterializerRegistry, ObjectRef, Record, RecordMaterializer, RecordType,
};
pub use service::RecordSheetService;
pub use writer::SheetWriter;

pub use pivot_engine::{AggregationType, PivotAnnotation};
