//! FILENAME: core/recordsheet/src/catalog.rs
//! Property Catalog: the ordered, visible data fields of a record type.
//! Position in the catalog is the column index in every sheet written or read.

use pivot_engine::PivotAnnotation;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ConvertError;
use crate::record::{FieldKind, FieldSpec, FieldType, RecordType};

/// One exported field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    pub field_type: FieldType,
    pub pivot: Option<PivotAnnotation>,
}

/// Memoized catalog of one type, with the field table it was computed from.
#[derive(Debug)]
struct CatalogEntry {
    source: Vec<FieldSpec>,
    fields: Arc<[FieldDescriptor]>,
}

/// Computes catalogs and memoizes them per type name. An entry is reused
/// only while the type's field table is unchanged.
#[derive(Debug, Default)]
pub struct PropertyCatalog {
    cache: Mutex<HashMap<String, CatalogEntry>>,
}

impl PropertyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible data fields of `record_type`, in declaration order.
    /// Fails with `ConvertError::Type` when there are none.
    pub fn catalog(&self, record_type: &RecordType) -> Result<Arc<[FieldDescriptor]>, ConvertError> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = cache.get(&record_type.name) {
            if entry.source == record_type.fields {
                return Ok(Arc::clone(&entry.fields));
            }
        }

        let fields: Arc<[FieldDescriptor]> = record_type
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::Data && f.visible)
            .map(|f| FieldDescriptor {
                id: f.id.clone(),
                name: f.name.clone(),
                field_type: f.field_type,
                pivot: f.pivot,
            })
            .collect();

        if fields.is_empty() {
            return Err(ConvertError::Type(record_type.name.clone()));
        }

        cache.insert(
            record_type.name.clone(),
            CatalogEntry {
                source: record_type.fields.clone(),
                fields: Arc::clone(&fields),
            },
        );
        Ok(fields)
    }
}

/// Finds the field a header cell names: by name first, then by id,
/// both ignoring case.
pub fn find_field(fields: &[FieldDescriptor], header: &str) -> Option<usize> {
    let header = header.trim().to_lowercase();
    fields
        .iter()
        .position(|f| f.name.to_lowercase() == header)
        .or_else(|| fields.iter().position(|f| f.id.to_lowercase() == header))
}
