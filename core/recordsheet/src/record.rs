//! FILENAME: core/recordsheet/src/record.rs
//! Record model.
//!
//! A `RecordType` is the statically declared metadata of one kind of record:
//! its fields in declaration order, each with a semantic type, a visibility
//! flag and an optional pivot annotation. Records themselves are anything
//! implementing `Record`; creating them and resolving references to other
//! domain objects are left to the `RecordMaterializer` and `IdentityResolver`
//! the caller supplies.

use chrono::{NaiveDate, NaiveDateTime};
use pivot_engine::PivotAnnotation;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::RecordError;

// ============================================================================
// FIELD METADATA
// ============================================================================

/// Semantic type of a field; decides how its value maps to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Enum,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Reference,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Enum => "enum",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "date-time",
            FieldType::Reference => "reference",
        };
        f.write_str(name)
    }
}

/// Only `Data` fields are exported and imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Data,
    Derived,
    Collection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Identifier used to get/set the value on a record.
    pub id: String,
    /// Display name, written as the column header.
    pub name: String,
    pub field_type: FieldType,
    pub kind: FieldKind,
    /// Shown in tables; hidden fields are never exported.
    pub visible: bool,
    pub pivot: Option<PivotAnnotation>,
}

impl FieldSpec {
    /// A visible data field.
    pub fn data(id: &str, name: &str, field_type: FieldType) -> Self {
        FieldSpec {
            id: id.to_string(),
            name: name.to_string(),
            field_type,
            kind: FieldKind::Data,
            visible: true,
            pivot: None,
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_pivot(mut self, annotation: PivotAnnotation) -> Self {
        self.pivot = Some(annotation);
        self
    }
}

/// Field metadata of one record type, fields in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl RecordType {
    pub fn new(name: &str) -> Self {
        RecordType {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// A handle to a domain object living outside the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_type: String,
    pub identifier: String,
    /// Shown in the cell.
    pub title: String,
}

impl ObjectRef {
    pub fn new(object_type: &str, identifier: &str, title: &str) -> Self {
        ObjectRef {
            object_type: object_type.to_string(),
            identifier: identifier.to_string(),
            title: title.to_string(),
        }
    }

    /// `"<object_type>:<identifier>"`
    pub fn bookmark(&self) -> String {
        format!("{}:{}", self.object_type, self.identifier)
    }
}

/// A typed field value. Text and enum fields both carry `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Reference(ObjectRef),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "date-time",
            FieldValue::Reference(_) => "reference",
        }
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// Lets callers recover their concrete record type from a `dyn Record`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A record whose fields can be read and written by field id.
pub trait Record: AsAny + fmt::Debug {
    fn type_name(&self) -> &str;

    /// None when the field is unset.
    fn get(&self, field_id: &str) -> Option<FieldValue>;

    fn set(&mut self, field_id: &str, value: FieldValue) -> Result<(), RecordError>;
}

impl dyn Record {
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast<T: Record>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

/// A record backed by a map from field id to value.
/// Used for types that have no dedicated Rust struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicRecord {
    type_name: String,
    values: BTreeMap<String, FieldValue>,
}

impl DynamicRecord {
    pub fn new(type_name: &str) -> Self {
        DynamicRecord {
            type_name: type_name.to_string(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field_id: &str, value: FieldValue) -> Self {
        self.values.insert(field_id.to_string(), value);
        self
    }
}

impl Record for DynamicRecord {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn get(&self, field_id: &str) -> Option<FieldValue> {
        self.values.get(field_id).cloned()
    }

    fn set(&mut self, field_id: &str, value: FieldValue) -> Result<(), RecordError> {
        self.values.insert(field_id.to_string(), value);
        Ok(())
    }
}

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Creates record instances for import.
pub trait RecordMaterializer {
    fn new_transient(&self, record_type: &RecordType) -> Result<Box<dyn Record>, RecordError>;

    /// True when an imported record must be rebuilt from its populated
    /// transient instance before it is returned.
    fn requires_template(&self, record_type: &RecordType) -> bool;

    fn new_from_template(
        &self,
        record_type: &RecordType,
        template: Box<dyn Record>,
    ) -> Result<Box<dyn Record>, RecordError>;
}

type TransientFactory = Box<dyn Fn() -> Box<dyn Record>>;
type TemplateFactory = Box<dyn Fn(Box<dyn Record>) -> Result<Box<dyn Record>, RecordError>>;

struct Factory {
    transient: TransientFactory,
    template: Option<TemplateFactory>,
}

/// Materializer keyed by type name.
/// Types without a registration are materialized as `DynamicRecord`s.
#[derive(Default)]
pub struct MaterializerRegistry {
    factories: HashMap<String, Factory>,
}

impl MaterializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_name: &str, transient: F)
    where
        F: Fn() -> Box<dyn Record> + 'static,
    {
        self.factories.insert(
            type_name.to_string(),
            Factory {
                transient: Box::new(transient),
                template: None,
            },
        );
    }

    pub fn register_with_template<F, T>(&mut self, type_name: &str, transient: F, template: T)
    where
        F: Fn() -> Box<dyn Record> + 'static,
        T: Fn(Box<dyn Record>) -> Result<Box<dyn Record>, RecordError> + 'static,
    {
        self.factories.insert(
            type_name.to_string(),
            Factory {
                transient: Box::new(transient),
                template: Some(Box::new(template)),
            },
        );
    }
}

impl fmt::Debug for MaterializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterializerRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RecordMaterializer for MaterializerRegistry {
    fn new_transient(&self, record_type: &RecordType) -> Result<Box<dyn Record>, RecordError> {
        Ok(match self.factories.get(&record_type.name) {
            Some(factory) => (factory.transient)(),
            None => Box::new(DynamicRecord::new(&record_type.name)),
        })
    }

    fn requires_template(&self, record_type: &RecordType) -> bool {
        self.factories
            .get(&record_type.name)
            .is_some_and(|f| f.template.is_some())
    }

    fn new_from_template(
        &self,
        record_type: &RecordType,
        template: Box<dyn Record>,
    ) -> Result<Box<dyn Record>, RecordError> {
        match self.factories.get(&record_type.name).and_then(|f| f.template.as_ref()) {
            Some(build) => build(template),
            None => Err(RecordError::UnknownType(record_type.name.clone())),
        }
    }
}

/// Turns references into tokens that survive a file round trip, and back.
pub trait IdentityResolver {
    /// None when the object cannot be addressed.
    fn token_for(&self, value: &ObjectRef) -> Option<String>;

    /// None when the token no longer resolves.
    fn resolve(&self, token: &str) -> Option<ObjectRef>;
}

/// In-memory resolver addressing objects by their bookmark.
/// Only registered objects can be tokenised or resolved.
#[derive(Debug, Clone, Default)]
pub struct BookmarkResolver {
    objects: HashMap<String, ObjectRef>,
}

impl BookmarkResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, object: ObjectRef) {
        self.objects.insert(object.bookmark(), object);
    }

    pub fn remove(&mut self, bookmark: &str) -> Option<ObjectRef> {
        self.objects.remove(bookmark)
    }
}

impl IdentityResolver for BookmarkResolver {
    fn token_for(&self, value: &ObjectRef) -> Option<String> {
        let bookmark = value.bookmark();
        self.objects.contains_key(&bookmark).then_some(bookmark)
    }

    fn resolve(&self, token: &str) -> Option<ObjectRef> {
        self.objects.get(token).cloned()
    }
}
