//! FILENAME: core/recordsheet/src/error.rs

use persistence::PersistenceError;
use pivot_engine::PivotError;
use thiserror::Error;

use crate::record::FieldType;

/// Failures raised by records and their materializer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    #[error("Field '{field}' rejected the value: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("No materializer for type '{0}'")]
    UnknownType(String),

    #[error("Record rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid sheet name: {0}")]
    Naming(String),

    #[error("Type '{0}' has no visible fields")]
    Type(String),

    #[error("Field '{field}' of type {expected} cannot take a {found} value")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: String,
    },

    #[error("Reference '{0}' cannot be resolved")]
    UnresolvableReference(String),

    #[error("Error processing row {row}: {source}")]
    RowImport {
        row: u32,
        #[source]
        source: Box<ConvertError>,
    },

    #[error("Could not locate sheet named any of: {candidates:?}")]
    SheetNotFound { candidates: Vec<String> },

    #[error(transparent)]
    Pivot(#[from] PivotError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Materialize(#[from] RecordError),
}

impl ConvertError {
    pub(crate) fn mismatch(field: &str, expected: FieldType, found: &str) -> Self {
        ConvertError::TypeMismatch {
            field: field.to_string(),
            expected,
            found: found.to_string(),
        }
    }
}
