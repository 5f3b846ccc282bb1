//! FILENAME: core/pivot-engine/src/error.rs

use grid::ShiftError;
use thiserror::Error;

/// The classification rule a record type violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    MissingRow,
    MultipleRows,
    MissingColumn,
    MissingValue,
}

impl std::fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ValidationRule::MissingRow => "no field has the row role",
            ValidationRule::MultipleRows => "only one field may have the row role",
            ValidationRule::MissingColumn => "no field has the column role",
            ValidationRule::MissingValue => "no field has the value role",
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error("Invalid pivot fields for '{type_name}': {rule}")]
    Validation { type_name: String, rule: ValidationRule },

    #[error("Source sheet carries no pivot metadata rows")]
    MissingMetadata,

    #[error("Invalid pivot metadata in column {column}: {reason}")]
    InvalidMetadata { column: u32, reason: String },

    #[error("Source header has {found} columns but {expected} fields are classified")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("Cannot move source rows: {0}")]
    Shift(#[from] ShiftError),
}
