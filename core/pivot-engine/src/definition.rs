//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a pivot:
//! - the role each record field plays (row key, column key, value, decoration)
//! - the declared order of column/value fields
//! - the aggregation applied to each value field

use serde::{Deserialize, Serialize};

use crate::error::{PivotError, ValidationRule};

/// Index of a field, which is also its column in the source sheet (0-based).
pub type FieldIndex = usize;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AggregationType {
    #[default]
    Sum,
    Count,
    Average,
    Min,
    Max,
    CountNumbers,
    StdDev,
    StdDevP,
    Var,
    VarP,
    Product,
}

impl AggregationType {
    pub const ALL: [AggregationType; 11] = [
        AggregationType::Sum,
        AggregationType::Count,
        AggregationType::Average,
        AggregationType::Min,
        AggregationType::Max,
        AggregationType::CountNumbers,
        AggregationType::StdDev,
        AggregationType::StdDevP,
        AggregationType::Var,
        AggregationType::VarP,
        AggregationType::Product,
    ];

    /// Tag written into the aggregation metadata row.
    pub fn tag(&self) -> &'static str {
        match self {
            AggregationType::Sum => "SUM",
            AggregationType::Count => "COUNT",
            AggregationType::Average => "AVERAGE",
            AggregationType::Min => "MIN",
            AggregationType::Max => "MAX",
            AggregationType::CountNumbers => "COUNTNUMBERS",
            AggregationType::StdDev => "STDDEV",
            AggregationType::StdDevP => "STDDEVP",
            AggregationType::Var => "VAR",
            AggregationType::VarP => "VARP",
            AggregationType::Product => "PRODUCT",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|agg| agg.tag().eq_ignore_ascii_case(tag.trim()))
    }
}

impl std::fmt::Display for AggregationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

// ============================================================================
// ROLES
// ============================================================================

/// How a field takes part in the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PivotRole {
    Row,
    Column,
    Value,
    /// Carried in flat exports only; never used for keys or aggregation.
    Decoration,
    Skip,
}

impl PivotRole {
    /// Tag written into the role metadata row.
    pub fn tag(&self) -> &'static str {
        match self {
            PivotRole::Row => "row",
            PivotRole::Column => "column",
            PivotRole::Value => "value",
            PivotRole::Decoration => "deco",
            PivotRole::Skip => "skip",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "row" => Some(PivotRole::Row),
            "column" => Some(PivotRole::Column),
            "value" => Some(PivotRole::Value),
            "deco" | "decoration" => Some(PivotRole::Decoration),
            "skip" => Some(PivotRole::Skip),
            _ => None,
        }
    }
}

/// The statically declared pivot role of a record field.
/// Fields without an annotation are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotAnnotation {
    Row,
    Column { order: i32 },
    Value { order: i32, aggregation: AggregationType },
    Decoration { order: i32 },
}

impl PivotAnnotation {
    pub fn role(&self) -> PivotRole {
        match self {
            PivotAnnotation::Row => PivotRole::Row,
            PivotAnnotation::Column { .. } => PivotRole::Column,
            PivotAnnotation::Value { .. } => PivotRole::Value,
            PivotAnnotation::Decoration { .. } => PivotRole::Decoration,
        }
    }

    /// The row field always sorts first.
    pub fn order(&self) -> i32 {
        match self {
            PivotAnnotation::Row => 0,
            PivotAnnotation::Column { order }
            | PivotAnnotation::Value { order, .. }
            | PivotAnnotation::Decoration { order } => *order,
        }
    }

    pub fn aggregation(&self) -> Option<AggregationType> {
        match self {
            PivotAnnotation::Value { aggregation, .. } => Some(*aggregation),
            _ => None,
        }
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// The resolved role of one field, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotFieldClassification {
    pub field_name: String,
    pub role: PivotRole,
    pub order: i32,
    /// Present exactly when `role` is `Value`.
    pub aggregation: Option<AggregationType>,
}

impl PivotFieldClassification {
    pub fn from_annotation(field_name: &str, annotation: Option<&PivotAnnotation>) -> Self {
        match annotation {
            Some(annotation) => PivotFieldClassification {
                field_name: field_name.to_string(),
                role: annotation.role(),
                order: annotation.order(),
                aggregation: annotation.aggregation(),
            },
            None => PivotFieldClassification::skip(field_name),
        }
    }

    pub fn skip(field_name: &str) -> Self {
        PivotFieldClassification {
            field_name: field_name.to_string(),
            role: PivotRole::Skip,
            order: 0,
            aggregation: None,
        }
    }
}

/// Classification of every field of one record type.
/// The position of an entry is the field's column in the source sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotClassification {
    pub type_name: String,
    pub fields: Vec<PivotFieldClassification>,
}

impl PivotClassification {
    pub fn new(type_name: &str, fields: Vec<PivotFieldClassification>) -> Self {
        PivotClassification {
            type_name: type_name.to_string(),
            fields,
        }
    }

    /// Checks the row/column/value cardinality rules in a fixed order,
    /// reporting the first rule violated.
    pub fn validate(&self) -> Result<(), PivotError> {
        let count = |role: PivotRole| self.fields.iter().filter(|f| f.role == role).count();

        let rule = match count(PivotRole::Row) {
            0 => Some(ValidationRule::MissingRow),
            1 => None,
            _ => Some(ValidationRule::MultipleRows),
        }
        .or_else(|| (count(PivotRole::Column) == 0).then_some(ValidationRule::MissingColumn))
        .or_else(|| (count(PivotRole::Value) == 0).then_some(ValidationRule::MissingValue));

        match rule {
            Some(rule) => Err(PivotError::Validation {
                type_name: self.type_name.clone(),
                rule,
            }),
            None => Ok(()),
        }
    }

    /// Indices of the fields with `role`, sorted by declared order.
    /// Ties keep catalog order.
    pub fn ordered(&self, role: PivotRole) -> Vec<FieldIndex> {
        let mut indices: Vec<FieldIndex> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.role == role)
            .map(|(i, _)| i)
            .collect();
        indices.sort_by_key(|&i| self.fields[i].order);
        indices
    }

    pub fn row_field(&self) -> Option<FieldIndex> {
        self.fields.iter().position(|f| f.role == PivotRole::Row)
    }
}
