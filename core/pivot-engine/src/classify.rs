//! FILENAME: core/pivot-engine/src/classify.rs
//! Pivot Field Classifier.
//!
//! Maps each catalogued field of a record type to its pivot role using the
//! statically declared annotations, then validates the result as a whole.

use crate::definition::{PivotAnnotation, PivotClassification, PivotFieldClassification};
use crate::error::PivotError;

/// A catalogued field together with its declared pivot annotation, if any.
#[derive(Debug, Clone, Copy)]
pub struct AnnotatedField<'a> {
    pub name: &'a str,
    pub annotation: Option<PivotAnnotation>,
}

impl<'a> AnnotatedField<'a> {
    pub fn new(name: &'a str, annotation: Option<PivotAnnotation>) -> Self {
        AnnotatedField { name, annotation }
    }
}

/// Classifies `fields` (in catalog order) for `type_name`.
///
/// Fails with `PivotError::Validation` unless exactly one field is a row
/// key, at least one is a column key and at least one is a value.
pub fn classify(
    type_name: &str,
    fields: &[AnnotatedField<'_>],
) -> Result<PivotClassification, PivotError> {
    let classified = fields
        .iter()
        .map(|f| PivotFieldClassification::from_annotation(f.name, f.annotation.as_ref()))
        .collect();

    let classification = PivotClassification::new(type_name, classified);
    classification.validate()?;
    Ok(classification)
}
