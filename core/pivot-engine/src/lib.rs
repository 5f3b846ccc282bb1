//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot subsystem.
//!
//! Derives a grouped aggregation worksheet from a flat record worksheet whose
//! columns have been classified by role. Depends on `grid` only for the
//! shared cell and grid types.
//!
//! Layers:
//! - `definition`: Roles, aggregations and per-field classifications (WHAT the pivot IS)
//! - `classify`: Turns field annotations into a validated classification
//! - `cache`: Interned keys and running aggregates (HOW we compute)
//! - `engine`: Reads the source grid and writes the pivot grid
//! - `metadata`: The three-row classification header for file-boundary sheets

pub mod cache;
pub mod classify;
pub mod definition;
pub mod engine;
pub mod error;
pub mod metadata;

pub use classify::{classify, AnnotatedField};
pub use definition::*;
pub use engine::{pivot, PivotSummary};
pub use error::{PivotError, ValidationRule};
pub use metadata::{embed_metadata, pivot_embedded, read_metadata, strip_metadata, METADATA_ROWS};
