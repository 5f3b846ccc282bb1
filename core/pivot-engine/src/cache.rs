//! FILENAME: core/pivot-engine/src/cache.rs
//! Pivot Cache - Internal representation used while aggregating.
//!
//! Architecture:
//! - Each distinct key value is stored once per field and referenced by index
//! - Row keys and column key tuples are numbered in order of first appearance
//! - One running accumulator per (row key, column key, value field)

use chrono::NaiveDate;
use grid::{Cell, CellValue};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::definition::AggregationType;

// ============================================================================
// VALUE INTERNING
// ============================================================================

/// A reference to an interned value within a field's unique value store.
pub type ValueId = u32;

/// Represents a blank key value. Blank is a group of its own.
pub const VALUE_ID_EMPTY: ValueId = u32::MAX;

/// The column part of a pivot key: one ValueId per column field, in declared order.
pub type ColumnKey = SmallVec<[ValueId; 4]>;

/// A normalized, hashable representation of a cell value.
/// Equality is by value; references compare by their identity token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    Reference(String),
}

impl From<&CellValue> for CacheValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => CacheValue::Empty,
            CellValue::Text(s) if s.is_empty() => CacheValue::Empty,
            CellValue::Number(n) => CacheValue::Number(OrderedFloat(*n)),
            CellValue::Text(s) => CacheValue::Text(s.clone()),
            CellValue::Boolean(b) => CacheValue::Boolean(*b),
            CellValue::Date(d) => CacheValue::Date(*d),
            CellValue::Reference { token, .. } => CacheValue::Reference(token.clone()),
        }
    }
}

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash equal
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

// ============================================================================
// FIELD CACHE
// ============================================================================

/// Distinct key values of one source field.
#[derive(Debug, Clone, Default)]
pub struct FieldCache {
    /// Map from value to its unique ID (for deduplication during build).
    value_to_id: FxHashMap<CacheValue, ValueId>,

    /// The first cell seen for each ID, kept for labels (and their styles).
    id_to_cell: Vec<Cell>,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a cell's value and returns its ValueId.
    pub fn intern(&mut self, cell: Option<&Cell>) -> ValueId {
        let Some(cell) = cell else {
            return VALUE_ID_EMPTY;
        };
        let key = CacheValue::from(&cell.value);
        if key == CacheValue::Empty {
            return VALUE_ID_EMPTY;
        }

        if let Some(&id) = self.value_to_id.get(&key) {
            return id;
        }

        let id = self.id_to_cell.len() as ValueId;
        self.id_to_cell.push(cell.clone());
        self.value_to_id.insert(key, id);
        id
    }

    /// The label cell for an ID; None for the blank key.
    pub fn label(&self, id: ValueId) -> Option<&Cell> {
        if id == VALUE_ID_EMPTY {
            return None;
        }
        self.id_to_cell.get(id as usize)
    }
}

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for computing aggregates incrementally.
/// Stores intermediate state needed for all aggregation types.
#[derive(Debug, Clone)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub product: f64,
    /// For variance/stddev: sum of squared differences from mean.
    /// Using Welford's algorithm for numerical stability.
    pub m2: f64,
    pub mean: f64,
    pub has_product: bool,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator {
            sum: 0.0,
            count: 0,
            count_numbers: 0,
            min: None,
            max: None,
            product: 1.0,
            m2: 0.0,
            mean: 0.0,
            has_product: false,
        }
    }

    /// Feeds one source cell. Blank cells do not contribute.
    pub fn add(&mut self, value: &CellValue) {
        match value {
            CellValue::Number(n) => self.add_number(*n),
            v if v.is_blank() => {}
            _ => self.add_non_number(),
        }
    }

    /// Adds a numeric value to the accumulator.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;

        self.sum += value;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        if !self.has_product {
            self.has_product = true;
            self.product = value;
        } else {
            self.product *= value;
        }

        // Welford's algorithm for variance
        let delta = value - self.mean;
        self.mean += delta / (self.count_numbers as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Adds a non-numeric value (only increments count).
    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    /// Computes the final aggregate value.
    /// None means the pivot cell stays blank.
    pub fn compute(&self, aggregation: AggregationType) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let n = self.count_numbers as f64;
        match aggregation {
            AggregationType::Sum => Some(self.sum),
            AggregationType::Count => Some(self.count as f64),
            AggregationType::CountNumbers => Some(n),
            AggregationType::Average => (self.count_numbers > 0).then(|| self.sum / n),
            AggregationType::Min => self.min,
            AggregationType::Max => self.max,
            AggregationType::Product => self.has_product.then_some(self.product),
            AggregationType::Var => (self.count_numbers > 1).then(|| self.m2 / (n - 1.0)),
            AggregationType::VarP => (self.count_numbers > 0).then(|| self.m2 / n),
            AggregationType::StdDev => {
                (self.count_numbers > 1).then(|| (self.m2 / (n - 1.0)).sqrt())
            }
            AggregationType::StdDevP => (self.count_numbers > 0).then(|| (self.m2 / n).sqrt()),
        }
    }
}

impl Default for AggregateAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MAIN CACHE STRUCT
// ============================================================================

/// Groups source records by (row key, column key tuple) and keeps one
/// accumulator per value field for every group that received a record.
#[derive(Debug, Clone)]
pub struct PivotCache {
    pub row_field: FieldCache,
    pub column_fields: Vec<FieldCache>,
    value_count: usize,

    /// Row keys in order of first appearance.
    row_keys: Vec<ValueId>,
    row_positions: FxHashMap<ValueId, usize>,

    /// Column key tuples in order of first appearance.
    column_keys: Vec<ColumnKey>,
    column_positions: FxHashMap<ColumnKey, usize>,

    /// Keyed by (row position, column position).
    aggregates: FxHashMap<(usize, usize), Vec<AggregateAccumulator>>,
}

impl PivotCache {
    pub fn new(column_field_count: usize, value_count: usize) -> Self {
        PivotCache {
            row_field: FieldCache::new(),
            column_fields: (0..column_field_count).map(|_| FieldCache::new()).collect(),
            value_count,
            row_keys: Vec::new(),
            row_positions: FxHashMap::default(),
            column_keys: Vec::new(),
            column_positions: FxHashMap::default(),
            aggregates: FxHashMap::default(),
        }
    }

    /// Adds one source record.
    /// `columns` and `values` follow the declared order of their fields.
    pub fn add_record(
        &mut self,
        row: Option<&Cell>,
        columns: &[Option<&Cell>],
        values: &[&CellValue],
    ) {
        let row_id = self.row_field.intern(row);
        let row_pos = *self.row_positions.entry(row_id).or_insert_with(|| {
            self.row_keys.push(row_id);
            self.row_keys.len() - 1
        });

        let key: ColumnKey = columns
            .iter()
            .zip(self.column_fields.iter_mut())
            .map(|(cell, field)| field.intern(*cell))
            .collect();
        let col_pos = match self.column_positions.get(&key) {
            Some(&pos) => pos,
            None => {
                self.column_keys.push(key.clone());
                self.column_positions.insert(key, self.column_keys.len() - 1);
                self.column_keys.len() - 1
            }
        };

        let value_count = self.value_count;
        let accumulators = self
            .aggregates
            .entry((row_pos, col_pos))
            .or_insert_with(|| vec![AggregateAccumulator::new(); value_count]);
        for (acc, value) in accumulators.iter_mut().zip(values) {
            acc.add(value);
        }
    }

    pub fn row_keys(&self) -> &[ValueId] {
        &self.row_keys
    }

    pub fn column_keys(&self) -> &[ColumnKey] {
        &self.column_keys
    }

    /// Accumulators of one group, or None when no record fell into it.
    pub fn get_aggregate(&self, row_pos: usize, col_pos: usize) -> Option<&[AggregateAccumulator]> {
        self.aggregates.get(&(row_pos, col_pos)).map(Vec::as_slice)
    }
}
