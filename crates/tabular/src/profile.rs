//! Structural dataset profiling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::value::ColumnType;

/// A structural summary of a dataset: shape, column order, dtypes, and null
/// counts.
///
/// Serializes to compact JSON so it can be embedded into prompt context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    /// Number of rows.
    pub rows: usize,
    /// Column names in table order.
    pub columns: Vec<String>,
    /// Column name to inferred type tag.
    pub dtypes: BTreeMap<String, ColumnType>,
    /// Column name to null count.
    pub missing: BTreeMap<String, usize>,
}

impl DatasetProfile {
    /// Total nulls across all columns.
    pub fn total_missing(&self) -> usize {
        self.missing.values().sum()
    }

    /// Compact JSON rendering for prompt context.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Compute the profile of a dataset in one pass over its columns.
///
/// Pure and non-mutating. An empty dataset yields a zero-row profile rather
/// than an error. Callers cache the result: profiling an unchanged dataset
/// twice yields identical profiles.
pub fn profile(dataset: &Dataset) -> DatasetProfile {
    let mut columns = Vec::with_capacity(dataset.column_count());
    let mut dtypes = BTreeMap::new();
    let mut missing = BTreeMap::new();

    for column in dataset.columns() {
        columns.push(column.name().to_string());
        dtypes.insert(column.name().to_string(), column.column_type());
        missing.insert(column.name().to_string(), column.null_count());
    }

    DatasetProfile {
        rows: dataset.row_count(),
        columns,
        dtypes,
        missing,
    }
}
