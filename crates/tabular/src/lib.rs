//! In-memory tabular datasets and structural profiling.
//!
//! A [`Dataset`] is a set of named, equally-sized columns of scalar
//! [`Value`]s with a per-column [`ColumnType`] inferred at load time. It is
//! immutable once loaded; consumers that need to mutate (the execution
//! sandbox) work on a deep copy.
//!
//! [`profile`] computes a [`DatasetProfile`] - row count, column order,
//! dtypes, null counts - in one pass. Callers cache the profile for the
//! dataset's lifetime; it is only recomputed when the dataset is replaced.

mod dataset;
mod profile;
mod value;

pub use dataset::{Column, Dataset, DatasetError};
pub use profile::{profile, DatasetProfile};
pub use value::{ColumnType, Value};
