//! The Dataset type and CSV ingestion.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::value::{ColumnType, Value};

/// Errors raised while building a dataset.
///
/// These surface before any conversation turn begins; a session cannot be
/// created over a dataset that failed to load.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The input table could not be parsed.
    #[error("failed to load dataset: {0}")]
    Load(String),

    /// Columns have different lengths.
    #[error("column '{name}' has {len} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        len: usize,
        expected: usize,
    },

    /// Two columns share a name.
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}

/// A named column of values with an inferred type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    ty: ColumnType,
    values: Vec<Value>,
}

impl Column {
    /// Create a column, inferring the type tag from the values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let ty = infer_type(&values);
        Self {
            name: name.into(),
            ty,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.ty
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}

/// An in-memory table: named, equally-sized columns of scalar values.
///
/// Immutable once constructed. The execution sandbox clones the whole
/// dataset before exposing it to untrusted code, so no execution can be
/// observed from outside its own copy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset from columns, rejecting ragged shapes and duplicate
    /// names.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name().to_string()) {
                return Err(DatasetError::DuplicateColumn(column.name().to_string()));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.len();
            for column in &columns {
                if column.len() != expected {
                    return Err(DatasetError::RaggedColumn {
                        name: column.name().to_string(),
                        len: column.len(),
                        expected,
                    });
                }
            }
        }

        Ok(Self { columns })
    }

    /// Parse a dataset from CSV text. The first record names the columns;
    /// empty fields become nulls; per-column types are inferred over all
    /// rows.
    pub fn from_csv_str(content: &str) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| DatasetError::Load(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(DatasetError::Load("no header row".to_string()));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for (row_idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| DatasetError::Load(e.to_string()))?;
            if record.len() != headers.len() {
                return Err(DatasetError::Load(format!(
                    "row {} has {} fields, expected {}",
                    row_idx + 1,
                    record.len(),
                    headers.len()
                )));
            }
            for (col_idx, field) in record.iter().enumerate() {
                cells[col_idx].push(field.trim().to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| Column::new(name, coerce_column(&raw)))
            .collect();

        Self::new(columns)
    }

    /// Load a dataset from a CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| DatasetError::Load(e.to_string()))?;
        Self::from_csv_str(&content)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns, in table order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Cell value at (column name, row index).
    pub fn get(&self, name: &str, row: usize) -> Option<&Value> {
        self.column(name)?.values().get(row)
    }
}

/// Infer the most specific type tag that fits every non-null value.
fn infer_type(values: &[Value]) -> ColumnType {
    let mut ty = None;
    for value in values {
        let tag = match value {
            Value::Null => continue,
            Value::Int(_) => ColumnType::Int,
            Value::Float(_) => ColumnType::Float,
            Value::Bool(_) => ColumnType::Bool,
            Value::Text(_) => ColumnType::Text,
        };
        ty = Some(match (ty, tag) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(ColumnType::Int), ColumnType::Float)
            | (Some(ColumnType::Float), ColumnType::Int) => ColumnType::Float,
            _ => ColumnType::Text,
        });
    }
    ty.unwrap_or(ColumnType::Text)
}

/// Parse raw CSV fields into the most specific scalar type that fits the
/// whole column, then coerce every field to it.
fn coerce_column(raw: &[String]) -> Vec<Value> {
    let non_empty: Vec<&String> = raw.iter().filter(|s| !s.is_empty()).collect();

    let all_int = !non_empty.is_empty() && non_empty.iter().all(|s| s.parse::<i64>().is_ok());
    let all_float = !non_empty.is_empty() && non_empty.iter().all(|s| s.parse::<f64>().is_ok());
    let all_bool = !non_empty.is_empty()
        && non_empty
            .iter()
            .all(|s| matches!(s.to_ascii_lowercase().as_str(), "true" | "false"));

    raw.iter()
        .map(|s| {
            if s.is_empty() {
                Value::Null
            } else if all_int {
                // parse checked above
                s.parse::<i64>().map(Value::Int).unwrap_or(Value::Null)
            } else if all_float {
                s.parse::<f64>().map(Value::Float).unwrap_or(Value::Null)
            } else if all_bool {
                Value::Bool(s.eq_ignore_ascii_case("true"))
            } else {
                Value::Text(s.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
id,score,label,active
1,3.5,alpha,true
2,,beta,false
3,1.25,,true
";

    #[test]
    fn test_csv_basic_shape() {
        let ds = Dataset::from_csv_str(CSV).unwrap();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column_count(), 4);
        assert_eq!(
            ds.columns().iter().map(Column::name).collect::<Vec<_>>(),
            vec!["id", "score", "label", "active"]
        );
    }

    #[test]
    fn test_csv_type_inference() {
        let ds = Dataset::from_csv_str(CSV).unwrap();
        assert_eq!(ds.column("id").unwrap().column_type(), ColumnType::Int);
        assert_eq!(ds.column("score").unwrap().column_type(), ColumnType::Float);
        assert_eq!(ds.column("label").unwrap().column_type(), ColumnType::Text);
        assert_eq!(ds.column("active").unwrap().column_type(), ColumnType::Bool);
    }

    #[test]
    fn test_csv_nulls() {
        let ds = Dataset::from_csv_str(CSV).unwrap();
        assert_eq!(ds.column("score").unwrap().null_count(), 1);
        assert_eq!(ds.get("score", 1), Some(&Value::Null));
        assert_eq!(ds.get("score", 0), Some(&Value::Float(3.5)));
    }

    #[test]
    fn test_mixed_int_float_promotes() {
        let ds = Dataset::from_csv_str("x\n1\n2.5\n").unwrap();
        assert_eq!(ds.column("x").unwrap().column_type(), ColumnType::Float);
        assert_eq!(ds.get("x", 0), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_all_null_column_is_text() {
        let ds = Dataset::from_csv_str("a,b\n1,\n2,\n").unwrap();
        assert_eq!(ds.column("b").unwrap().column_type(), ColumnType::Text);
        assert_eq!(ds.column("b").unwrap().null_count(), 2);
    }

    #[test]
    fn test_header_only_is_zero_rows() {
        let ds = Dataset::from_csv_str("a,b,c\n").unwrap();
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 3);
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = Dataset::from_csv_str("a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, DatasetError::Load(_)));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let columns = vec![
            Column::new("x", vec![Value::Int(1)]),
            Column::new("x", vec![Value::Int(2)]),
        ];
        let err = Dataset::new(columns).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateColumn(name) if name == "x"));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let columns = vec![
            Column::new("a", vec![Value::Int(1), Value::Int(2)]),
            Column::new("b", vec![Value::Int(1)]),
        ];
        let err = Dataset::new(columns).unwrap_err();
        assert!(matches!(err, DatasetError::RaggedColumn { .. }));
    }
}
