//! The `df` userdata: a private, mutable copy of the dataset.
//!
//! Lua scripts see the dataset through this façade only. All indices are
//! 1-based per Lua convention. Writes go to the copy; the session's dataset
//! is never reachable from here.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{UserData, UserDataMethods, Value as LuaValue};
use tabular::{Dataset, Value};

/// Owned, mutable copy of a dataset for one execution.
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
}

impl Frame {
    /// Deep-copy a dataset into a frame.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let names = dataset
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let columns = dataset
            .columns()
            .iter()
            .map(|c| c.values().to_vec())
            .collect();
        Self { names, columns }
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Cell at (column name, 1-based row).
    pub fn get(&self, name: &str, row: usize) -> Result<Value, String> {
        let col = self
            .index_of(name)
            .ok_or_else(|| format!("unknown column '{}'", name))?;
        if row == 0 || row > self.rows() {
            return Err(format!("row {} out of range 1..{}", row, self.rows()));
        }
        Ok(self.columns[col][row - 1].clone())
    }

    /// Overwrite the cell at (column name, 1-based row). Affects only this
    /// copy.
    pub fn set(&mut self, name: &str, row: usize, value: Value) -> Result<(), String> {
        let col = self
            .index_of(name)
            .ok_or_else(|| format!("unknown column '{}'", name))?;
        let rows = self.rows();
        if row == 0 || row > rows {
            return Err(format!("row {} out of range 1..{}", row, rows));
        }
        self.columns[col][row - 1] = value;
        Ok(())
    }

    /// All values of a column.
    pub fn column_values(&self, name: &str) -> Result<&[Value], String> {
        let col = self
            .index_of(name)
            .ok_or_else(|| format!("unknown column '{}'", name))?;
        Ok(&self.columns[col])
    }

    /// Null count of a column.
    pub fn null_count(&self, name: &str) -> Result<usize, String> {
        Ok(self
            .column_values(name)?
            .iter()
            .filter(|v| v.is_null())
            .count())
    }
}

fn value_to_lua(lua: &mlua::Lua, value: &Value) -> mlua::Result<LuaValue> {
    Ok(match value {
        Value::Null => LuaValue::Nil,
        Value::Int(i) => LuaValue::Integer(*i),
        Value::Float(f) => LuaValue::Number(*f),
        Value::Bool(b) => LuaValue::Boolean(*b),
        Value::Text(s) => LuaValue::String(lua.create_string(s)?),
    })
}

fn lua_to_value(value: LuaValue) -> mlua::Result<Value> {
    Ok(match value {
        LuaValue::Nil => Value::Null,
        LuaValue::Integer(i) => Value::Int(i),
        LuaValue::Number(n) => Value::Float(n),
        LuaValue::Boolean(b) => Value::Bool(b),
        LuaValue::String(s) => Value::Text(s.to_str()?.to_string()),
        other => {
            return Err(mlua::Error::RuntimeError(format!(
                "cannot store {} in a cell",
                other.type_name()
            )))
        }
    })
}

/// The `df` userdata handed to Lua.
#[derive(Clone)]
pub struct FrameUserData {
    frame: Rc<RefCell<Frame>>,
}

impl FrameUserData {
    pub fn new(frame: Rc<RefCell<Frame>>) -> Self {
        Self { frame }
    }
}

impl UserData for FrameUserData {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        // df:rows() -> row count
        methods.add_method("rows", |_, this, ()| Ok(this.frame.borrow().rows()));

        // df:cols() -> column count
        methods.add_method("cols", |_, this, ()| Ok(this.frame.borrow().cols()));

        // df:columns() -> list of column names
        methods.add_method("columns", |lua, this, ()| {
            let frame = this.frame.borrow();
            let table = lua.create_table()?;
            for (i, name) in frame.names().iter().enumerate() {
                table.set(i + 1, name.as_str())?;
            }
            Ok(table)
        });

        // df:col(name) -> list of values (nulls are nil; use df:rows() for length)
        methods.add_method("col", |lua, this, name: String| {
            let frame = this.frame.borrow();
            let values = frame
                .column_values(&name)
                .map_err(mlua::Error::RuntimeError)?;
            let table = lua.create_table()?;
            for (i, value) in values.iter().enumerate() {
                table.set(i + 1, value_to_lua(lua, value)?)?;
            }
            Ok(table)
        });

        // df:get(name, row) -> value or nil
        methods.add_method("get", |lua, this, (name, row): (String, usize)| {
            let frame = this.frame.borrow();
            let value = frame.get(&name, row).map_err(mlua::Error::RuntimeError)?;
            value_to_lua(lua, &value)
        });

        // df:set(name, row, val_or_nil)
        methods.add_method(
            "set",
            |_, this, (name, row, value): (String, usize, LuaValue)| {
                let value = lua_to_value(value)?;
                this.frame
                    .borrow_mut()
                    .set(&name, row, value)
                    .map_err(mlua::Error::RuntimeError)
            },
        );

        // df:nulls(name) -> null count for a column
        methods.add_method("nulls", |_, this, name: String| {
            this.frame
                .borrow()
                .null_count(&name)
                .map_err(mlua::Error::RuntimeError)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_csv_str("id,score\n1,3.5\n2,\n").unwrap()
    }

    #[test]
    fn test_frame_copies_dataset() {
        let ds = sample();
        let frame = Frame::from_dataset(&ds);
        assert_eq!(frame.rows(), 2);
        assert_eq!(frame.cols(), 2);
        assert_eq!(frame.get("id", 1).unwrap(), Value::Int(1));
        assert_eq!(frame.get("score", 2).unwrap(), Value::Null);
    }

    #[test]
    fn test_set_mutates_copy_only() {
        let ds = sample();
        let mut frame = Frame::from_dataset(&ds);
        frame.set("id", 1, Value::Int(99)).unwrap();

        assert_eq!(frame.get("id", 1).unwrap(), Value::Int(99));
        assert_eq!(ds.get("id", 0), Some(&Value::Int(1)));
    }

    #[test]
    fn test_unknown_column_errors() {
        let frame = Frame::from_dataset(&sample());
        assert!(frame.get("missing", 1).is_err());
        assert!(frame.null_count("missing").is_err());
    }

    #[test]
    fn test_row_bounds() {
        let frame = Frame::from_dataset(&sample());
        assert!(frame.get("id", 0).is_err());
        assert!(frame.get("id", 3).is_err());
    }
}
