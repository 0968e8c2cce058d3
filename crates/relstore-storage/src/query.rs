//! Query state: output columns, condition parameters, bound output
//! variables, and the materialized result cursor.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rusqlite::types::{FromSql, Value, ValueRef};

use relstore_core::errors::{StorageError, StorageResult};

/// A bound output variable, refreshed on every `DbStorage::next()`.
///
/// Clones share the underlying slot, so the handle kept by the caller sees
/// every refresh. `None` encodes SQL NULL.
#[derive(Debug)]
pub struct OutVar<T> {
    slot: Rc<RefCell<Option<T>>>,
}

impl<T> OutVar<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value; `None` when the column was NULL.
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.slot.borrow().clone()
    }

    /// Whether the last fetched value was NULL.
    pub fn is_null(&self) -> bool {
        self.slot.borrow().is_none()
    }
}

impl<T> Default for OutVar<T> {
    fn default() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }
}

impl<T> Clone for OutVar<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

/// Type-erased refresh hook for one bound output variable.
pub(crate) type Binder = Box<dyn Fn(usize, ValueRef<'_>) -> StorageResult<()>>;

/// Build the refresh hook for a bound output variable.
pub(crate) fn make_binder<T>(var: &OutVar<T>) -> Binder
where
    T: FromSql + 'static,
{
    let var = var.clone();
    Box::new(move |index, value| {
        let parsed = match value {
            ValueRef::Null => None,
            other => Some(T::column_result(other).map_err(|e| StorageError::TypeMismatch {
                index,
                message: e.to_string(),
            })?),
        };
        *var.slot.borrow_mut() = parsed;
        Ok(())
    })
}

/// One declared output column: free-form select text, optionally bound.
pub(crate) struct OutputColumn {
    pub text: String,
    pub binder: Option<Binder>,
}

/// Accumulated query state between `set_table_for_query` and `query()`.
/// Parameter names carry the `:` prefix rusqlite expects.
#[derive(Default)]
pub(crate) struct QuerySpec {
    pub tables: Vec<String>,
    pub outputs: Vec<OutputColumn>,
    pub params: Vec<(String, Value)>,
    pub where_clause: Option<String>,
    pub group_by: Option<String>,
    pub order_by: Option<String>,
}

impl QuerySpec {
    /// Render the SELECT statement.
    pub fn to_sql(&self) -> StorageResult<String> {
        if self.outputs.is_empty() {
            return Err(StorageError::NoOutputColumns);
        }
        if self.tables.is_empty() {
            return Err(StorageError::NoTableSelected);
        }
        let columns: Vec<&str> = self.outputs.iter().map(|c| c.text.as_str()).collect();
        let mut sql = format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            self.tables.join(", ")
        );
        if let Some(clause) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        if let Some(expr) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(expr);
        }
        if let Some(expr) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(expr);
        }
        Ok(sql)
    }
}

/// Materialized query results with a one-row cursor.
pub(crate) struct ResultSet {
    pub rows: VecDeque<Vec<Value>>,
    pub current: Option<Vec<Value>>,
}

impl ResultSet {
    /// Move to the next row; false once the set is exhausted.
    pub fn advance(&mut self) -> bool {
        self.current = self.rows.pop_front();
        self.current.is_some()
    }

    pub fn current_row(&self) -> StorageResult<&[Value]> {
        self.current.as_deref().ok_or(StorageError::NoActiveRow)
    }
}
