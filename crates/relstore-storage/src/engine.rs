//! `DbStorage` — transactional SQL persistence wrapper.
//!
//! Owns a single `rusqlite::Connection` bound through a `LogicalLocation`.
//! No code outside this module touches the raw connection; callers work
//! through explicit transaction bracketing, table lifecycle operations,
//! a staged insert path, and a query path with named condition parameters
//! and positional or bound output columns.
//!
//! ```no_run
//! use relstore_core::{LogicalLocation, Policy};
//! use relstore_storage::DbStorage;
//!
//! # fn main() -> relstore_core::StorageResult<()> {
//! let mut dbs = DbStorage::new();
//! dbs.set_policy(Policy::new());
//! dbs.set_persist_location(&LogicalLocation::new("sqlite:catalog.db"))?;
//!
//! dbs.start_transaction()?;
//! dbs.set_table_for_insert("sources");
//! dbs.set_column("id", 42i64);
//! dbs.set_column("ra", 3.14159f64);
//! dbs.set_column_to_null("flags");
//! dbs.insert_row()?;
//! dbs.end_transaction()?;
//! # Ok(())
//! # }
//! ```

use rusqlite::types::{FromSql, Value, ValueRef};
use rusqlite::{Connection, OptionalExtension};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use relstore_core::errors::{StorageError, StorageResult};
use relstore_core::{LogicalLocation, Policy};

use crate::connection::open_location;
use crate::ddl::{quote_ident, splice_table_name};
use crate::query::{make_binder, OutVar, OutputColumn, QuerySpec, ResultSet};
use crate::sqe;

/// Transactional storage wrapper over a single SQLite connection.
pub struct DbStorage {
    policy: Policy,
    conn: Option<Connection>,
    location: Option<String>,
    in_transaction: bool,
    insert_table: Option<String>,
    insert_columns: Vec<(String, Value)>,
    query: QuerySpec,
    results: Option<ResultSet>,
}

impl DbStorage {
    pub fn new() -> Self {
        Self {
            policy: Policy::new(),
            conn: None,
            location: None,
            in_transaction: false,
            insert_table: None,
            insert_columns: Vec::new(),
            query: QuerySpec::default(),
            results: None,
        }
    }

    /// Install the policy consulted when connections are opened.
    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    /// Bind the storage to a location for persisting data.
    pub fn set_persist_location(&mut self, location: &LogicalLocation) -> StorageResult<()> {
        self.bind_location(location)
    }

    /// Bind the storage to a location for retrieving data.
    pub fn set_retrieve_location(&mut self, location: &LogicalLocation) -> StorageResult<()> {
        self.bind_location(location)
    }

    fn bind_location(&mut self, location: &LogicalLocation) -> StorageResult<()> {
        if self.in_transaction {
            return Err(StorageError::TransactionInProgress);
        }
        // Re-binding to the same target keeps the open connection, which
        // also keeps in-memory databases coherent across persist/retrieve.
        if self.conn.is_some() && self.location.as_deref() == Some(location.location_str()) {
            return Ok(());
        }
        let conn = open_location(location, &self.policy)?;
        self.conn = Some(conn);
        self.location = Some(location.location_str().to_string());
        self.results = None;
        Ok(())
    }

    fn conn(&self) -> StorageResult<&Connection> {
        self.conn.as_ref().ok_or(StorageError::NotConnected)
    }

    // ── transactions ──

    /// Begin a transaction. Transactions do not nest.
    pub fn start_transaction(&mut self) -> StorageResult<()> {
        if self.in_transaction {
            return Err(StorageError::TransactionInProgress);
        }
        self.conn()?.execute_batch("BEGIN IMMEDIATE").map_err(sqe)?;
        self.in_transaction = true;
        debug!("transaction started");
        Ok(())
    }

    /// Commit the current transaction.
    pub fn end_transaction(&mut self) -> StorageResult<()> {
        if !self.in_transaction {
            return Err(StorageError::NoTransaction);
        }
        self.conn()?.execute_batch("COMMIT").map_err(sqe)?;
        self.in_transaction = false;
        debug!("transaction committed");
        Ok(())
    }

    // ── table lifecycle ──

    /// Create `table` with the same schema as the existing `template`
    /// table. With `may_already_exist`, an existing `table` is accepted
    /// as-is instead of being an error.
    pub fn create_table_from_template(
        &self,
        table: &str,
        template: &str,
        may_already_exist: bool,
    ) -> StorageResult<()> {
        let conn = self.conn()?;
        if table_exists(conn, table)? {
            if may_already_exist {
                return Ok(());
            }
            return Err(StorageError::TableExists {
                table: table.to_string(),
            });
        }
        let ddl = template_ddl(conn, template)?;
        let create = splice_table_name(&ddl, table).ok_or_else(|| StorageError::SqliteError {
            message: format!("cannot rewrite DDL of template table {template}"),
        })?;
        conn.execute_batch(&create).map_err(sqe)?;
        info!(table, template, "created table from template");
        Ok(())
    }

    /// Remove all rows from `table`. SQLite has no TRUNCATE statement;
    /// DELETE without a WHERE clause is its fast path.
    pub fn truncate_table(&self, table: &str) -> StorageResult<()> {
        let rows = self
            .conn()?
            .execute(&format!("DELETE FROM {}", quote_ident(table)), [])
            .map_err(sqe)?;
        debug!(table, rows, "truncated table");
        Ok(())
    }

    pub fn drop_table(&self, table: &str) -> StorageResult<()> {
        self.conn()?
            .execute_batch(&format!("DROP TABLE {}", quote_ident(table)))
            .map_err(sqe)?;
        info!(table, "dropped table");
        Ok(())
    }

    /// Raw SQL escape hatch. Statements run as a batch.
    pub fn execute_sql(&self, sql: &str) -> StorageResult<()> {
        self.conn()?.execute_batch(sql).map_err(sqe)
    }

    // ── insert path ──

    /// Choose the target table for subsequent inserts, clearing any
    /// pending column values.
    pub fn set_table_for_insert(&mut self, table: &str) {
        self.insert_table = Some(table.to_string());
        self.insert_columns.clear();
    }

    /// Stage a column value for the next inserted row. Staging the same
    /// column again overwrites the pending value. Strings go in as owned
    /// `String`s.
    pub fn set_column(&mut self, name: &str, value: impl Into<Value>) {
        self.put_column(name, value.into());
    }

    /// Stage an explicit NULL for a column of the next inserted row.
    pub fn set_column_to_null(&mut self, name: &str) {
        self.put_column(name, Value::Null);
    }

    fn put_column(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.insert_columns.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.insert_columns.push((name.to_string(), value));
        }
    }

    /// Insert the staged row. Column values are cleared afterwards; the
    /// table selection is kept so further rows can be staged.
    pub fn insert_row(&mut self) -> StorageResult<()> {
        let table = self
            .insert_table
            .as_deref()
            .ok_or(StorageError::NoTableSelected)?;
        if self.insert_columns.is_empty() {
            return Err(StorageError::EmptyRow);
        }
        let conn = self.conn.as_ref().ok_or(StorageError::NotConnected)?;

        let names: Vec<String> = self
            .insert_columns
            .iter()
            .map(|(n, _)| quote_ident(n))
            .collect();
        let placeholders: Vec<String> = (1..=self.insert_columns.len())
            .map(|i| format!("?{i}"))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            names.join(", "),
            placeholders.join(", ")
        );

        let mut stmt = conn.prepare_cached(&sql).map_err(sqe)?;
        stmt.execute(rusqlite::params_from_iter(
            self.insert_columns.iter().map(|(_, v)| v),
        ))
        .map_err(sqe)?;
        drop(stmt);

        debug!(table, columns = self.insert_columns.len(), "inserted row");
        self.insert_columns.clear();
        Ok(())
    }

    // ── query path ──

    /// Choose the table for the next query, resetting prior query state.
    pub fn set_table_for_query(&mut self, table: &str) {
        self.query = QuerySpec::default();
        self.query.tables.push(table.to_string());
        self.results = None;
    }

    /// Query over several tables (free-form FROM items, so aliases pass
    /// through).
    pub fn set_table_list_for_query(&mut self, tables: &[&str]) {
        self.query = QuerySpec::default();
        self.query
            .tables
            .extend(tables.iter().map(|t| (*t).to_string()));
        self.results = None;
    }

    /// Bind a named condition parameter, referenced as `:name` in the
    /// WHERE fragment. Parameters the final SQL does not mention are
    /// ignored.
    pub fn cond_param(&mut self, name: &str, value: impl Into<Value>) {
        self.query.params.push((format!(":{name}"), value.into()));
    }

    /// Free-form WHERE fragment.
    pub fn set_query_where(&mut self, fragment: &str) {
        self.query.where_clause = Some(fragment.to_string());
    }

    pub fn group_by(&mut self, expression: &str) {
        self.query.group_by = Some(expression.to_string());
    }

    pub fn order_by(&mut self, expression: &str) {
        self.query.order_by = Some(expression.to_string());
    }

    /// Declare a positionally read output column. The text is free-form
    /// select syntax, so qualified names and expressions pass through.
    pub fn out_column(&mut self, text: &str) {
        self.query.outputs.push(OutputColumn {
            text: text.to_string(),
            binder: None,
        });
    }

    /// Declare an output column bound to `var`. The variable occupies the
    /// next output position and is refreshed on every successful `next()`.
    pub fn out_param<T>(&mut self, text: &str, var: &OutVar<T>)
    where
        T: FromSql + 'static,
    {
        self.query.outputs.push(OutputColumn {
            text: text.to_string(),
            binder: Some(make_binder(var)),
        });
    }

    /// Build and run the SELECT, materializing the full result set.
    pub fn query(&mut self) -> StorageResult<()> {
        let conn = self.conn.as_ref().ok_or(StorageError::NotConnected)?;
        let sql = self.query.to_sql()?;
        debug!(sql, "executing query");

        let mut stmt = conn.prepare(&sql).map_err(sqe)?;
        for (name, value) in &self.query.params {
            if let Some(index) = stmt.parameter_index(name).map_err(sqe)? {
                stmt.raw_bind_parameter(index, value).map_err(sqe)?;
            }
        }

        let column_count = stmt.column_count();
        let mut rows = stmt.raw_query();
        let mut materialized = VecDeque::new();
        while let Some(row) = rows.next().map_err(sqe)? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(row.get::<_, Value>(i).map_err(sqe)?);
            }
            materialized.push_back(values);
        }
        debug!(rows = materialized.len(), "query materialized");

        self.results = Some(ResultSet {
            rows: materialized,
            current: None,
        });
        Ok(())
    }

    /// Advance the cursor, refreshing all bound output variables.
    /// Returns false once the result set is exhausted.
    pub fn next(&mut self) -> StorageResult<bool> {
        let results = self.results.as_mut().ok_or(StorageError::NoQueryActive)?;
        if !results.advance() {
            return Ok(false);
        }
        let row = results.current_row()?;
        for (index, output) in self.query.outputs.iter().enumerate() {
            if let Some(binder) = &output.binder {
                let value = row.get(index).ok_or(StorageError::ColumnOutOfRange {
                    index,
                    count: row.len(),
                })?;
                binder(index, ValueRef::from(value))?;
            }
        }
        Ok(true)
    }

    /// Whether the given output column of the current row is NULL.
    pub fn column_is_null(&self, index: usize) -> StorageResult<bool> {
        Ok(matches!(self.current_value(index)?, Value::Null))
    }

    /// Typed read of an output column from the current row.
    pub fn get_column_by_pos<T: FromSql>(&self, index: usize) -> StorageResult<T> {
        let value = self.current_value(index)?;
        T::column_result(ValueRef::from(value)).map_err(|e| StorageError::TypeMismatch {
            index,
            message: e.to_string(),
        })
    }

    fn current_value(&self, index: usize) -> StorageResult<&Value> {
        let results = self.results.as_ref().ok_or(StorageError::NoQueryActive)?;
        let row = results.current_row()?;
        row.get(index).ok_or(StorageError::ColumnOutOfRange {
            index,
            count: row.len(),
        })
    }

    /// Drop the cursor and all query state.
    pub fn finish_query(&mut self) {
        self.results = None;
        self.query = QuerySpec::default();
    }
}

impl Default for DbStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DbStorage {
    fn drop(&mut self) {
        if self.in_transaction {
            if let Some(conn) = &self.conn {
                let _ = conn.execute_batch("ROLLBACK");
                warn!("storage dropped with an open transaction; rolled back");
            }
        }
    }
}

fn table_exists(conn: &Connection, table: &str) -> StorageResult<bool> {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")
        .and_then(|mut stmt| stmt.exists([table]))
        .map_err(sqe)
}

fn template_ddl(conn: &Connection, template: &str) -> StorageResult<String> {
    let ddl: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [template],
            |row| row.get(0),
        )
        .optional()
        .map_err(sqe)?;
    ddl.ok_or_else(|| StorageError::TableMissing {
        table: template.to_string(),
    })
}
