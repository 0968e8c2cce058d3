//! Typed key/value configuration backed by a TOML table.
//!
//! `Policy` is the configuration object injected into `DbStorage` before
//! use. Keys are dotted paths (`"db.busy_timeout_ms"`); values are typed.
//! An absent key reads as `Ok(None)`, a key of the wrong type is an error.

use std::path::Path;

use serde::{Deserialize, Serialize};
use toml::value::{Table, Value};

use crate::errors::{PolicyError, PolicyResult};

/// Hierarchical typed configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy {
    root: Table,
}

impl Policy {
    /// Empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a policy from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse a policy from TOML text.
    pub fn from_toml(text: &str) -> PolicyResult<Self> {
        let root: Table = toml::from_str(text)?;
        Ok(Self { root })
    }

    /// Whether a dotted-path key is present.
    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Top-level key names.
    pub fn names(&self) -> Vec<&str> {
        self.root.keys().map(String::as_str).collect()
    }

    pub fn get_bool(&self, name: &str) -> PolicyResult<Option<bool>> {
        match self.lookup(name) {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(*b)),
            Some(_) => Err(mismatch(name, "bool")),
        }
    }

    pub fn get_int(&self, name: &str) -> PolicyResult<Option<i64>> {
        match self.lookup(name) {
            None => Ok(None),
            Some(Value::Integer(i)) => Ok(Some(*i)),
            Some(_) => Err(mismatch(name, "integer")),
        }
    }

    /// Floating-point accessor. Integer values are widened.
    pub fn get_double(&self, name: &str) -> PolicyResult<Option<f64>> {
        match self.lookup(name) {
            None => Ok(None),
            Some(Value::Float(f)) => Ok(Some(*f)),
            Some(Value::Integer(i)) => Ok(Some(*i as f64)),
            Some(_) => Err(mismatch(name, "float")),
        }
    }

    pub fn get_string(&self, name: &str) -> PolicyResult<Option<&str>> {
        match self.lookup(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(mismatch(name, "string")),
        }
    }

    /// Array-of-tables accessor (e.g. `[[auth]]` blocks). An absent key
    /// reads as an empty list.
    pub fn get_array_of_tables(&self, name: &str) -> PolicyResult<Vec<&Table>> {
        match self.lookup(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_table().ok_or_else(|| mismatch(name, "table array")))
                .collect(),
            Some(_) => Err(mismatch(name, "table array")),
        }
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.insert(name, Value::Boolean(value));
    }

    pub fn set_int(&mut self, name: &str, value: i64) {
        self.insert(name, Value::Integer(value));
    }

    pub fn set_double(&mut self, name: &str, value: f64) {
        self.insert(name, Value::Float(value));
    }

    pub fn set_string(&mut self, name: &str, value: &str) {
        self.insert(name, Value::String(value.to_string()));
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        let mut parts = name.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    fn insert(&mut self, name: &str, value: Value) {
        let parts: Vec<&str> = name.split('.').collect();
        let Some((last, parents)) = parts.split_last() else {
            return;
        };
        let mut table = &mut self.root;
        for part in parents {
            let entry = table
                .entry((*part).to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            // A scalar on the path is replaced by a table.
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            table = match entry {
                Value::Table(t) => t,
                _ => return,
            };
        }
        table.insert((*last).to_string(), value);
    }
}

fn mismatch(name: &str, expected: &'static str) -> PolicyError {
    PolicyError::TypeMismatch {
        name: name.to_string(),
        expected,
    }
}
