//! # relstore-storage
//!
//! SQLite persistence layer for relstore.
//! One connection per storage, explicit transaction bracketing,
//! template-based DDL, typed inserts, and parameterized queries with
//! positional or bound output columns.

pub mod connection;
pub mod ddl;
pub mod engine;
pub mod query;

pub use engine::DbStorage;
pub use query::OutVar;

use relstore_core::errors::StorageError;

/// Wrap a rusqlite (or other displayable) error into a `StorageError`.
pub(crate) fn sqe(e: impl std::fmt::Display) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}
