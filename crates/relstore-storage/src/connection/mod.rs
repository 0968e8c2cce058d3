//! Connection handling — logical location to SQLite connection.

pub mod pragmas;

use rusqlite::Connection;
use tracing::debug;

use relstore_core::errors::{StorageError, StorageResult};
use relstore_core::{LogicalLocation, Policy};

use crate::sqe;

/// Open a connection for the given logical location.
///
/// Recognized forms: `:memory:`, `sqlite://PATH`, `sqlite:PATH`, and bare
/// filesystem paths. Any other `scheme://` location is rejected — network
/// engines are outside this layer.
pub fn open_location(location: &LogicalLocation, policy: &Policy) -> StorageResult<Connection> {
    let loc = location.location_str();
    let conn = match sqlite_target(loc) {
        SqliteTarget::Memory => Connection::open_in_memory().map_err(sqe)?,
        SqliteTarget::File(path) => Connection::open(path).map_err(sqe)?,
        SqliteTarget::Unsupported => {
            return Err(StorageError::UnsupportedLocation {
                location: loc.to_string(),
            });
        }
    };
    pragmas::apply_pragmas(&conn, policy)?;
    debug!(location = loc, "opened database connection");
    Ok(conn)
}

enum SqliteTarget<'a> {
    Memory,
    File(&'a str),
    Unsupported,
}

fn sqlite_target(loc: &str) -> SqliteTarget<'_> {
    if loc == ":memory:" {
        return SqliteTarget::Memory;
    }
    if let Some(rest) = loc.strip_prefix("sqlite://") {
        return SqliteTarget::File(rest);
    }
    if let Some(rest) = loc.strip_prefix("sqlite:") {
        return SqliteTarget::File(rest);
    }
    if loc.contains("://") {
        return SqliteTarget::Unsupported;
    }
    SqliteTarget::File(loc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_path_targets() {
        assert!(matches!(sqlite_target(":memory:"), SqliteTarget::Memory));
        assert!(matches!(
            sqlite_target("sqlite:/tmp/a.db"),
            SqliteTarget::File("/tmp/a.db")
        ));
        assert!(matches!(
            sqlite_target("sqlite:///tmp/a.db"),
            SqliteTarget::File("/tmp/a.db")
        ));
        assert!(matches!(
            sqlite_target("data/cat.db"),
            SqliteTarget::File("data/cat.db")
        ));
    }

    #[test]
    fn foreign_schemes_are_unsupported() {
        assert!(matches!(
            sqlite_target("mysql://host:3306/test"),
            SqliteTarget::Unsupported
        ));
    }

    #[test]
    fn opens_in_memory() {
        let loc = LogicalLocation::new(":memory:");
        let conn = open_location(&loc, &Policy::new()).unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }
}
