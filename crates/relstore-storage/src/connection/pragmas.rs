//! Connection pragmas, tuned from the policy.

use rusqlite::Connection;
use tracing::debug;

use relstore_core::errors::StorageResult;
use relstore_core::Policy;

use crate::sqe;

/// Busy timeout when the policy does not set one.
const DEFAULT_BUSY_TIMEOUT_MS: i64 = 5_000;

/// Apply connection pragmas.
///
/// Policy keys: `db.busy_timeout_ms` (integer), `db.foreign_keys` (bool,
/// default on), `db.journal_mode` (string, meaningful for file-backed
/// databases).
pub fn apply_pragmas(conn: &Connection, policy: &Policy) -> StorageResult<()> {
    let busy_timeout = policy
        .get_int("db.busy_timeout_ms")
        .map_err(sqe)?
        .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);
    conn.pragma_update(None, "busy_timeout", busy_timeout)
        .map_err(sqe)?;

    let foreign_keys = policy
        .get_bool("db.foreign_keys")
        .map_err(sqe)?
        .unwrap_or(true);
    conn.pragma_update(None, "foreign_keys", foreign_keys)
        .map_err(sqe)?;

    if let Some(mode) = policy.get_string("db.journal_mode").map_err(sqe)? {
        // journal_mode reports the resulting mode as a row.
        conn.pragma_update_and_check(None, "journal_mode", mode, |_| Ok(()))
            .map_err(sqe)?;
        debug!(mode, "set journal mode");
    }

    Ok(())
}
