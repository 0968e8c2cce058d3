//! Database credential lookup.
//!
//! Credentials live in the policy as `[[auth]]` table entries:
//!
//! ```toml
//! [[auth]]
//! url = "mysql://db.example.org:3306/test"
//! username = "reader"
//! password = "hunter2"
//! ```
//!
//! Entries are matched by the host and port components of their `url`.

use tracing::warn;

use crate::errors::{StorageError, StorageResult};
use crate::policy::Policy;

#[derive(Debug, Clone)]
struct AuthEntry {
    host: String,
    port: u16,
    username: String,
    password: String,
}

/// Credential registry matched by host and port.
#[derive(Debug, Clone, Default)]
pub struct DbAuth {
    entries: Vec<AuthEntry>,
}

impl DbAuth {
    /// Build from the `[[auth]]` entries of a policy. Incomplete entries
    /// and entries without a recognizable `host:port` are skipped.
    pub fn from_policy(policy: &Policy) -> Self {
        let mut entries = Vec::new();
        let tables = policy.get_array_of_tables("auth").unwrap_or_default();
        for table in tables {
            let url = table.get("url").and_then(|v| v.as_str());
            let username = table.get("username").and_then(|v| v.as_str());
            let password = table.get("password").and_then(|v| v.as_str());
            let (Some(url), Some(username), Some(password)) = (url, username, password) else {
                warn!("skipping incomplete auth entry");
                continue;
            };
            match parse_host_port(url) {
                Some((host, port)) => entries.push(AuthEntry {
                    host,
                    port,
                    username: username.to_string(),
                    password: password.to_string(),
                }),
                None => warn!(url, "skipping auth entry with unparseable url"),
            }
        }
        Self { entries }
    }

    /// Whether credentials exist for the given target.
    pub fn available(&self, host: &str, port: u16) -> bool {
        self.find(host, port).is_some()
    }

    pub fn username(&self, host: &str, port: u16) -> StorageResult<&str> {
        self.find(host, port)
            .map(|e| e.username.as_str())
            .ok_or_else(|| unavailable(host, port))
    }

    pub fn password(&self, host: &str, port: u16) -> StorageResult<&str> {
        self.find(host, port)
            .map(|e| e.password.as_str())
            .ok_or_else(|| unavailable(host, port))
    }

    fn find(&self, host: &str, port: u16) -> Option<&AuthEntry> {
        self.entries
            .iter()
            .find(|e| e.host == host && e.port == port)
    }
}

fn unavailable(host: &str, port: u16) -> StorageError {
    StorageError::AuthUnavailable {
        target: format!("{host}:{port}"),
    }
}

/// Extract host and port from a `scheme://host:port/...` url.
fn parse_host_port(url: &str) -> Option<(String, u16)> {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let authority = rest.split(['/', '?']).next()?;
    let (host, port) = authority.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    let port: u16 = port.parse().ok()?;
    Some((host.to_string(), port))
}
