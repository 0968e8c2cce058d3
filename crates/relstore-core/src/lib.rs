//! # relstore-core
//!
//! Foundation crate for the relstore persistence layer.
//! Defines errors, the `Policy` configuration object, logical locations,
//! and database credential lookup. The storage crate depends on this.

pub mod auth;
pub mod errors;
pub mod location;
pub mod policy;
pub mod tracing;

// Re-export the most commonly used types at the crate root.
pub use auth::DbAuth;
pub use errors::{PolicyError, PolicyResult, StorageError, StorageResult};
pub use location::LogicalLocation;
pub use policy::Policy;
