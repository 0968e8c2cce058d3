//! Error types shared across the relstore workspace.

mod policy_error;
mod storage_error;

pub use policy_error::{PolicyError, PolicyResult};
pub use storage_error::{StorageError, StorageResult};
