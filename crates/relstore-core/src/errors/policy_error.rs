//! Policy configuration errors.

/// Errors raised while loading or reading a `Policy`.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Policy value '{name}' is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },
}

/// Result alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
