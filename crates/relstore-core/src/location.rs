//! Logical locations — opaque connection targets.

/// A logical location naming a connection target.
///
/// The string is stored verbatim: a `sqlite:` URI, a bare file path,
/// `:memory:`, or a URI for some other engine. Interpretation is left to
/// the storage layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLocation {
    location: String,
}

impl LogicalLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// The location string as given.
    pub fn location_str(&self) -> &str {
        &self.location
    }
}

impl std::fmt::Display for LogicalLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.location)
    }
}
