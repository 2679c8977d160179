//! Request DTOs for the feed service API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query for the invalidate operation (DELETE /api/cache)
///
/// # Fields
/// - `pattern`: Optional substring; keys containing it are removed.
///   Without it the whole cache is cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    #[serde(default)]
    pub pattern: Option<String>,
}

impl InvalidateQuery {
    /// Returns the pattern, treating an empty string as absent.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|p| !p.is_empty())
    }
}
