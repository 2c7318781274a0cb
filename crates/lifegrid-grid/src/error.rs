//! Error types for the `lifegrid-grid` crate.

/// Errors that can occur during grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// No catalog pattern is registered under the requested key.
    #[error("pattern not found: {key}")]
    PatternNotFound {
        /// The key that was looked up.
        key: String,
    },
}
