//! Error types for rule loading.

use std::path::PathBuf;

/// Errors that can occur while reading a rule configuration source.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The rule file could not be read.
    #[error("failed to read rule file {}: {source}", path.display())]
    Read {
        /// The path that was requested.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rule file is not valid JSON or a record has the wrong shape.
    #[error("failed to parse rule file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document is valid JSON but neither a rule list nor a rule set.
    #[error("invalid rule document: {0}")]
    InvalidDocument(String),
}
