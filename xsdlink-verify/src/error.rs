//! Error types for equivalence verification.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for verification operations.
///
/// Only infrastructure failures are errors; structural differences are
/// reported through [`crate::VerificationReport`].
#[derive(Debug, Error)]
pub enum VerifyError {
    /// XSD loading error.
    #[error("schema error: {0}")]
    Schema(#[from] xsdlink_schema::SchemaParseError),

    /// YAML parsing error.
    #[error("YAML error in '{}': {source}", path.display())]
    Yaml {
        /// File being read.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// IO error.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// YAML that is not shaped like a LinkML schema.
    #[error("invalid LinkML document '{}': {message}", path.display())]
    InvalidLinkml {
        /// File being read.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl VerifyError {
    /// Creates an invalid document error.
    pub fn invalid(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidLinkml {
            path: path.into(),
            message: message.into(),
        }
    }
}
