//! Error type of the conversion pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for end-to-end operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Loading or normalizing the XSD failed.
    #[error(transparent)]
    Schema(#[from] xsdlink_schema::SchemaError),

    /// Generating or writing LinkML failed.
    #[error(transparent)]
    Codegen(#[from] xsdlink_codegen::CodegenError),

    /// Reading either side for verification failed.
    #[error(transparent)]
    Verify(#[from] xsdlink_verify::VerifyError),

    /// Model dump serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl Error {
    /// Creates an IO error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
