//! # xsdlink
//!
//! Converts XML Schema documents describing microscopy metadata (OME and
//! NBO families) into LinkML, and verifies that the translation kept every
//! class and field.
//!
//! ## Pipeline
//!
//! XSD documents are loaded with their includes, normalized into an
//! intermediate model, scanned for identifier fields and mapped to a LinkML
//! schema written as one YAML file or one file per class. The verifier then
//! recounts both sides independently.
//!
//! ## Quick Start
//!
//! ```ignore
//! use xsdlink::prelude::*;
//!
//! let config = GeneratorConfig::new().with_elements(["Image"]);
//! let conversion = xsdlink::convert(Path::new("ome.xsd"), Path::new("ome.yaml"), &config)?;
//! let report = verify(Path::new("ome.xsd"), Path::new("ome.yaml"), &VerifyOptions { allow_subset: true })?;
//! assert!(report.passed());
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - XSD loading, normalization and the intermediate model
//! - [`codegen`] - LinkML generation and writers
//! - [`verify`] - Structural equivalence verification

pub mod batch;
pub mod error;
pub mod prelude;

/// XSD loading, normalization and the intermediate model.
pub mod schema {
    pub use xsdlink_schema::*;
}

/// LinkML generation.
pub mod codegen {
    pub use xsdlink_codegen::*;
}

/// Structural equivalence verification.
pub mod verify {
    pub use xsdlink_verify::*;
}

pub use batch::{BatchEntry, BatchOutcome, BatchSummary, run_batch};
pub use error::Error;

// Re-export commonly used items at the crate root
pub use xsdlink_codegen::{GeneratedSchema, Generator, GeneratorConfig};
pub use xsdlink_schema::{SchemaModel, parse_schema_file};
pub use xsdlink_verify::{VerificationReport, VerifyOptions};

use std::fs;
use std::path::{Path, PathBuf};

/// Result of one conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Generated schema.
    pub generated: GeneratedSchema,
    /// Files written, index last when partitioned.
    pub written: Vec<PathBuf>,
}

/// Converts an XSD file and writes the LinkML output.
///
/// # Arguments
/// * `xsd` - Root XSD file
/// * `output` - YAML file, or directory in partition mode
/// * `config` - Metadata overrides and output options
///
/// # Errors
/// Returns `Error` if loading, generation or writing fails. Nothing is
/// written when generation fails.
pub fn convert(xsd: &Path, output: &Path, config: &GeneratorConfig) -> Result<Conversion, Error> {
    let model = parse_schema_file(xsd)?;
    convert_model(&model, output, config)
}

/// Generates and writes LinkML for an already normalized model.
///
/// # Errors
/// Returns `Error` if generation or writing fails.
pub fn convert_model(
    model: &SchemaModel,
    output: &Path,
    config: &GeneratorConfig,
) -> Result<Conversion, Error> {
    let generated = Generator::new(model, config).generate()?;
    let written = generated.write(output)?;
    Ok(Conversion { generated, written })
}

/// Writes the intermediate model as pretty-printed JSON.
///
/// # Errors
/// Returns `Error` if serialization or writing fails.
pub fn write_model_json(model: &SchemaModel, path: &Path) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(model)?;
    fs::write(path, json).map_err(|source| Error::io(path, source))?;
    tracing::info!(path = %path.display(), "wrote intermediate model");
    Ok(())
}
