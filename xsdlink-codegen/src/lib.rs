//! # xsdlink Codegen
//!
//! LinkML generation from normalized XSD models.
//!
//! This crate provides:
//! - Schema metadata derivation and NCName-safe naming
//! - Class, slot and enum generation
//! - Element-restricted output through dependency closure
//! - Single-file and partitioned YAML writers

pub mod closure;
pub mod config;
pub mod documentation;
pub mod error;
pub mod generator;
pub mod linkml;
pub mod naming;
pub mod partition;
pub mod ranges;

pub use closure::{Closure, dependency_closure};
pub use config::{GeneratorConfig, SchemaMetadata, infer_prefix};
pub use error::{CodegenError, NamingCollisionWarning, UnresolvedRangeError};
pub use generator::{GeneratedSchema, Generator};
pub use linkml::LinkmlSchema;
pub use naming::{NameRegistry, NameTable, coerce_ncname};
pub use partition::{PartitionFile, partition};
pub use ranges::{RangeTable, builtin_range};

/// Generates a LinkML schema from an XSD string.
///
/// Includes and imports cannot be resolved without a base directory; use
/// [`generate_from_file`] for multi-file schemas.
///
/// # Arguments
/// * `xml` - XSD document content
/// * `config` - Metadata overrides and output options
///
/// # Errors
/// Returns `CodegenError` if parsing or generation fails.
pub fn generate_from_xml(xml: &str, config: &GeneratorConfig) -> Result<GeneratedSchema, CodegenError> {
    let model = xsdlink_schema::parse_schema(xml)?;
    Generator::new(&model, config).generate()
}

/// Generates a LinkML schema from an XSD file and everything it includes.
///
/// # Arguments
/// * `path` - Path to the root XSD file
/// * `config` - Metadata overrides and output options
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, or generation fails.
pub fn generate_from_file(
    path: &std::path::Path,
    config: &GeneratorConfig,
) -> Result<GeneratedSchema, CodegenError> {
    let model = xsdlink_schema::parse_schema_file(path)?;
    Generator::new(&model, config).generate()
}
