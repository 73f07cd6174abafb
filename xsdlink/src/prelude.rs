//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions.
//!
//! ```ignore
//! use xsdlink::prelude::*;
//! ```

pub use std::path::Path;

// Schema types
pub use xsdlink_schema::{
    IdentifierPolicy, SchemaError, SchemaModel, TypeNode, TypeSource, detect_identifiers,
    parse_schema, parse_schema_file,
};

// Generation types
pub use xsdlink_codegen::{
    CodegenError, GeneratedSchema, Generator, GeneratorConfig, NamingCollisionWarning,
    SchemaMetadata, generate_from_file, generate_from_xml,
};

// Verification types
pub use xsdlink_verify::{ClassComparison, VerificationReport, VerifyError, VerifyOptions, verify};

// Pipeline
pub use crate::{BatchSummary, Conversion, Error, convert, run_batch};
