//! # xsdlink Schema
//!
//! XML Schema reader and normalized intermediate model.
//!
//! This crate provides:
//! - A namespace-aware XML reader and an include/import loader
//! - Normalization of XSD documents into an intermediate model
//! - Integrity validation of the model
//! - The identifier heuristic

pub mod error;
pub mod identifier;
pub mod ir;
pub mod loader;
pub mod parser;
pub mod types;
pub mod validation;
pub mod xml;

pub use error::{SchemaError, SchemaIntegrityError, SchemaParseError};
pub use identifier::{FieldRef, IdentifierMarks, IdentifierPolicy, detect_identifiers};
pub use ir::{ModelBuilder, SchemaModel};
pub use loader::{DocumentSet, SchemaDocument, load_documents, load_documents_from_str};
pub use parser::{normalize, parse_schema, parse_schema_file, parse_schema_with_base};
pub use types::{
    Degradation, Derivation, ElementBinding, EnumId, EnumNode, EnumValue, FieldKind, FieldNode,
    MaxOccurs, Occurs, QName, TypeId, TypeNode, TypeRef, TypeSource, XML_NAMESPACE, XSD_NAMESPACE,
    identity_name,
};
pub use validation::validate_model;
