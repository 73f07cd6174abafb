//! Error types for schema loading, normalization and integrity checks.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for reading and normalizing XSD documents.
///
/// Every variant is fatal for the document being converted: the normalizer
/// never returns a partial model.
#[derive(Debug, Error)]
pub enum SchemaParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Structurally malformed XML the tokenizer let through.
    #[error("malformed XML: {message}")]
    Malformed {
        /// Error message.
        message: String,
    },

    /// IO error while reading a schema document.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Root element is not `xs:schema`.
    #[error("document root '{found}' is not an XML Schema")]
    NotASchema {
        /// Qualified name of the root element found.
        found: String,
    },

    /// A namespace prefix is used without a declaration in scope.
    #[error("unresolved namespace prefix '{prefix}' in '{context}'")]
    UnresolvedPrefix {
        /// Undeclared prefix.
        prefix: String,
        /// Qualified name or value that used it.
        context: String,
    },

    /// An include/import/redefine target cannot be loaded.
    #[error("cannot resolve schema location '{location}' referenced from '{from}'")]
    UnresolvedInclude {
        /// Value of `schemaLocation`.
        location: String,
        /// Document containing the reference.
        from: String,
    },

    /// A `ref`, `base` or group reference names nothing that was loaded.
    #[error("unresolved {kind} reference '{name}'")]
    UnresolvedReference {
        /// Kind of component (element, attribute, group, ...).
        kind: String,
        /// Referenced name.
        name: String,
    },

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },
}

/// Structural impossibility detected in the intermediate model.
#[derive(Debug, Error)]
pub enum SchemaIntegrityError {
    /// Base-type chain loops back on itself.
    #[error("cyclic inheritance: {path}")]
    CyclicInheritance {
        /// Chain of type names forming the cycle.
        path: String,
    },

    /// Model group or attribute group references itself.
    #[error("cyclic group reference: {path}")]
    CyclicGroup {
        /// Chain of group names forming the cycle.
        path: String,
    },

    /// Simple type derives from itself.
    #[error("cyclic simple type derivation: {name}")]
    CyclicSimpleType {
        /// Simple type name.
        name: String,
    },

    /// Base reference points outside the model.
    #[error("type '{type_name}' references missing base #{base}")]
    DanglingBase {
        /// Derived type name.
        type_name: String,
        /// Missing base index.
        base: usize,
    },

    /// Field type reference points outside the model.
    #[error("field '{field}' of '{type_name}' references a missing type or enum")]
    DanglingRange {
        /// Owning type name.
        type_name: String,
        /// Field name.
        field: String,
    },

    /// Occurrence bounds violate `min <= max`.
    #[error("field '{field}' of '{type_name}' has invalid occurrence {min}..{max}")]
    InvalidOccurs {
        /// Owning type name.
        type_name: String,
        /// Field name.
        field: String,
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: String,
    },
}

/// Error type returned by the normalization pipeline.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Parsing error.
    #[error("schema parse error: {0}")]
    Parse(#[from] SchemaParseError),

    /// Integrity error.
    #[error("schema integrity error: {0}")]
    Integrity(#[from] SchemaIntegrityError),
}

impl From<quick_xml::Error> for SchemaError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Parse(SchemaParseError::Xml(err))
    }
}

impl SchemaParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an unresolved reference error.
    pub fn unresolved(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates a malformed-document error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}
