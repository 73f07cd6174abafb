//! Error types for LinkML generation.

use std::fmt;
use thiserror::Error;

/// A field whose type maps to no builtin, class or enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve range '{type_name}' of field '{field_name}' in class '{class_name}'")]
pub struct UnresolvedRangeError {
    /// Class owning the field.
    pub class_name: String,
    /// Field name as declared in the schema.
    pub field_name: String,
    /// Type name that could not be resolved.
    pub type_name: String,
}

/// Error type for generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Schema parsing or integrity error.
    #[error("schema error: {0}")]
    Schema(#[from] xsdlink_schema::SchemaError),

    /// Unresolvable field range.
    #[error(transparent)]
    UnresolvedRange(#[from] UnresolvedRangeError),

    /// Requested element is not declared in the schema.
    #[error("unknown element or type '{name}'")]
    UnknownElement {
        /// Requested name.
        name: String,
    },

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodegenError {
    /// Creates an unknown element error.
    pub fn unknown_element(name: impl Into<String>) -> Self {
        Self::UnknownElement { name: name.into() }
    }
}

impl From<xsdlink_schema::SchemaParseError> for CodegenError {
    fn from(err: xsdlink_schema::SchemaParseError) -> Self {
        Self::Schema(err.into())
    }
}

/// A name changed to avoid a collision after NCName coercion.
///
/// Not an error: generation continues with the assigned name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingCollisionWarning {
    /// Naming scope (`schema` for classes and enums, the class for slots).
    pub scope: String,
    /// Name as declared in the schema.
    pub original: String,
    /// Name emitted in the output.
    pub assigned: String,
}

impl fmt::Display for NamingCollisionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' renamed to '{}' in {} to avoid a collision",
            self.original, self.assigned, self.scope
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_range_message() {
        let err: CodegenError = UnresolvedRangeError {
            class_name: "Pixels".into(),
            field_name: "Type".into(),
            type_name: "{urn:x}PixelType".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "cannot resolve range '{urn:x}PixelType' of field 'Type' in class 'Pixels'"
        );
    }

    #[test]
    fn test_collision_warning_display() {
        let warning = NamingCollisionWarning {
            scope: "schema".into(),
            original: "Foo-Bar".into(),
            assigned: "Foo_Bar_2".into(),
        };
        assert_eq!(
            warning.to_string(),
            "'Foo-Bar' renamed to 'Foo_Bar_2' in schema to avoid a collision"
        );
    }
}
