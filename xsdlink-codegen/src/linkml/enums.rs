//! Enum generation.

use crate::documentation::split_documentation;
use crate::linkml::document::{EnumDefinition, PermissibleValue};
use xsdlink_schema::{EnumId, SchemaModel};

/// Generator for enum definitions.
pub struct EnumGenerator<'a> {
    model: &'a SchemaModel,
}

impl<'a> EnumGenerator<'a> {
    /// Creates a new enum generator.
    #[must_use]
    pub fn new(model: &'a SchemaModel) -> Self {
        Self { model }
    }

    /// Generates one enum definition.
    ///
    /// Permissible values are keyed by their raw literal, in facet order.
    #[must_use]
    pub fn generate(&self, id: EnumId) -> EnumDefinition {
        let node = &self.model[id];
        let meta = split_documentation(node.documentation.as_deref());

        let permissible_values = node
            .values
            .iter()
            .map(|value| {
                let description = split_documentation(value.documentation.as_deref()).description;
                (value.value.clone(), PermissibleValue { description })
            })
            .collect();

        EnumDefinition {
            description: meta.description,
            permissible_values,
            annotations: meta.annotations,
        }
    }
}
