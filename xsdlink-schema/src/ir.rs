//! Intermediate model consumed by the generator.
//!
//! The model is the single source of truth between the XSD normalizer and
//! the LinkML generator. It is built through [`ModelBuilder`], validated once
//! in [`ModelBuilder::finish`], and never mutated afterwards.

use crate::error::SchemaIntegrityError;
use crate::types::{
    ElementBinding, EnumId, EnumNode, FieldKind, FieldNode, QName, TypeId, TypeNode, TypeSource,
};
use crate::validation::validate_nodes;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Index;

/// Normalized, immutable representation of an XSD document set.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaModel {
    /// Target namespace of the root document.
    pub target_namespace: Option<String>,
    /// Schema-level documentation of the root document.
    pub documentation: Option<String>,
    types: Vec<TypeNode>,
    enums: Vec<EnumNode>,
    elements: IndexMap<QName, ElementBinding>,
}

impl SchemaModel {
    /// All type nodes, indexed by [`TypeId`].
    #[must_use]
    pub fn types(&self) -> &[TypeNode] {
        &self.types
    }

    /// All enum nodes, indexed by [`EnumId`].
    #[must_use]
    pub fn enums(&self) -> &[EnumNode] {
        &self.enums
    }

    /// Iterates over type ids in declaration order.
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.types.len()).map(TypeId)
    }

    /// Gets a type node by id.
    #[must_use]
    pub fn get_type(&self, id: TypeId) -> Option<&TypeNode> {
        self.types.get(id.0)
    }

    /// Gets an enum node by id.
    #[must_use]
    pub fn get_enum(&self, id: EnumId) -> Option<&EnumNode> {
        self.enums.get(id.0)
    }

    /// Iterates over top-level element declarations in document order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementBinding> {
        self.elements.values()
    }

    /// Looks up a top-level element by local name.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<&ElementBinding> {
        self.elements.values().find(|e| e.qname.local == name)
    }

    /// Looks up a type node by local name, preferring named complex types.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        let named = self
            .types
            .iter()
            .position(|t| matches!(t.source, TypeSource::ComplexType(_)) && t.name == name);
        named
            .or_else(|| self.types.iter().position(|t| t.name == name))
            .map(TypeId)
    }

    /// Base chain of a type, nearest ancestor first.
    #[must_use]
    pub fn ancestors(&self, id: TypeId) -> Vec<TypeId> {
        ancestors_of(&self.types, id)
    }

    /// Fields visible on a type: inherited ones base-to-derived, then its own.
    ///
    /// Each entry carries the declaring type and the field's index in it.
    #[must_use]
    pub fn all_fields(&self, id: TypeId) -> Vec<(TypeId, usize, &FieldNode)> {
        let mut lineage = self.ancestors(id);
        lineage.reverse();
        lineage.push(id);

        lineage
            .into_iter()
            .flat_map(|owner| {
                self.types[owner.0]
                    .fields
                    .iter()
                    .enumerate()
                    .map(move |(index, field)| (owner, index, field))
            })
            .collect()
    }

    /// Direct subtypes of a type, in declaration order.
    #[must_use]
    pub fn subtypes(&self, id: TypeId) -> Vec<TypeId> {
        self.type_ids()
            .filter(|&t| self.types[t.0].base == Some(id))
            .collect()
    }
}

impl Index<TypeId> for SchemaModel {
    type Output = TypeNode;

    fn index(&self, id: TypeId) -> &TypeNode {
        &self.types[id.0]
    }
}

impl Index<EnumId> for SchemaModel {
    type Output = EnumNode;

    fn index(&self, id: EnumId) -> &EnumNode {
        &self.enums[id.0]
    }
}

/// Accumulates nodes while the normalizer walks the documents.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    target_namespace: Option<String>,
    documentation: Option<String>,
    types: Vec<TypeNode>,
    enums: Vec<EnumNode>,
    elements: IndexMap<QName, ElementBinding>,
}

impl ModelBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(target_namespace: Option<String>) -> Self {
        Self {
            target_namespace,
            ..Self::default()
        }
    }

    /// Sets the schema-level documentation.
    pub fn set_documentation(&mut self, documentation: Option<String>) {
        self.documentation = documentation;
    }

    /// Adds a type node and returns its id.
    pub fn add_type(&mut self, node: TypeNode) -> TypeId {
        self.types.push(node);
        TypeId(self.types.len() - 1)
    }

    /// Mutable access to a node added earlier.
    pub fn type_mut(&mut self, id: TypeId) -> &mut TypeNode {
        &mut self.types[id.0]
    }

    /// Shared access to a node added earlier.
    #[must_use]
    pub fn type_node(&self, id: TypeId) -> &TypeNode {
        &self.types[id.0]
    }

    /// Adds an enum node and returns its id.
    pub fn add_enum(&mut self, node: EnumNode) -> EnumId {
        self.enums.push(node);
        EnumId(self.enums.len() - 1)
    }

    /// Shared access to an enum added earlier.
    #[must_use]
    pub fn enum_node(&self, id: EnumId) -> &EnumNode {
        &self.enums[id.0]
    }

    /// Records a top-level element declaration.
    pub fn bind_element(&mut self, binding: ElementBinding) {
        self.elements.insert(binding.qname.clone(), binding);
    }

    /// Validates the accumulated nodes and freezes them into a model.
    ///
    /// # Errors
    /// Returns `SchemaIntegrityError` if a base chain is cyclic, a reference
    /// dangles, or an occurrence range is inconsistent.
    pub fn finish(mut self) -> Result<SchemaModel, SchemaIntegrityError> {
        validate_nodes(&self.types, &self.enums)?;
        mark_overrides(&mut self.types);

        Ok(SchemaModel {
            target_namespace: self.target_namespace,
            documentation: self.documentation,
            types: self.types,
            enums: self.enums,
            elements: self.elements,
        })
    }
}

/// Flags own fields that redeclare an ancestor's field of the same kind.
fn mark_overrides(types: &mut [TypeNode]) {
    for index in 0..types.len() {
        let inherited: HashSet<(FieldKind, String)> = ancestors_of(types, TypeId(index))
            .into_iter()
            .flat_map(|a| types[a.0].fields.iter().map(|f| (f.kind, f.name.clone())))
            .collect();
        if inherited.is_empty() {
            continue;
        }
        for field in &mut types[index].fields {
            field.overrides_inherited = inherited.contains(&(field.kind, field.name.clone()));
        }
    }
}

/// Walks the base chain, stopping if it revisits a node.
fn ancestors_of(types: &[TypeNode], id: TypeId) -> Vec<TypeId> {
    let mut chain = Vec::new();
    let mut current = types.get(id.0).and_then(|t| t.base);
    while let Some(base) = current {
        if base == id || chain.contains(&base) || base.0 >= types.len() {
            break;
        }
        chain.push(base);
        current = types[base.0].base;
    }
    chain
}
