//! Dependency closure of a restricted element set.

use crate::error::CodegenError;
use std::collections::BTreeSet;
use xsdlink_schema::{EnumId, SchemaModel, TypeId, TypeRef};

/// Types and enums that must be emitted together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
    /// Type nodes, ordered by id.
    pub types: BTreeSet<TypeId>,
    /// Enum nodes, ordered by id.
    pub enums: BTreeSet<EnumId>,
}

impl Closure {
    /// Closure covering the whole model.
    #[must_use]
    pub fn full(model: &SchemaModel) -> Self {
        Self {
            types: model.type_ids().collect(),
            enums: (0..model.enums().len()).map(EnumId).collect(),
        }
    }

    /// Returns true if the type is part of the closure.
    #[must_use]
    pub fn contains_type(&self, id: TypeId) -> bool {
        self.types.contains(&id)
    }
}

/// Computes everything reachable from the named top-level elements through
/// base references and field ranges.
///
/// A name that is not a top-level element is looked up as a type.
///
/// # Errors
/// Returns `CodegenError::UnknownElement` for a name matching neither.
pub fn dependency_closure(model: &SchemaModel, elements: &[String]) -> Result<Closure, CodegenError> {
    let mut closure = Closure::default();
    let mut queue: Vec<TypeId> = Vec::new();

    for name in elements {
        let name = name.trim();
        let seed = match model.element(name) {
            Some(binding) => binding.class.map(TypeRef::Complex).unwrap_or_else(|| binding.target.clone()),
            None => model
                .find_type(name)
                .map(TypeRef::Complex)
                .ok_or_else(|| CodegenError::unknown_element(name))?,
        };
        match seed {
            TypeRef::Complex(id) => queue.push(id),
            TypeRef::Enum(id) => {
                closure.enums.insert(id);
            }
            _ => tracing::debug!(element = name, "element has simple content only"),
        }
    }

    while let Some(id) = queue.pop() {
        if !closure.types.insert(id) {
            continue;
        }
        let node = &model[id];
        if let Some(base) = node.base {
            queue.push(base);
        }
        for field in &node.fields {
            match field.type_ref {
                TypeRef::Complex(target) => queue.push(target),
                TypeRef::Enum(target) => {
                    closure.enums.insert(target);
                }
                _ => {}
            }
        }
    }

    tracing::info!(
        classes = closure.types.len(),
        enums = closure.enums.len(),
        "restricted output to element closure"
    );
    Ok(closure)
}
