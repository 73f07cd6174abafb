//! Integrity checks for the intermediate model.
//!
//! These run once, inside [`ModelBuilder::finish`](crate::ir::ModelBuilder::finish),
//! before a [`SchemaModel`] becomes visible to downstream stages.

use crate::error::SchemaIntegrityError;
use crate::ir::SchemaModel;
use crate::types::{EnumNode, TypeNode, TypeRef};

/// Validates a finished model.
///
/// # Errors
/// Returns `SchemaIntegrityError` describing the first violation.
pub fn validate_model(model: &SchemaModel) -> Result<(), SchemaIntegrityError> {
    validate_nodes(model.types(), model.enums())
}

/// Validates raw type and enum vectors.
///
/// # Arguments
/// * `types` - Type nodes indexed by `TypeId`
/// * `enums` - Enum nodes indexed by `EnumId`
///
/// # Errors
/// Returns `SchemaIntegrityError` on a dangling reference, an inheritance
/// cycle or an inconsistent occurrence range.
pub fn validate_nodes(types: &[TypeNode], enums: &[EnumNode]) -> Result<(), SchemaIntegrityError> {
    validate_bases(types)?;
    validate_fields(types, enums)?;
    Ok(())
}

/// Checks that every base resolves and that no base chain loops.
fn validate_bases(types: &[TypeNode]) -> Result<(), SchemaIntegrityError> {
    for node in types {
        match node.base {
            Some(base) if base.0 >= types.len() => {
                return Err(SchemaIntegrityError::DanglingBase {
                    type_name: node.name.clone(),
                    base: base.0,
                });
            }
            _ => {}
        }
    }

    for start in 0..types.len() {
        let mut chain = vec![start];
        let mut current = types[start].base;
        while let Some(id) = current {
            if let Some(pos) = chain.iter().position(|&seen| seen == id.0) {
                let mut names: Vec<&str> = chain[pos..]
                    .iter()
                    .map(|&i| types[i].name.as_str())
                    .collect();
                names.push(types[id.0].name.as_str());
                return Err(SchemaIntegrityError::CyclicInheritance {
                    path: names.join(" -> "),
                });
            }
            chain.push(id.0);
            current = types[id.0].base;
        }
    }

    Ok(())
}

/// Checks field references and occurrence ranges.
fn validate_fields(types: &[TypeNode], enums: &[EnumNode]) -> Result<(), SchemaIntegrityError> {
    for node in types {
        for field in &node.fields {
            let dangling = match &field.type_ref {
                TypeRef::Complex(id) => id.0 >= types.len(),
                TypeRef::Enum(id) => id.0 >= enums.len(),
                _ => false,
            };
            if dangling {
                return Err(SchemaIntegrityError::DanglingRange {
                    type_name: node.name.clone(),
                    field: field.name.clone(),
                });
            }

            if !field.occurs.is_consistent() || field.occurs.is_prohibited() {
                return Err(SchemaIntegrityError::InvalidOccurs {
                    type_name: node.name.clone(),
                    field: field.name.clone(),
                    min: field.occurs.min,
                    max: field.occurs.max.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        FieldKind, FieldNode, MaxOccurs, Occurs, QName, TypeId, TypeSource,
    };

    fn node(name: &str, base: Option<usize>) -> TypeNode {
        let mut node = TypeNode::new(
            QName::new(None, name),
            TypeSource::ComplexType(name.to_string()),
        );
        node.base = base.map(TypeId);
        node
    }

    #[test]
    fn test_validate_acyclic_chain() {
        let types = vec![node("Base", None), node("Mid", Some(0)), node("Leaf", Some(1))];
        assert!(validate_nodes(&types, &[]).is_ok());
    }

    #[test]
    fn test_validate_cycle() {
        let types = vec![node("A", Some(1)), node("B", Some(0))];
        let err = validate_nodes(&types, &[]).unwrap_err();
        match err {
            SchemaIntegrityError::CyclicInheritance { path } => {
                assert_eq!(path, "A -> B -> A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_self_cycle() {
        let types = vec![node("Loop", Some(0))];
        assert!(matches!(
            validate_nodes(&types, &[]),
            Err(SchemaIntegrityError::CyclicInheritance { .. })
        ));
    }

    #[test]
    fn test_validate_dangling_base() {
        let types = vec![node("Orphan", Some(7))];
        assert!(matches!(
            validate_nodes(&types, &[]),
            Err(SchemaIntegrityError::DanglingBase { base: 7, .. })
        ));
    }

    #[test]
    fn test_validate_field_ranges_and_occurs() {
        let mut owner = node("Owner", None);
        owner.fields.push(FieldNode::new(
            "missing",
            FieldKind::Element,
            TypeRef::Complex(TypeId(4)),
        ));
        assert!(matches!(
            validate_nodes(&[owner], &[]),
            Err(SchemaIntegrityError::DanglingRange { .. })
        ));

        let mut owner = node("Owner", None);
        owner.fields.push(
            FieldNode::new("bad", FieldKind::Element, TypeRef::Primitive("string".into()))
                .with_occurs(Occurs::new(2, MaxOccurs::Bounded(1))),
        );
        assert!(matches!(
            validate_nodes(&[owner], &[]),
            Err(SchemaIntegrityError::InvalidOccurs { .. })
        ));
    }
}
