//! Identifier heuristic.
//!
//! Picks at most one field per type to act as its identifier slot. This is
//! a convention detector, not a key/keyref implementation: it never fails.

use crate::ir::SchemaModel;
use crate::types::{FieldNode, TypeId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Rules deciding which fields look like identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierPolicy {
    /// Builtins that always identify (`ID`).
    pub id_types: Vec<String>,
    /// Builtins that reference an identifier (`IDREF`).
    pub reference_types: Vec<String>,
    /// Field names suggesting an identifier, compared case-insensitively.
    pub name_hints: Vec<String>,
    /// Declared type suffixes that confirm a name hint.
    pub type_suffixes: Vec<String>,
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        Self {
            id_types: vec!["ID".to_string()],
            reference_types: vec!["IDREF".to_string()],
            name_hints: vec!["ID".to_string()],
            type_suffixes: vec!["ID".to_string()],
        }
    }
}

impl IdentifierPolicy {
    /// Returns true if a single-valued field qualifies as an identifier.
    #[must_use]
    pub fn matches(&self, field: &FieldNode) -> bool {
        if field.is_multivalued() {
            return false;
        }

        if let Some(builtin) = field.type_ref.builtin() {
            if self.id_types.iter().any(|t| t == builtin)
                || self.reference_types.iter().any(|t| t == builtin)
            {
                return true;
            }
        }

        let named = self
            .name_hints
            .iter()
            .any(|hint| hint.eq_ignore_ascii_case(&field.name));
        let typed = field.declared_type.as_ref().is_some_and(|declared| {
            self.type_suffixes
                .iter()
                .any(|suffix| declared.local.ends_with(suffix.as_str()))
        });
        named && typed
    }
}

/// Position of a field inside the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FieldRef {
    /// Type declaring the field.
    pub owner: TypeId,
    /// Index in the owner's fields.
    pub index: usize,
}

/// Identifier choice per type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentifierMarks {
    marks: BTreeMap<TypeId, FieldRef>,
}

impl IdentifierMarks {
    /// Identifier field of a type, which may be declared by an ancestor.
    #[must_use]
    pub fn identifier_of(&self, id: TypeId) -> Option<FieldRef> {
        self.marks.get(&id).copied()
    }

    /// Returns true if `owner.fields[index]` is the identifier of `owner`.
    #[must_use]
    pub fn is_identifier(&self, owner: TypeId, index: usize) -> bool {
        self.identifier_of(owner) == Some(FieldRef { owner, index })
    }

    /// Number of marked types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Returns true if no type has an identifier.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Marks the identifier field of every type.
///
/// Inherited fields are scanned first, base to derived, then own fields in
/// declaration order; the first match wins.
///
/// # Arguments
/// * `model` - Normalized model
/// * `policy` - Matching rules
#[must_use]
pub fn detect_identifiers(model: &SchemaModel, policy: &IdentifierPolicy) -> IdentifierMarks {
    let mut marks = BTreeMap::new();
    for id in model.type_ids() {
        let found = model
            .all_fields(id)
            .into_iter()
            .find(|(_, _, field)| policy.matches(field))
            .map(|(owner, index, _)| FieldRef { owner, index });
        if let Some(found) = found {
            marks.insert(id, found);
        }
    }
    tracing::debug!(marked = marks.len(), "identifier fields detected");
    IdentifierMarks { marks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;
    use crate::types::FieldKind;

    fn schema(body: &str) -> String {
        format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:ome="urn:t" targetNamespace="urn:t">{body}</xs:schema>"#
        )
    }

    #[test]
    fn test_detect_identifier_by_builtin() {
        let model = parse_schema(&schema(
            r#"<xs:complexType name="Pixels">
                 <xs:attribute name="Name" type="xs:string"/>
                 <xs:attribute name="Key" type="xs:ID" use="required"/>
                 <xs:attribute name="Other" type="xs:ID"/>
               </xs:complexType>"#,
        ))
        .expect("Failed to parse");
        let marks = detect_identifiers(&model, &IdentifierPolicy::default());
        let pixels = model.find_type("Pixels").unwrap();
        assert_eq!(
            marks.identifier_of(pixels),
            Some(FieldRef {
                owner: pixels,
                index: 1
            })
        );
        assert!(marks.is_identifier(pixels, 1));
        assert!(!marks.is_identifier(pixels, 2));
    }

    #[test]
    fn test_inherited_identifier_wins() {
        let model = parse_schema(&schema(
            r#"<xs:complexType name="Base"><xs:attribute name="ID" type="xs:ID"/></xs:complexType>
               <xs:complexType name="Leaf">
                 <xs:complexContent><xs:extension base="ome:Base">
                   <xs:attribute name="Ref" type="xs:IDREF"/>
                 </xs:extension></xs:complexContent>
               </xs:complexType>"#,
        ))
        .expect("Failed to parse");
        let marks = detect_identifiers(&model, &IdentifierPolicy::default());
        let base = model.find_type("Base").unwrap();
        let leaf = model.find_type("Leaf").unwrap();
        assert_eq!(marks.identifier_of(leaf).unwrap().owner, base);
        assert!(!marks.is_identifier(leaf, 0));
    }

    #[test]
    fn test_name_hint_needs_id_like_type() {
        let model = parse_schema(&schema(
            r#"<xs:simpleType name="LSID"><xs:restriction base="xs:string"/></xs:simpleType>
               <xs:complexType name="A"><xs:attribute name="id" type="ome:LSID"/></xs:complexType>
               <xs:complexType name="B"><xs:attribute name="ID" type="xs:string"/></xs:complexType>"#,
        ))
        .expect("Failed to parse");
        let marks = detect_identifiers(&model, &IdentifierPolicy::default());
        assert!(marks.identifier_of(model.find_type("A").unwrap()).is_some());
        assert!(marks.identifier_of(model.find_type("B").unwrap()).is_none());
        assert_eq!(marks.len(), 1);
    }

    #[test]
    fn test_multivalued_references_are_skipped() {
        let model = parse_schema(&schema(
            r#"<xs:complexType name="Refs"><xs:attribute name="Targets" type="xs:IDREFS"/></xs:complexType>"#,
        ))
        .expect("Failed to parse");
        let refs = model.find_type("Refs").unwrap();
        assert!(model[refs].field(FieldKind::Attribute, "Targets").unwrap().is_multivalued());
        let marks = detect_identifiers(&model, &IdentifierPolicy::default());
        assert!(marks.is_empty());
    }
}
