//! NCName coercion and collision-safe name assignment.

use crate::closure::Closure;
use crate::error::NamingCollisionWarning;
use heck::ToSnakeCase;
use std::collections::{HashMap, HashSet};
use xsdlink_schema::{EnumId, FieldKind, SchemaModel, TypeId};

/// Coerces a name into an NCName-safe identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`; a leading digit (or an
/// empty name) gets a `_` prefix.
#[must_use]
pub fn coerce_ncname(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Slot name for a field: snake case, then coerced.
#[must_use]
pub fn slot_name(name: &str) -> String {
    let snake = name.to_snake_case();
    if snake.is_empty() {
        coerce_ncname(name)
    } else {
        coerce_ncname(&snake)
    }
}

/// Assigns unique output names within one scope.
///
/// Names that are already safe keep themselves; names that had to be
/// coerced take the first free `_2`, `_3`, ... suffix when they collide.
#[derive(Debug)]
pub struct NameRegistry {
    scope: String,
    taken: HashSet<String>,
    warnings: Vec<NamingCollisionWarning>,
}

impl NameRegistry {
    /// Creates an empty registry for `scope`.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            taken: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Marks a name as used without assigning it.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// Assigns names to `originals`, returning them in the same order.
    ///
    /// `natural` maps an original to its preferred output name. Originals
    /// whose natural name needs no coercion are placed first so a coerced
    /// name can never displace them.
    pub fn assign_all<F>(&mut self, originals: &[String], natural: F) -> Vec<String>
    where
        F: Fn(&str) -> String,
    {
        let preferred: Vec<String> = originals.iter().map(|o| natural(o)).collect();
        let mut assigned: Vec<Option<String>> = vec![None; originals.len()];

        for pass in [true, false] {
            for (index, original) in originals.iter().enumerate() {
                let clean = is_unchanged(original, &preferred[index]);
                if clean == pass {
                    assigned[index] = Some(self.claim(original, &preferred[index]));
                }
            }
        }

        assigned.into_iter().flatten().collect()
    }

    /// Claims `candidate`, or the first free suffixed variant.
    fn claim(&mut self, original: &str, candidate: &str) -> String {
        if self.taken.insert(candidate.to_string()) {
            return candidate.to_string();
        }

        let mut suffix = 2;
        let assigned = loop {
            let attempt = format!("{candidate}_{suffix}");
            if self.taken.insert(attempt.clone()) {
                break attempt;
            }
            suffix += 1;
        };

        let warning = NamingCollisionWarning {
            scope: self.scope.clone(),
            original: original.to_string(),
            assigned: assigned.clone(),
        };
        tracing::warn!("{warning}");
        self.warnings.push(warning);
        assigned
    }

    /// Collisions resolved so far.
    #[must_use]
    pub fn warnings(&self) -> &[NamingCollisionWarning] {
        &self.warnings
    }

    /// Consumes the registry, returning its warnings.
    #[must_use]
    pub fn into_warnings(self) -> Vec<NamingCollisionWarning> {
        self.warnings
    }
}

/// Output names of every emitted class, enum and slot.
///
/// Classes and enums share the `schema` scope. Slots are scoped per class;
/// inherited slot names are reserved, and a field redeclaring an inherited
/// one reuses the ancestor's name.
#[derive(Debug, Default)]
pub struct NameTable {
    classes: HashMap<TypeId, String>,
    enums: HashMap<EnumId, String>,
    slots: HashMap<TypeId, Vec<String>>,
    warnings: Vec<NamingCollisionWarning>,
}

impl NameTable {
    /// Names everything in `closure`.
    #[must_use]
    pub fn build(model: &SchemaModel, closure: &Closure) -> Self {
        let mut table = Self::default();

        let mut originals: Vec<String> = Vec::new();
        originals.extend(closure.types.iter().map(|id| model[*id].name.clone()));
        originals.extend(closure.enums.iter().map(|id| model[*id].name.clone()));

        let mut registry = NameRegistry::new("schema");
        let mut assigned = registry.assign_all(&originals, coerce_ncname).into_iter();
        for id in &closure.types {
            if let Some(name) = assigned.next() {
                table.classes.insert(*id, name);
            }
        }
        for id in &closure.enums {
            if let Some(name) = assigned.next() {
                table.enums.insert(*id, name);
            }
        }
        table.warnings.extend(registry.into_warnings());

        for id in &closure.types {
            table.assign_slots(model, *id);
        }
        table
    }

    fn assign_slots(&mut self, model: &SchemaModel, id: TypeId) {
        if self.slots.contains_key(&id) {
            return;
        }
        let node = &model[id];

        let mut inherited: Vec<(FieldKind, String, String)> = Vec::new();
        if let Some(base) = node.base {
            self.assign_slots(model, base);
            for (owner, index, field) in model.all_fields(base) {
                if let Some(slot) = self.slot(owner, index) {
                    inherited.push((field.kind, field.name.clone(), slot.to_string()));
                }
            }
        }

        let scope = self
            .classes
            .get(&id)
            .cloned()
            .unwrap_or_else(|| node.name.clone());
        let mut registry = NameRegistry::new(scope);
        for (_, _, slot) in &inherited {
            registry.reserve(slot.clone());
        }

        let mut names: Vec<Option<String>> = vec![None; node.fields.len()];
        let mut fresh: Vec<usize> = Vec::new();
        for (index, field) in node.fields.iter().enumerate() {
            let reused = inherited
                .iter()
                .rev()
                .find(|(kind, name, _)| field.overrides_inherited && *kind == field.kind && *name == field.name)
                .map(|(_, _, slot)| slot.clone());
            match reused {
                Some(slot) => names[index] = Some(slot),
                None => fresh.push(index),
            }
        }

        let originals: Vec<String> = fresh.iter().map(|i| node.fields[*i].name.clone()).collect();
        let assigned = registry.assign_all(&originals, slot_name);
        for (index, name) in fresh.into_iter().zip(assigned) {
            names[index] = Some(name);
        }
        self.warnings.extend(registry.into_warnings());
        self.slots
            .insert(id, names.into_iter().map(Option::unwrap_or_default).collect());
    }

    /// Output name of a class.
    #[must_use]
    pub fn class(&self, id: TypeId) -> Option<&str> {
        self.classes.get(&id).map(String::as_str)
    }

    /// Output name of an enum.
    #[must_use]
    pub fn enumeration(&self, id: EnumId) -> Option<&str> {
        self.enums.get(&id).map(String::as_str)
    }

    /// Output name of `owner.fields[index]`.
    #[must_use]
    pub fn slot(&self, owner: TypeId, index: usize) -> Option<&str> {
        self.slots
            .get(&owner)
            .and_then(|names| names.get(index))
            .map(String::as_str)
    }

    /// Collisions resolved while naming.
    #[must_use]
    pub fn warnings(&self) -> &[NamingCollisionWarning] {
        &self.warnings
    }

    /// Consumes the table, returning its warnings.
    #[must_use]
    pub fn into_warnings(self) -> Vec<NamingCollisionWarning> {
        self.warnings
    }
}

/// A name counts as safe when its preferred form only changed case or
/// word separators the way snake casing does, not through coercion.
fn is_unchanged(original: &str, preferred: &str) -> bool {
    original == preferred
        || (original.to_snake_case() == preferred && coerce_ncname(original) == original)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_ncname() {
        assert_eq!(coerce_ncname("Foo-Bar"), "Foo_Bar");
        assert_eq!(coerce_ncname("3D"), "_3D");
        assert_eq!(coerce_ncname("a.b c"), "a_b_c");
        assert_eq!(coerce_ncname("µm"), "_m");
        assert_eq!(coerce_ncname(""), "_");
        assert_eq!(coerce_ncname("Pixels"), "Pixels");
    }

    #[test]
    fn test_slot_name() {
        assert_eq!(slot_name("ID"), "id");
        assert_eq!(slot_name("SizeX"), "size_x");
        assert_eq!(slot_name("Channel"), "channel");
        assert_eq!(slot_name("lang"), "lang");
    }

    #[test]
    fn test_safe_name_keeps_itself() {
        let originals = vec!["Foo-Bar".to_string(), "Foo_Bar".to_string()];
        let mut registry = NameRegistry::new("schema");
        let names = registry.assign_all(&originals, coerce_ncname);
        assert_eq!(names, vec!["Foo_Bar_2", "Foo_Bar"]);

        let warnings = registry.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].original, "Foo-Bar");
        assert_eq!(warnings[0].assigned, "Foo_Bar_2");
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let originals: Vec<String> = ["a-b", "a_b", "a.b", "a b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let first = NameRegistry::new("schema").assign_all(&originals, coerce_ncname);
        let second = NameRegistry::new("schema").assign_all(&originals, coerce_ncname);
        assert_eq!(first, second);
        assert_eq!(first, vec!["a_b_2", "a_b", "a_b_3", "a_b_4"]);
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let mut registry = NameRegistry::new("Image");
        registry.reserve("id");
        let names = registry.assign_all(&["ID".to_string()], slot_name);
        assert_eq!(names, vec!["id_2"]);
        assert_eq!(registry.warnings().len(), 1);
    }

    #[test]
    fn test_name_table_reuses_inherited_slots() {
        let model = xsdlink_schema::parse_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:t" targetNamespace="urn:t">
                <xs:complexType name="Base">
                    <xs:attribute name="ID" type="xs:ID"/>
                    <xs:attribute name="Name" type="xs:string"/>
                </xs:complexType>
                <xs:complexType name="Derived">
                    <xs:complexContent><xs:restriction base="t:Base">
                        <xs:attribute name="Name" type="xs:string" use="required"/>
                        <xs:attribute name="id" type="xs:string"/>
                    </xs:restriction></xs:complexContent>
                </xs:complexType>
                <xs:complexType name="Foo-Bar"/>
                <xs:simpleType name="Foo_Bar">
                    <xs:restriction base="xs:string"><xs:enumeration value="A"/></xs:restriction>
                </xs:simpleType>
            </xs:schema>"#,
        )
        .expect("Failed to parse");
        let closure = Closure::full(&model);
        let table = NameTable::build(&model, &closure);

        let derived = model.find_type("Derived").unwrap();
        assert_eq!(table.slot(derived, 0), Some("name"));
        assert_eq!(table.slot(derived, 1), Some("id_2"));
        assert_eq!(table.class(model.find_type("Foo-Bar").unwrap()), Some("Foo_Bar_2"));
        assert_eq!(table.enumeration(EnumId(0)), Some("Foo_Bar"));
        assert_eq!(table.warnings().len(), 2);
    }

    #[test]
    fn test_exact_duplicates_are_suffixed() {
        let originals = vec!["Image".to_string(), "Image".to_string()];
        let names = NameRegistry::new("schema").assign_all(&originals, coerce_ncname);
        assert_eq!(names, vec!["Image", "Image_2"]);
    }
}
