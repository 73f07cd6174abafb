//! Serializable LinkML document model.
//!
//! Field order of each struct is the key order of the emitted YAML.

use indexmap::IndexMap;
use serde::Serialize;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Annotation value: one string, or a list when repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// Single value.
    Single(String),
    /// Several distinct values.
    Many(Vec<String>),
}

impl AnnotationValue {
    /// Builds a value from a deduplicated list; `None` when empty.
    #[must_use]
    pub fn from_values(mut values: Vec<String>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::Single),
            _ => Some(Self::Many(values)),
        }
    }

    /// Adds a value unless already present.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Single(existing) if *existing == value => {}
            Self::Single(existing) => {
                *self = Self::Many(vec![std::mem::take(existing), value]);
            }
            Self::Many(values) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
    }
}

/// Top-level LinkML schema document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkmlSchema {
    /// Schema URL.
    pub id: String,
    /// Schema name.
    pub name: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// License URL.
    pub license: String,
    /// Version.
    pub version: String,
    /// Prefix map.
    pub prefixes: IndexMap<String, String>,
    /// Default prefix.
    pub default_prefix: String,
    /// Range used by slots without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_range: Option<String>,
    /// Imported schemas.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    /// Subset declarations.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub subsets: IndexMap<String, SubsetDefinition>,
    /// Classes keyed by name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub classes: IndexMap<String, ClassDefinition>,
    /// Enums keyed by name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub enums: IndexMap<String, EnumDefinition>,
}

/// Subset declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubsetDefinition {
    /// Description.
    pub description: String,
}

/// Class definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassDefinition {
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_a: Option<String>,
    /// Abstract flag.
    #[serde(rename = "abstract", skip_serializing_if = "is_false")]
    pub is_abstract: bool,
    /// Class CURIE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_uri: Option<String>,
    /// Subsets the class belongs to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub in_subset: Vec<String>,
    /// Annotations; always holds `xsd_source`.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: IndexMap<String, AnnotationValue>,
    /// Own slots, inlined.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, SlotDefinition>,
    /// Refinements of inherited slots.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub slot_usage: IndexMap<String, SlotDefinition>,
}

/// Slot definition, used for attributes and slot usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotDefinition {
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Range class, enum or type.
    pub range: String,
    /// `minOccurs >= 1`.
    pub required: bool,
    /// `maxOccurs > 1` or unbounded.
    pub multivalued: bool,
    /// Identifier slot of the class.
    #[serde(skip_serializing_if = "is_false")]
    pub identifier: bool,
    /// Nested objects are written inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inlined: Option<bool>,
    /// Nested objects are written as a list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inlined_as_list: Option<bool>,
    /// Regular expression constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Default value expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifabsent: Option<String>,
    /// Slot CURIE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_uri: Option<String>,
    /// Subsets the slot belongs to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub in_subset: Vec<String>,
    /// Annotations.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: IndexMap<String, AnnotationValue>,
}

/// Enum definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnumDefinition {
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Permissible values keyed by their literal.
    pub permissible_values: IndexMap<String, PermissibleValue>,
    /// Annotations.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: IndexMap<String, AnnotationValue>,
}

/// Permissible value of an enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissibleValue {
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_annotation_value_push() {
        let mut value = AnnotationValue::Single("a".into());
        value.push("a".into());
        assert_eq!(value, AnnotationValue::Single("a".into()));
        value.push("b".into());
        value.push("b".into());
        assert_eq!(value, AnnotationValue::Many(vec!["a".into(), "b".into()]));
        assert_eq!(AnnotationValue::from_values(Vec::new()), None);
    }

    #[test]
    fn test_slot_serialization_keeps_flags() {
        let slot = SlotDefinition {
            range: "string".into(),
            ..SlotDefinition::default()
        };
        let yaml = serde_yaml::to_string(&slot).unwrap();
        assert_eq!(yaml, "range: string\nrequired: false\nmultivalued: false\n");
    }

    #[test]
    fn test_class_serialization_order() {
        let mut class = ClassDefinition {
            is_a: Some("BaseType".into()),
            is_abstract: true,
            ..ClassDefinition::default()
        };
        class.annotations.insert(
            "xsd_source".into(),
            AnnotationValue::Single("complexType:Pixels".into()),
        );
        let yaml = serde_yaml::to_string(&class).unwrap();
        assert_eq!(
            yaml,
            "is_a: BaseType\nabstract: true\nannotations:\n  xsd_source: complexType:Pixels\n"
        );
    }
}
