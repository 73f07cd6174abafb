//! Splitting a generated schema into one document per class.
//!
//! Every class file repeats the schema metadata and holds exactly one class.
//! It imports `linkml:types`, the class files it references through `is_a`
//! or slot ranges, and the index when it uses an enum or subset. The index
//! holds the metadata, subsets and enums, and imports every class file.

use crate::linkml::{ClassDefinition, LinkmlSchema, SlotDefinition};
use indexmap::IndexMap;

/// Import of the LinkML builtin types.
pub const LINKML_TYPES: &str = "linkml:types";

/// One document of a partitioned schema.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionFile {
    /// File name inside the output directory.
    pub file_name: String,
    /// Document content.
    pub schema: LinkmlSchema,
}

/// Name of the index document, without extension.
#[must_use]
pub fn index_stem(schema: &LinkmlSchema) -> String {
    format!("{}.index", schema.name)
}

/// Splits a schema into class files followed by the index file.
#[must_use]
pub fn partition(schema: &LinkmlSchema) -> Vec<PartitionFile> {
    let index = index_stem(schema);
    let mut files = Vec::with_capacity(schema.classes.len() + 1);

    for (class_name, class) in &schema.classes {
        let mut imports = vec![LINKML_TYPES.to_string()];
        for peer in referenced_classes(class, schema) {
            if peer != class_name.as_str() && !imports.iter().any(|i| i == peer) {
                imports.push(peer.to_string());
            }
        }
        if uses_index(class, schema) {
            imports.push(index.clone());
        }

        let mut classes = IndexMap::new();
        classes.insert(class_name.clone(), class.clone());
        files.push(PartitionFile {
            file_name: format!("{class_name}.yaml"),
            schema: LinkmlSchema {
                id: format!("{}/{}", schema.id.trim_end_matches('/'), class_name),
                name: format!("{}_{}", schema.name, class_name),
                imports,
                subsets: IndexMap::new(),
                classes,
                enums: IndexMap::new(),
                ..metadata_only(schema)
            },
        });
    }

    let mut imports = vec![LINKML_TYPES.to_string()];
    imports.extend(schema.classes.keys().cloned());
    files.push(PartitionFile {
        file_name: format!("{index}.yaml"),
        schema: LinkmlSchema {
            imports,
            subsets: schema.subsets.clone(),
            enums: schema.enums.clone(),
            ..metadata_only(schema)
        },
    });

    tracing::debug!(files = files.len(), "partitioned schema");
    files
}

fn metadata_only(schema: &LinkmlSchema) -> LinkmlSchema {
    LinkmlSchema {
        id: schema.id.clone(),
        name: schema.name.clone(),
        title: schema.title.clone(),
        description: schema.description.clone(),
        license: schema.license.clone(),
        version: schema.version.clone(),
        prefixes: schema.prefixes.clone(),
        default_prefix: schema.default_prefix.clone(),
        default_range: schema.default_range.clone(),
        ..LinkmlSchema::default()
    }
}

fn slots(class: &ClassDefinition) -> impl Iterator<Item = &SlotDefinition> {
    class.attributes.values().chain(class.slot_usage.values())
}

/// Classes named by `is_a` or a slot range, in first-seen order.
fn referenced_classes<'s>(class: &'s ClassDefinition, schema: &LinkmlSchema) -> Vec<&'s str> {
    class
        .is_a
        .as_deref()
        .into_iter()
        .chain(slots(class).map(|slot| slot.range.as_str()))
        .filter(|name| schema.classes.contains_key(*name))
        .collect()
}

fn uses_index(class: &ClassDefinition, schema: &LinkmlSchema) -> bool {
    let subsets = !class.in_subset.is_empty() || slots(class).any(|s| !s.in_subset.is_empty());
    subsets || slots(class).any(|slot| schema.enums.contains_key(&slot.range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkml::{EnumDefinition, SubsetDefinition};
    use pretty_assertions::assert_eq;

    fn slot(range: &str) -> SlotDefinition {
        SlotDefinition {
            range: range.into(),
            ..SlotDefinition::default()
        }
    }

    fn sample() -> LinkmlSchema {
        let mut schema = LinkmlSchema {
            id: "urn:t/linkml".into(),
            name: "t".into(),
            title: "T Schema".into(),
            default_prefix: "t".into(),
            ..LinkmlSchema::default()
        };
        schema.classes.insert("BaseType".into(), ClassDefinition::default());
        let mut channel = ClassDefinition::default();
        channel.attributes.insert("color".into(), slot("Color"));
        schema.classes.insert("Channel".into(), channel);
        let mut pixels = ClassDefinition {
            is_a: Some("BaseType".into()),
            in_subset: vec!["NBO_Tier1".into()],
            ..ClassDefinition::default()
        };
        pixels.attributes.insert("channel".into(), slot("Channel"));
        pixels.attributes.insert("size_x".into(), slot("integer"));
        schema.classes.insert("Pixels".into(), pixels);
        schema.enums.insert("Color".into(), EnumDefinition::default());
        schema.subsets.insert(
            "NBO_Tier1".into(),
            SubsetDefinition {
                description: "tier 1".into(),
            },
        );
        schema
    }

    #[test]
    fn test_one_file_per_class_plus_index() {
        let files = partition(&sample());
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["BaseType.yaml", "Channel.yaml", "Pixels.yaml", "t.index.yaml"]
        );
        for file in &files[..3] {
            assert_eq!(file.schema.classes.len(), 1);
            assert!(file.schema.enums.is_empty());
            assert_eq!(file.schema.title, "T Schema");
        }
    }

    #[test]
    fn test_imports() {
        let files = partition(&sample());
        assert_eq!(files[0].schema.imports, vec![LINKML_TYPES]);
        assert_eq!(files[1].schema.imports, vec![LINKML_TYPES, "t.index"]);
        assert_eq!(
            files[2].schema.imports,
            vec![LINKML_TYPES, "BaseType", "Channel", "t.index"]
        );
        assert_eq!(files[2].schema.id, "urn:t/linkml/Pixels");

        let index = &files[3].schema;
        assert_eq!(
            index.imports,
            vec![LINKML_TYPES, "BaseType", "Channel", "Pixels"]
        );
        assert!(index.classes.is_empty());
        assert!(index.enums.contains_key("Color"));
        assert!(index.subsets.contains_key("NBO_Tier1"));
    }
}
