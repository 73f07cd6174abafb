//! Class and slot generation.

use crate::documentation::{merge_appinfo, split_documentation};
use crate::error::{CodegenError, UnresolvedRangeError};
use crate::linkml::document::{AnnotationValue, ClassDefinition, SlotDefinition};
use crate::naming::{NameTable, coerce_ncname};
use crate::ranges::RangeTable;
use indexmap::IndexMap;
use xsdlink_schema::{
    Degradation, FieldKind, FieldNode, IdentifierMarks, SchemaModel, TypeId, TypeRef,
};

/// Annotation holding the XSD-side identity of a class.
pub const XSD_SOURCE: &str = "xsd_source";

/// Generator for class definitions.
pub struct ClassGenerator<'a> {
    model: &'a SchemaModel,
    names: &'a NameTable,
    ranges: &'a RangeTable,
    marks: &'a IdentifierMarks,
    prefix: &'a str,
}

impl<'a> ClassGenerator<'a> {
    /// Creates a new class generator.
    ///
    /// # Arguments
    /// * `model` - Normalized model
    /// * `names` - Output names of classes, enums and slots
    /// * `ranges` - Builtin range table
    /// * `marks` - Identifier choice per type
    /// * `prefix` - Prefix for `class_uri` and `slot_uri`
    #[must_use]
    pub fn new(
        model: &'a SchemaModel,
        names: &'a NameTable,
        ranges: &'a RangeTable,
        marks: &'a IdentifierMarks,
        prefix: &'a str,
    ) -> Self {
        Self {
            model,
            names,
            ranges,
            marks,
            prefix,
        }
    }

    /// Generates the definition of one class.
    ///
    /// # Errors
    /// Returns `CodegenError::UnresolvedRange` if a field type maps to no
    /// builtin, class or enum.
    pub fn generate(&self, id: TypeId) -> Result<ClassDefinition, CodegenError> {
        let node = &self.model[id];
        let class_name = self
            .names
            .class(id)
            .map_or_else(|| coerce_ncname(&node.name), str::to_string);

        let meta = split_documentation(node.documentation.as_deref());
        let mut annotations = IndexMap::new();
        annotations.insert(
            XSD_SOURCE.to_string(),
            AnnotationValue::Single(node.source.to_string()),
        );
        annotations.extend(meta.annotations);
        merge_appinfo(&mut annotations, &node.appinfo);
        for degradation in &node.degradations {
            let detail = degradation_detail(degradation);
            match annotations.get_mut(degradation.tag()) {
                Some(existing) => existing.push(detail),
                None => {
                    annotations.insert(degradation.tag().to_string(), AnnotationValue::Single(detail));
                }
            }
        }

        let is_a = match node.base {
            Some(base) => Some(
                self.names
                    .class(base)
                    .map(str::to_string)
                    .ok_or_else(|| UnresolvedRangeError {
                        class_name: node.name.clone(),
                        field_name: "is_a".to_string(),
                        type_name: self.model[base].name.clone(),
                    })?,
            ),
            None => None,
        };

        let mut class = ClassDefinition {
            description: meta.description,
            is_a,
            is_abstract: node.is_abstract,
            class_uri: Some(format!("{}:{}", self.prefix, class_name)),
            in_subset: meta.subsets,
            annotations,
            ..ClassDefinition::default()
        };

        for (index, field) in node.fields.iter().enumerate() {
            let slot_name = self
                .names
                .slot(id, index)
                .map_or_else(|| crate::naming::slot_name(&field.name), str::to_string);
            let slot = self.generate_slot(id, index, field)?;
            if field.overrides_inherited {
                class.slot_usage.insert(slot_name, slot);
            } else {
                class.attributes.insert(slot_name, slot);
            }
        }

        Ok(class)
    }

    /// Generates one slot definition.
    fn generate_slot(
        &self,
        owner: TypeId,
        index: usize,
        field: &FieldNode,
    ) -> Result<SlotDefinition, CodegenError> {
        let range = self.range(owner, field)?;
        let identifier = self.marks.is_identifier(owner, index);
        let class_range = matches!(field.type_ref, TypeRef::Complex(_));
        let inline = field.kind == FieldKind::Element && class_range;

        let meta = split_documentation(field.documentation.as_deref());
        let mut annotations = meta.annotations;
        merge_appinfo(&mut annotations, &field.appinfo);

        Ok(SlotDefinition {
            description: meta.description,
            required: field.is_required(),
            multivalued: field.is_multivalued(),
            identifier,
            inlined: inline.then_some(true),
            inlined_as_list: (inline && field.is_multivalued()).then_some(true),
            pattern: field.pattern.clone(),
            ifabsent: field
                .default_value
                .as_deref()
                .map(|value| ifabsent(&range, value)),
            slot_uri: Some(format!("{}:{}", self.prefix, coerce_ncname(&field.name))),
            in_subset: meta.subsets,
            annotations,
            range,
        })
    }

    /// Resolves the LinkML range of a field.
    fn range(&self, owner: TypeId, field: &FieldNode) -> Result<String, UnresolvedRangeError> {
        let resolved = match &field.type_ref {
            TypeRef::Primitive(builtin) => Some(self.ranges.resolve(builtin)),
            TypeRef::Complex(id) => self.names.class(*id).map(str::to_string),
            TypeRef::Enum(id) => self.names.enumeration(*id).map(str::to_string),
            TypeRef::Unresolved(_) => None,
        };
        resolved.ok_or_else(|| UnresolvedRangeError {
            class_name: self.model[owner].name.clone(),
            field_name: field.name.clone(),
            type_name: match &field.type_ref {
                TypeRef::Primitive(builtin) => builtin.clone(),
                TypeRef::Complex(id) => self.model[*id].name.clone(),
                TypeRef::Enum(id) => self.model[*id].name.clone(),
                TypeRef::Unresolved(qname) => qname.to_string(),
            },
        })
    }
}

/// `ifabsent` expression for a default value of the given range.
fn ifabsent(range: &str, value: &str) -> String {
    match range {
        "integer" if value.parse::<i64>().is_ok() => format!("int({value})"),
        "float" if value.parse::<f64>().is_ok() => format!("float({value})"),
        "boolean" => match value {
            "true" | "1" => "true".to_string(),
            "false" | "0" => "false".to_string(),
            other => format!("string({other})"),
        },
        _ => format!("string({value})"),
    }
}

fn degradation_detail(degradation: &Degradation) -> String {
    match degradation {
        Degradation::Choice { fields } => fields.join(", "),
        Degradation::Mixed => "character data not modeled".to_string(),
        Degradation::AnyElement => "element wildcard dropped".to_string(),
        Degradation::AnyAttribute => "attribute wildcard dropped".to_string(),
        Degradation::Union { field } => field.clone(),
        Degradation::SubstitutionHead => "abstract substitution group head".to_string(),
        Degradation::SubstitutionMember {
            head,
            declared_type: Some(declared),
        } => format!("{head} (declared type {declared})"),
        Degradation::SubstitutionMember { head, .. } => head.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::Closure;
    use pretty_assertions::assert_eq;
    use xsdlink_schema::{IdentifierPolicy, detect_identifiers, parse_schema};

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:t" targetNamespace="urn:t">
        <xs:complexType name="BaseType">
            <xs:attribute name="Name" type="xs:string"/>
        </xs:complexType>
        <xs:complexType name="Channel">
            <xs:attribute name="SamplesPerPixel" type="xs:positiveInteger" default="1"/>
        </xs:complexType>
        <xs:complexType name="Detector">
            <xs:attribute name="ID" type="xs:ID"/>
        </xs:complexType>
        <xs:complexType name="Pixels">
            <xs:annotation><xs:documentation>Pixel data.
                tier=1</xs:documentation></xs:annotation>
            <xs:complexContent><xs:extension base="t:BaseType">
                <xs:sequence>
                    <xs:element name="Channel" type="t:Channel" minOccurs="0" maxOccurs="unbounded"/>
                    <xs:choice>
                        <xs:element name="BinData" type="xs:base64Binary"/>
                        <xs:element name="TiffData" type="xs:string"/>
                    </xs:choice>
                </xs:sequence>
                <xs:attribute name="ID" type="xs:ID" use="required"/>
                <xs:attribute name="Name" type="xs:string" use="required"/>
            </xs:extension></xs:complexContent>
        </xs:complexType>
    </xs:schema>"#;

    fn generate(name: &str) -> ClassDefinition {
        let model = parse_schema(SCHEMA).expect("Failed to parse");
        let closure = Closure::full(&model);
        let names = NameTable::build(&model, &closure);
        let ranges = RangeTable::default();
        let marks = detect_identifiers(&model, &IdentifierPolicy::default());
        let generator = ClassGenerator::new(&model, &names, &ranges, &marks, "t");
        generator
            .generate(model.find_type(name).unwrap())
            .expect("Failed to generate")
    }

    #[test]
    fn test_class_inheritance_and_slots() {
        let pixels = generate("Pixels");
        assert_eq!(pixels.is_a.as_deref(), Some("BaseType"));
        assert_eq!(pixels.class_uri.as_deref(), Some("t:Pixels"));
        assert_eq!(pixels.description.as_deref(), Some("Pixel data."));
        assert_eq!(pixels.in_subset, vec!["NBO_Tier1"]);

        let id = &pixels.attributes["id"];
        assert!(id.identifier);
        assert!(id.required);
        assert!(!id.multivalued);

        let channel = &pixels.attributes["channel"];
        assert_eq!(channel.range, "Channel");
        assert!(channel.multivalued);
        assert!(!channel.required);
        assert_eq!(channel.inlined, Some(true));
        assert_eq!(channel.inlined_as_list, Some(true));
    }

    #[test]
    fn test_optional_identifier_stays_optional() {
        let detector = generate("Detector");
        let id = &detector.attributes["id"];
        assert!(id.identifier);
        assert!(!id.required);
    }

    #[test]
    fn test_override_goes_to_slot_usage() {
        let pixels = generate("Pixels");
        assert!(pixels.slot_usage["name"].required);
        assert!(!pixels.attributes.contains_key("name"));
    }

    #[test]
    fn test_annotations() {
        let pixels = generate("Pixels");
        let keys: Vec<&str> = pixels.annotations.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["xsd_source", "xsd_choice"]);
        assert_eq!(
            pixels.annotations["xsd_source"],
            AnnotationValue::Single("complexType:Pixels".into())
        );
        assert!(!pixels.attributes["bin_data"].required);
    }

    #[test]
    fn test_default_value() {
        let channel = generate("Channel");
        let slot = &channel.attributes["samples_per_pixel"];
        assert_eq!(slot.range, "integer");
        assert_eq!(slot.ifabsent.as_deref(), Some("int(1)"));
        assert_eq!(slot.slot_uri.as_deref(), Some("t:SamplesPerPixel"));
    }

    #[test]
    fn test_ifabsent_by_range() {
        assert_eq!(ifabsent("float", "0.5"), "float(0.5)");
        assert_eq!(ifabsent("boolean", "1"), "true");
        assert_eq!(ifabsent("integer", "x"), "string(x)");
        assert_eq!(ifabsent("string", "Red"), "string(Red)");
    }
}
