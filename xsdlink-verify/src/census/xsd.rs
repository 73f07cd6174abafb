//! Census of the XSD side.
//!
//! Walks the loaded documents directly instead of the normalized model, so
//! a normalizer bug cannot hide itself. Only the XML reader and the
//! include loader are shared with the converter.

use crate::error::VerifyError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use xsdlink_schema::xml::XmlElement;
use xsdlink_schema::{DocumentSet, QName, identity_name, load_documents};

/// Field counts of one expected class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCensus {
    /// Distinct attribute names.
    pub attributes: usize,
    /// Distinct child element names.
    pub elements: usize,
    /// 1 when the class carries simple content.
    pub content: usize,
}

impl ClassCensus {
    /// Number of LinkML slots the class must own.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.attributes + self.elements + self.content
    }
}

/// Everything the XSD declares that must survive conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XsdCensus {
    /// Named top-level complex types.
    pub complex_types: usize,
    /// Top-level elements.
    pub top_level_elements: usize,
    /// Expected classes keyed by identity (`complexType:Foo`).
    pub classes: BTreeMap<String, ClassCensus>,
}

/// Counts the classes and fields declared by an XSD file and its includes.
///
/// # Errors
/// Returns `VerifyError::Schema` if the documents cannot be loaded.
pub fn xsd_census(path: &Path) -> Result<XsdCensus, VerifyError> {
    let documents = load_documents(path)?;
    Ok(census_documents(&documents))
}

/// Counts the classes and fields of already loaded documents.
#[must_use]
pub fn census_documents(documents: &DocumentSet) -> XsdCensus {
    let mut walker = Walker::default();
    let mut heads: Vec<QName> = Vec::new();
    for (doc, component) in documents.components() {
        let Some(name) = component.attr("name") else {
            continue;
        };
        let globals = match component.local.as_str() {
            "complexType" => &mut walker.complex_types,
            "element" => &mut walker.elements,
            "group" => &mut walker.groups,
            "attributeGroup" => &mut walker.attribute_groups,
            _ => continue,
        };
        let qname = QName::new(doc.target_namespace.clone(), name);
        globals.0.entry(qname).or_insert(component);
        if component.is_xsd("element") {
            if let Some(head) = component.attr("substitutionGroup") {
                if let Ok(head) = component.resolve_qname(head) {
                    heads.push(head);
                }
            }
        }
    }
    let heads: HashSet<QName> = heads
        .iter()
        .filter_map(|head| walker.elements.key(head))
        .cloned()
        .collect();

    for (doc, component) in documents.components() {
        let Some(name) = component.attr("name") else {
            continue;
        };
        let qname = QName::new(doc.target_namespace.clone(), name);
        if component.is_xsd("complexType") {
            walker.census.complex_types += 1;
            let identity = identity_name(&qname, walker.complex_types.is_ambiguous(name));
            let path = format!("complexType:{identity}");
            walker.class(path.clone(), &path, |w, path, counts| {
                w.body(component, path, counts);
            });
        } else if component.is_xsd("element") {
            walker.census.top_level_elements += 1;
            let qualifies = component.xsd_child("complexType").is_some()
                || component.attr("substitutionGroup").is_some()
                || heads.contains(&qname);
            if qualifies {
                let identity = identity_name(&qname, walker.elements.is_ambiguous(name));
                let path = format!("element:{identity}");
                walker.class(path.clone(), &path, |w, path, counts| {
                    w.element_class(component, path, counts);
                });
            }
        }
    }

    tracing::debug!(
        classes = walker.census.classes.len(),
        complex_types = walker.census.complex_types,
        elements = walker.census.top_level_elements,
        "XSD census complete"
    );
    walker.census
}

/// Distinct field names collected for one class.
#[derive(Default)]
struct Counts {
    attributes: BTreeSet<String>,
    elements: BTreeSet<String>,
    content: bool,
}

/// Top-level declarations of one kind, keyed by qualified name.
#[derive(Default)]
struct Globals<'a>(HashMap<QName, &'a XmlElement>);

impl<'a> Globals<'a> {
    /// Exact match, else the only declaration with that local name.
    fn key(&self, name: &QName) -> Option<&QName> {
        if let Some((key, _)) = self.0.get_key_value(name) {
            return Some(key);
        }
        let mut candidates = self.0.keys().filter(|q| q.local == name.local);
        let first = candidates.next()?;
        candidates.next().is_none().then_some(first)
    }

    /// Resolves a QName-valued attribute written on `context`.
    fn resolve(&self, context: &XmlElement, value: &str) -> Option<(QName, &'a XmlElement)> {
        let name = context.resolve_qname(value).ok()?;
        let key = self.key(&name)?;
        self.0.get(key).map(|found| (key.clone(), *found))
    }

    fn is_ambiguous(&self, local: &str) -> bool {
        self.0.keys().filter(|q| q.local == local).count() > 1
    }
}

#[derive(Default)]
struct Walker<'a> {
    complex_types: Globals<'a>,
    elements: Globals<'a>,
    groups: Globals<'a>,
    attribute_groups: Globals<'a>,
    active_groups: Vec<QName>,
    census: XsdCensus,
}

impl<'a> Walker<'a> {
    /// Records a class once per identity.
    fn class<F>(&mut self, identity: String, path: &str, fill: F)
    where
        F: FnOnce(&mut Self, &str, &mut Counts),
    {
        if self.census.classes.contains_key(&identity) {
            return;
        }
        // Reserve first so nested locals with the same identity stop here.
        self.census.classes.insert(identity.clone(), ClassCensus::default());
        let mut counts = Counts::default();
        fill(self, path, &mut counts);
        self.census.classes.insert(
            identity,
            ClassCensus {
                attributes: counts.attributes.len(),
                elements: counts.elements.len(),
                content: usize::from(counts.content),
            },
        );
    }

    /// Returns true if a `type` or `base` value names a simple type.
    fn is_simple(&self, context: &XmlElement, value: &str) -> bool {
        is_xsd_name(context, value) || self.complex_types.resolve(context, value).is_none()
    }

    fn element_class(&mut self, element: &'a XmlElement, path: &str, counts: &mut Counts) {
        if let Some(inline) = element.xsd_child("complexType") {
            self.body(inline, path, counts);
        } else if let Some(type_name) = element.attr("type") {
            counts.content = self.is_simple(element, type_name);
        }
    }

    fn body(&mut self, complex: &'a XmlElement, path: &str, counts: &mut Counts) {
        for child in complex.xsd_children() {
            match child.local.as_str() {
                "complexContent" | "simpleContent" => {
                    let Some(derivation) = child
                        .xsd_children()
                        .find(|c| c.local == "extension" || c.local == "restriction")
                    else {
                        continue;
                    };
                    if child.local == "simpleContent" {
                        let base = derivation.attr("base").unwrap_or_default();
                        if self.is_simple(derivation, base) {
                            counts.content = true;
                        }
                    }
                    for item in derivation.xsd_children() {
                        self.item(item, path, counts);
                    }
                }
                _ => self.item(child, path, counts),
            }
        }
    }

    fn item(&mut self, item: &'a XmlElement, path: &str, counts: &mut Counts) {
        match item.local.as_str() {
            "sequence" | "all" | "choice" if !prohibited(item) => {
                for child in item.xsd_children() {
                    self.item(child, path, counts);
                }
            }
            "group" if !prohibited(item) => {
                let Some(reference) = item.attr("ref") else {
                    return;
                };
                let group = self.groups.resolve(item, reference);
                if let Some(group) = self.enter(group) {
                    for child in group.xsd_children() {
                        self.item(child, path, counts);
                    }
                    self.active_groups.pop();
                }
            }
            "element" if !prohibited(item) => {
                if let Some(reference) = item.attr("ref") {
                    counts.elements.insert(local_part(reference).to_string());
                } else if let Some(name) = item.attr("name") {
                    counts.elements.insert(name.to_string());
                    if let Some(inline) = item.xsd_child("complexType") {
                        let nested = format!("{path}/{name}");
                        self.class(format!("local:{nested}"), &nested, |w, p, c| {
                            w.body(inline, p, c);
                        });
                    }
                }
            }
            "attribute" if item.attr("use") != Some("prohibited") => {
                let name = item.attr("ref").map(local_part).or_else(|| item.attr("name"));
                if let Some(name) = name {
                    counts.attributes.insert(name.to_string());
                }
            }
            "attributeGroup" => {
                let Some(reference) = item.attr("ref") else {
                    return;
                };
                let group = self.attribute_groups.resolve(item, reference);
                if let Some(group) = self.enter(group) {
                    for child in group.xsd_children() {
                        if child.local == "attribute" || child.local == "attributeGroup" {
                            self.item(child, path, counts);
                        }
                    }
                    self.active_groups.pop();
                }
            }
            _ => {}
        }
    }

    /// Enters a group unless it is already being expanded.
    fn enter(&mut self, group: Option<(QName, &'a XmlElement)>) -> Option<&'a XmlElement> {
        let (name, group) = group?;
        if self.active_groups.contains(&name) {
            tracing::warn!(group = %name, "cyclic group reference skipped by census");
            return None;
        }
        self.active_groups.push(name);
        Some(group)
    }
}

fn prohibited(particle: &XmlElement) -> bool {
    particle.attr("maxOccurs").map(str::trim) == Some("0")
}

fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// Returns true if a QName-valued attribute points into the XSD namespace.
fn is_xsd_name(context: &XmlElement, value: &str) -> bool {
    context.resolve_qname(value).is_ok_and(|q| q.is_xsd())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xsdlink_schema::load_documents_from_str;

    fn census(body: &str) -> XsdCensus {
        let xml = format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:t" targetNamespace="urn:t">{body}</xs:schema>"#
        );
        let documents = load_documents_from_str(&xml, None).expect("Failed to parse");
        census_documents(&documents)
    }

    #[test]
    fn test_counts_distinct_fields() {
        let census = census(
            r#"<xs:attributeGroup name="Common"><xs:attribute name="ID" type="xs:ID"/></xs:attributeGroup>
            <xs:complexType name="Pixels">
                <xs:sequence>
                    <xs:element name="Channel" type="xs:string" maxOccurs="unbounded"/>
                    <xs:choice>
                        <xs:element name="BinData" type="xs:string"/>
                        <xs:element name="Channel" type="xs:string"/>
                    </xs:choice>
                    <xs:element name="Gone" type="xs:string" maxOccurs="0"/>
                </xs:sequence>
                <xs:attributeGroup ref="t:Common"/>
                <xs:attribute name="Old" type="xs:string" use="prohibited"/>
                <xs:attribute ref="xml:lang"/>
            </xs:complexType>"#,
        );
        assert_eq!(census.complex_types, 1);
        assert_eq!(
            census.classes["complexType:Pixels"],
            ClassCensus {
                attributes: 2,
                elements: 2,
                content: 0
            }
        );
    }

    #[test]
    fn test_element_classes_and_locals() {
        let census = census(
            r#"<xs:complexType name="Base"/>
            <xs:element name="Image">
                <xs:complexType><xs:sequence>
                    <xs:element name="Pixels"><xs:complexType>
                        <xs:attribute name="SizeX" type="xs:int"/>
                    </xs:complexType></xs:element>
                </xs:sequence></xs:complexType>
            </xs:element>
            <xs:element name="Shape" type="t:Base"/>
            <xs:element name="Label" type="xs:string" substitutionGroup="t:Shape"/>
            <xs:element name="Plain" type="xs:string"/>"#,
        );
        assert_eq!(census.top_level_elements, 4);
        let identities: Vec<&str> = census.classes.keys().map(String::as_str).collect();
        assert_eq!(
            identities,
            vec![
                "complexType:Base",
                "element:Image",
                "element:Label",
                "element:Shape",
                "local:element:Image/Pixels"
            ]
        );
        assert_eq!(census.classes["local:element:Image/Pixels"].total(), 1);
        assert_eq!(census.classes["element:Shape"].total(), 0);
        assert_eq!(census.classes["element:Label"].content, 1);
    }

    #[test]
    fn test_locals_are_keyed_by_owner_kind() {
        let census = census(
            r#"<xs:complexType name="Image"><xs:sequence>
                <xs:element name="Pixels"><xs:complexType>
                    <xs:attribute name="A" type="xs:int"/>
                </xs:complexType></xs:element>
            </xs:sequence></xs:complexType>
            <xs:element name="Image"><xs:complexType><xs:sequence>
                <xs:element name="Pixels"><xs:complexType>
                    <xs:attribute name="B" type="xs:int"/>
                    <xs:attribute name="C" type="xs:int"/>
                </xs:complexType></xs:element>
            </xs:sequence></xs:complexType></xs:element>"#,
        );
        assert_eq!(census.classes.len(), 4);
        assert_eq!(census.classes["local:complexType:Image/Pixels"].total(), 1);
        assert_eq!(census.classes["local:element:Image/Pixels"].total(), 2);
    }

    #[test]
    fn test_imported_name_clash_is_qualified() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(
            dir.path().join("other.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:o">
                <xs:complexType name="Foo">
                    <xs:attribute name="X" type="xs:int"/>
                    <xs:attribute name="Y" type="xs:int"/>
                    <xs:attribute name="Z" type="xs:int"/>
                </xs:complexType>
            </xs:schema>"#,
        )
        .expect("Failed to write");
        let root = dir.path().join("root.xsd");
        std::fs::write(
            &root,
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:t">
                <xs:import namespace="urn:o" schemaLocation="other.xsd"/>
                <xs:complexType name="Foo"><xs:attribute name="A" type="xs:int"/></xs:complexType>
            </xs:schema>"#,
        )
        .expect("Failed to write");

        let census = xsd_census(&root).expect("Failed to count");
        assert_eq!(census.complex_types, 2);
        assert_eq!(census.classes["complexType:{urn:t}Foo"].total(), 1);
        assert_eq!(census.classes["complexType:{urn:o}Foo"].total(), 3);
    }

    #[test]
    fn test_simple_content() {
        let census = census(
            r#"<xs:complexType name="Text">
                <xs:simpleContent><xs:extension base="xs:string">
                    <xs:attribute name="lang" type="xs:string"/>
                </xs:extension></xs:simpleContent>
            </xs:complexType>
            <xs:complexType name="Note">
                <xs:simpleContent><xs:extension base="t:Text">
                    <xs:attribute name="author" type="xs:string"/>
                </xs:extension></xs:simpleContent>
            </xs:complexType>"#,
        );
        assert_eq!(census.classes["complexType:Text"].total(), 2);
        assert_eq!(census.classes["complexType:Note"].total(), 1);
    }
}
