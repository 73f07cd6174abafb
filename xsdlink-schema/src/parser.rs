//! XSD normalizer.
//!
//! Walks a loaded [`DocumentSet`] and builds a [`SchemaModel`]. Constructs
//! without a direct counterpart (`choice`, `mixed`, `any`, `union`,
//! substitution groups) are approximated and recorded as [`Degradation`]s.

use crate::error::{SchemaError, SchemaIntegrityError, SchemaParseError};
use crate::ir::{ModelBuilder, SchemaModel};
use crate::loader::{DocumentSet, load_documents, load_documents_from_str};
use crate::types::{
    Derivation, Degradation, ElementBinding, EnumId, EnumNode, EnumValue, FieldKind, FieldNode,
    MaxOccurs, Occurs, QName, TypeId, TypeNode, TypeRef, TypeSource, XML_NAMESPACE, identity_name,
};
use crate::xml::XmlElement;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Parses an XSD file and the documents it references.
///
/// # Arguments
/// * `path` - Path to the root XSD file
///
/// # Returns
/// The normalized intermediate model.
///
/// # Errors
/// Returns `SchemaError` if loading, normalization or integrity checks fail.
pub fn parse_schema_file(path: impl AsRef<Path>) -> Result<SchemaModel, SchemaError> {
    let documents = load_documents(path.as_ref())?;
    normalize(&documents)
}

/// Parses an XSD document from a string.
///
/// Includes and imports cannot be resolved without a base directory; use
/// [`parse_schema_with_base`] for documents that have them.
///
/// # Errors
/// Returns `SchemaError` if parsing or validation fails.
pub fn parse_schema(xml: &str) -> Result<SchemaModel, SchemaError> {
    parse_schema_with_base(xml, None)
}

/// Parses an XSD document from a string, resolving locations against
/// `base_dir`.
///
/// # Errors
/// Returns `SchemaError` if parsing or validation fails.
pub fn parse_schema_with_base(
    xml: &str,
    base_dir: Option<&Path>,
) -> Result<SchemaModel, SchemaError> {
    let documents = load_documents_from_str(xml, base_dir)?;
    normalize(&documents)
}

/// Builds the intermediate model from loaded documents.
///
/// # Errors
/// Returns `SchemaError` on unresolved references, invalid occurrence
/// attributes, or an integrity violation.
pub fn normalize(documents: &DocumentSet) -> Result<SchemaModel, SchemaError> {
    let mut normalizer = Normalizer::new(documents);
    normalizer.collect_globals()?;
    normalizer.reserve_types()?;
    normalizer.resolve_simple_types()?;
    normalizer.bind_elements()?;
    normalizer.build_types()?;

    let model = normalizer.builder.finish()?;
    tracing::info!(
        types = model.types().len(),
        enums = model.enums().len(),
        "normalized schema"
    );
    Ok(model)
}

/// Top-level component and the target namespace of its document.
#[derive(Clone, Copy)]
struct Global<'a> {
    element: &'a XmlElement,
    namespace: Option<&'a str>,
}

/// Resolved simple type.
#[derive(Debug, Clone)]
struct SimpleTarget {
    type_ref: TypeRef,
    list: bool,
    union: bool,
    pattern: Option<String>,
}

impl SimpleTarget {
    fn primitive(name: &str) -> Self {
        Self {
            type_ref: TypeRef::Primitive(name.to_string()),
            list: false,
            union: false,
            pattern: None,
        }
    }

    fn unresolved(name: QName) -> Self {
        Self {
            type_ref: TypeRef::Unresolved(name),
            list: false,
            union: false,
            pattern: None,
        }
    }
}

/// Declaration scope of the type body being built.
#[derive(Clone)]
struct Scope<'a> {
    owner: TypeId,
    /// Identity path of the owner (`element:Image`, `element:Image/Pixels`).
    path: String,
    namespace: Option<&'a str>,
}

/// Fields and degradations collected for one type body.
#[derive(Default)]
struct Body {
    fields: Vec<FieldNode>,
    degradations: Vec<Degradation>,
}

impl Body {
    /// Adds a field, merging a duplicate `(kind, name)` into the first one.
    fn push(&mut self, field: FieldNode) {
        match self
            .fields
            .iter_mut()
            .find(|f| f.kind == field.kind && f.name == field.name)
        {
            Some(existing) => {
                existing.occurs = existing.occurs.union(field.occurs);
                existing.from_choice |= field.from_choice;
                if existing.documentation.is_none() {
                    existing.documentation = field.documentation;
                }
            }
            None => self.fields.push(field),
        }
    }
}

struct Normalizer<'a> {
    documents: &'a DocumentSet,
    builder: ModelBuilder,
    complex_types: IndexMap<QName, Global<'a>>,
    simple_types: IndexMap<QName, Global<'a>>,
    elements: IndexMap<QName, Global<'a>>,
    groups: IndexMap<QName, Global<'a>>,
    attribute_groups: IndexMap<QName, Global<'a>>,
    attributes: IndexMap<QName, Global<'a>>,
    substitution_heads: HashSet<QName>,
    complex_ids: HashMap<QName, TypeId>,
    element_ids: HashMap<QName, TypeId>,
    local_ids: HashMap<String, TypeId>,
    element_targets: HashMap<QName, SimpleTarget>,
    simple_cache: HashMap<QName, SimpleTarget>,
    simple_stack: Vec<QName>,
    group_stack: Vec<QName>,
}

impl<'a> Normalizer<'a> {
    fn new(documents: &'a DocumentSet) -> Self {
        let mut builder = ModelBuilder::new(documents.target_namespace().map(str::to_string));
        builder.set_documentation(documents.root().and_then(|d| documentation(&d.root)));
        Self {
            documents,
            builder,
            complex_types: IndexMap::new(),
            simple_types: IndexMap::new(),
            elements: IndexMap::new(),
            groups: IndexMap::new(),
            attribute_groups: IndexMap::new(),
            attributes: IndexMap::new(),
            substitution_heads: HashSet::new(),
            complex_ids: HashMap::new(),
            element_ids: HashMap::new(),
            local_ids: HashMap::new(),
            element_targets: HashMap::new(),
            simple_cache: HashMap::new(),
            simple_stack: Vec::new(),
            group_stack: Vec::new(),
        }
    }

    /// Pass 1: indexes every named top-level component.
    fn collect_globals(&mut self) -> Result<(), SchemaError> {
        let documents = self.documents;
        for (doc, component) in documents.components() {
            let namespace = doc.target_namespace.as_deref();
            if component.is_xsd("redefine") {
                for redefined in component.xsd_children().filter_map(|c| c.attr("name")) {
                    tracing::warn!(
                        name = redefined,
                        "redefine approximated by the original definition"
                    );
                }
                continue;
            }

            let map = match component.local.as_str() {
                "complexType" => &mut self.complex_types,
                "simpleType" => &mut self.simple_types,
                "element" => &mut self.elements,
                "group" => &mut self.groups,
                "attributeGroup" => &mut self.attribute_groups,
                "attribute" => &mut self.attributes,
                _ => continue,
            };
            let name = component
                .attr("name")
                .ok_or_else(|| SchemaParseError::missing_attr(&component.name, "name"))?;
            let qname = QName::new(namespace.map(str::to_string), name);
            map.entry(qname).or_insert(Global {
                element: component,
                namespace,
            });

            if component.is_xsd("element") {
                if let Some(head) = component.attr("substitutionGroup") {
                    let head = component.resolve_qname(head)?;
                    self.substitution_heads.insert(head);
                }
            }
        }

        // Heads written with a prefix may differ from the declared namespace
        // when chameleon includes are involved; normalize to declared names.
        let heads: Vec<QName> = self.substitution_heads.drain().collect();
        for head in heads {
            let (qname, _) = lookup(&self.elements, &head)
                .ok_or_else(|| SchemaParseError::unresolved("element", head.to_string()))?;
            self.substitution_heads.insert(qname.clone());
        }
        Ok(())
    }

    /// Reserves a type node for every named complex type and qualifying
    /// top-level element, in document order.
    fn reserve_types(&mut self) -> Result<(), SchemaError> {
        let documents = self.documents;
        let ambiguous_types = ambiguous_locals(self.complex_types.keys());
        let ambiguous_elements = ambiguous_locals(self.elements.keys());
        for (doc, component) in documents.components() {
            let namespace = doc.target_namespace.clone();
            let Some(name) = component.attr("name") else {
                continue;
            };
            let qname = QName::new(namespace, name);

            if component.is_xsd("complexType") {
                if self.complex_ids.contains_key(&qname) {
                    continue;
                }
                let identity = identity_name(&qname, ambiguous_types.contains(name));
                let id = self
                    .builder
                    .add_type(TypeNode::new(qname.clone(), TypeSource::ComplexType(identity)));
                self.complex_ids.insert(qname, id);
            } else if component.is_xsd("element") && self.qualifies(component, &qname) {
                if self.element_ids.contains_key(&qname) {
                    continue;
                }
                let identity = identity_name(&qname, ambiguous_elements.contains(name));
                let id = self
                    .builder
                    .add_type(TypeNode::new(qname.clone(), TypeSource::Element(identity)));
                self.element_ids.insert(qname, id);
            }
        }
        Ok(())
    }

    fn qualifies(&self, element: &XmlElement, qname: &QName) -> bool {
        element.xsd_child("complexType").is_some()
            || element.attr("substitutionGroup").is_some()
            || self.substitution_heads.contains(qname)
    }

    /// Resolves every named simple type so unreferenced enumerations are
    /// still part of the model.
    fn resolve_simple_types(&mut self) -> Result<(), SchemaError> {
        let names: Vec<QName> = self.simple_types.keys().cloned().collect();
        for name in names {
            self.resolve_simple(&name)?;
        }
        Ok(())
    }

    /// Records every top-level element and what its content resolves to.
    fn bind_elements(&mut self) -> Result<(), SchemaError> {
        let elements: Vec<(QName, Global<'a>)> =
            self.elements.iter().map(|(q, g)| (q.clone(), *g)).collect();
        for (qname, global) in elements {
            let class = self.element_ids.get(&qname).copied();
            let target = match class {
                Some(id) => SimpleTarget {
                    type_ref: TypeRef::Complex(id),
                    ..SimpleTarget::primitive("anyType")
                },
                None => self.element_content(global.element, &qname.local)?,
            };
            self.builder.bind_element(ElementBinding {
                qname: qname.clone(),
                target: target.type_ref.clone(),
                class,
                documentation: documentation(global.element),
            });
            self.element_targets.insert(qname, target);
        }
        Ok(())
    }

    /// Content type of a top-level element that does not own a class.
    fn element_content(
        &mut self,
        element: &'a XmlElement,
        enum_name: &str,
    ) -> Result<SimpleTarget, SchemaError> {
        if let Some(type_name) = element.attr("type") {
            let qname = element.resolve_qname(type_name)?;
            return self.resolve_type(&qname);
        }
        if let Some(simple) = element.xsd_child("simpleType") {
            return self.simple_body(simple, enum_name, None);
        }
        Ok(SimpleTarget::primitive("anyType"))
    }

    /// Pass 2: fills in every reserved type node.
    fn build_types(&mut self) -> Result<(), SchemaError> {
        let complex: Vec<(QName, TypeId)> = self
            .complex_types
            .keys()
            .filter_map(|q| self.complex_ids.get(q).map(|id| (q.clone(), *id)))
            .collect();
        let elements: Vec<(QName, TypeId)> = self
            .elements
            .keys()
            .filter_map(|q| self.element_ids.get(q).map(|id| (q.clone(), *id)))
            .collect();

        let mut pending: Vec<(TypeId, QName, bool)> = complex
            .into_iter()
            .map(|(q, id)| (id, q, true))
            .chain(elements.into_iter().map(|(q, id)| (id, q, false)))
            .collect();
        pending.sort_by_key(|(id, _, _)| *id);

        for (id, qname, is_complex) in pending {
            if is_complex {
                let global = self.complex_types[&qname];
                let scope = Scope {
                    owner: id,
                    path: self.builder.type_node(id).source.path(),
                    namespace: global.namespace,
                };
                let doc = documentation(global.element);
                let appinfo = appinfo(global.element);
                {
                    let node = self.builder.type_mut(id);
                    node.documentation = doc;
                    node.appinfo = appinfo;
                }
                self.complex_body(global.element, &scope)?;
            } else {
                let global = self.elements[&qname];
                self.element_class(id, &qname, global)?;
            }
        }
        Ok(())
    }

    /// Body of a top-level element that owns a class.
    fn element_class(
        &mut self,
        id: TypeId,
        qname: &QName,
        global: Global<'a>,
    ) -> Result<(), SchemaError> {
        let element = global.element;
        let scope = Scope {
            owner: id,
            path: self.builder.type_node(id).source.path(),
            namespace: global.namespace,
        };

        {
            let node = self.builder.type_mut(id);
            node.documentation = documentation(element);
            node.appinfo = appinfo(element);
            node.is_abstract = element.attr("abstract") == Some("true");
        }

        if let Some(inline) = element.xsd_child("complexType") {
            if self.builder.type_node(id).documentation.is_none() {
                self.builder.type_mut(id).documentation = documentation(inline);
            }
            self.complex_body(inline, &scope)?;
        } else if let Some(type_name) = element.attr("type") {
            let declared = element.resolve_qname(type_name)?;
            let target = self.resolve_type(&declared)?;
            let node = self.builder.type_mut(id);
            match target.type_ref {
                TypeRef::Complex(base) => {
                    node.base = Some(base);
                    node.derivation = Some(Derivation::Substitution);
                }
                _ => {
                    let mut field = FieldNode::new("value", FieldKind::Content, target.type_ref);
                    field.declared_type = Some(declared);
                    field.pattern = target.pattern;
                    node.fields.push(field);
                }
            }
        }

        if self.substitution_heads.contains(qname) {
            tracing::warn!(element = %qname.local, "substitution group head modeled as abstract class");
            let node = self.builder.type_mut(id);
            node.is_abstract = true;
            node.degradations.push(Degradation::SubstitutionHead);
        }

        if let Some(head) = element.attr("substitutionGroup") {
            let head = element.resolve_qname(head)?;
            let (head_qname, _) = lookup(&self.elements, &head)
                .ok_or_else(|| SchemaParseError::unresolved("element", head.to_string()))?;
            let head_id = self
                .element_ids
                .get(head_qname)
                .copied()
                .ok_or_else(|| SchemaParseError::unresolved("element", head.to_string()))?;

            let declared_type = {
                let current = self.builder.type_node(id);
                current
                    .base
                    .map(|base| self.builder.type_node(base).name.clone())
            };
            tracing::warn!(
                element = %qname.local,
                head = %head_qname.local,
                "substitution group member linked to its head"
            );
            let node = self.builder.type_mut(id);
            node.base = Some(head_id);
            node.derivation = Some(Derivation::Substitution);
            node.degradations.push(Degradation::SubstitutionMember {
                head: head_qname.local.clone(),
                declared_type,
            });
        }
        Ok(())
    }

    /// Fills a type node from a `complexType` element.
    fn complex_body(
        &mut self,
        complex: &'a XmlElement,
        scope: &Scope<'a>,
    ) -> Result<(), SchemaError> {
        let mut body = Body::default();
        let is_abstract = complex.attr("abstract") == Some("true");
        let mut mixed = complex.attr("mixed") == Some("true");
        let mut base: Option<(TypeId, Derivation)> = None;

        for child in complex.xsd_children() {
            match child.local.as_str() {
                "complexContent" => {
                    mixed |= child.attr("mixed") == Some("true");
                    let Some(derivation) = derivation_child(child) else {
                        continue;
                    };
                    base = self.complex_base(derivation)?;
                    self.content_model(derivation, scope, &mut body)?;
                }
                "simpleContent" => {
                    let Some(derivation) = derivation_child(child) else {
                        continue;
                    };
                    base = self.simple_content(derivation, scope, &mut body)?;
                    self.content_model(derivation, scope, &mut body)?;
                }
                _ => self.content_item(child, Occurs::ONE, false, scope, &mut body)?,
            }
        }

        if mixed {
            tracing::debug!(owner = %scope.path, "mixed content keeps element children only");
            body.degradations.push(Degradation::Mixed);
        }

        let node = self.builder.type_mut(scope.owner);
        if let Some((base, derivation)) = base {
            node.base = Some(base);
            node.derivation = Some(derivation);
        }
        node.is_abstract |= is_abstract;
        for field in body.fields {
            match node
                .fields
                .iter_mut()
                .find(|f| f.kind == field.kind && f.name == field.name)
            {
                Some(existing) => existing.occurs = existing.occurs.union(field.occurs),
                None => node.fields.push(field),
            }
        }
        node.degradations.extend(body.degradations);
        Ok(())
    }

    /// Processes the children of an `extension`/`restriction` or
    /// `complexType` that make up its content and attributes.
    fn content_model(
        &mut self,
        parent: &'a XmlElement,
        scope: &Scope<'a>,
        body: &mut Body,
    ) -> Result<(), SchemaError> {
        for child in parent.xsd_children() {
            self.content_item(child, Occurs::ONE, false, scope, body)?;
        }
        Ok(())
    }

    fn content_item(
        &mut self,
        item: &'a XmlElement,
        outer: Occurs,
        in_choice: bool,
        scope: &Scope<'a>,
        body: &mut Body,
    ) -> Result<(), SchemaError> {
        match item.local.as_str() {
            "sequence" | "all" | "choice" | "group" | "element" | "any" => {
                self.particle(item, outer, in_choice, scope, body)
            }
            "attribute" => self.attribute(item, scope, body),
            "attributeGroup" => self.attribute_group(item, scope, body),
            "anyAttribute" => {
                tracing::debug!(owner = %scope.path, "anyAttribute wildcard dropped");
                body.degradations.push(Degradation::AnyAttribute);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn particle(
        &mut self,
        particle: &'a XmlElement,
        outer: Occurs,
        in_choice: bool,
        scope: &Scope<'a>,
        body: &mut Body,
    ) -> Result<(), SchemaError> {
        let occurs = parse_occurs(particle)?;
        if occurs.is_prohibited() {
            return Ok(());
        }
        let occurs = occurs.multiply(outer);

        match particle.local.as_str() {
            "element" => {
                let mut field = self.element_field(particle, scope)?;
                field.occurs = if in_choice { occurs.optional() } else { occurs };
                field.from_choice = in_choice;
                body.push(field);
            }
            "sequence" | "all" => {
                for child in particle.xsd_children() {
                    self.particle_child(child, occurs, in_choice, scope, body)?;
                }
            }
            "choice" => {
                let before = body.fields.len();
                for child in particle.xsd_children() {
                    self.particle_child(child, occurs, true, scope, body)?;
                }
                let fields: Vec<String> =
                    body.fields[before..].iter().map(|f| f.name.clone()).collect();
                tracing::warn!(
                    owner = %scope.path,
                    fields = ?fields,
                    "choice approximated as optional siblings"
                );
                body.degradations.push(Degradation::Choice { fields });
            }
            "group" => {
                let reference = particle
                    .attr("ref")
                    .ok_or_else(|| SchemaParseError::missing_attr(&particle.name, "ref"))?;
                let reference = particle.resolve_qname(reference)?;
                let (qname, global) = lookup(&self.groups, &reference)
                    .map(|(q, g)| (q.clone(), *g))
                    .ok_or_else(|| SchemaParseError::unresolved("group", reference.to_string()))?;
                self.enter_group(&qname)?;
                for child in global.element.xsd_children() {
                    self.particle_child(child, occurs, in_choice, scope, body)?;
                }
                self.group_stack.pop();
            }
            "any" => {
                tracing::debug!(owner = %scope.path, "any wildcard dropped");
                body.degradations.push(Degradation::AnyElement);
            }
            _ => {}
        }
        Ok(())
    }

    fn particle_child(
        &mut self,
        child: &'a XmlElement,
        outer: Occurs,
        in_choice: bool,
        scope: &Scope<'a>,
        body: &mut Body,
    ) -> Result<(), SchemaError> {
        match child.local.as_str() {
            "sequence" | "all" | "choice" | "group" | "element" | "any" => {
                self.particle(child, outer, in_choice, scope, body)
            }
            _ => Ok(()),
        }
    }

    fn enter_group(&mut self, qname: &QName) -> Result<(), SchemaIntegrityError> {
        if let Some(pos) = self.group_stack.iter().position(|g| g == qname) {
            let mut path: Vec<&str> = self.group_stack[pos..]
                .iter()
                .map(|g| g.local.as_str())
                .collect();
            path.push(&qname.local);
            return Err(SchemaIntegrityError::CyclicGroup {
                path: path.join(" -> "),
            });
        }
        self.group_stack.push(qname.clone());
        Ok(())
    }

    /// Builds the field for a local element particle.
    fn element_field(
        &mut self,
        element: &'a XmlElement,
        scope: &Scope<'a>,
    ) -> Result<FieldNode, SchemaError> {
        if let Some(reference) = element.attr("ref") {
            let reference = element.resolve_qname(reference)?;
            let (qname, global) = lookup(&self.elements, &reference)
                .map(|(q, g)| (q.clone(), *g))
                .ok_or_else(|| SchemaParseError::unresolved("element", reference.to_string()))?;
            let target = self
                .element_targets
                .get(&qname)
                .cloned()
                .ok_or_else(|| SchemaParseError::unresolved("element", qname.to_string()))?;
            let mut field = self.value_field(&qname.local, FieldKind::Element, target, scope);
            field.declared_type = global
                .element
                .attr("type")
                .map(|t| global.element.resolve_qname(t))
                .transpose()?;
            field.documentation = documentation(element).or_else(|| documentation(global.element));
            field.appinfo = appinfo(element);
            field.default_value = default_value(global.element);
            return Ok(field);
        }

        let name = element
            .attr("name")
            .ok_or_else(|| SchemaParseError::missing_attr(&element.name, "name"))?;

        let mut declared_type = None;
        let target = if let Some(type_name) = element.attr("type") {
            let qname = element.resolve_qname(type_name)?;
            declared_type = Some(qname.clone());
            self.resolve_type(&qname)?
        } else if let Some(inline) = element.xsd_child("complexType") {
            let id = self.local_type(name, inline, scope)?;
            SimpleTarget {
                type_ref: TypeRef::Complex(id),
                ..SimpleTarget::primitive("anyType")
            }
        } else if let Some(simple) = element.xsd_child("simpleType") {
            let enum_name = self.inline_enum_name(scope.owner, name);
            self.simple_body(simple, &enum_name, None)?
        } else {
            SimpleTarget::primitive("anyType")
        };

        let mut field = self.value_field(name, FieldKind::Element, target, scope);
        field.declared_type = declared_type;
        field.documentation = documentation(element);
        field.appinfo = appinfo(element);
        field.default_value = default_value(element);
        Ok(field)
    }

    /// Class for a local element with an anonymous complex type, one per
    /// identity path.
    fn local_type(
        &mut self,
        name: &str,
        complex: &'a XmlElement,
        scope: &Scope<'a>,
    ) -> Result<TypeId, SchemaError> {
        let source = TypeSource::Local {
            owner: scope.path.clone(),
            element: name.to_string(),
        };
        let path = source.path();
        if let Some(id) = self.local_ids.get(&path) {
            return Ok(*id);
        }

        let mut node = TypeNode::new(
            QName::new(scope.namespace.map(str::to_string), name),
            source,
        );
        node.documentation = documentation(complex);
        node.appinfo = appinfo(complex);
        let id = self.builder.add_type(node);
        self.local_ids.insert(path.clone(), id);

        let nested = Scope {
            owner: id,
            path,
            namespace: scope.namespace,
        };
        self.complex_body(complex, &nested)?;
        Ok(id)
    }

    fn attribute(
        &mut self,
        attribute: &'a XmlElement,
        scope: &Scope<'a>,
        body: &mut Body,
    ) -> Result<(), SchemaError> {
        let occurs = match attribute.attr("use") {
            Some("prohibited") => return Ok(()),
            Some("required") => Occurs::ONE,
            _ => Occurs::OPTIONAL,
        };

        let mut field = if let Some(reference) = attribute.attr("ref") {
            let reference = attribute.resolve_qname(reference)?;
            if reference.namespace.as_deref() == Some(XML_NAMESPACE) {
                let mut field = FieldNode::new(
                    reference.local.clone(),
                    FieldKind::Attribute,
                    TypeRef::Primitive("string".to_string()),
                );
                field.declared_type = Some(reference);
                field
            } else {
                let (qname, global) = lookup(&self.attributes, &reference)
                    .map(|(q, g)| (q.clone(), *g))
                    .ok_or_else(|| {
                        SchemaParseError::unresolved("attribute", reference.to_string())
                    })?;
                self.attribute_field(global.element, &qname.local, scope)?
            }
        } else {
            let name = attribute
                .attr("name")
                .ok_or_else(|| SchemaParseError::missing_attr(&attribute.name, "name"))?;
            self.attribute_field(attribute, name, scope)?
        };

        if let Some(doc) = documentation(attribute) {
            field.documentation = Some(doc);
        }
        let own_appinfo = appinfo(attribute);
        if !own_appinfo.is_empty() {
            field.appinfo = own_appinfo;
        }
        if let Some(value) = default_value(attribute) {
            field.default_value = Some(value);
        }
        field.occurs = if field.occurs.is_multivalued() {
            Occurs::new(occurs.min, MaxOccurs::Unbounded)
        } else {
            occurs
        };
        body.push(field);
        Ok(())
    }

    fn attribute_field(
        &mut self,
        attribute: &'a XmlElement,
        name: &str,
        scope: &Scope<'a>,
    ) -> Result<FieldNode, SchemaError> {
        let mut declared_type = None;
        let target = if let Some(type_name) = attribute.attr("type") {
            let qname = attribute.resolve_qname(type_name)?;
            declared_type = Some(qname.clone());
            self.resolve_simple(&qname)?
        } else if let Some(simple) = attribute.xsd_child("simpleType") {
            let enum_name = self.inline_enum_name(scope.owner, name);
            self.simple_body(simple, &enum_name, None)?
        } else {
            SimpleTarget::primitive("anySimpleType")
        };

        let mut field = self.value_field(name, FieldKind::Attribute, target, scope);
        field.declared_type = declared_type;
        field.documentation = documentation(attribute);
        field.appinfo = appinfo(attribute);
        field.default_value = default_value(attribute);
        Ok(field)
    }

    fn attribute_group(
        &mut self,
        group: &'a XmlElement,
        scope: &Scope<'a>,
        body: &mut Body,
    ) -> Result<(), SchemaError> {
        let reference = group
            .attr("ref")
            .ok_or_else(|| SchemaParseError::missing_attr(&group.name, "ref"))?;
        let reference = group.resolve_qname(reference)?;
        let (qname, global) = lookup(&self.attribute_groups, &reference)
            .map(|(q, g)| (q.clone(), *g))
            .ok_or_else(|| SchemaParseError::unresolved("attributeGroup", reference.to_string()))?;

        self.enter_group(&qname)?;
        for child in global.element.xsd_children() {
            match child.local.as_str() {
                "attribute" | "attributeGroup" | "anyAttribute" => {
                    self.content_item(child, Occurs::ONE, false, scope, body)?;
                }
                _ => {}
            }
        }
        self.group_stack.pop();
        Ok(())
    }

    /// Turns a resolved simple target into a field, recording a union.
    fn value_field(
        &mut self,
        name: &str,
        kind: FieldKind,
        target: SimpleTarget,
        scope: &Scope<'a>,
    ) -> FieldNode {
        if target.union {
            tracing::debug!(owner = %scope.path, field = name, "union mapped to string");
            self.builder
                .type_mut(scope.owner)
                .degradations
                .push(Degradation::Union {
                    field: name.to_string(),
                });
        }
        let mut field = FieldNode::new(name, kind, target.type_ref);
        field.pattern = target.pattern;
        if target.list {
            field.occurs = Occurs::new(field.occurs.min, MaxOccurs::Unbounded);
        }
        field
    }

    fn inline_enum_name(&self, owner: TypeId, field: &str) -> String {
        format!("Enum_{}_{}", self.builder.type_node(owner).name, field)
    }

    /// Resolves the base of a `complexContent` derivation.
    fn complex_base(
        &mut self,
        derivation: &'a XmlElement,
    ) -> Result<Option<(TypeId, Derivation)>, SchemaError> {
        let kind = derivation_kind(derivation);
        let base = derivation
            .attr("base")
            .ok_or_else(|| SchemaParseError::missing_attr(&derivation.name, "base"))?;
        let base = derivation.resolve_qname(base)?;
        if base.is_xsd() && base.local == "anyType" {
            return Ok(None);
        }
        let id = lookup(&self.complex_types, &base)
            .and_then(|(q, _)| self.complex_ids.get(q).copied())
            .ok_or_else(|| SchemaParseError::unresolved("type", base.to_string()))?;
        Ok(Some((id, kind)))
    }

    /// Handles a `simpleContent` derivation: a complex base becomes the
    /// type's base, a simple one a `value` content field.
    fn simple_content(
        &mut self,
        derivation: &'a XmlElement,
        scope: &Scope<'a>,
        body: &mut Body,
    ) -> Result<Option<(TypeId, Derivation)>, SchemaError> {
        let kind = derivation_kind(derivation);
        let base = derivation
            .attr("base")
            .ok_or_else(|| SchemaParseError::missing_attr(&derivation.name, "base"))?;
        let base = derivation.resolve_qname(base)?;

        if !base.is_xsd() {
            if let Some(id) =
                lookup(&self.complex_types, &base).and_then(|(q, _)| self.complex_ids.get(q).copied())
            {
                return Ok(Some((id, kind)));
            }
        }

        let target = self.resolve_simple(&base)?;
        let mut field = self.value_field("value", FieldKind::Content, target, scope);
        field.declared_type = Some(base);
        if let Some(pattern) = pattern_facet(derivation) {
            field.pattern = Some(pattern);
        }
        body.push(field);
        Ok(None)
    }

    /// Resolves a `type` attribute that may name a complex or simple type.
    fn resolve_type(&mut self, qname: &QName) -> Result<SimpleTarget, SchemaError> {
        if !qname.is_xsd() {
            if let Some(id) =
                lookup(&self.complex_types, qname).and_then(|(q, _)| self.complex_ids.get(q).copied())
            {
                return Ok(SimpleTarget {
                    type_ref: TypeRef::Complex(id),
                    ..SimpleTarget::primitive("anyType")
                });
            }
        }
        self.resolve_simple(qname)
    }

    /// Resolves a simple type name to a builtin or enumeration.
    fn resolve_simple(&mut self, qname: &QName) -> Result<SimpleTarget, SchemaError> {
        if qname.is_xsd() {
            return Ok(builtin_target(&qname.local));
        }
        let Some((declared, global)) = lookup(&self.simple_types, qname).map(|(q, g)| (q.clone(), *g))
        else {
            tracing::warn!(type_name = %qname, "type not found in loaded documents");
            return Ok(SimpleTarget::unresolved(qname.clone()));
        };
        if let Some(cached) = self.simple_cache.get(&declared) {
            return Ok(cached.clone());
        }
        if self.simple_stack.contains(&declared) {
            return Err(SchemaIntegrityError::CyclicSimpleType {
                name: declared.local.clone(),
            }
            .into());
        }

        self.simple_stack.push(declared.clone());
        let result = self.simple_body(global.element, &declared.local, Some(&declared));
        self.simple_stack.pop();

        let target = result?;
        self.simple_cache.insert(declared, target.clone());
        Ok(target)
    }

    /// Resolves a `simpleType` element, creating an enum for enumeration
    /// facets.
    fn simple_body(
        &mut self,
        simple: &'a XmlElement,
        enum_name: &str,
        qname: Option<&QName>,
    ) -> Result<SimpleTarget, SchemaError> {
        if let Some(restriction) = simple.xsd_child("restriction") {
            let base = match restriction.attr("base") {
                Some(base) => {
                    let base = restriction.resolve_qname(base)?;
                    self.resolve_simple(&base)?
                }
                None => match restriction.xsd_child("simpleType") {
                    Some(inner) => self.simple_body(inner, enum_name, None)?,
                    None => SimpleTarget::primitive("string"),
                },
            };

            let pattern = pattern_facet(restriction).or(base.pattern.clone());
            let values: Vec<&XmlElement> = restriction
                .xsd_children()
                .filter(|c| c.is_xsd("enumeration"))
                .collect();
            if values.is_empty() {
                return Ok(SimpleTarget { pattern, ..base });
            }

            let builtin = match &base.type_ref {
                TypeRef::Primitive(name) => name.clone(),
                TypeRef::Enum(id) => self.builder_enum_base(*id),
                _ => "string".to_string(),
            };
            let mut node = EnumNode::new(enum_name, builtin);
            node.qname = qname.cloned();
            node.documentation = documentation(simple);
            for facet in values {
                let value = facet
                    .attr("value")
                    .ok_or_else(|| SchemaParseError::missing_attr(&facet.name, "value"))?;
                node.add_value(EnumValue {
                    value: value.to_string(),
                    documentation: documentation(facet),
                });
            }
            let id = self.builder.add_enum(node);
            return Ok(SimpleTarget {
                type_ref: TypeRef::Enum(id),
                list: base.list,
                union: false,
                pattern,
            });
        }

        if let Some(list) = simple.xsd_child("list") {
            let item = match list.attr("itemType") {
                Some(item) => {
                    let item = list.resolve_qname(item)?;
                    self.resolve_simple(&item)?
                }
                None => match list.xsd_child("simpleType") {
                    Some(inner) => self.simple_body(inner, enum_name, None)?,
                    None => SimpleTarget::primitive("string"),
                },
            };
            return Ok(SimpleTarget { list: true, ..item });
        }

        if simple.xsd_child("union").is_some() {
            return Ok(SimpleTarget {
                union: true,
                ..SimpleTarget::primitive("string")
            });
        }

        Ok(SimpleTarget::primitive("string"))
    }

    fn builder_enum_base(&self, id: EnumId) -> String {
        self.builder.enum_node(id).base.clone()
    }
}

/// Target for an XSD builtin; list builtins are multivalued.
fn builtin_target(local: &str) -> SimpleTarget {
    match local {
        "IDREFS" => SimpleTarget {
            list: true,
            ..SimpleTarget::primitive("IDREF")
        },
        "ENTITIES" => SimpleTarget {
            list: true,
            ..SimpleTarget::primitive("ENTITY")
        },
        "NMTOKENS" => SimpleTarget {
            list: true,
            ..SimpleTarget::primitive("NMTOKEN")
        },
        other => SimpleTarget::primitive(other),
    }
}

/// Finds a component by QName, falling back to a unique local-name match.
fn lookup<'m, 'a>(
    map: &'m IndexMap<QName, Global<'a>>,
    name: &QName,
) -> Option<(&'m QName, &'m Global<'a>)> {
    if let Some(found) = map.get_key_value(name) {
        return Some(found);
    }
    let mut candidates = map.iter().filter(|(q, _)| q.local == name.local);
    let first = candidates.next()?;
    candidates.next().is_none().then_some(first)
}

/// Local names declared under more than one namespace.
fn ambiguous_locals<'q>(names: impl Iterator<Item = &'q QName>) -> HashSet<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *seen.entry(name.local.as_str()).or_default() += 1;
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(local, _)| local.to_string())
        .collect()
}

fn derivation_child(content: &XmlElement) -> Option<&XmlElement> {
    content
        .xsd_children()
        .find(|c| c.is_xsd("extension") || c.is_xsd("restriction"))
}

fn derivation_kind(derivation: &XmlElement) -> Derivation {
    if derivation.is_xsd("restriction") {
        Derivation::Restriction
    } else {
        Derivation::Extension
    }
}

/// Reads `minOccurs`/`maxOccurs`.
fn parse_occurs(element: &XmlElement) -> Result<Occurs, SchemaParseError> {
    let min: u32 = match element.attr("minOccurs") {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| SchemaParseError::invalid_attr(&element.name, "minOccurs", value))?,
        None => 1,
    };
    let max = match element.attr("maxOccurs") {
        Some(value) => MaxOccurs::parse(value)
            .ok_or_else(|| SchemaParseError::invalid_attr(&element.name, "maxOccurs", value))?,
        None => MaxOccurs::Bounded(1),
    };
    let occurs = Occurs::new(min, max);
    if !occurs.is_prohibited() && !occurs.is_consistent() {
        return Err(SchemaParseError::invalid_attr(
            &element.name,
            "maxOccurs",
            max.to_string(),
        ));
    }
    Ok(occurs)
}

/// Pattern facets of one restriction step, OR-ed together.
fn pattern_facet(restriction: &XmlElement) -> Option<String> {
    let patterns: Vec<&str> = restriction
        .xsd_children()
        .filter(|c| c.is_xsd("pattern"))
        .filter_map(|c| c.attr("value"))
        .collect();
    match patterns.as_slice() {
        [] => None,
        [single] => Some((*single).to_string()),
        many => Some(
            many.iter()
                .map(|p| format!("({p})"))
                .collect::<Vec<_>>()
                .join("|"),
        ),
    }
}

fn default_value(element: &XmlElement) -> Option<String> {
    element
        .attr("default")
        .or_else(|| element.attr("fixed"))
        .map(str::to_string)
}

/// Collects `annotation/documentation` text.
///
/// Each line is whitespace-normalized; empty and repeated lines are dropped.
fn documentation(element: &XmlElement) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    for annotation in element.children.iter().filter(|c| c.is_xsd("annotation")) {
        for doc in annotation.children.iter().filter(|c| c.is_xsd("documentation")) {
            for line in doc.text_content().lines() {
                let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
                if !line.is_empty() && !lines.contains(&line) {
                    lines.push(line);
                }
            }
        }
    }
    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Collects `annotation/appinfo` entries as `(name, value)` pairs.
fn appinfo(element: &XmlElement) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for annotation in element.children.iter().filter(|c| c.is_xsd("annotation")) {
        for info in annotation.children.iter().filter(|c| c.is_xsd("appinfo")) {
            if info.children.is_empty() {
                let text = info.text.trim();
                if !text.is_empty() {
                    entries.push(("appinfo".to_string(), text.to_string()));
                }
                continue;
            }
            for child in &info.children {
                let items: Vec<&XmlElement> = if child.local == "xsdfu" {
                    child.children.iter().collect()
                } else {
                    vec![child]
                };
                for item in items {
                    let value = item.text_content();
                    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
                    entries.push((item.local.clone(), value));
                }
            }
        }
    }
    entries
}
