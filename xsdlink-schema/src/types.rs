//! Intermediate model node definitions.
//!
//! This module contains the language-neutral nodes produced by the
//! normalizer: complex types, fields, enumerations and the records of
//! approximated XSD constructs.

use serde::Serialize;
use std::fmt;

/// XML Schema namespace.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QName {
    /// Namespace URI, if any.
    pub namespace: Option<String>,
    /// Local part.
    pub local: String,
}

impl QName {
    /// Creates a new qualified name.
    #[must_use]
    pub fn new(namespace: Option<String>, local: impl Into<String>) -> Self {
        Self {
            namespace,
            local: local.into(),
        }
    }

    /// Creates a name in the XML Schema namespace.
    #[must_use]
    pub fn xsd(local: impl Into<String>) -> Self {
        Self::new(Some(XSD_NAMESPACE.to_string()), local)
    }

    /// Returns true if the name is in the XML Schema namespace.
    #[must_use]
    pub fn is_xsd(&self) -> bool {
        self.namespace.as_deref() == Some(XSD_NAMESPACE)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Index of a [`TypeNode`] in its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub usize);

/// Index of an [`EnumNode`] in its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EnumId(pub usize);

/// Where a type node was declared in the XSD.
///
/// The display form (`complexType:Foo`, `element:Foo`,
/// `local:element:Image/Pixels`) is the XSD-side identity the verifier
/// re-derives. A top-level name declared in more than one namespace is
/// written as `{namespace}Foo` so each declaration keeps its own identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeSource {
    /// Named top-level `complexType`.
    ComplexType(String),
    /// Top-level `element` qualifying as a class.
    Element(String),
    /// Local element with an anonymous complex type.
    Local {
        /// Identity path of the enclosing type (`element:Image`,
        /// `complexType:Image/Pixels`).
        owner: String,
        /// Element name.
        element: String,
    },
}

impl TypeSource {
    /// Path nested declarations extend to build their own identity.
    ///
    /// The root of the path keeps the owner's kind, so locals under a
    /// complex type and an element of the same name stay distinct.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::ComplexType(name) => format!("complexType:{name}"),
            Self::Element(name) => format!("element:{name}"),
            Self::Local { owner, element } => format!("{owner}/{element}"),
        }
    }
}

impl fmt::Display for TypeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ComplexType(_) | Self::Element(_) => f.write_str(&self.path()),
            Self::Local { .. } => write!(f, "local:{}", self.path()),
        }
    }
}

/// Identity name of a top-level declaration: its local name, or the
/// expanded `{namespace}local` form when `ambiguous`.
#[must_use]
pub fn identity_name(qname: &QName, ambiguous: bool) -> String {
    if ambiguous {
        qname.to_string()
    } else {
        qname.local.clone()
    }
}

/// How a type relates to its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Derivation {
    /// `xs:extension`.
    Extension,
    /// `xs:restriction`.
    Restriction,
    /// Substitution group membership (or a head typed by a named type).
    Substitution,
}

/// XSD construct replaced by a documented approximation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Degradation {
    /// Children of a `choice` were made optional siblings.
    Choice {
        /// Names of the affected fields.
        fields: Vec<String>,
    },
    /// Mixed content: character data is not modeled.
    Mixed,
    /// `xs:any` wildcard dropped.
    AnyElement,
    /// `xs:anyAttribute` wildcard dropped.
    AnyAttribute,
    /// `xs:union` simple type mapped to string.
    Union {
        /// Field using the union.
        field: String,
    },
    /// Substitution-group head modeled as an abstract class.
    SubstitutionHead,
    /// Substitution-group member linked to its head via `is_a`.
    SubstitutionMember {
        /// Head element name.
        head: String,
        /// Named type the member declared, if it was dropped for the head.
        declared_type: Option<String>,
    },
}

impl Degradation {
    /// Short tag used for annotations and log lines.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Choice { .. } => "xsd_choice",
            Self::Mixed => "xsd_mixed",
            Self::AnyElement => "xsd_any",
            Self::AnyAttribute => "xsd_any_attribute",
            Self::Union { .. } => "xsd_union",
            Self::SubstitutionHead => "xsd_substitution_head",
            Self::SubstitutionMember { .. } => "xsd_substitution_group",
        }
    }
}

/// Upper occurrence bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaxOccurs {
    /// Finite bound.
    Bounded(u32),
    /// `maxOccurs="unbounded"`.
    Unbounded,
}

impl MaxOccurs {
    /// Parses a `maxOccurs` attribute value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "unbounded" => Some(Self::Unbounded),
            other => other.parse().ok().map(Self::Bounded),
        }
    }

    /// Returns the larger of two bounds.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        match (self, other) {
            (Self::Bounded(a), Self::Bounded(b)) => Self::Bounded(a.max(b)),
            _ => Self::Unbounded,
        }
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Occurrence constraint of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurs {
    /// `minOccurs`.
    pub min: u32,
    /// `maxOccurs`.
    pub max: MaxOccurs,
}

impl Occurs {
    /// Exactly once, the XSD default.
    pub const ONE: Self = Self {
        min: 1,
        max: MaxOccurs::Bounded(1),
    };

    /// Zero or one.
    pub const OPTIONAL: Self = Self {
        min: 0,
        max: MaxOccurs::Bounded(1),
    };

    /// Creates an occurrence constraint.
    #[must_use]
    pub const fn new(min: u32, max: MaxOccurs) -> Self {
        Self { min, max }
    }

    /// Combines a particle's occurrence with that of its enclosing group.
    #[must_use]
    pub fn multiply(self, outer: Self) -> Self {
        let max = match (self.max, outer.max) {
            (MaxOccurs::Bounded(0), _) | (_, MaxOccurs::Bounded(0)) => MaxOccurs::Bounded(0),
            (MaxOccurs::Bounded(a), MaxOccurs::Bounded(b)) => MaxOccurs::Bounded(a.saturating_mul(b)),
            _ => MaxOccurs::Unbounded,
        };
        Self {
            min: self.min.saturating_mul(outer.min),
            max,
        }
    }

    /// Widens to cover both constraints (used when merging duplicates).
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns a copy with the lower bound forced to zero.
    #[must_use]
    pub const fn optional(self) -> Self {
        Self {
            min: 0,
            max: self.max,
        }
    }

    /// `minOccurs >= 1`.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.min >= 1
    }

    /// `maxOccurs > 1` or unbounded.
    #[must_use]
    pub const fn is_multivalued(&self) -> bool {
        match self.max {
            MaxOccurs::Bounded(n) => n > 1,
            MaxOccurs::Unbounded => true,
        }
    }

    /// Returns true if the particle may not occur at all (`maxOccurs="0"`).
    #[must_use]
    pub const fn is_prohibited(&self) -> bool {
        matches!(self.max, MaxOccurs::Bounded(0))
    }

    /// Returns true if `min <= max`.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        match self.max {
            MaxOccurs::Bounded(n) => self.min <= n,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::ONE
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeRef {
    /// XSD built-in type, by local name (after simple-type resolution).
    Primitive(String),
    /// Complex type node.
    Complex(TypeId),
    /// Enumeration node.
    Enum(EnumId),
    /// Name that matched nothing the normalizer loaded.
    Unresolved(QName),
}

impl TypeRef {
    /// Returns the built-in name for primitive references.
    #[must_use]
    pub fn builtin(&self) -> Option<&str> {
        match self {
            Self::Primitive(name) => Some(name),
            _ => None,
        }
    }
}

/// Kind of XML construct a field comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    /// `xs:attribute`.
    Attribute,
    /// `xs:element` particle.
    Element,
    /// Character data of a simple-content type.
    Content,
}

impl FieldKind {
    /// Lower-case label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::Element => "element",
            Self::Content => "content",
        }
    }
}

/// Attribute, child element or content value of a type node.
#[derive(Debug, Clone, Serialize)]
pub struct FieldNode {
    /// XML name of the field.
    pub name: String,
    /// Attribute, element or content.
    pub kind: FieldKind,
    /// Resolved type.
    pub type_ref: TypeRef,
    /// Type name as written in the schema, if any.
    pub declared_type: Option<QName>,
    /// Occurrence constraint.
    pub occurs: Occurs,
    /// Documentation text.
    pub documentation: Option<String>,
    /// `appinfo` entries as `(name, value)`.
    pub appinfo: Vec<(String, String)>,
    /// Pattern facet of the value type.
    pub pattern: Option<String>,
    /// `default` or `fixed` value.
    pub default_value: Option<String>,
    /// Declared inside a `choice`.
    pub from_choice: bool,
    /// Redeclares a field of an ancestor type.
    pub overrides_inherited: bool,
}

impl FieldNode {
    /// Creates a field with default occurrence and no metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind,
            type_ref,
            declared_type: None,
            occurs: Occurs::ONE,
            documentation: None,
            appinfo: Vec::new(),
            pattern: None,
            default_value: None,
            from_choice: false,
            overrides_inherited: false,
        }
    }

    /// Returns a copy with the given occurrence.
    #[must_use]
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// `minOccurs >= 1`.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.occurs.is_required()
    }

    /// `maxOccurs > 1` or unbounded.
    #[must_use]
    pub const fn is_multivalued(&self) -> bool {
        self.occurs.is_multivalued()
    }
}

/// Complex type or class-qualifying element.
#[derive(Debug, Clone, Serialize)]
pub struct TypeNode {
    /// Qualified name.
    pub qname: QName,
    /// Local name.
    pub name: String,
    /// Declaration site.
    pub source: TypeSource,
    /// Documentation text.
    pub documentation: Option<String>,
    /// `appinfo` entries as `(name, value)`.
    pub appinfo: Vec<(String, String)>,
    /// Base type.
    pub base: Option<TypeId>,
    /// How the base was derived.
    pub derivation: Option<Derivation>,
    /// Abstract type or substitution-group head.
    pub is_abstract: bool,
    /// Own fields in declaration order.
    pub fields: Vec<FieldNode>,
    /// Approximated constructs.
    pub degradations: Vec<Degradation>,
}

impl TypeNode {
    /// Creates an empty type node.
    #[must_use]
    pub fn new(qname: QName, source: TypeSource) -> Self {
        Self {
            name: qname.local.clone(),
            qname,
            source,
            documentation: None,
            appinfo: Vec::new(),
            base: None,
            derivation: None,
            is_abstract: false,
            fields: Vec::new(),
            degradations: Vec::new(),
        }
    }

    /// Looks up an own field by kind and name.
    #[must_use]
    pub fn field(&self, kind: FieldKind, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.kind == kind && f.name == name)
    }

    /// Number of own attribute fields.
    #[must_use]
    pub fn attribute_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Attribute)
            .count()
    }

    /// Number of own element and content fields.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.fields.len() - self.attribute_count()
    }
}

/// Enumeration derived from `xs:enumeration` facets.
#[derive(Debug, Clone, Serialize)]
pub struct EnumNode {
    /// Enumeration name.
    pub name: String,
    /// Qualified name of the simple type, if named.
    pub qname: Option<QName>,
    /// Documentation text.
    pub documentation: Option<String>,
    /// Built-in type the facets restrict.
    pub base: String,
    /// Permissible values in declaration order.
    pub values: Vec<EnumValue>,
}

impl EnumNode {
    /// Creates an empty enumeration.
    #[must_use]
    pub fn new(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qname: None,
            documentation: None,
            base: base.into(),
            values: Vec::new(),
        }
    }

    /// Adds a value, ignoring repeats.
    pub fn add_value(&mut self, value: EnumValue) {
        if !self.values.iter().any(|v| v.value == value.value) {
            self.values.push(value);
        }
    }

    /// Gets a value by its literal.
    #[must_use]
    pub fn get_value(&self, value: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.value == value)
    }
}

/// Permissible value of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    /// Literal value.
    pub value: String,
    /// Documentation text.
    pub documentation: Option<String>,
}

impl EnumValue {
    /// Creates an undocumented value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            documentation: None,
        }
    }
}

/// Top-level element declaration.
#[derive(Debug, Clone, Serialize)]
pub struct ElementBinding {
    /// Element name.
    pub qname: QName,
    /// Type of the element's content.
    pub target: TypeRef,
    /// Type node owned by the element when it qualifies as a class.
    pub class: Option<TypeId>,
    /// Documentation text.
    pub documentation: Option<String>,
}
