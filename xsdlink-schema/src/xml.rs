//! Namespace-aware element tree built on quick-xml.
//!
//! The normalizer and the equivalence verifier both walk XSD documents as a
//! tree. This module turns the quick-xml event stream into [`XmlElement`]
//! nodes carrying their in-scope namespace bindings, so QName-valued
//! attributes (`type`, `base`, `ref`, ...) can be resolved where they appear.

use crate::error::SchemaParseError;
use crate::types::{QName, XML_NAMESPACE, XSD_NAMESPACE};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;

/// Element node of a parsed XML document.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    /// Qualified name as written (`xs:complexType`).
    pub name: String,
    /// Local part of the name.
    pub local: String,
    /// Resolved namespace URI of the element.
    pub namespace: Option<String>,
    /// Attributes in document order, namespace declarations excluded.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Direct character data, entities resolved.
    pub text: String,
    /// Prefix bindings in scope; the default namespace is keyed by `""`.
    scope: BTreeMap<String, String>,
}

impl XmlElement {
    /// Returns the value of an unqualified attribute.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if this is the XSD element with the given local name.
    #[must_use]
    pub fn is_xsd(&self, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(XSD_NAMESPACE)
    }

    /// Iterates over child elements in the XSD namespace.
    pub fn xsd_children(&self) -> impl Iterator<Item = &XmlElement> {
        self.children
            .iter()
            .filter(|c| c.namespace.as_deref() == Some(XSD_NAMESPACE))
    }

    /// Returns the first XSD child with the given local name.
    #[must_use]
    pub fn xsd_child(&self, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is_xsd(local))
    }

    /// Concatenated character data of this element and all descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            let nested = child.text_content();
            if !nested.is_empty() {
                if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
                out.push_str(&nested);
            }
        }
        out
    }

    /// Returns the namespace bound to `prefix` in this element's scope.
    #[must_use]
    pub fn namespace_for(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.scope
            .get(prefix)
            .map(String::as_str)
            .filter(|ns| !ns.is_empty())
    }

    /// Resolves a QName-valued attribute against the in-scope bindings.
    ///
    /// # Errors
    /// Returns `SchemaParseError::UnresolvedPrefix` if the prefix is not
    /// declared.
    pub fn resolve_qname(&self, value: &str) -> Result<QName, SchemaParseError> {
        let value = value.trim();
        match value.split_once(':') {
            Some((prefix, local)) => {
                let namespace =
                    self.namespace_for(prefix)
                        .ok_or_else(|| SchemaParseError::UnresolvedPrefix {
                            prefix: prefix.to_string(),
                            context: value.to_string(),
                        })?;
                Ok(QName::new(Some(namespace.to_string()), local))
            }
            None => Ok(QName::new(
                self.namespace_for("").map(str::to_string),
                value,
            )),
        }
    }
}

/// Parses an XML document into its root element.
///
/// # Arguments
/// * `xml` - Document content
///
/// # Errors
/// Returns `SchemaParseError` if the document is not well-formed, uses an
/// undeclared prefix, or has no single root element.
pub fn parse_document(xml: &str) -> Result<XmlElement, SchemaParseError> {
    let mut reader = Reader::from_str(xml);
    // Documentation text is normalized later; keep inter-token spacing.
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let element = open_element(e, stack.last())?;
                stack.push(element);
            }
            Event::Empty(ref e) => {
                let element = open_element(e, stack.last())?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| SchemaParseError::malformed("unexpected closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(ref t) => {
                if let Some(current) = stack.last_mut() {
                    let text = std::str::from_utf8(t.as_ref())?;
                    current.text.push_str(&unescape(text)?);
                }
            }
            Event::CData(ref c) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(std::str::from_utf8(c)?);
                }
            }
            Event::GeneralRef(ref r) => {
                if let Some(current) = stack.last_mut() {
                    let name = std::str::from_utf8(r)?;
                    current.text.push_str(&resolve_entity(name)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(SchemaParseError::malformed(format!(
            "unclosed element '{}'",
            open.name
        )));
    }

    root.ok_or_else(|| SchemaParseError::malformed("document has no root element"))
}

/// Builds an element from a start tag, inheriting the parent's scope.
fn open_element(
    e: &BytesStart<'_>,
    parent: Option<&XmlElement>,
) -> Result<XmlElement, SchemaParseError> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let mut scope = parent.map(|p| p.scope.clone()).unwrap_or_default();
    let mut attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| SchemaParseError::malformed(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = unescape(std::str::from_utf8(&attr.value)?)?;

        if key == "xmlns" {
            scope.insert(String::new(), value);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.insert(prefix.to_string(), value);
        } else {
            attributes.push((key.to_string(), value));
        }
    }

    let mut element = XmlElement {
        local: String::new(),
        name,
        namespace: None,
        attributes,
        children: Vec::new(),
        text: String::new(),
        scope,
    };

    let (prefix, local) = match element.name.split_once(':') {
        Some((prefix, local)) => (prefix.to_string(), local.to_string()),
        None => (String::new(), element.name.clone()),
    };
    element.namespace = match element.namespace_for(&prefix) {
        Some(ns) => Some(ns.to_string()),
        None if prefix.is_empty() => None,
        None => {
            return Err(SchemaParseError::UnresolvedPrefix {
                prefix,
                context: element.name.clone(),
            });
        }
    };
    element.local = local;

    Ok(element)
}

/// Hands a completed element to its parent, or makes it the root.
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), SchemaParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(SchemaParseError::malformed(format!(
            "second root element '{}'",
            element.name
        )))
    } else {
        *root = Some(element);
        Ok(())
    }
}

/// Resolves a predefined or numeric entity name (without `&` and `;`).
fn resolve_entity(name: &str) -> Result<String, SchemaParseError> {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok()
            } else {
                None
            };
            code.and_then(char::from_u32)
        }
    };
    resolved
        .map(String::from)
        .ok_or_else(|| SchemaParseError::malformed(format!("undefined entity '&{name};'")))
}

/// Replaces entity references in raw text or attribute values.
fn unescape(raw: &str) -> Result<String, SchemaParseError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find(';')
            .ok_or_else(|| SchemaParseError::malformed(format!("unterminated entity in '{raw}'")))?;
        out.push_str(&resolve_entity(&after[..end])?);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
