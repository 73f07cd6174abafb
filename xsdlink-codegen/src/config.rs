//! Generator configuration and schema-level metadata.

use crate::naming::coerce_ncname;
use indexmap::IndexMap;
use serde::Serialize;
use xsdlink_schema::IdentifierPolicy;

/// Description written into every generated schema.
pub const DEFAULT_DESCRIPTION: &str = "LinkML translation of the provided XML Schema";

/// License written into every generated schema.
pub const DEFAULT_LICENSE: &str = "https://creativecommons.org/publicdomain/zero/1.0/";

/// Version written into every generated schema.
pub const DEFAULT_VERSION: &str = "0.0.1";

/// Options consumed by the generator.
///
/// Every metadata field is optional; an unset field is derived from the
/// target namespace by [`SchemaMetadata::derive`].
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// Schema `id` URL.
    pub schema_id: Option<String>,
    /// Schema `name`.
    pub name: Option<String>,
    /// Schema `title`.
    pub title: Option<String>,
    /// `default_prefix`.
    pub default_prefix: Option<String>,
    /// Additional prefixes, appended in order.
    pub extra_prefixes: IndexMap<String, String>,
    /// Restricts output to these top-level elements and their dependencies.
    pub elements: Option<Vec<String>>,
    /// Writes one file per class plus an index file.
    pub partition: bool,
    /// Identifier detection rules.
    pub identifier_policy: IdentifierPolicy,
    /// Builtin name to LinkML range overrides.
    pub range_overrides: IndexMap<String, String>,
}

impl GeneratorConfig {
    /// Creates a configuration with every option defaulted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema id.
    #[must_use]
    pub fn with_schema_id(mut self, id: impl Into<String>) -> Self {
        self.schema_id = Some(id.into());
        self
    }

    /// Sets the schema name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the schema title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the default prefix.
    #[must_use]
    pub fn with_default_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_prefix = Some(prefix.into());
        self
    }

    /// Adds an extra prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.extra_prefixes.insert(prefix.into(), uri.into());
        self
    }

    /// Restricts output to the given elements.
    #[must_use]
    pub fn with_elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements = Some(elements.into_iter().map(Into::into).collect());
        self
    }

    /// Enables partitioned output.
    #[must_use]
    pub fn with_partition(mut self, partition: bool) -> Self {
        self.partition = partition;
        self
    }

    /// Overrides the LinkML range of an XSD builtin.
    #[must_use]
    pub fn with_range_override(
        mut self,
        builtin: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        self.range_overrides.insert(builtin.into(), range.into());
        self
    }
}

/// Schema-level metadata of a generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaMetadata {
    /// Schema URL.
    pub id: String,
    /// NCName-safe schema name.
    pub name: String,
    /// Human-readable title.
    pub title: String,
    /// Schema description.
    pub description: String,
    /// License URL.
    pub license: String,
    /// Schema version.
    pub version: String,
    /// Default prefix.
    pub default_prefix: String,
    /// Prefix to URI map, in output order.
    pub prefixes: IndexMap<String, String>,
}

impl SchemaMetadata {
    /// Derives metadata from a target namespace, then applies overrides.
    ///
    /// # Arguments
    /// * `target_namespace` - XSD target namespace, if any
    /// * `config` - Generator configuration holding the overrides
    #[must_use]
    pub fn derive(target_namespace: Option<&str>, config: &GeneratorConfig) -> Self {
        let namespace = target_namespace.filter(|ns| !ns.trim().is_empty());
        let name = config
            .name
            .as_deref()
            .map_or_else(|| infer_prefix(namespace), coerce_ncname);
        let id = config.schema_id.clone().unwrap_or_else(|| match namespace {
            Some(ns) => format!("{}/linkml", ns.trim_end_matches('/')),
            None => "https://w3id.org/linkml/schema".to_string(),
        });
        let title = config
            .title
            .clone()
            .unwrap_or_else(|| format!("{} Schema", name.to_uppercase()));
        let default_prefix = config
            .default_prefix
            .as_deref()
            .map_or_else(|| name.clone(), coerce_ncname);

        let mut prefixes = IndexMap::new();
        prefixes.insert("linkml".to_string(), "https://w3id.org/linkml/".to_string());
        prefixes.insert(
            "xsd".to_string(),
            "http://www.w3.org/2001/XMLSchema#".to_string(),
        );
        prefixes.insert(
            name.clone(),
            namespace.map_or_else(|| format!("https://example.org/{name}#"), str::to_string),
        );
        prefixes.insert("schema".to_string(), "http://schema.org/".to_string());
        if !prefixes.contains_key(&default_prefix) {
            prefixes.insert(
                default_prefix.clone(),
                format!("https://example.org/{default_prefix}#"),
            );
        }
        for (prefix, uri) in &config.extra_prefixes {
            prefixes.insert(prefix.clone(), uri.clone());
        }

        Self {
            id,
            name,
            title,
            description: DEFAULT_DESCRIPTION.to_string(),
            license: DEFAULT_LICENSE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            default_prefix,
            prefixes,
        }
    }
}

/// Infers a schema prefix from the last meaningful namespace segment.
///
/// Version-like segments (`2016-06`, `v2`) are skipped, so
/// `http://www.openmicroscopy.org/Schemas/OME/2016-06` yields `ome`.
#[must_use]
pub fn infer_prefix(target_namespace: Option<&str>) -> String {
    let Some(namespace) = target_namespace else {
        return "schema".to_string();
    };

    let segment = namespace
        .split(['/', ':', '#'])
        .rev()
        .map(str::trim)
        .find(|s| !s.is_empty() && !is_version(s) && !is_scheme(s));

    let inferred = match segment {
        Some(segment) => segment.to_lowercase().replace(['-', ' '], "_"),
        None if namespace.contains("openmicroscopy") => "ome".to_string(),
        None if namespace.contains("bina") || namespace.contains("microscopy") => {
            "nbo".to_string()
        }
        None => "schema".to_string(),
    };

    let inferred = coerce_ncname(&inferred);
    if inferred.starts_with(|c: char| c.is_ascii_alphabetic()) {
        inferred
    } else {
        format!("ns_{}", inferred.trim_start_matches('_'))
    }
}

fn is_version(segment: &str) -> bool {
    let body = segment
        .strip_prefix(['v', 'V'])
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(segment);
    body.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
}

fn is_scheme(segment: &str) -> bool {
    matches!(segment, "http" | "https" | "urn" | "file")
}
