//! Loading of a root XSD document and everything it includes or imports.

use crate::error::SchemaParseError;
use crate::xml::{XmlElement, parse_document};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// One parsed schema document.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// File the document was read from, if any.
    pub path: Option<PathBuf>,
    /// The `xs:schema` element.
    pub root: XmlElement,
    /// Effective target namespace (inherited by chameleon includes).
    pub target_namespace: Option<String>,
}

impl SchemaDocument {
    /// Human-readable origin used in error messages.
    #[must_use]
    pub fn origin(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "<inline>".to_string(), |p| p.display().to_string())
    }
}

/// Root document followed by its transitive includes and imports.
///
/// Documents appear in depth-first document order, each file once.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    /// Loaded documents; the first one is the root.
    pub documents: Vec<SchemaDocument>,
}

impl DocumentSet {
    /// Returns the root document.
    #[must_use]
    pub fn root(&self) -> Option<&SchemaDocument> {
        self.documents.first()
    }

    /// Target namespace of the root document.
    #[must_use]
    pub fn target_namespace(&self) -> Option<&str> {
        self.root().and_then(|d| d.target_namespace.as_deref())
    }

    /// Iterates over the top-level XSD components of every document,
    /// paired with the document they come from.
    pub fn components(&self) -> impl Iterator<Item = (&SchemaDocument, &XmlElement)> {
        self.documents
            .iter()
            .flat_map(|doc| doc.root.xsd_children().map(move |child| (doc, child)))
    }
}

/// Loads a schema file and everything it references.
///
/// # Arguments
/// * `path` - Root XSD file
///
/// # Errors
/// Returns `SchemaParseError` if any document cannot be read or parsed, is
/// not an XML Schema, or references a location that cannot be resolved.
pub fn load_documents(path: &Path) -> Result<DocumentSet, SchemaParseError> {
    let mut loader = Loader::default();
    loader.load_file(path, None)?;
    Ok(DocumentSet {
        documents: loader.documents,
    })
}

/// Loads a schema from a string.
///
/// # Arguments
/// * `xml` - Root document content
/// * `base_dir` - Directory relative locations are resolved against; with
///   `None` any include fails as unresolvable
///
/// # Errors
/// Same as [`load_documents`].
pub fn load_documents_from_str(
    xml: &str,
    base_dir: Option<&Path>,
) -> Result<DocumentSet, SchemaParseError> {
    let mut loader = Loader::default();
    loader.load_root(parse_document(xml)?, None, base_dir, None)?;
    Ok(DocumentSet {
        documents: loader.documents,
    })
}

#[derive(Default)]
struct Loader {
    documents: Vec<SchemaDocument>,
    visited: HashSet<PathBuf>,
}

impl Loader {
    fn load_file(
        &mut self,
        path: &Path,
        inherited_namespace: Option<&str>,
    ) -> Result<(), SchemaParseError> {
        let canonical = fs::canonicalize(path).map_err(|source| SchemaParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !self.visited.insert(canonical.clone()) {
            return Ok(());
        }

        tracing::debug!(path = %canonical.display(), "loading schema document");
        let content = fs::read_to_string(&canonical).map_err(|source| SchemaParseError::Io {
            path: canonical.clone(),
            source,
        })?;
        let root = parse_document(&content)?;
        let base_dir = canonical.parent().map(Path::to_path_buf);
        self.load_root(root, Some(canonical), base_dir.as_deref(), inherited_namespace)
    }

    fn load_root(
        &mut self,
        root: XmlElement,
        path: Option<PathBuf>,
        base_dir: Option<&Path>,
        inherited_namespace: Option<&str>,
    ) -> Result<(), SchemaParseError> {
        if !root.is_xsd("schema") {
            return Err(SchemaParseError::NotASchema { found: root.name });
        }

        let target_namespace = root
            .attr("targetNamespace")
            .map(str::to_string)
            .or_else(|| inherited_namespace.map(str::to_string));

        let references: Vec<(String, Option<String>, bool)> = root
            .xsd_children()
            .filter_map(|child| {
                let chameleon = child.is_xsd("include") || child.is_xsd("redefine");
                if !chameleon && !child.is_xsd("import") {
                    return None;
                }
                let namespace = child.attr("namespace").map(str::to_string);
                match child.attr("schemaLocation") {
                    Some(location) => Some((location.to_string(), namespace, chameleon)),
                    None => {
                        tracing::debug!(
                            namespace = namespace.as_deref().unwrap_or(""),
                            "skipping import without schemaLocation"
                        );
                        None
                    }
                }
            })
            .collect();

        let document = SchemaDocument {
            path,
            root,
            target_namespace,
        };
        let from = document.origin();
        let includer_namespace = document.target_namespace.clone();
        self.documents.push(document);

        for (location, _namespace, chameleon) in references {
            let target = resolve_location(&location, base_dir).ok_or_else(|| {
                SchemaParseError::UnresolvedInclude {
                    location: location.clone(),
                    from: from.clone(),
                }
            })?;
            let inherited = if chameleon {
                includer_namespace.as_deref()
            } else {
                None
            };
            self.load_file(&target, inherited).map_err(|err| match err {
                SchemaParseError::Io { .. } => SchemaParseError::UnresolvedInclude {
                    location: location.clone(),
                    from: from.clone(),
                },
                other => other,
            })?;
        }

        Ok(())
    }
}

/// Resolves a `schemaLocation` against the including document's directory.
fn resolve_location(location: &str, base_dir: Option<&Path>) -> Option<PathBuf> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return None;
    }
    let location = location.strip_prefix("file://").unwrap_or(location);
    let candidate = Path::new(location);
    let resolved = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir?.join(candidate)
    };
    resolved.is_file().then_some(resolved)
}
