//! Census of the LinkML side.
//!
//! Reads the generated YAML as untyped values so any LinkML document can be
//! checked, not only ones this workspace produced.

use crate::error::VerifyError;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Annotation carrying the XSD identity of a class.
const XSD_SOURCE: &str = "xsd_source";

/// One LinkML class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkmlClass {
    /// Class name.
    pub name: String,
    /// Distinct own slots (`attributes`, `slot_usage`, `slots`).
    pub slots: usize,
}

/// A class whose XSD identity was already claimed by another class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateClass {
    /// XSD identity both classes carry.
    pub identity: String,
    /// Name of the later class.
    pub class_name: String,
    /// Name of the class that kept the identity.
    pub first: String,
}

/// Classes found in a LinkML file or partition directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkmlCensus {
    /// Classes keyed by XSD identity.
    pub classes: BTreeMap<String, LinkmlClass>,
    /// Classes repeating an identity already in `classes`.
    pub duplicates: Vec<DuplicateClass>,
    /// Number of enums.
    pub enums: usize,
    /// Documents read.
    pub documents: usize,
}

/// Counts the classes of a LinkML file, or of every `*.yaml` file in a
/// directory.
///
/// # Errors
/// Returns `VerifyError` if a file cannot be read or is not a LinkML schema.
pub fn linkml_census(path: &Path) -> Result<LinkmlCensus, VerifyError> {
    let files = if path.is_dir() {
        yaml_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut census = LinkmlCensus::default();
    for file in files {
        let content = fs::read_to_string(&file).map_err(|source| VerifyError::Io {
            path: file.clone(),
            source,
        })?;
        census.add_document(&content, &file)?;
    }
    Ok(census)
}

impl LinkmlCensus {
    /// Adds the classes and enums of one YAML document.
    ///
    /// # Errors
    /// Returns `VerifyError` if the content is not YAML or not a mapping.
    pub fn add_document(&mut self, content: &str, origin: &Path) -> Result<(), VerifyError> {
        let value: Value = serde_yaml::from_str(content).map_err(|source| VerifyError::Yaml {
            path: origin.to_path_buf(),
            source,
        })?;
        let root = value
            .as_mapping()
            .ok_or_else(|| VerifyError::invalid(origin, "top level is not a mapping"))?;
        self.documents += 1;

        if let Some(enums) = root.get("enums").and_then(Value::as_mapping) {
            self.enums += enums.len();
        }

        let Some(classes) = root.get("classes") else {
            return Ok(());
        };
        let classes = match classes {
            Value::Mapping(classes) => classes,
            Value::Null => return Ok(()),
            _ => return Err(VerifyError::invalid(origin, "'classes' is not a mapping")),
        };

        for (name, class) in classes {
            let name = name
                .as_str()
                .ok_or_else(|| VerifyError::invalid(origin, "class name is not a string"))?;
            let empty = Mapping::new();
            let class = class.as_mapping().unwrap_or(&empty);
            let identity = xsd_source(class).unwrap_or_else(|| format!("complexType:{name}"));

            if let Some(first) = self.classes.get(&identity) {
                tracing::warn!(class = name, first = %first.name, %identity, "duplicate class identity");
                self.duplicates.push(DuplicateClass {
                    identity,
                    class_name: name.to_string(),
                    first: first.name.clone(),
                });
                continue;
            }
            self.classes.insert(
                identity,
                LinkmlClass {
                    name: name.to_string(),
                    slots: slot_names(class).len(),
                },
            );
        }
        Ok(())
    }
}

fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>, VerifyError> {
    let entries = fs::read_dir(dir).map_err(|source| VerifyError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| VerifyError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Identity from `annotations.xsd_source`, plain or `{tag, value}` form.
fn xsd_source(class: &Mapping) -> Option<String> {
    let annotation = class
        .get("annotations")
        .and_then(Value::as_mapping)?
        .get(XSD_SOURCE)?;
    match annotation {
        Value::String(value) => Some(value.clone()),
        Value::Mapping(tagged) => tagged.get("value").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn slot_names(class: &Mapping) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for key in ["attributes", "slot_usage"] {
        if let Some(slots) = class.get(key).and_then(Value::as_mapping) {
            names.extend(slots.keys().filter_map(Value::as_str).map(str::to_string));
        }
    }
    if let Some(slots) = class.get("slots").and_then(Value::as_sequence) {
        names.extend(slots.iter().filter_map(Value::as_str).map(str::to_string));
    }
    names
}
