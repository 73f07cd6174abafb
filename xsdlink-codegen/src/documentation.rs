//! Metadata carried in documentation text and `appinfo`.
//!
//! NBO schemas annotate types with `key=value` lines inside their
//! documentation. Those lines are lifted out of the description into
//! subsets and annotations.

use crate::linkml::AnnotationValue;
use indexmap::IndexMap;

/// Keys whose values become `<key>_<value>` subsets.
const SUBSET_KEYS: [&str; 3] = ["domain", "category", "extension"];

/// Description and metadata split out of a documentation string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocMetadata {
    /// Remaining free text.
    pub description: Option<String>,
    /// Subset names, in first-seen order.
    pub subsets: Vec<String>,
    /// Other `key=value` pairs.
    pub annotations: IndexMap<String, AnnotationValue>,
}

/// Splits `key=value` lines out of documentation text.
///
/// `description=...` lines stay part of the description; `tier` values map
/// to `NBO_Tier<N>` subsets.
#[must_use]
pub fn split_documentation(text: Option<&str>) -> DocMetadata {
    let mut meta = DocMetadata::default();
    let Some(text) = text else {
        return meta;
    };

    let mut description: Vec<&str> = Vec::new();
    let mut pairs: IndexMap<String, Vec<String>> = IndexMap::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.split_once('=') {
            Some((key, value)) if is_key(key.trim()) => {
                let key = key.trim();
                let value = value.trim();
                if key.eq_ignore_ascii_case("description") {
                    description.push(value);
                } else {
                    pairs.entry(key.to_string()).or_default().push(value.to_string());
                }
            }
            _ => description.push(line),
        }
    }

    let joined = description.join("\n");
    meta.description = (!joined.trim().is_empty()).then(|| joined.trim().to_string());

    for (key, values) in pairs {
        let lower = key.to_ascii_lowercase();
        if lower == "tier" {
            for token in values.iter().flat_map(|v| v.split([',', ' '])) {
                if let Some(subset) = tier_subset(token.trim()) {
                    push_unique(&mut meta.subsets, subset);
                }
            }
        } else if SUBSET_KEYS.contains(&lower.as_str()) {
            for value in &values {
                let subset = subset_name(&format!("{key}_{value}"));
                if !subset.is_empty() {
                    push_unique(&mut meta.subsets, subset);
                }
            }
        } else {
            let mut deduped: Vec<String> = Vec::new();
            for value in values.into_iter().filter(|v| !v.is_empty()) {
                push_unique(&mut deduped, value);
            }
            if let Some(value) = AnnotationValue::from_values(deduped) {
                meta.annotations.insert(key, value);
            }
        }
    }

    meta
}

/// Folds `appinfo` entries into annotations, merging repeated names.
pub fn merge_appinfo(annotations: &mut IndexMap<String, AnnotationValue>, appinfo: &[(String, String)]) {
    for (name, value) in appinfo {
        let value = if value.trim().is_empty() {
            "true".to_string()
        } else {
            value.trim().to_string()
        };
        match annotations.get_mut(name) {
            Some(existing) => existing.push(value),
            None => {
                annotations.insert(name.clone(), AnnotationValue::Single(value));
            }
        }
    }
}

fn is_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

fn tier_subset(token: &str) -> Option<String> {
    match token {
        "1" | "2" | "3" => Some(format!("NBO_Tier{token}")),
        _ => None,
    }
}

/// Collapses runs of non-NCName characters into `_`.
fn subset_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
