//! XSD builtin to LinkML range mapping.

use indexmap::IndexMap;

/// LinkML range for an XSD builtin type, by local name.
///
/// Builtins without a closer LinkML type fall back to `string`.
#[must_use]
pub fn builtin_range(builtin: &str) -> &'static str {
    match builtin {
        "boolean" => "boolean",
        "decimal" | "double" | "float" => "float",
        "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
        | "positiveInteger" | "nonPositiveInteger" | "negativeInteger" | "unsignedLong"
        | "unsignedInt" | "unsignedShort" | "unsignedByte" => "integer",
        "dateTime" | "dateTimeStamp" => "datetime",
        "date" => "date",
        "time" => "time",
        "anyURI" => "uri",
        _ => "string",
    }
}

/// Range table with per-builtin overrides.
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    overrides: IndexMap<String, String>,
}

impl RangeTable {
    /// Creates a table applying `overrides` before the builtin mapping.
    #[must_use]
    pub fn new(overrides: &IndexMap<String, String>) -> Self {
        Self {
            overrides: overrides.clone(),
        }
    }

    /// LinkML range for a builtin.
    #[must_use]
    pub fn resolve(&self, builtin: &str) -> String {
        self.overrides
            .get(builtin)
            .cloned()
            .unwrap_or_else(|| builtin_range(builtin).to_string())
    }
}
