//! Comparison of the two censuses.

use crate::census::{ClassCensus, DuplicateClass, LinkmlCensus, XsdCensus};
use serde::Serialize;
use std::fmt;

/// Comparison options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Tolerates XSD classes missing from the LinkML output, for
    /// element-restricted conversions.
    pub allow_subset: bool,
}

/// One class present on both sides, with its expected and actual field counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassComparison {
    /// XSD identity.
    pub identity: String,
    /// LinkML class name.
    pub class_name: String,
    /// Fields counted in the XSD.
    pub expected: ClassCensus,
    /// Slots counted in the LinkML class.
    pub actual: usize,
}

impl ClassComparison {
    /// Returns true if the slot count equals the XSD field count.
    #[must_use]
    pub const fn agrees(&self) -> bool {
        self.expected.total() == self.actual
    }
}

/// Outcome of a verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Named top-level complex types in the XSD.
    pub complex_types: usize,
    /// Top-level elements in the XSD.
    pub top_level_elements: usize,
    /// Classes expected by the XSD.
    pub xsd_classes: usize,
    /// Classes found in the LinkML output, duplicates included.
    pub linkml_classes: usize,
    /// Every class present on both sides, in identity order.
    pub matched: Vec<ClassComparison>,
    /// Matched classes whose counts differ.
    pub mismatches: Vec<ClassComparison>,
    /// Identities only the XSD declares.
    pub only_in_xsd: Vec<String>,
    /// Identities only the LinkML output declares.
    pub only_in_linkml: Vec<String>,
    /// LinkML classes repeating an identity.
    pub duplicates: Vec<DuplicateClass>,
    /// Whether XSD-only classes are tolerated.
    pub allow_subset: bool,
}

impl VerificationReport {
    /// Returns true if the structures are equivalent.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
            && self.only_in_linkml.is_empty()
            && self.duplicates.is_empty()
            && (self.allow_subset || self.only_in_xsd.is_empty())
    }

    /// Number of classes that keep the report from passing.
    #[must_use]
    pub fn discrepancies(&self) -> usize {
        let missing = if self.allow_subset { 0 } else { self.only_in_xsd.len() };
        self.mismatches.len() + missing + self.only_in_linkml.len() + self.duplicates.len()
    }
}

/// Compares an XSD census with a LinkML census.
#[must_use]
pub fn compare(xsd: &XsdCensus, linkml: &LinkmlCensus, options: &VerifyOptions) -> VerificationReport {
    let mut report = VerificationReport {
        complex_types: xsd.complex_types,
        top_level_elements: xsd.top_level_elements,
        xsd_classes: xsd.classes.len(),
        linkml_classes: linkml.classes.len() + linkml.duplicates.len(),
        duplicates: linkml.duplicates.clone(),
        allow_subset: options.allow_subset,
        ..VerificationReport::default()
    };

    for (identity, expected) in &xsd.classes {
        match linkml.classes.get(identity) {
            Some(class) => {
                let comparison = ClassComparison {
                    identity: identity.clone(),
                    class_name: class.name.clone(),
                    expected: *expected,
                    actual: class.slots,
                };
                if !comparison.agrees() {
                    report.mismatches.push(comparison.clone());
                }
                report.matched.push(comparison);
            }
            None => report.only_in_xsd.push(identity.clone()),
        }
    }
    report.only_in_linkml = linkml
        .classes
        .keys()
        .filter(|identity| !xsd.classes.contains_key(*identity))
        .cloned()
        .collect();

    if report.passed() {
        tracing::info!(matched = report.matched.len(), "structures are equivalent");
    } else {
        tracing::warn!(
            mismatches = report.mismatches.len(),
            only_in_xsd = report.only_in_xsd.len(),
            only_in_linkml = report.only_in_linkml.len(),
            duplicates = report.duplicates.len(),
            "structures differ"
        );
    }
    report
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<28} {:>8}", "XSD complex types", self.complex_types)?;
        writeln!(f, "{:<28} {:>8}", "XSD top-level elements", self.top_level_elements)?;
        writeln!(f, "{:<28} {:>8}", "XSD classes", self.xsd_classes)?;
        writeln!(f, "{:<28} {:>8}", "LinkML classes", self.linkml_classes)?;
        writeln!(f, "{:<28} {:>8}", "matched", self.matched.len())?;
        writeln!(f, "{:<28} {:>8}", "field mismatches", self.mismatches.len())?;

        if !self.matched.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{:<40} {:<24} {:>6} {:>6} {:>6} {:>6}  status",
                "identity", "class", "attrs", "elems", "value", "slots"
            )?;
            for m in &self.matched {
                writeln!(
                    f,
                    "{:<40} {:<24} {:>6} {:>6} {:>6} {:>6}  {}",
                    m.identity,
                    m.class_name,
                    m.expected.attributes,
                    m.expected.elements,
                    m.expected.content,
                    m.actual,
                    if m.agrees() { "ok" } else { "MISMATCH" }
                )?;
            }
            writeln!(f)?;
        }
        for identity in &self.only_in_xsd {
            let note = if self.allow_subset { " (allowed)" } else { "" };
            writeln!(f, "missing in LinkML: {identity}{note}")?;
        }
        for identity in &self.only_in_linkml {
            writeln!(f, "unexpected in LinkML: {identity}")?;
        }
        for d in &self.duplicates {
            writeln!(
                f,
                "duplicate identity in LinkML: {} ({} repeats {})",
                d.identity, d.class_name, d.first
            )?;
        }
        write!(f, "result: {}", if self.passed() { "PASS" } else { "FAIL" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::LinkmlClass;

    fn xsd() -> XsdCensus {
        let mut census = XsdCensus::default();
        census.classes.insert(
            "complexType:Pixels".into(),
            ClassCensus {
                attributes: 2,
                elements: 1,
                content: 0,
            },
        );
        census
            .classes
            .insert("complexType:Channel".into(), ClassCensus::default());
        census
    }

    fn linkml(pixels_slots: usize) -> LinkmlCensus {
        let mut census = LinkmlCensus::default();
        census.classes.insert(
            "complexType:Pixels".into(),
            LinkmlClass {
                name: "Pixels".into(),
                slots: pixels_slots,
            },
        );
        census
    }

    #[test]
    fn test_mismatch_is_reported() {
        let report = compare(&xsd(), &linkml(2), &VerifyOptions::default());
        assert!(!report.passed());
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.mismatches[0].identity, "complexType:Pixels");
        assert_eq!(report.mismatches[0].actual, 2);
        assert_eq!(report.only_in_xsd, vec!["complexType:Channel"]);
        assert_eq!(report.discrepancies(), 2);
        assert!(report.to_string().ends_with("result: FAIL"));
    }

    #[test]
    fn test_every_matched_class_is_listed() {
        let mut census = xsd();
        census.complex_types = 2;
        census.top_level_elements = 0;
        let mut output = linkml(3);
        output.classes.insert(
            "complexType:Channel".into(),
            LinkmlClass {
                name: "Channel".into(),
                slots: 0,
            },
        );
        let report = compare(&census, &output, &VerifyOptions::default());
        assert!(report.passed());
        assert_eq!(report.complex_types, 2);
        assert_eq!(
            report.matched,
            vec![
                ClassComparison {
                    identity: "complexType:Channel".into(),
                    class_name: "Channel".into(),
                    expected: ClassCensus::default(),
                    actual: 0,
                },
                ClassComparison {
                    identity: "complexType:Pixels".into(),
                    class_name: "Pixels".into(),
                    expected: ClassCensus {
                        attributes: 2,
                        elements: 1,
                        content: 0,
                    },
                    actual: 3,
                },
            ]
        );

        let text = report.to_string();
        assert!(text.contains("XSD complex types"));
        assert!(text.contains("XSD top-level elements"));
        let pixels_row = text
            .lines()
            .find(|line| line.starts_with("complexType:Pixels"))
            .expect("Failed to find Pixels row");
        assert!(pixels_row.contains("Pixels"));
        assert!(pixels_row.ends_with("ok"));
        assert!(text.lines().any(|line| line.starts_with("complexType:Channel")));
    }

    #[test]
    fn test_duplicate_identity_fails() {
        let mut output = linkml(3);
        output.duplicates.push(DuplicateClass {
            identity: "complexType:Pixels".into(),
            class_name: "Pixels_2".into(),
            first: "Pixels".into(),
        });
        let options = VerifyOptions { allow_subset: true };
        let report = compare(&xsd(), &output, &options);
        assert!(!report.passed());
        assert_eq!(report.linkml_classes, 2);
        assert_eq!(report.discrepancies(), 1);
        assert!(
            report
                .to_string()
                .contains("duplicate identity in LinkML: complexType:Pixels (Pixels_2 repeats Pixels)")
        );
    }

    #[test]
    fn test_subset_is_tolerated() {
        let options = VerifyOptions { allow_subset: true };
        let report = compare(&xsd(), &linkml(3), &options);
        assert!(report.passed());
        assert!(report.to_string().contains("missing in LinkML: complexType:Channel (allowed)"));
    }

    #[test]
    fn test_unexpected_class_fails() {
        let mut extra = linkml(3);
        extra.classes.insert(
            "complexType:Ghost".into(),
            LinkmlClass {
                name: "Ghost".into(),
                slots: 0,
            },
        );
        let options = VerifyOptions { allow_subset: true };
        let report = compare(&xsd(), &extra, &options);
        assert!(!report.passed());
        assert_eq!(report.only_in_linkml, vec!["complexType:Ghost"]);
    }
}
