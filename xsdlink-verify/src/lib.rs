//! # xsdlink Verify
//!
//! Structural equivalence verification between an XSD and its LinkML
//! translation.
//!
//! This crate provides:
//! - An XSD census computed from the raw documents, not the normalized model
//! - A LinkML census over a single file or a partition directory
//! - A comparison report listing every matched class and its field counts

pub mod census;
pub mod error;
pub mod report;

pub use census::{
    ClassCensus, DuplicateClass, LinkmlCensus, LinkmlClass, XsdCensus, census_documents,
    linkml_census, xsd_census,
};
pub use error::VerifyError;
pub use report::{ClassComparison, VerificationReport, VerifyOptions, compare};

use std::path::Path;

/// Verifies a generated LinkML file or partition directory against its XSD.
///
/// # Arguments
/// * `xsd_path` - Root XSD file
/// * `linkml_path` - Generated YAML file or partition directory
/// * `options` - Comparison options
///
/// # Errors
/// Returns `VerifyError` if either side cannot be read.
pub fn verify(
    xsd_path: &Path,
    linkml_path: &Path,
    options: &VerifyOptions,
) -> Result<VerificationReport, VerifyError> {
    let xsd = xsd_census(xsd_path)?;
    let linkml = linkml_census(linkml_path)?;
    Ok(compare(&xsd, &linkml, options))
}
