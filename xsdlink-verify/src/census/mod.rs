//! Independent structure counts of both sides of a conversion.

pub mod linkml;
pub mod xsd;

pub use linkml::{DuplicateClass, LinkmlCensus, LinkmlClass, linkml_census};
pub use xsd::{ClassCensus, XsdCensus, census_documents, xsd_census};
