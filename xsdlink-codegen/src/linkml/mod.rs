//! LinkML document model and generators.

pub mod classes;
pub mod document;
pub mod enums;

pub use classes::{ClassGenerator, XSD_SOURCE};
pub use document::{
    AnnotationValue, ClassDefinition, EnumDefinition, LinkmlSchema, PermissibleValue,
    SlotDefinition, SubsetDefinition,
};
pub use enums::EnumGenerator;
