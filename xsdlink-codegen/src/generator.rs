//! Main LinkML generator.

use crate::closure::{Closure, dependency_closure};
use crate::config::{GeneratorConfig, SchemaMetadata};
use crate::error::{CodegenError, NamingCollisionWarning};
use crate::linkml::{ClassGenerator, EnumGenerator, LinkmlSchema, SubsetDefinition};
use crate::naming::NameTable;
use crate::partition::{LINKML_TYPES, partition};
use crate::ranges::RangeTable;
use std::fs;
use std::path::{Path, PathBuf};
use xsdlink_schema::{SchemaModel, detect_identifiers};

/// Range used by slots that do not declare one.
pub const DEFAULT_RANGE: &str = "string";

/// Main LinkML generator.
pub struct Generator<'a> {
    model: &'a SchemaModel,
    config: &'a GeneratorConfig,
}

impl<'a> Generator<'a> {
    /// Creates a new generator.
    ///
    /// # Arguments
    /// * `model` - Normalized model
    /// * `config` - Metadata overrides and output options
    #[must_use]
    pub fn new(model: &'a SchemaModel, config: &'a GeneratorConfig) -> Self {
        Self { model, config }
    }

    /// Generates the complete LinkML schema.
    ///
    /// Every class and enum is built before anything is returned, so a
    /// failure never leaves a partial document behind.
    ///
    /// # Errors
    /// Returns `CodegenError::UnknownElement` for an unknown `elements`
    /// entry, or `CodegenError::UnresolvedRange` for an unmappable field.
    pub fn generate(&self) -> Result<GeneratedSchema, CodegenError> {
        let metadata = SchemaMetadata::derive(self.model.target_namespace.as_deref(), self.config);

        let closure = match &self.config.elements {
            Some(elements) if !elements.is_empty() => dependency_closure(self.model, elements)?,
            _ => Closure::full(self.model),
        };
        let marks = detect_identifiers(self.model, &self.config.identifier_policy);
        let names = NameTable::build(self.model, &closure);
        let ranges = RangeTable::new(&self.config.range_overrides);

        let mut schema = LinkmlSchema {
            id: metadata.id,
            name: metadata.name,
            title: metadata.title,
            description: metadata.description,
            license: metadata.license,
            version: metadata.version,
            prefixes: metadata.prefixes,
            default_prefix: metadata.default_prefix,
            default_range: Some(DEFAULT_RANGE.to_string()),
            imports: vec![LINKML_TYPES.to_string()],
            ..LinkmlSchema::default()
        };

        let classes = ClassGenerator::new(
            self.model,
            &names,
            &ranges,
            &marks,
            &schema.default_prefix,
        );
        let mut generated = Vec::with_capacity(closure.types.len());
        for id in &closure.types {
            let name = names
                .class(*id)
                .map_or_else(|| self.model[*id].name.clone(), str::to_string);
            generated.push((name, classes.generate(*id)?));
        }
        schema.classes.extend(generated);

        let enums = EnumGenerator::new(self.model);
        for id in &closure.enums {
            let name = names
                .enumeration(*id)
                .map_or_else(|| self.model[*id].name.clone(), str::to_string);
            schema.enums.insert(name, enums.generate(*id));
        }

        declare_subsets(&mut schema);

        tracing::info!(
            classes = schema.classes.len(),
            enums = schema.enums.len(),
            identifiers = marks.len(),
            "generated LinkML schema"
        );

        Ok(GeneratedSchema {
            schema,
            warnings: names.into_warnings(),
            partition: self.config.partition,
        })
    }
}

/// Declares every subset used by a class or slot.
fn declare_subsets(schema: &mut LinkmlSchema) {
    let used: Vec<String> = schema
        .classes
        .values()
        .flat_map(|class| {
            class.in_subset.iter().chain(
                class
                    .attributes
                    .values()
                    .chain(class.slot_usage.values())
                    .flat_map(|slot| slot.in_subset.iter()),
            )
        })
        .cloned()
        .collect();

    for name in used {
        if schema.subsets.contains_key(&name) {
            continue;
        }
        let description = match name.strip_prefix("NBO_Tier") {
            Some(tier) => format!("NBO tier {tier} elements"),
            None => format!("Elements tagged {name} in their documentation"),
        };
        schema.subsets.insert(name, SubsetDefinition { description });
    }
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedSchema {
    /// Complete schema document.
    pub schema: LinkmlSchema,
    /// Names changed to avoid collisions.
    pub warnings: Vec<NamingCollisionWarning>,
    /// Whether [`GeneratedSchema::write`] partitions the output.
    pub partition: bool,
}

impl GeneratedSchema {
    /// Serializes the schema as a single YAML document.
    ///
    /// # Errors
    /// Returns `CodegenError::Yaml` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, CodegenError> {
        Ok(serde_yaml::to_string(&self.schema)?)
    }

    /// Writes the schema as one YAML file.
    ///
    /// # Errors
    /// Returns `CodegenError` if serialization or writing fails.
    pub fn write_single(&self, path: &Path) -> Result<(), CodegenError> {
        let yaml = self.to_yaml()?;
        write_atomic(path, &yaml)?;
        tracing::info!(path = %path.display(), "wrote LinkML schema");
        Ok(())
    }

    /// Writes one YAML file per class plus an index file into `dir`.
    ///
    /// All documents are serialized before the first file is written. YAML
    /// files left in `dir` by an earlier run are removed once the new files
    /// are in place.
    ///
    /// # Returns
    /// Paths of the written files, index last.
    ///
    /// # Errors
    /// Returns `CodegenError` if serialization or writing fails.
    pub fn write_partitioned(&self, dir: &Path) -> Result<Vec<PathBuf>, CodegenError> {
        let rendered = partition(&self.schema)
            .into_iter()
            .map(|file| -> Result<(PathBuf, String), CodegenError> {
                Ok((dir.join(&file.file_name), serde_yaml::to_string(&file.schema)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(rendered.len());
        for (path, yaml) in rendered {
            write_atomic(&path, &yaml)?;
            written.push(path);
        }
        remove_stale(dir, &written)?;
        tracing::info!(dir = %dir.display(), files = written.len(), "wrote partitioned LinkML schema");
        Ok(written)
    }

    /// Writes single or partitioned output depending on the configuration.
    ///
    /// # Errors
    /// Returns `CodegenError` if serialization or writing fails.
    pub fn write(&self, path: &Path) -> Result<Vec<PathBuf>, CodegenError> {
        if self.partition {
            self.write_partitioned(path)
        } else {
            self.write_single(path)?;
            Ok(vec![path.to_path_buf()])
        }
    }
}

/// Removes `*.yaml` and `*.yml` files in `dir` that are not in `keep`.
fn remove_stale(dir: &Path, keep: &[PathBuf]) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if yaml && path.is_file() && !keep.contains(&path) {
            tracing::debug!(path = %path.display(), "removing stale partition file");
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Writes through a temporary sibling file and renames it into place.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}
