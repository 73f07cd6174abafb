//! Converting and verifying every XSD file of a directory.

use crate::error::Error;
use crate::{GeneratorConfig, VerificationReport, VerifyOptions, convert};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one input file.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// Converted and verified.
    Verified {
        /// Classes generated.
        classes: usize,
        /// Enums generated.
        enums: usize,
        /// Naming collisions resolved.
        warnings: usize,
    },
    /// Converted, but the verifier found differences.
    Mismatch(VerificationReport),
    /// Conversion or verification failed.
    Failed(String),
}

/// One input file and its outcome.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    /// XSD file.
    pub input: PathBuf,
    /// YAML file or partition directory.
    pub output: PathBuf,
    /// Outcome.
    pub outcome: BatchOutcome,
}

/// Outcomes of a batch run, in file name order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Processed files.
    pub entries: Vec<BatchEntry>,
}

impl BatchSummary {
    /// Returns true if every file converted and verified.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures() == 0
    }

    /// Number of files that did not verify.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !matches!(e.outcome, BatchOutcome::Verified { .. }))
            .count()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<32} {:>8} {:>6} {:>9}  status",
            "schema", "classes", "enums", "renamed"
        )?;
        for entry in &self.entries {
            let name = entry
                .input
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
            match &entry.outcome {
                BatchOutcome::Verified {
                    classes,
                    enums,
                    warnings,
                } => writeln!(f, "{name:<32} {classes:>8} {enums:>6} {warnings:>9}  ok")?,
                BatchOutcome::Mismatch(report) => writeln!(
                    f,
                    "{name:<32} {:>8} {:>6} {:>9}  mismatch ({} classes differ)",
                    report.linkml_classes,
                    "-",
                    "-",
                    report.discrepancies()
                )?,
                BatchOutcome::Failed(message) => {
                    writeln!(f, "{name:<32} {:>8} {:>6} {:>9}  error: {message}", "-", "-", "-")?;
                }
            }
        }
        write!(
            f,
            "{} schemas, {} failed",
            self.entries.len(),
            self.failures()
        )
    }
}

/// Converts and verifies every `*.xsd` file directly inside `input_dir`.
///
/// A failing file is recorded and the batch continues. Outputs are
/// `<stem>.yaml`, or a `<stem>/` directory in partition mode.
///
/// # Errors
/// Returns `Error::Io` only if a directory cannot be read or created.
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    config: &GeneratorConfig,
) -> Result<BatchSummary, Error> {
    let mut inputs = Vec::new();
    let entries = fs::read_dir(input_dir).map_err(|source| Error::io(input_dir, source))?;
    for entry in entries {
        let path = entry.map_err(|source| Error::io(input_dir, source))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "xsd") {
            inputs.push(path);
        }
    }
    inputs.sort();
    fs::create_dir_all(output_dir).map_err(|source| Error::io(output_dir, source))?;

    let options = VerifyOptions {
        allow_subset: config.elements.is_some(),
    };
    let mut summary = BatchSummary::default();
    for input in inputs {
        let stem = input
            .file_stem()
            .map_or_else(|| "schema".into(), |s| s.to_string_lossy().into_owned());
        let output = if config.partition {
            output_dir.join(&stem)
        } else {
            output_dir.join(format!("{stem}.yaml"))
        };

        tracing::info!(input = %input.display(), "converting");
        let outcome = match convert_and_verify(&input, &output, config, &options) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(input = %input.display(), error = %err, "conversion failed");
                BatchOutcome::Failed(err.to_string())
            }
        };
        summary.entries.push(BatchEntry {
            input,
            output,
            outcome,
        });
    }
    Ok(summary)
}

fn convert_and_verify(
    input: &Path,
    output: &Path,
    config: &GeneratorConfig,
    options: &VerifyOptions,
) -> Result<BatchOutcome, Error> {
    let conversion = convert(input, output, config)?;
    let report = xsdlink_verify::verify(input, output, options)?;
    if !report.passed() {
        return Ok(BatchOutcome::Mismatch(report));
    }
    Ok(BatchOutcome::Verified {
        classes: conversion.generated.schema.classes.len(),
        enums: conversion.generated.schema.enums.len(),
        warnings: conversion.generated.warnings.len(),
    })
}
