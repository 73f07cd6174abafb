//! `xsdlink` command line: convert, verify and batch.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use xsdlink::{GeneratorConfig, VerifyOptions};

/// Convert XML Schema into LinkML and verify the translation
#[derive(Parser, Debug)]
#[command(name = "xsdlink", version)]
struct Cli {
    /// raise log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// convert one XSD file into LinkML YAML
    Convert(ConvertArgs),
    /// compare an XSD with a generated LinkML file or partition directory
    Verify(VerifyArgs),
    /// convert and verify every *.xsd file of a directory
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// root XSD file
    xsd: PathBuf,

    /// output YAML file, or directory with --partition
    #[arg(short, long)]
    output: PathBuf,

    /// schema id URL
    #[arg(long)]
    schema_id: Option<String>,

    /// schema name
    #[arg(long)]
    name: Option<String>,

    /// schema title
    #[arg(long)]
    title: Option<String>,

    /// default prefix
    #[arg(long)]
    default_prefix: Option<String>,

    /// extra prefix as key=URI (repeatable)
    #[arg(long = "prefix", value_parser = parse_prefix)]
    prefixes: Vec<(String, String)>,

    /// restrict output to these top-level elements and their dependencies
    #[arg(long, value_delimiter = ',')]
    elements: Vec<String>,

    /// write one file per class plus an index file
    #[arg(long, default_value_t = false)]
    partition: bool,

    /// also write the intermediate model as JSON
    #[arg(long)]
    dump_model: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// root XSD file
    xsd: PathBuf,

    /// generated YAML file or partition directory
    linkml: PathBuf,

    /// tolerate XSD classes missing from the output
    #[arg(long, default_value_t = false)]
    allow_subset: bool,

    /// print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// directory holding the XSD files
    dir: PathBuf,

    /// output directory
    #[arg(short, long)]
    output: PathBuf,

    /// write one directory per schema with one file per class
    #[arg(long, default_value_t = false)]
    partition: bool,
}

fn parse_prefix(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((prefix, uri)) if !prefix.trim().is_empty() && !uri.trim().is_empty() => {
            Ok((prefix.trim().to_string(), uri.trim().to_string()))
        }
        _ => Err(format!("expected key=URI, got '{raw}'")),
    }
}

impl ConvertArgs {
    fn config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::new().with_partition(self.partition);
        config.schema_id = self.schema_id.clone();
        config.name = self.name.clone();
        config.title = self.title.clone();
        config.default_prefix = self.default_prefix.clone();
        for (prefix, uri) in &self.prefixes {
            config = config.with_prefix(prefix, uri);
        }
        if !self.elements.is_empty() {
            config = config.with_elements(self.elements.iter().map(|e| e.trim().to_string()));
        }
        config
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn convert(args: &ConvertArgs) -> Result<ExitCode> {
    let config = args.config();
    let model = xsdlink::parse_schema_file(&args.xsd)
        .with_context(|| format!("failed to load {}", args.xsd.display()))?;
    if let Some(path) = &args.dump_model {
        xsdlink::write_model_json(&model, path)?;
    }
    let conversion = xsdlink::convert_model(&model, &args.output, &config)
        .with_context(|| format!("failed to convert {}", args.xsd.display()))?;

    for warning in &conversion.generated.warnings {
        eprintln!("warning: {warning}");
    }
    for path in &conversion.written {
        println!("wrote {}", path.display());
    }
    let schema = &conversion.generated.schema;
    println!(
        "{} classes, {} enums, {} renamed -> {}",
        schema.classes.len(),
        schema.enums.len(),
        conversion.generated.warnings.len(),
        args.output.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn verify(args: &VerifyArgs) -> Result<ExitCode> {
    let options = VerifyOptions {
        allow_subset: args.allow_subset,
    };
    let report = xsdlink_verify::verify(&args.xsd, &args.linkml, &options)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn batch(args: &BatchArgs) -> Result<ExitCode> {
    let config = GeneratorConfig::new().with_partition(args.partition);
    let summary = xsdlink::run_batch(&args.dir, &args.output, &config)?;
    println!("{summary}");
    Ok(if summary.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Command::Convert(args) => convert(args),
        Command::Verify(args) => verify(args),
        Command::Batch(args) => batch(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
