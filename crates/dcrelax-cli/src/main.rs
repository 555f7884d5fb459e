//! dcrelax CLI
//!
//! Command-line front end for:
//! - Validating denial-constraint files (`dc_v1`)
//! - Listing the attributes a constraint file constrains
//! - Emitting relaxed query templates for repair featurization

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use dcrelax_dsl::dc_v1::parse_dc_v1;
use dcrelax_dsl::digest::dc_digest_v1;
use dcrelax_dsl::{AttributeCatalog, ConstraintSet};
use dcrelax_featurize::{generate_relaxations, RelaxConfig, RelaxationEntry};

mod logging;

#[derive(Parser)]
#[command(name = "dcrelax")]
#[command(
    author,
    version,
    about = "dcrelax: relaxed denial-constraint templates for data repair"
)]
struct Cli {
    /// Log verbosity: -v info, -vv debug, -vvv trace (RUST_LOG overrides)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a constraint file and print a summary.
    Check {
        /// Constraint file (one constraint per line)
        input: PathBuf,
    },

    /// Print constrained attributes, one per line, in first-appearance order.
    Attributes {
        /// Constraint file (one constraint per line)
        input: PathBuf,
    },

    /// Emit one template per (constraint, predicate, tuple side).
    Relax(RelaxArgs),
}

#[derive(Args)]
struct RelaxArgs {
    /// Constraint file (one constraint per line)
    input: PathBuf,

    /// Attribute catalog as a comma-separated list
    #[arg(long, value_delimiter = ',', conflicts_with = "dataset")]
    attributes: Vec<String>,

    /// CSV dataset whose header row is the attribute catalog
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// JSON relaxation config (`index_name`, `pool_alias`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Row-identity column (overrides --config)
    #[arg(long)]
    index_name: Option<String>,

    /// Candidate pool alias (overrides --config)
    #[arg(long)]
    pool_alias: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One template per line
    Text,
    /// Report with digest, config and full entry metadata
    Json,
}

#[derive(Serialize)]
struct RelaxReport<'a> {
    source_digest: String,
    index_name: &'a str,
    pool_alias: &'a str,
    relaxations: &'a [RelaxationEntry],
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Check { input } => cmd_check(&input),
        Commands::Attributes { input } => cmd_attributes(&input),
        Commands::Relax(args) => cmd_relax(&args),
    }
}

fn load_constraints(input: &Path) -> Result<(String, ConstraintSet)> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read `{}`", input.display()))?;
    let set = parse_dc_v1(&text)?;
    tracing::info!(
        path = %input.display(),
        constraints = set.len(),
        predicates = set.predicate_count(),
        "parsed constraints"
    );
    Ok((text, set))
}

fn cmd_check(input: &Path) -> Result<()> {
    println!("{} {}", "Checking".green().bold(), input.display());

    let (text, set) = load_constraints(input)?;

    println!("  Dialect: {}", "dc_v1".cyan());
    println!("  Digest: {}", dc_digest_v1(&text).cyan());
    println!("  Constraints: {}", set.len());
    println!("  Predicates: {}", set.predicate_count());
    for (i, constraint) in set.iter().enumerate() {
        println!(
            "    #{i} (line {}): {}",
            constraint.line(),
            constraint.to_string().yellow()
        );
    }

    println!("{}", "Valid.".green());
    Ok(())
}

fn cmd_attributes(input: &Path) -> Result<()> {
    let (_, set) = load_constraints(input)?;
    for name in set.constrained_attributes() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_relax(args: &RelaxArgs) -> Result<()> {
    let (text, set) = load_constraints(&args.input)?;
    let config = relax_config(args)?;
    let catalog = attribute_catalog(args, &set)?;

    let entries = generate_relaxations(&set, &catalog, &config)?;
    tracing::info!(
        relaxations = entries.len(),
        attributes = catalog.len(),
        "generated relaxations"
    );

    let rendered = match args.format {
        OutputFormat::Text => entries
            .iter()
            .map(|e| format!("{}\n", e.template))
            .collect::<String>(),
        OutputFormat::Json => {
            let report = RelaxReport {
                source_digest: dc_digest_v1(&text),
                index_name: &config.index_name,
                pool_alias: &config.pool_alias,
                relaxations: &entries,
            };
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            json
        }
    };

    match &args.out {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write `{}`", path.display()))?;
            eprintln!(
                "{} {} ({} relaxations)",
                "wrote".green().bold(),
                path.display().to_string().bold(),
                entries.len()
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn relax_config(args: &RelaxArgs) -> Result<RelaxConfig> {
    let mut config = match &args.config {
        Some(path) => RelaxConfig::load(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => RelaxConfig::default(),
    };
    if let Some(index_name) = &args.index_name {
        config.index_name = index_name.clone();
    }
    if let Some(pool_alias) = &args.pool_alias {
        config.pool_alias = pool_alias.clone();
    }
    config.validate()?;
    Ok(config)
}

fn attribute_catalog(args: &RelaxArgs, set: &ConstraintSet) -> Result<AttributeCatalog> {
    if let Some(path) = &args.dataset {
        let file = fs::File::open(path)
            .with_context(|| format!("failed to open dataset `{}`", path.display()))?;
        let mut header = String::new();
        BufReader::new(file)
            .read_line(&mut header)
            .with_context(|| format!("failed to read dataset header `{}`", path.display()))?;
        let catalog = AttributeCatalog::from_csv_header(&header);
        if catalog.is_empty() {
            return Err(anyhow!("dataset `{}` has no header row", path.display()));
        }
        return Ok(catalog);
    }

    if !args.attributes.is_empty() {
        return Ok(AttributeCatalog::new(
            args.attributes
                .iter()
                .map(|a| a.trim())
                .filter(|a| !a.is_empty()),
        ));
    }

    tracing::info!("no attribute catalog given; using the constrained attributes");
    Ok(AttributeCatalog::new(set.constrained_attributes()))
}
