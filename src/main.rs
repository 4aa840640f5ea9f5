mod aggregate;
mod analyze;
mod config;
mod extract;
mod inputs;
mod stats;

use clap::{Parser, Subcommand};
use extract::{DuplicatePolicy, MarkerScanner};
use stats::EmptyPolicy;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Extract named properties from SDF files and report summary statistics
/// (mean, sample standard deviation, descriptive statistics) across files.
#[derive(Parser, Debug)]
#[command(name = "sdfprops", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "sdfprops.toml")]
    config: PathBuf,

    /// Keep the first occurrence of a repeated tag instead of the last
    #[arg(long, global = true)]
    first_wins: bool,

    /// Debug logging (per-file extraction details)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show one property's values and descriptive statistics across files
    #[command(group(
        clap::ArgGroup::new("inputs")
            .required(true)
            .multiple(true)
            .args(["files", "pattern"])
    ))]
    Analyze {
        /// Comma-separated list of SDF files (e.g. a_out.sdf,b_out.sdf)
        #[arg(short = 'f', long = "files", value_name = "PATHS")]
        files: Option<String>,

        /// Glob pattern locating SDF files (e.g. '*_out.sdf')
        #[arg(short = 'r', long = "pattern", value_name = "PATTERN")]
        pattern: Option<String>,

        /// Property to analyze (default: from config, FITNESS)
        #[arg(short = 'p', long = "property")]
        property: Option<String>,

        /// Decimal places in the statistics table (default: from config)
        #[arg(long)]
        precision: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the mean of one property across files
    Mean {
        /// Property tag, e.g. WEIGHT_1
        #[arg(short, long)]
        tag: String,

        /// Treat zero as missing data and leave it out of the mean
        #[arg(long)]
        skip_zeros: bool,

        /// Print 0 instead of failing when no non-zero value remains
        #[arg(long)]
        empty_as_zero: bool,

        /// Decimal places (default: from config)
        #[arg(long)]
        precision: Option<usize>,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Print the sample standard deviation of one property across files
    Stddev {
        /// Property tag, e.g. WEIGHT_4
        #[arg(short, long)]
        tag: String,

        /// Decimal places (default: from config)
        #[arg(long)]
        precision: Option<usize>,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Dump the properties found in each file
    Extract {
        /// Only extract these tags (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
}

/// Filter used when `RUST_LOG` is unset.
fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "sdfprops=debug"
    } else if quiet {
        "sdfprops=error"
    } else {
        "sdfprops=info"
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = default_filter(verbose, quiet);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let cfg = config::load_config(&cli.config).map_err(|e| e.to_string())?;
    let duplicates = if cli.first_wins {
        DuplicatePolicy::FirstWins
    } else {
        cfg.extract.duplicates
    };
    let scanner = MarkerScanner::new();

    match cli.command {
        Commands::Analyze {
            files,
            pattern,
            property,
            precision,
            json,
        } => {
            let paths = inputs::resolve_inputs(files.as_deref(), pattern.as_deref())
                .map_err(|e| e.to_string())?;
            let property = property.unwrap_or(cfg.analyze.property);
            let property = property.trim_matches('\'');
            analyze::handle_analyze(
                &scanner,
                &paths,
                property,
                duplicates,
                precision.unwrap_or(cfg.analyze.precision),
                json,
            )
        }
        Commands::Mean {
            tag,
            skip_zeros,
            empty_as_zero,
            precision,
            files,
        } => {
            let zeros = cfg.aggregate.zero_policy(&tag, skip_zeros);
            let empty = if empty_as_zero {
                EmptyPolicy::Zero
            } else {
                cfg.aggregate.empty_after_filter
            };
            aggregate::handle_mean(
                &scanner,
                &files,
                &tag,
                duplicates,
                zeros,
                empty,
                precision.unwrap_or(cfg.aggregate.precision),
            )
        }
        Commands::Stddev {
            tag,
            precision,
            files,
        } => aggregate::handle_stddev(
            &scanner,
            &files,
            &tag,
            duplicates,
            precision.unwrap_or(cfg.aggregate.precision),
        ),
        Commands::Extract { tag, json, files } => {
            extract::handle_extract(&scanner, &files, &tag, duplicates, json)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    tracing::debug!(?cli, "parsed CLI arguments");

    if let Err(e) = run(cli) {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}
