use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use rol_to_csv::{
    ExtractError, ExtractOptions, ExtractionReport, HeaderMatch, OutputEncoding, PageSelection,
    Vocabulary, extract_rol_to_archive, extract_rol_to_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "rol2csv",
    version,
    about = "Extract the ANS Rol de Procedimentos table into a normalized CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the procedure table and write the merged, normalized CSV.
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path.
    #[arg(short, long)]
    output: PathBuf,

    /// Also package the dataset into this zip archive.
    #[arg(long)]
    zip: Option<PathBuf>,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Output delimiter character.
    #[arg(long, default_value = ";")]
    delimiter: char,

    /// Output encoding: utf8-bom, utf8 or windows1252.
    #[arg(long, default_value = "utf8-bom")]
    encoding: String,

    /// JSON file mapping legend abbreviations to expansions.
    #[arg(long)]
    vocabulary: Option<PathBuf>,

    /// Minimum cells required per candidate table row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,

    /// Treat a continuation header as repeated even with stray outer whitespace.
    #[arg(long)]
    trim_headers: bool,

    /// Print the extraction report as JSON on stdout.
    #[arg(long)]
    report_json: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(ExtractError::InvalidPageSelection)
        .context("failed to parse --pages")?;

    let encoding = OutputEncoding::from_str(&args.encoding)
        .map_err(|error| anyhow!("invalid --encoding: {error}"))?;

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let vocabulary = match &args.vocabulary {
        Some(path) => Vocabulary::from_json_file(path)
            .with_context(|| format!("failed to load vocabulary '{}'", path.display()))?,
        None => Vocabulary::ans_coverage_legend(),
    };

    let header_match = if args.trim_headers {
        HeaderMatch::IgnoreOuterWhitespace
    } else {
        HeaderMatch::Exact
    };

    Ok(ExtractOptions {
        pages,
        delimiter: args.delimiter as u8,
        encoding,
        vocabulary,
        min_cols: args.min_cols,
        header_match,
    })
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?} row={:?} confidence={:?}: {}",
                warning.code, warning.page, warning.row, warning.confidence, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    let report = match &args.zip {
        Some(zip_path) => extract_rol_to_archive(&args.input, &args.output, zip_path, &options),
        None => extract_rol_to_csv(&args.input, &args.output, &options),
    }
    .with_context(|| format!("failed to extract table from '{}'", args.input.display()))?;
    Ok(report)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rol_to_csv=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if args.report_json {
                    match serde_json::to_string_pretty(&report) {
                        Ok(json) => println!("{json}"),
                        Err(error) => eprintln!("error: failed to serialize report: {error}"),
                    }
                }
                if report.row_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
