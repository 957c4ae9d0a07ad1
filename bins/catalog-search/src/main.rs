//! catalog-search - search the guitar catalog from the terminal
//!
//! Loads the composer and work corpora once and searches them locally,
//! tolerating typos.

use catalog_core::config::Config;
use catalog_core::error::{Error, ErrorCode, exit_codes};
use catalog_search::SearchError;
use catalog_telemetry::TelemetryConfig;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;
mod progress;

use commands::Context;
use commands::search::{ComposerFilterArgs, WorkFilterArgs};
use output::{OutputFormat, Status};

/// Typo-tolerant search over the guitar catalog
#[derive(Parser)]
#[command(name = "catalog-search")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Configuration file (searched for in the usual places when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root of the catalog REST API, overriding configuration and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search composers by name or country
    Composers {
        /// Search text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<NonZeroUsize>,

        #[command(flatten)]
        filter: ComposerFilterArgs,
    },

    /// Search works by title, composer, instrumentation or catalog number
    Works {
        /// Search text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<NonZeroUsize>,

        #[command(flatten)]
        filter: WorkFilterArgs,
    },

    /// Search composers and works together
    All {
        /// Search text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum number of results per section
        #[arg(short, long)]
        limit: Option<NonZeroUsize>,
    },

    /// Load both corpora and report sizes, load times and catalog breakdowns
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return fail(cli.format, &e, exit_codes::CONFIG_ERROR),
    };

    let level = if cli.verbose {
        "catalog_search=debug,catalog_api_client=debug,catalog_core=debug".to_string()
    } else {
        config.schema.logging.level.clone()
    };
    let telemetry = TelemetryConfig::default()
        .with_level(level)
        .with_json(config.schema.logging.json);
    if let Err(e) = catalog_telemetry::init_with_config(telemetry) {
        Status::warning(&format!("logging disabled: {e}"));
    }

    let ctx = match Context::new(&config, cli.api_url.as_deref(), cli.format) {
        Ok(ctx) => ctx,
        Err(e) => {
            let err = Error::config_invalid(format!("{e:#}"));
            return fail(cli.format, &err, exit_codes::CONFIG_ERROR);
        }
    };

    let result = match cli.command {
        Commands::Composers { query, limit, filter } => {
            commands::search::composers(&ctx, &query.join(" "), limit, &filter.to_filter()).await
        }
        Commands::Works { query, limit, filter } => {
            commands::search::works(&ctx, &query.join(" "), limit, &filter.to_filter()).await
        }
        Commands::All { query, limit } => commands::search::all(&ctx, &query.join(" "), limit).await,
        Commands::Stats => commands::stats::run(&ctx).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<SearchError>() {
            Some(err) if !err.failed_kinds().is_empty() => {
                fail(cli.format, &load_failure(err), exit_codes::BACKEND_ERROR)
            }
            _ => fail(
                cli.format,
                &Error::new(ErrorCode::Unknown, format!("{e:#}")),
                exit_codes::FAILURE,
            ),
        },
    }
}

/// Report `err` in the selected format and turn `code` into an exit status.
///
/// JSON output goes to stdout as an [`catalog_core::error::ErrorReport`] so
/// scripts can parse failures the same way as results.
fn fail(format: OutputFormat, err: &Error, code: i32) -> ExitCode {
    match format {
        OutputFormat::Text => eprintln!("{} {}", "Error:".red().bold(), err),
        OutputFormat::Json => {
            if let Err(e) = output::print_json(&err.to_report()) {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
        }
    }
    exit(code)
}

fn load_failure(err: &SearchError) -> Error {
    let kinds: Vec<String> = err.failed_kinds().iter().map(ToString::to_string).collect();
    let base = if err.is_retryable() {
        Error::backend_unavailable(err.to_string())
    } else {
        Error::new(ErrorCode::NetworkError, err.to_string())
    };
    base.with_context(format!("loading the {} corpus", kinds.join(" and ")))
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
