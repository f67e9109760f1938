//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pages through paginated operations of a Smithy model
#[derive(Parser, Debug)]
#[command(name = "smithy-paginator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Smithy model file (JSON AST)
    #[arg(short, long, global = true)]
    pub model: Option<PathBuf>,

    /// Runtime configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List paginated operations and their member paths
    Operations,

    /// Resolve every paginated operation and report configuration errors
    Validate,

    /// Fetch pages and print each output document
    Pages(RunArgs),

    /// Fetch pages and print each item
    Items(RunArgs),
}

/// Arguments shared by the commands that fetch pages
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Operation name or absolute shape ID
    #[arg(short, long)]
    pub operation: String,

    /// Inline input document (JSON object)
    #[arg(long)]
    pub input_json: Option<String>,

    /// Page size written into every request (overrides the config)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Maximum pages to fetch, 0 for no limit (overrides the config)
    #[arg(long)]
    pub max_pages: Option<usize>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
