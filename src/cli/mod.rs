//! CLI module
//!
//! Command-line interface for inspecting models and paging live services.
//!
//! # Commands
//!
//! - `operations` - List paginated operations
//! - `validate` - Resolve every paginated operation against the model
//! - `pages` - Fetch and print output documents
//! - `items` - Fetch and print projected items

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, RunArgs};
pub use runner::Runner;
