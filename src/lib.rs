// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # smithy-paginator
//!
//! A generic cursor-pagination engine for operations described by Smithy
//! models, plus the plumbing to run it against a live JSON service.
//!
//! ## Features
//!
//! - **Lazy Pagination**: Cold, pull-driven page sequences as a `Stream` or an `Iterator`
//! - **End Behaviors**: Empty token, repeated token, or a boolean truncation member
//! - **Item Projection**: Flatten pages into their items
//! - **Smithy Models**: Resolve `smithy.api#paginated` traits, including service defaults
//! - **HTTP Transport**: AWS JSON protocol client with retry and rate limiting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use smithy_paginator::{load_config, load_model, EndBehavior, PageFetcher, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let model = load_model("model.json")?;
//!     let config = load_config("paginator.yaml")?;
//!
//!     let operation = Arc::new(model.resolve("ListObjects", EndBehavior::OutputTokenEmpty)?);
//!     let fetcher: Arc<dyn PageFetcher> = Arc::new(config.operation_client()?);
//!
//!     let input = operation.prepare_input(serde_json::json!({"Bucket": "logs"}), Some(100))?;
//!     let pages: Vec<_> = operation.paginate_with(fetcher, input).try_collect().await?;
//!     println!("fetched {} pages", pages.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          CLI                               │
//! │   operations    validate    pages    items                 │
//! └────────────────────────────────────────────────────────────┘
//!                              │
//! ┌────────────┬───────────────┴──┬──────────────┬────────────┐
//! │   Model    │     Binding      │  Pagination  │    HTTP    │
//! ├────────────┼──────────────────┼──────────────┼────────────┤
//! │ JSON AST   │ Member paths     │ CursorState  │ Retry      │
//! │ Traits     │ JSON pages       │ Stream       │ Rate limit │
//! │ Resolution │ Page fetcher     │ Iterator     │ X-Amz-Target│
//! └────────────┴──────────────────┴──────────────┴────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Generic cursor pagination engine
pub mod pagination;

/// JSON binding of the engine
pub mod binding;

/// Smithy model loading and paginated trait resolution
pub mod model;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Runtime configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use binding::{FieldPath, JsonPage, JsonRequest, PageFetcher, PaginatedOperation};
pub use config::{load_config, load_config_from_str, RuntimeConfig};
pub use model::{load_model, SmithyModel};
pub use pagination::{
    paginate, paginate_blocking, Cursor, CursorRequest, CursorResponse, EndBehavior,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
