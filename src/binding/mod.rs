//! JSON binding module
//!
//! Drives the cursor engine over untyped JSON documents.
//!
//! # Overview
//!
//! Instead of a generated paginator per operation, a single
//! [`PaginatedOperation`] carries the resolved member paths (input token,
//! output token, items, page size) and the end behavior. Requests are
//! copied with only the input token replaced; pages expose the output token
//! and the items found at their paths.

mod operation;
mod path;

pub use operation::{JsonPage, JsonRequest, PageFetcher, PaginatedOperation};
pub use path::FieldPath;
