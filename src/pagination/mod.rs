//! Pagination module
//!
//! Cursor threading for paged operations.
//!
//! # Overview
//!
//! A paged operation is driven by three pieces of data fixed at setup time:
//! the request's input token, the response's output token and one
//! [`EndBehavior`]. [`paginate`] turns those plus a page-fetch function into
//! a lazy [`Pages`] stream; [`paginate_blocking`] does the same for
//! synchronous fetch functions. Both can be flattened into the items each
//! page carries.
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//!
//! let pages = paginate(request, EndBehavior::OutputTokenEmpty, |req| client.list(req));
//! let items: Vec<_> = pages.items(|page| page.items).try_collect().await?;
//! ```

mod iter;
mod stream;
mod types;

pub use iter::{paginate_blocking, ItemIter, PageIter};
pub use stream::{paginate, Items, Pages};
pub use types::{Cursor, CursorRequest, CursorResponse, CursorState, EndBehavior, StopResult};

#[cfg(test)]
mod tests;
