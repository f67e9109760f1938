//! Pagination types and traits
//!
//! Defines the core cursor abstractions used by the page stream and the
//! blocking page iterator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

// ============================================================================
// Cursor
// ============================================================================

/// A continuation token returned by a paged operation
///
/// Tokens are opaque to the engine. It only needs to copy them, compare
/// them with the token that produced the current page, and tell whether
/// a token is blank (an empty string or an empty collection).
pub trait Cursor: Clone + PartialEq + Debug {
    /// Whether this token carries no continuation information
    fn is_blank(&self) -> bool;
}

impl Cursor for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Clone + PartialEq + Debug> Cursor for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Cursor for HashMap<K, V>
where
    K: Clone + Eq + Hash + Debug,
    V: Clone + PartialEq + Debug,
{
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Cursor for BTreeMap<K, V>
where
    K: Clone + Ord + Debug,
    V: Clone + PartialEq + Debug,
{
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Cursor for Value {
    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }
}

// ============================================================================
// Request / Response seams
// ============================================================================

/// A paged operation's input
///
/// The engine never mutates the caller's request. Every page is fetched
/// with a copy produced by [`CursorRequest::with_cursor`], which must
/// leave every other field identical.
pub trait CursorRequest {
    /// Token type carried in the request
    type Cursor: Cursor;

    /// The cursor currently set on this request (absent = first page)
    fn cursor(&self) -> Option<&Self::Cursor>;

    /// Copy of this request with only the cursor replaced
    #[must_use]
    fn with_cursor(&self, cursor: Option<Self::Cursor>) -> Self
    where
        Self: Sized;
}

/// A paged operation's output
pub trait CursorResponse {
    /// Token type returned in the response
    type Cursor: Cursor;

    /// Follow the output token path; `None` if any step is missing
    fn next_cursor(&self) -> Option<Self::Cursor>;

    /// Read a named boolean member, used by [`EndBehavior::TruncationMember`]
    fn member_flag(&self, _member: &str) -> Option<bool> {
        None
    }
}

// ============================================================================
// End Behavior
// ============================================================================

/// Rule deciding when a paginated sequence has no more pages
///
/// Exactly one behavior is attached to a paged operation when it is set up.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndBehavior {
    /// Continue while the next token is present and non-blank
    #[default]
    OutputTokenEmpty,

    /// Continue while the next token is present and differs from the token
    /// that was sent for the page just fetched
    IdenticalToken,

    /// Continue while the named boolean member of the output is `true`
    TruncationMember {
        /// Output member holding the truncation flag (e.g. "IsTruncated")
        member: String,
    },
}

impl EndBehavior {
    /// Create a truncation-member behavior
    pub fn truncation_member(member: impl Into<String>) -> Self {
        Self::TruncationMember {
            member: member.into(),
        }
    }

    /// Decide whether another page should be fetched
    ///
    /// `used` is the token sent with the request that produced this page,
    /// `next` the token read from its output and `flag` reads a boolean
    /// member off the output.
    pub fn decide<C, F>(&self, used: Option<&C>, next: Option<&C>, flag: F) -> StopResult
    where
        C: Cursor,
        F: FnOnce(&str) -> Option<bool>,
    {
        let proceed = match self {
            Self::OutputTokenEmpty => next.is_some_and(|token| !token.is_blank()),
            Self::IdenticalToken => next.is_some_and(|token| used != Some(token)),
            Self::TruncationMember { member } => flag(member) == Some(true),
        };

        if proceed {
            StopResult::Continue
        } else {
            StopResult::Stop
        }
    }
}

/// Result of checking the end behavior after a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopResult {
    /// Continue pagination
    Continue,
    /// Stop pagination
    Stop,
}

impl StopResult {
    /// Check if we should continue
    pub fn should_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Check if we should stop
    pub fn should_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

// ============================================================================
// Cursor State
// ============================================================================

/// Tracks one pagination run
///
/// Local to a single run; nothing here is shared between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorState<C> {
    /// Token to send with the next request
    pub cursor: Option<C>,
    /// Whether another page may be fetched
    pub has_next: bool,
    /// Pages successfully fetched so far
    pub pages: u64,
}

impl<C: Cursor> CursorState<C> {
    /// Start a run from the caller's initial token
    pub fn new(cursor: Option<C>) -> Self {
        Self {
            cursor,
            has_next: true,
            pages: 0,
        }
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.has_next = false;
    }

    /// Derive the request for the next page from the caller's request
    pub fn request<R>(&self, initial: &R) -> R
    where
        R: CursorRequest<Cursor = C>,
    {
        initial.with_cursor(self.cursor.clone())
    }

    /// Record a fetched page: thread its token and apply the end behavior
    pub fn advance<R>(&mut self, behavior: &EndBehavior, page: &R) -> StopResult
    where
        R: CursorResponse<Cursor = C>,
    {
        let used = self.cursor.take();
        let next = page.next_cursor();
        let result = behavior.decide(used.as_ref(), next.as_ref(), |member| {
            page.member_flag(member)
        });

        self.cursor = next;
        self.pages += 1;
        if result.should_stop() {
            self.mark_done();
        }
        result
    }
}
