//! Paginated operation binding
//!
//! Binds the cursor engine onto untyped JSON input/output documents using
//! member paths resolved once at setup time.

use super::path::FieldPath;
use crate::error::{Error, Result};
use crate::pagination::{
    paginate, paginate_blocking, CursorRequest, CursorResponse, EndBehavior, Items,
};
use async_trait::async_trait;
use futures::stream::Stream;
use futures::TryFutureExt;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// Paginated Operation
// ============================================================================

/// A fully resolved paged operation
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedOperation {
    name: String,
    input_token: FieldPath,
    output_token: FieldPath,
    items: Option<FieldPath>,
    page_size: Option<FieldPath>,
    end_behavior: EndBehavior,
}

impl PaginatedOperation {
    /// Create an operation with the given token paths
    ///
    /// The input token must be a top-level input member.
    pub fn new(
        name: impl Into<String>,
        input_token: FieldPath,
        output_token: FieldPath,
    ) -> Result<Self> {
        if !input_token.is_top_level() {
            return Err(Error::invalid_path(
                input_token.to_string(),
                "input token must be a top-level input member",
            ));
        }

        Ok(Self {
            name: name.into(),
            input_token,
            output_token,
            items: None,
            page_size: None,
            end_behavior: EndBehavior::default(),
        })
    }

    /// Create an operation from dotted path strings
    pub fn from_paths(name: impl Into<String>, input_token: &str, output_token: &str) -> Result<Self> {
        Self::new(
            name,
            FieldPath::parse(input_token)?,
            FieldPath::parse(output_token)?,
        )
    }

    /// Set the items path
    #[must_use]
    pub fn with_items(mut self, items: FieldPath) -> Self {
        self.items = Some(items);
        self
    }

    /// Set the page size member
    #[must_use]
    pub fn with_page_size_member(mut self, member: FieldPath) -> Self {
        self.page_size = Some(member);
        self
    }

    /// Set the end behavior
    #[must_use]
    pub fn with_end_behavior(mut self, behavior: EndBehavior) -> Self {
        self.end_behavior = behavior;
        self
    }

    /// Operation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input token member
    pub fn input_token(&self) -> &FieldPath {
        &self.input_token
    }

    /// Output token path
    pub fn output_token(&self) -> &FieldPath {
        &self.output_token
    }

    /// Items path, if the operation declares one
    pub fn items(&self) -> Option<&FieldPath> {
        self.items.as_ref()
    }

    /// Page size member, if the operation declares one
    pub fn page_size(&self) -> Option<&FieldPath> {
        self.page_size.as_ref()
    }

    /// End behavior
    pub fn end_behavior(&self) -> &EndBehavior {
        &self.end_behavior
    }

    /// Prepare the caller's input for a run
    ///
    /// Writes `page_size` into the page size member. The same value is then
    /// carried by every derived request.
    pub fn prepare_input(&self, input: Value, page_size: Option<u32>) -> Result<Value> {
        let mut input = match input {
            Value::Null => json!({}),
            Value::Object(_) => input,
            other => {
                return Err(Error::invalid_value(
                    "input",
                    format!("expected a JSON object, got {other}"),
                ))
            }
        };

        if let Some(size) = page_size {
            let member = self.page_size.as_ref().ok_or_else(|| {
                Error::config(format!(
                    "Operation '{}' has no page size member",
                    self.name
                ))
            })?;
            member.write(&mut input, Some(json!(size)));
        }

        Ok(input)
    }

    /// Paginate with an async fetch function over JSON documents
    pub fn paginate<F, Fut, E>(
        self: &Arc<Self>,
        input: Value,
        mut fetch: F,
    ) -> impl Stream<Item = std::result::Result<JsonPage, E>>
    where
        F: FnMut(Value) -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
    {
        let operation = Arc::clone(self);
        paginate(
            JsonRequest::new(input, Arc::clone(self)),
            self.end_behavior.clone(),
            move |request: JsonRequest| {
                let operation = Arc::clone(&operation);
                fetch(request.into_body()).map_ok(move |body| JsonPage::new(body, operation))
            },
        )
    }

    /// Paginate and flatten every page into its items
    pub fn paginate_items<F, Fut, E>(
        self: &Arc<Self>,
        input: Value,
        fetch: F,
    ) -> impl Stream<Item = std::result::Result<Value, E>>
    where
        F: FnMut(Value) -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
    {
        Items::new(self.paginate(input, fetch), JsonPage::into_items)
    }

    /// Paginate through a [`PageFetcher`]
    pub fn paginate_with(
        self: &Arc<Self>,
        fetcher: Arc<dyn PageFetcher>,
        input: Value,
    ) -> impl Stream<Item = Result<JsonPage>> {
        let operation = self.name.clone();
        self.paginate(input, move |body| {
            let fetcher = Arc::clone(&fetcher);
            let operation = operation.clone();
            async move { fetcher.fetch(&operation, body).await }
        })
    }

    /// Paginate with a blocking fetch function over JSON documents
    pub fn paginate_blocking<F, E>(
        self: &Arc<Self>,
        input: Value,
        mut fetch: F,
    ) -> impl Iterator<Item = std::result::Result<JsonPage, E>>
    where
        F: FnMut(Value) -> std::result::Result<Value, E>,
    {
        let operation = Arc::clone(self);
        paginate_blocking(
            JsonRequest::new(input, Arc::clone(self)),
            self.end_behavior.clone(),
            move |request: JsonRequest| {
                fetch(request.into_body()).map(|body| JsonPage::new(body, Arc::clone(&operation)))
            },
        )
    }
}

// ============================================================================
// Page Fetcher
// ============================================================================

/// Invokes one operation call for one page
///
/// Retries, timeouts and cancellation belong to the implementation.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Call `operation` with the given input document
    async fn fetch(&self, operation: &str, input: Value) -> Result<Value>;
}

// ============================================================================
// JSON Request / Page
// ============================================================================

/// An operation input document
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    body: Value,
    operation: Arc<PaginatedOperation>,
}

impl JsonRequest {
    /// Wrap an input document
    pub fn new(body: Value, operation: Arc<PaginatedOperation>) -> Self {
        Self { body, operation }
    }

    /// The input document
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Unwrap the input document
    pub fn into_body(self) -> Value {
        self.body
    }
}

impl CursorRequest for JsonRequest {
    type Cursor = Value;

    fn cursor(&self) -> Option<&Value> {
        self.operation.input_token.read(&self.body)
    }

    fn with_cursor(&self, cursor: Option<Value>) -> Self {
        let mut body = self.body.clone();
        self.operation.input_token.write(&mut body, cursor);
        Self {
            body,
            operation: Arc::clone(&self.operation),
        }
    }
}

/// An operation output document
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPage {
    body: Value,
    operation: Arc<PaginatedOperation>,
}

impl JsonPage {
    /// Wrap an output document
    pub fn new(body: Value, operation: Arc<PaginatedOperation>) -> Self {
        Self { body, operation }
    }

    /// The output document
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Unwrap the output document
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Project the configured items path
    ///
    /// Lists yield their elements and maps yield `{"key", "value"}` entries.
    /// A page without an items path or without the member yields `None`.
    pub fn into_items(mut self) -> Option<Vec<Value>> {
        let path = self.operation.items.as_ref()?;
        match path.take(&mut self.body)? {
            Value::Array(items) => Some(items),
            Value::Object(entries) => Some(
                entries
                    .into_iter()
                    .map(|(key, value)| json!({ "key": key, "value": value }))
                    .collect(),
            ),
            other => Some(vec![other]),
        }
    }
}

impl CursorResponse for JsonPage {
    type Cursor = Value;

    fn next_cursor(&self) -> Option<Value> {
        self.operation.output_token.read(&self.body).cloned()
    }

    fn member_flag(&self, member: &str) -> Option<bool> {
        let path = FieldPath::parse(member).ok()?;
        match path.read(&self.body)? {
            Value::Bool(flag) => Some(*flag),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}
