//! Operation calls over the AWS JSON protocol
//!
//! Each page is one `POST /` whose `X-Amz-Target` header names the
//! operation and whose body is the input document.

use super::client::HttpClient;
use crate::binding::PageFetcher;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use tracing::trace;
use url::Url;

/// Content type of the AWS JSON 1.1 protocol
pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Header naming the called operation
pub const TARGET_HEADER: &str = "x-amz-target";

/// Calls operations of one service endpoint
#[derive(Debug)]
pub struct OperationClient {
    client: HttpClient,
    endpoint: Url,
    target_prefix: Option<String>,
}

impl OperationClient {
    pub fn new(client: HttpClient, endpoint: &str) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            target_prefix: None,
        })
    }

    /// Prefix the target header value with `{prefix}.`
    #[must_use]
    pub fn with_target_prefix(mut self, prefix: Option<String>) -> Self {
        self.target_prefix = prefix;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Value sent in the target header for `operation`
    pub fn target(&self, operation: &str) -> String {
        match &self.target_prefix {
            Some(prefix) => format!("{prefix}.{operation}"),
            None => operation.to_string(),
        }
    }

    /// Call one operation with an input document
    pub async fn call(&self, operation: &str, input: &Value) -> Result<Value> {
        let target = self.target(operation);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(AMZ_JSON_CONTENT_TYPE));
        headers.insert(
            TARGET_HEADER,
            HeaderValue::from_str(&target)
                .map_err(|e| Error::invalid_value("target_prefix", e.to_string()))?,
        );

        trace!(target = %target, "Calling operation");
        self.client.post_json(&self.endpoint, &headers, input).await
    }
}

#[async_trait]
impl PageFetcher for OperationClient {
    async fn fetch(&self, operation: &str, input: Value) -> Result<Value> {
        self.call(operation, &input).await
    }
}
