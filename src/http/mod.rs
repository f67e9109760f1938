//! HTTP transport module
//!
//! Fetches pages from a live service over the AWS JSON protocol.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Page Fetching**: [`OperationClient`] implements [`crate::binding::PageFetcher`]

mod client;
mod operation;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use operation::{OperationClient, AMZ_JSON_CONTENT_TYPE, TARGET_HEADER};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
