//! Runtime configuration
//!
//! YAML settings for running paginated operations against a live endpoint:
//! transport behaviour plus per-operation end behaviour and page size.
//!
//! ```yaml
//! endpoint: https://storage.example.com
//! target_prefix: Storage_20240101
//! http:
//!   timeout_secs: 10
//!   rate_limit: { requests_per_second: 5, burst_size: 5 }
//! operations:
//!   ListObjects:
//!     end_behavior: { type: truncation_member, member: IsTruncated }
//!     page_size: 100
//! max_pages: 50
//! ```

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, OperationClient, RateLimiterConfig};
use crate::model::short_name;
use crate::pagination::EndBehavior;
use crate::types::{BackoffType, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete runtime configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Service endpoint URL
    pub endpoint: String,

    /// Prefix of the `X-Amz-Target` header, usually `{Service}_{version}`
    #[serde(default)]
    pub target_prefix: Option<String>,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpSettings,

    /// Per-operation settings keyed by operation name
    #[serde(default)]
    pub operations: HashMap<String, OperationSettings>,

    /// Stop after this many pages (0 = unlimited)
    #[serde(default)]
    pub max_pages: usize,
}

impl RuntimeConfig {
    /// Settings for an operation, looked up by absolute ID then short name
    pub fn operation(&self, operation: &str) -> Option<&OperationSettings> {
        self.operations
            .get(operation)
            .or_else(|| self.operations.get(short_name(operation)))
    }

    /// Configured end behavior, or [`EndBehavior::OutputTokenEmpty`]
    pub fn end_behavior_for(&self, operation: &str) -> EndBehavior {
        self.operation(operation)
            .and_then(|settings| settings.end_behavior.clone())
            .unwrap_or_default()
    }

    pub fn page_size_for(&self, operation: &str) -> Option<u32> {
        self.operation(operation).and_then(|settings| settings.page_size)
    }

    /// Page limit, `None` when unlimited
    pub fn max_pages(&self) -> Option<usize> {
        (self.max_pages > 0).then_some(self.max_pages)
    }

    /// Build the operation client for the configured endpoint
    pub fn operation_client(&self) -> Result<OperationClient> {
        let client = HttpClient::with_config(self.http.to_client_config())?;
        Ok(OperationClient::new(client, &self.endpoint)?
            .with_target_prefix(self.target_prefix.clone().none_if_empty()))
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::missing_field("endpoint"));
        }
        url::Url::parse(&self.endpoint)
            .map_err(|e| Error::invalid_value("endpoint", e.to_string()))?;

        if self.http.timeout_secs == 0 {
            return Err(Error::invalid_value(
                "http.timeout_secs",
                "must be greater than 0",
            ));
        }

        for (name, settings) in &self.operations {
            if settings.page_size == Some(0) {
                return Err(Error::invalid_value(
                    format!("operations.{name}.page_size"),
                    "must be greater than 0",
                ));
            }
            if let Some(EndBehavior::TruncationMember { member }) = &settings.end_behavior {
                if member.trim().is_empty() {
                    return Err(Error::invalid_value(
                        format!("operations.{name}.end_behavior.member"),
                        "cannot be empty",
                    ));
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Operation Settings
// ============================================================================

/// Settings for one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSettings {
    /// How the end of pagination is detected
    #[serde(default)]
    pub end_behavior: Option<EndBehavior>,

    /// Value written into the page size member of every request
    #[serde(default)]
    pub page_size: Option<u32>,
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff strategy
    #[serde(default)]
    pub backoff: BackoffType,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Client-side rate limit; none when omitted
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            rate_limit: None,
            headers: HashMap::new(),
        }
    }
}

impl HttpSettings {
    /// Convert to the client configuration
    pub fn to_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(
                self.backoff,
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            );

        builder = match &self.rate_limit {
            Some(limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        builder.build()
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    60000
}

// ============================================================================
// Loading
// ============================================================================

/// Load and validate a runtime configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_config_from_str(&content)
}

/// Load and validate a runtime configuration from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<RuntimeConfig> {
    let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    debug!(
        endpoint = %config.endpoint,
        operations = config.operations.len(),
        "Loaded runtime config"
    );
    Ok(config)
}
