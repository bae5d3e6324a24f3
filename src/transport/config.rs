//! Transport defaults and call resolution

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::options::{CachePolicy, CallOptions, Credentials, RequestMode};

/// Defaults that per-call options are layered over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchDefaults {
    /// HTTP verb
    pub method: String,

    /// Cross-origin mode
    pub mode: RequestMode,

    /// Credential policy
    pub credentials: Credentials,

    /// Cache policy
    pub cache: CachePolicy,

    /// Default request headers (names lowercase)
    pub headers: BTreeMap<String, String>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for FetchDefaults {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            method: "post".to_string(),
            mode: RequestMode::Cors,
            credentials: Credentials::Omit,
            cache: CachePolicy::Default,
            headers,
            timeout_ms: 30_000,
        }
    }
}

impl FetchDefaults {
    /// Get the timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Merge per-call options over these defaults
    pub fn resolve(&self, options: &CallOptions) -> ResolvedCall {
        debug!(?options, "FetchDefaults::resolve: called");
        let mut headers: BTreeMap<String, String> = self
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();

        if let Some(extra) = &options.headers {
            debug!(count = extra.len(), "FetchDefaults::resolve: layering call headers");
            for (name, value) in extra {
                headers.insert(name.to_ascii_lowercase(), value.clone());
            }
        }

        ResolvedCall {
            url: options.url.clone(),
            method: options.method.clone().unwrap_or_else(|| self.method.clone()),
            mode: options.mode.unwrap_or(self.mode),
            credentials: options.credentials.unwrap_or(self.credentials),
            cache: options.cache.unwrap_or(self.cache),
            headers,
        }
    }
}

/// Effective parameters of one call after defaults are applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCall {
    pub url: Option<String>,
    pub method: String,
    pub mode: RequestMode,
    pub credentials: Credentials,
    pub cache: CachePolicy,
    pub headers: BTreeMap<String, String>,
}

impl ResolvedCall {
    /// Read- and delete-style verbs carry their payload in the query string
    pub fn payload_in_query(&self) -> bool {
        self.method.eq_ignore_ascii_case("get") || self.method.eq_ignore_ascii_case("delete")
    }
}
