//! Transport module
//!
//! A transport performs one call for a job and decodes the response body.

use async_trait::async_trait;
use serde_json::Value;

mod config;
mod error;
mod http;
mod query;

pub use config::{FetchDefaults, ResolvedCall};
pub use error::TransportError;
pub use http::{ContentKind, HttpTransport};
pub use query::{append_query, to_query_string};

use crate::options::{CallOptions, Payload};

/// Performs the network (or other) call behind a job
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one call and return its decoded body
    async fn execute(&self, options: &CallOptions, payload: &Payload) -> Result<Value, TransportError>;
}
