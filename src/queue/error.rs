//! Queue error types

use thiserror::Error;

/// Errors raised synchronously by `enqueue`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("URL is missing")]
    MissingDestination,
}
