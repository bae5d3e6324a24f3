//! Custom handlers that replace the transport for a call

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::options::Payload;

/// A callable that performs a job instead of the transport
///
/// The returned value becomes the success response verbatim; `Value::Null`
/// counts as "no response" and fails the job.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, payload: Payload) -> eyre::Result<Value>;
}

/// Adapter turning an async closure into a [`Handler`]
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Payload) -> Fut + Send + Sync,
    Fut: Future<Output = eyre::Result<Value>> + Send,
{
    async fn handle(&self, payload: Payload) -> eyre::Result<Value> {
        (self.0)(payload).await
    }
}

/// Build a shared handler from an async closure
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = eyre::Result<Value>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
