//! DataLoader - the public entry point
//!
//! Holds a set of call options and forwards every `load` into a shared
//! [`OperationQueue`], turning the job outcome back into a `Result`.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::job::Outcome;
use crate::options::{CallOptions, Payload};
use crate::queue::{OperationQueue, QueueError};
use crate::transport::TransportError;

/// Errors returned by [`DataLoader::load`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("URL is missing")]
    MissingDestination,

    /// The job settled as a failure; carries "Operation failed: <cause>"
    #[error("{0}")]
    Failed(String),
}

impl From<QueueError> for LoadError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::MissingDestination => LoadError::MissingDestination,
        }
    }
}

/// Sends data through a shared operation queue
#[derive(Clone)]
pub struct DataLoader {
    options: CallOptions,
    queue: Arc<OperationQueue>,
}

impl DataLoader {
    /// Wrap `queue`, starting its ticker if it is idle and a runtime is available
    pub fn new(options: CallOptions, queue: Arc<OperationQueue>) -> Self {
        debug!(?options, "DataLoader::new: called");
        queue.ensure_running();
        Self { options, queue }
    }

    /// Build a loader over a new HTTP-backed queue from `config`
    pub fn from_config(options: CallOptions, config: &Config) -> Result<Self, TransportError> {
        debug!("DataLoader::from_config: called");
        let queue = OperationQueue::from_config(config)?;
        Ok(Self::new(options, Arc::new(queue)))
    }

    pub fn options(&self) -> &CallOptions {
        &self.options
    }

    pub fn queue(&self) -> &Arc<OperationQueue> {
        &self.queue
    }

    /// Layer new options over the current ones
    pub fn config(&mut self, update: CallOptions) {
        debug!(?update, "DataLoader::config: called");
        self.options.merge(update);
    }

    /// Enqueue `payload` and wait for the batched call to settle
    pub async fn load(&self, payload: impl Into<Payload>) -> Result<Value, LoadError> {
        let payload = payload.into();
        debug!(args = payload.len(), "DataLoader::load: called");

        let pending = self.queue.enqueue(self.options.clone(), payload)?;
        match pending.await {
            Outcome::Success { response } => {
                debug!("DataLoader::load: success");
                Ok(response)
            }
            Outcome::Fail { error } => {
                debug!(%error, "DataLoader::load: failed");
                Err(LoadError::Failed(error))
            }
        }
    }
}
