//! Operation queue configuration

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::job::Logger;

/// Default log tag
pub const DEFAULT_IDENTIFIER: &str = "[Data loader]";

/// Default tick period in milliseconds
pub const DEFAULT_OPERATION_INTERVAL_MS: u64 = 300;

/// Operation queue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Tag prepended to job log lines
    #[serde(default = "default_identifier")]
    pub identifier: String,

    /// Scheduler tick period in milliseconds
    #[serde(rename = "operation-interval-ms", default = "default_operation_interval_ms")]
    pub operation_interval_ms: u64,
}

fn default_identifier() -> String {
    DEFAULT_IDENTIFIER.to_string()
}

fn default_operation_interval_ms() -> u64 {
    DEFAULT_OPERATION_INTERVAL_MS
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            operation_interval_ms: default_operation_interval_ms(),
        }
    }
}

impl QueueConfig {
    /// Get the tick period as a Duration (never zero)
    pub fn operation_interval(&self) -> Duration {
        Duration::from_millis(self.operation_interval_ms.max(1))
    }
}

/// Changes applied by `OperationQueue::reconfigure`; unset fields are kept
#[derive(Default, Clone)]
pub struct QueueSettings {
    pub identifier: Option<String>,
    pub logger: Option<Arc<dyn Logger>>,
    pub operation_interval_ms: Option<u64>,
}

impl QueueSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn operation_interval_ms(mut self, interval_ms: u64) -> Self {
        self.operation_interval_ms = Some(interval_ms);
        self
    }
}

impl std::fmt::Debug for QueueSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueSettings")
            .field("identifier", &self.identifier)
            .field("logger", &self.logger.as_ref().map(|_| "<logger>"))
            .field("operation_interval_ms", &self.operation_interval_ms)
            .finish()
    }
}
