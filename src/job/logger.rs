//! Logger used to report job failures

use tracing::{error, info, warn};

/// Destination for job-level log lines, tagged with the queue identifier
pub trait Logger: Send + Sync {
    fn log(&self, identifier: &str, message: &str);
    fn warn(&self, identifier: &str, message: &str);
    fn error(&self, identifier: &str, message: &str);
}

/// Default logger that forwards to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, identifier: &str, message: &str) {
        info!(%identifier, "{}", message);
    }

    fn warn(&self, identifier: &str, message: &str) {
        warn!(%identifier, "{}", message);
    }

    fn error(&self, identifier: &str, message: &str) {
        error!(%identifier, "{}", message);
    }
}
