//! Operation queue
//!
//! Keyed job queuing with a periodic round-robin flush. Jobs are bucketed by
//! a key derived from their call options; each scheduler tick drains one key.

mod config;
mod core;
mod error;
mod key;
mod table;

pub use self::core::{OperationQueue, TickReport};
pub use config::{DEFAULT_IDENTIFIER, DEFAULT_OPERATION_INTERVAL_MS, QueueConfig, QueueSettings};
pub use error::QueueError;
pub use key::{DEFAULT_KEY, FETCH_FALLBACK_KEY, job_key};
pub use table::{Batch, KeyedQueueTable};
