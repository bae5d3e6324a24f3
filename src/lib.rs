//! DataLoader - keyed request batching
//!
//! Many call sites enqueue "send this data" operations; the queue buckets them
//! by destination key and a periodic scheduler flushes one key per tick
//! through a pluggable transport (HTTP by default).
//!
//! # Core Concepts
//!
//! - **Keys**: each call is bucketed under a key derived from its options
//! - **Round-robin flush**: every tick drains the next key with work, all of
//!   its jobs at once
//! - **Outcomes, not errors**: a job always settles to success or fail, so a
//!   failing call never aborts its batch siblings
//!
//! # Modules
//!
//! - [`queue`] - Keyed queue table and periodic scheduler
//! - [`job`] - Jobs, outcomes, handlers and the failure logger
//! - [`transport`] - Transport trait and HTTP implementation
//! - [`loader`] - `DataLoader` facade
//! - [`config`] - Configuration types and loading

pub mod config;
pub mod job;
pub mod loader;
pub mod logging;
pub mod options;
pub mod queue;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use job::{Handler, Job, Logger, Outcome, PendingOutcome, TracingLogger, handler_fn};
pub use loader::{DataLoader, LoadError};
pub use logging::setup_logging;
pub use options::{CachePolicy, CallOptions, Credentials, Payload, RequestMode};
pub use queue::{KeyedQueueTable, OperationQueue, QueueConfig, QueueError, QueueSettings, TickReport, job_key};
pub use transport::{FetchDefaults, HttpTransport, Transport, TransportError};
