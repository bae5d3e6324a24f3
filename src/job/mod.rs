//! Jobs
//!
//! A job wraps one enqueued call as a deferred computation that always
//! settles to an [`Outcome`], never to an error.

mod core;
mod handler;
mod logger;
mod outcome;

pub use self::core::{ABANDONED, Job, JobContext, NO_RESPONSE, PendingOutcome};
pub use handler::{FnHandler, Handler, handler_fn};
pub use logger::{Logger, TracingLogger};
pub use outcome::{FAILURE_PREFIX, Outcome};

#[cfg(test)]
pub(crate) use logger::recording;
