//! Job implementation

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use super::logger::Logger;
use super::outcome::Outcome;
use crate::options::{CallOptions, Payload};
use crate::transport::Transport;

/// Cause used when a handler or transport yields nothing
pub const NO_RESPONSE: &str = "Remote server not response";

/// Cause used when a job is dropped without ever being dispatched
pub const ABANDONED: &str = "Operation abandoned before dispatch";

/// Everything a job needs at dispatch time
///
/// Captured once per batch so that reconfiguring the queue does not affect
/// jobs already in flight.
#[derive(Clone)]
pub struct JobContext {
    pub transport: Arc<dyn Transport>,
    pub logger: Arc<dyn Logger>,
    pub identifier: String,
}

/// One enqueued call
pub struct Job {
    id: Uuid,
    options: CallOptions,
    payload: Payload,
    tx: oneshot::Sender<Outcome>,
}

impl Job {
    /// Create a job and the outcome its caller waits on
    pub fn create(options: CallOptions, payload: Payload) -> (Job, PendingOutcome) {
        let id = Uuid::now_v7();
        debug!(%id, ?options, args = payload.len(), "Job::create: called");
        let (tx, rx) = oneshot::channel();
        let job = Job {
            id,
            options,
            payload,
            tx,
        };
        (job, PendingOutcome { job_id: id, rx })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &CallOptions {
        &self.options
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Execute the job and settle its outcome
    ///
    /// Never fails: handler/transport errors and panics all become
    /// `Outcome::Fail`, and each failure is reported through the logger.
    pub async fn run(self, ctx: Arc<JobContext>) -> Outcome {
        let Job {
            id,
            options,
            payload,
            tx,
        } = self;
        debug!(%id, "Job::run: called");

        let attempt = AssertUnwindSafe(Self::execute(&options, payload, &ctx)).catch_unwind().await;
        let outcome = match attempt {
            Ok(Ok(response)) if response.is_null() => {
                debug!(%id, "Job::run: empty result");
                Outcome::failure(NO_RESPONSE)
            }
            Ok(Ok(response)) => {
                debug!(%id, "Job::run: success");
                Outcome::success(response)
            }
            Ok(Err(cause)) => {
                debug!(%id, %cause, "Job::run: failed");
                Outcome::failure(cause)
            }
            Err(_) => {
                debug!(%id, "Job::run: panicked");
                Outcome::failure("handler panicked")
            }
        };

        if let Outcome::Fail { error } = &outcome {
            ctx.logger.warn(&ctx.identifier, error);
        }

        if tx.send(outcome.clone()).is_err() {
            debug!(%id, "Job::run: caller no longer waiting");
        }
        outcome
    }

    async fn execute(options: &CallOptions, payload: Payload, ctx: &JobContext) -> Result<Value, String> {
        match &options.handler {
            Some(handler) => {
                debug!("Job::execute: custom handler");
                handler.handle(payload).await.map_err(|e| e.to_string())
            }
            None => {
                debug!("Job::execute: transport");
                ctx.transport.execute(options, &payload).await.map_err(|e| e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("payload", &self.payload)
            .finish()
    }
}

/// The deferred outcome of a job
///
/// Always resolves to an [`Outcome`]; a job dropped before it runs resolves
/// to a failure instead of an error.
#[derive(Debug)]
pub struct PendingOutcome {
    job_id: Uuid,
    rx: oneshot::Receiver<Outcome>,
}

impl PendingOutcome {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }
}

impl Future for PendingOutcome {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let job_id = self.job_id;
        Pin::new(&mut self.rx).poll(cx).map(move |settled| {
            settled.unwrap_or_else(|_| {
                debug!(%job_id, "PendingOutcome::poll: job dropped unsettled");
                Outcome::failure(ABANDONED)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::handler_fn;
    use crate::job::logger::recording::RecordingLogger;
    use crate::transport::TransportError;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    fn context(transport: MockTransport, logger: Arc<RecordingLogger>) -> Arc<JobContext> {
        Arc::new(JobContext {
            transport: Arc::new(transport),
            logger,
            identifier: "[Data loader]".to_string(),
        })
    }

    #[tokio::test]
    async fn test_transport_success() {
        let logger = Arc::new(RecordingLogger::new());
        let ctx = context(MockTransport::with_results(vec![Ok(json!({"status": "OK"}))]), logger.clone());

        let (job, pending) = Job::create(CallOptions::for_url("http://x"), Payload::from(json!(1)));
        job.run(ctx).await;

        assert_eq!(pending.await, Outcome::success(json!({"status": "OK"})));
        assert!(logger.lines().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_wrapped_and_logged() {
        let logger = Arc::new(RecordingLogger::new());
        let ctx = context(
            MockTransport::with_results(vec![Err(TransportError::RemoteStatus(404))]),
            logger.clone(),
        );

        let (job, pending) = Job::create(CallOptions::for_url("http://x"), Payload::empty());
        job.run(ctx).await;

        let expected = "Operation failed: Remote server returned status code: 404";
        assert_eq!(
            pending.await,
            Outcome::Fail {
                error: expected.to_string()
            }
        );
        assert_eq!(
            logger.lines(),
            vec![("warn", "[Data loader]".to_string(), expected.to_string())]
        );
    }

    #[tokio::test]
    async fn test_null_result_is_no_response() {
        let logger = Arc::new(RecordingLogger::new());
        let ctx = context(MockTransport::with_results(vec![Ok(Value::Null)]), logger.clone());

        let (job, pending) = Job::create(CallOptions::for_url("http://x"), Payload::empty());
        job.run(ctx).await;

        assert_eq!(pending.await, Outcome::failure(NO_RESPONSE));
        assert_eq!(logger.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_handler_bypasses_transport() {
        let transport = Arc::new(MockTransport::new());
        let ctx = Arc::new(JobContext {
            transport: transport.clone(),
            logger: Arc::new(RecordingLogger::new()),
            identifier: "t".to_string(),
        });

        let handler = handler_fn(|payload: Payload| async move { Ok::<_, eyre::Report>(json!({"got": payload.len()})) });
        let options = CallOptions::new().name("local").handler(handler);
        let (job, pending) = Job::create(options, Payload::new(vec![json!("a"), json!("b")]));
        job.run(ctx).await;

        assert_eq!(pending.await, Outcome::success(json!({"got": 2})));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_handler_error_passes_through() {
        let logger = Arc::new(RecordingLogger::new());
        let ctx = context(MockTransport::new(), logger);

        let handler = handler_fn(|_payload: Payload| async move { Err::<Value, _>(eyre::eyre!("quota exceeded")) });
        let (job, pending) = Job::create(CallOptions::new().name("n").handler(handler), Payload::empty());
        job.run(ctx).await;

        assert_eq!(pending.await, Outcome::failure("quota exceeded"));
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_failure() {
        let ctx = context(MockTransport::new(), Arc::new(RecordingLogger::new()));

        let handler = handler_fn(|_payload: Payload| async move {
            if true {
                panic!("bad handler");
            }
            Ok::<_, eyre::Report>(Value::Null)
        });
        let (job, pending) = Job::create(CallOptions::new().name("n").handler(handler), Payload::empty());
        let outcome = job.run(ctx).await;

        assert!(!outcome.is_success());
        assert_eq!(pending.await, outcome);
    }

    #[tokio::test]
    async fn test_dropped_job_resolves_to_abandoned() {
        let (job, pending) = Job::create(CallOptions::for_url("http://x"), Payload::empty());
        let job_id = pending.job_id();
        assert_eq!(job.id(), job_id);
        drop(job);

        assert_eq!(pending.await, Outcome::failure(ABANDONED));
    }
}
