//! Operation queue implementation

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::config::{QueueConfig, QueueSettings};
use super::error::QueueError;
use super::key::job_key;
use super::table::KeyedQueueTable;
use crate::config::Config;
use crate::job::{Job, JobContext, Logger, PendingOutcome, TracingLogger};
use crate::options::{CallOptions, Payload};
use crate::transport::{HttpTransport, Transport, TransportError};

/// Settings that can change while the queue is running
struct Runtime {
    identifier: String,
    logger: Arc<dyn Logger>,
    interval: Duration,
}

/// State shared between the queue handle and its ticker task
struct Shared {
    table: Mutex<KeyedQueueTable>,
    runtime: RwLock<Runtime>,
    transport: Arc<dyn Transport>,
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Key whose queue was detached
    pub key: String,

    /// Number of jobs dispatched from it
    pub dispatched: usize,
}

impl Shared {
    fn context(&self) -> Arc<JobContext> {
        let runtime = self.runtime.read();
        Arc::new(JobContext {
            transport: Arc::clone(&self.transport),
            logger: Arc::clone(&runtime.logger),
            identifier: runtime.identifier.clone(),
        })
    }

    fn tick(&self) -> Option<TickReport> {
        // Lock is released before anything is spawned
        let batch = self.table.lock().detach_next()?;
        let dispatched = batch.jobs.len();
        debug!(key = %batch.key, dispatched, "OperationQueue::tick: visited key");

        if dispatched > 0 {
            tokio::spawn(dispatch(batch.jobs, self.context()));
        }

        Some(TickReport {
            key: batch.key,
            dispatched,
        })
    }
}

/// Run a detached batch concurrently; each job settles its own outcome
async fn dispatch(jobs: Vec<Job>, ctx: Arc<JobContext>) {
    let count = jobs.len();
    debug!(count, "dispatch: called");
    join_all(jobs.into_iter().map(|job| job.run(Arc::clone(&ctx)))).await;
    debug!(count, "dispatch: batch settled");
}

async fn run_ticker(shared: Weak<Shared>, period: Duration) {
    debug!(?period, "run_ticker: called");
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match shared.upgrade() {
            Some(shared) => {
                shared.tick();
            }
            None => {
                debug!("run_ticker: queue dropped, stopping");
                break;
            }
        }
    }
}

/// Keyed request-batching queue
///
/// Call sites enqueue jobs under a key derived from their options; a periodic
/// ticker visits one key per tick in round-robin order, detaches everything
/// queued under it and dispatches those jobs concurrently.
pub struct OperationQueue {
    shared: Arc<Shared>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl OperationQueue {
    /// Create an idle queue
    ///
    /// Nothing flushes until [`start`](Self::start) or
    /// [`ensure_running`](Self::ensure_running) is called, or [`tick`](Self::tick)
    /// is driven by hand.
    pub fn new(config: QueueConfig, transport: Arc<dyn Transport>) -> Self {
        debug!(?config, "OperationQueue::new: called");
        let interval = config.operation_interval();
        Self {
            shared: Arc::new(Shared {
                table: Mutex::new(KeyedQueueTable::new()),
                runtime: RwLock::new(Runtime {
                    identifier: config.identifier,
                    logger: Arc::new(TracingLogger),
                    interval,
                }),
                transport,
            }),
            ticker: Mutex::new(None),
        }
    }

    /// Create a queue backed by the HTTP transport
    ///
    /// The ticker is started right away when called inside a Tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        debug!("OperationQueue::from_config: called");
        let transport = HttpTransport::new(config.fetch.clone())?;
        let queue = Self::new(config.queue.clone(), Arc::new(transport));
        queue.ensure_running();
        Ok(queue)
    }

    /// Start (or restart) the periodic ticker
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let period = self.shared.runtime.read().interval;
        debug!(?period, "OperationQueue::start: called");

        let mut ticker = self.ticker.lock();
        if let Some(handle) = ticker.take() {
            debug!("OperationQueue::start: cancelling previous ticker");
            handle.abort();
        }
        *ticker = Some(tokio::spawn(run_ticker(Arc::downgrade(&self.shared), period)));
        info!(?period, "Operation queue ticker started");
    }

    /// Start the ticker unless it is already running
    ///
    /// Outside a Tokio runtime the queue stays idle. Returns whether the ticker
    /// is running afterwards.
    pub fn ensure_running(&self) -> bool {
        if self.is_running() {
            return true;
        }
        if Handle::try_current().is_err() {
            debug!("OperationQueue::ensure_running: no runtime, staying idle");
            return false;
        }
        self.start();
        true
    }

    /// Stop the periodic ticker; queued jobs stay queued
    pub fn shutdown(&self) {
        debug!("OperationQueue::shutdown: called");
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
            info!("Operation queue ticker stopped");
        }
    }

    /// Check if the ticker is running
    pub fn is_running(&self) -> bool {
        self.ticker.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Apply new settings
    ///
    /// Setting an interval cancels any running ticker and starts a new one with
    /// the new period. Outside a Tokio runtime the period is only recorded.
    pub fn reconfigure(&self, settings: QueueSettings) {
        debug!(?settings, "OperationQueue::reconfigure: called");
        let QueueSettings {
            identifier,
            logger,
            operation_interval_ms,
        } = settings;

        {
            let mut runtime = self.shared.runtime.write();
            if let Some(identifier) = identifier {
                runtime.identifier = identifier;
            }
            if let Some(logger) = logger {
                runtime.logger = logger;
            }
            if let Some(interval_ms) = operation_interval_ms {
                runtime.interval = QueueConfig {
                    operation_interval_ms: interval_ms,
                    ..Default::default()
                }
                .operation_interval();
            }
        }

        if operation_interval_ms.is_some() {
            if Handle::try_current().is_ok() {
                debug!("OperationQueue::reconfigure: interval changed, restarting ticker");
                self.start();
            } else {
                debug!("OperationQueue::reconfigure: no runtime, ticker not started");
            }
        }
    }

    /// Queue a call and return its deferred outcome immediately
    ///
    /// Fails only when the options give no usable destination: the derived
    /// key is empty, or none of name/type/url is set and there is no handler.
    pub fn enqueue(&self, options: CallOptions, payload: impl Into<Payload>) -> Result<PendingOutcome, QueueError> {
        let key = job_key(&options);
        debug!(%key, "OperationQueue::enqueue: called");

        if key.is_empty() || (options.lacks_destination() && options.handler.is_none()) {
            debug!("OperationQueue::enqueue: no usable destination");
            return Err(QueueError::MissingDestination);
        }

        let (job, pending) = Job::create(options, payload.into());
        self.shared.table.lock().push(&key, job);
        Ok(pending)
    }

    /// Run one scheduler tick now
    ///
    /// Returns None when no key is known yet. Must be called from within a
    /// Tokio runtime since dispatched jobs are spawned onto it.
    pub fn tick(&self) -> Option<TickReport> {
        self.shared.tick()
    }

    /// Known keys in visitation order
    pub fn keys(&self) -> Vec<String> {
        self.shared.table.lock().keys().to_vec()
    }

    /// Number of jobs waiting under `key`
    pub fn pending(&self, key: &str) -> usize {
        self.shared.table.lock().pending(key)
    }

    /// Total number of waiting jobs
    pub fn total_pending(&self) -> usize {
        self.shared.table.lock().total_pending()
    }

    /// Index of the next key the scheduler will visit
    pub fn pointer(&self) -> usize {
        self.shared.table.lock().pointer()
    }

    pub fn identifier(&self) -> String {
        self.shared.runtime.read().identifier.clone()
    }

    pub fn operation_interval(&self) -> Duration {
        self.shared.runtime.read().interval
    }
}

impl Drop for OperationQueue {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}
