//! Keyed queue table
//!
//! Maps each key to the jobs waiting under it and keeps the keys in order of
//! first appearance so the scheduler can visit them round-robin.

use std::collections::HashMap;

use tracing::debug;

use crate::job::Job;

/// Jobs detached from one key in a single tick
#[derive(Debug)]
pub struct Batch {
    pub key: String,
    pub jobs: Vec<Job>,
}

/// Queue-of-queues with a rotating visitation pointer
#[derive(Debug, Default)]
pub struct KeyedQueueTable {
    queues: HashMap<String, Vec<Job>>,
    keys: Vec<String>,
    pointer: usize,
}

impl KeyedQueueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job under `key`, registering the key on first use
    pub fn push(&mut self, key: &str, job: Job) {
        debug!(%key, job_id = %job.id(), "KeyedQueueTable::push: called");
        match self.queues.get_mut(key) {
            Some(queue) => queue.push(job),
            None => {
                debug!(%key, "KeyedQueueTable::push: new key");
                self.keys.push(key.to_string());
                self.queues.insert(key.to_string(), vec![job]);
            }
        }
    }

    /// Detach every job queued under the next key that has work
    ///
    /// Walks forward from the pointer, emptying each visited queue, and stops
    /// at the first non-empty one. When a full wrap finds nothing, the batch
    /// names the starting key and carries no jobs. Returns None only when no
    /// key is known.
    pub fn detach_next(&mut self) -> Option<Batch> {
        if self.keys.is_empty() {
            return None;
        }

        let start = self.pointer;
        loop {
            let key = &self.keys[self.pointer];
            let jobs = self.queues.get_mut(key).map(std::mem::take).unwrap_or_default();
            self.pointer = (self.pointer + 1) % self.keys.len();

            if !jobs.is_empty() {
                debug!(%key, count = jobs.len(), pointer = self.pointer, "KeyedQueueTable::detach_next: detached");
                return Some(Batch {
                    key: key.clone(),
                    jobs,
                });
            }

            if self.pointer == start {
                debug!(pointer = self.pointer, "KeyedQueueTable::detach_next: wrapped without work");
                return Some(Batch {
                    key: self.keys[start].clone(),
                    jobs: Vec::new(),
                });
            }
        }
    }

    /// Known keys in visitation order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of jobs waiting under `key`
    pub fn pending(&self, key: &str) -> usize {
        self.queues.get(key).map(Vec::len).unwrap_or(0)
    }

    /// Total number of waiting jobs
    pub fn total_pending(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }

    /// Index of the next key to visit
    pub fn pointer(&self) -> usize {
        self.pointer
    }
}
