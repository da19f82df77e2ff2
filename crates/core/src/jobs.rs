//! Background jobs for long-running repository operations.
//!
//! Each job runs on its own named thread and talks back to the owner thread
//! over a channel. Cancellation is cooperative: the job polls its
//! [`JobContext`] and bails out with an error. A job that panics is reported
//! as failed so the runner never waits on it forever.

use std::collections::HashMap;
use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

pub type JobId = u64;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Transfer progress of a network operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub received_objects: usize,
    pub indexed_objects: usize,
    pub total_objects: usize,
    pub received_bytes: usize,
}

impl Progress {
    /// Completion in `0.0..=1.0`; zero while the total is unknown.
    pub fn fraction(&self) -> f64 {
        if self.total_objects == 0 {
            0.0
        } else {
            self.received_objects as f64 / self.total_objects as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress {
        job: JobId,
        progress: Progress,
    },
    Finished {
        job: JobId,
        label: String,
        outcome: JobOutcome,
    },
}

/// What a running job sees: its cancel flag and a progress channel.
#[derive(Debug, Clone)]
pub struct JobContext {
    job: JobId,
    cancel: CancelToken,
    events: Option<Sender<JobEvent>>,
}

impl JobContext {
    /// A context not attached to any runner, for running an operation on the
    /// calling thread.
    pub fn detached() -> Self {
        Self {
            job: 0,
            cancel: CancelToken::new(),
            events: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.job
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn report(&self, progress: Progress) {
        if let Some(events) = &self.events {
            // The owner may already be gone; progress is best effort.
            let _ = events.send(JobEvent::Progress {
                job: self.job,
                progress,
            });
        }
    }
}

#[derive(Debug)]
struct RunningJob {
    label: String,
    cancel: CancelToken,
}

/// Spawns jobs and collects their events.
#[derive(Debug)]
pub struct JobRunner {
    tx: Sender<JobEvent>,
    rx: Receiver<JobEvent>,
    next_id: JobId,
    running: HashMap<JobId, RunningJob>,
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRunner {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            next_id: 1,
            running: HashMap::new(),
        }
    }

    /// Run `job` on a new thread. An error returned after cancellation is
    /// reported as [`JobOutcome::Cancelled`].
    pub fn spawn<F, E>(&mut self, label: impl Into<String>, job: F) -> std::io::Result<JobId>
    where
        F: FnOnce(&JobContext) -> Result<(), E> + Send + 'static,
        E: Display,
    {
        let id = self.next_id;
        let label = label.into();
        let cancel = CancelToken::new();
        let ctx = JobContext {
            job: id,
            cancel: cancel.clone(),
            events: Some(self.tx.clone()),
        };
        let tx = self.tx.clone();
        let thread_label = label.clone();

        thread::Builder::new()
            .name(format!("gitlane-job-{id}"))
            .spawn(move || {
                log::info!("job {id} started: {thread_label}");
                let outcome = match panic::catch_unwind(AssertUnwindSafe(|| job(&ctx))) {
                    Ok(Ok(())) => JobOutcome::Succeeded,
                    Ok(Err(_)) if ctx.is_cancelled() => JobOutcome::Cancelled,
                    Ok(Err(err)) => JobOutcome::Failed(err.to_string()),
                    Err(payload) => {
                        log::error!("job {id} panicked");
                        JobOutcome::Failed(format!("panicked: {}", panic_message(&*payload)))
                    }
                };
                log::info!("job {id} finished: {outcome:?}");
                let _ = tx.send(JobEvent::Finished {
                    job: id,
                    label: thread_label,
                    outcome,
                });
            })?;

        self.next_id += 1;
        self.running.insert(id, RunningJob { label, cancel });
        Ok(id)
    }

    /// Request cancellation of `job`. Returns `false` when it is not running.
    pub fn cancel(&self, job: JobId) -> bool {
        match self.running.get(&job) {
            Some(running) => {
                log::info!("cancelling job {job}: {}", running.label);
                running.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for running in self.running.values() {
            running.cancel.cancel();
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.running.is_empty()
    }

    /// Labels of the jobs still running.
    pub fn running(&self) -> impl Iterator<Item = (JobId, &str)> {
        self.running
            .iter()
            .map(|(id, running)| (*id, running.label.as_str()))
    }

    /// Next event without blocking.
    pub fn try_next(&mut self) -> Option<JobEvent> {
        let event = self.rx.try_recv().ok()?;
        self.track(&event);
        Some(event)
    }

    /// Next event, waiting at most `timeout`.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<JobEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.track(&event);
                Some(event)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn track(&mut self, event: &JobEvent) {
        if let JobEvent::Finished { job, .. } = event {
            self.running.remove(job);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}
