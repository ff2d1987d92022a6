//! Host update loop
//!
//! Background producers never call observers directly. They schedule jobs on
//! the [`UpdateLoop`] owned by the application task, which runs them one at a
//! time in the order they were scheduled.

use std::future::Future;

use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable handle used to schedule work on an [`UpdateLoop`]
#[derive(Clone)]
pub struct Scheduler {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Scheduler {
    /// Schedule a job on the update loop
    ///
    /// Returns `false` if the loop has been dropped.
    pub fn schedule<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.jobs.send(Box::new(job)).is_ok()
    }

    /// Whether the owning loop has been dropped
    pub fn is_closed(&self) -> bool {
        self.jobs.is_closed()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// FIFO job queue drained by the owning task
pub struct UpdateLoop {
    scheduler: Scheduler,
    jobs: mpsc::UnboundedReceiver<Job>,
}

impl UpdateLoop {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            scheduler: Scheduler { jobs: tx },
            jobs: rx,
        }
    }

    /// Get a scheduler for this loop
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.clone()
    }

    /// Wait for the next job and run it
    pub async fn turn(&mut self) {
        // The loop holds a sender itself, so the channel never closes here
        if let Some(job) = self.jobs.recv().await {
            job();
        }
    }

    /// Run every job that is already queued, without waiting
    ///
    /// Returns the number of jobs run.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.jobs.try_recv() {
            job();
            count += 1;
        }
        count
    }

    /// Run jobs until `until` completes, then return its output
    pub async fn run_until<F: Future>(&mut self, until: F) -> F::Output {
        tokio::pin!(until);
        loop {
            tokio::select! {
                biased;
                output = &mut until => return output,
                Some(job) = self.jobs.recv() => job(),
            }
        }
    }
}

impl Default for UpdateLoop {
    fn default() -> Self {
        Self::new()
    }
}
