//! Long-lived worker threads that run one trial at a time.

use crate::core::{execute, RandomStream, Trial};
use crate::error::Error;
use crossbeam::channel::{Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};

static LIVE_WORKERS: AtomicUsize = AtomicUsize::new(0);

/// Returns the number of worker loops currently running in this process, over all pools.
pub fn live_workers() -> usize {
    LIVE_WORKERS.load(Ordering::SeqCst)
}

/// Counts a worker loop as live from its creation until it is dropped, also when unwinding.
struct Live;

impl Live {
    fn enter() -> Self {
        LIVE_WORKERS.fetch_add(1, Ordering::SeqCst);
        Self
    }
}

impl Drop for Live {
    fn drop(&mut self) {
        LIVE_WORKERS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A trial index together with its random stream. Owned by exactly one worker at a time.
pub struct Task {
    /// Index of the trial.
    pub index: usize,
    /// The stream the trial draws from.
    pub stream: RandomStream,
}

/// Message sent from a worker back to the dispatcher.
pub struct Report<T> {
    /// Index of the trial this report is about.
    pub index: usize,
    /// The result of the trial, or the reason it failed.
    pub outcome: Result<T, Error>,
}

/// Channel endpoints of a worker.
pub struct WorkerChannels<T> {
    /// Receive tasks from the dispatcher.
    pub tasks: Receiver<Task>,
    /// Send reports to the dispatcher.
    pub reports: Sender<Report<T>>,
}

/// Worker loop: runs every task it receives and reports back, until the dispatcher closes the
/// task channel. Returns the number of trials this worker reported on.
pub fn run<T, F>(id: usize, trial: &F, channels: WorkerChannels<T>) -> usize
where
    F: Trial<T> + ?Sized,
{
    let _live = Live::enter();
    let WorkerChannels { tasks, reports } = channels;
    let mut completed = 0;

    while let Ok(Task { index, stream }) = tasks.recv() {
        tracing::trace!(worker = id, index, "running trial");

        let outcome = execute(trial, index, stream);

        if reports.send(Report { index, outcome }).is_err() {
            // dispatcher is gone, nobody is interested in further results
            break;
        }
        completed += 1;
    }

    tracing::trace!(worker = id, completed, "worker terminated");
    completed
}
