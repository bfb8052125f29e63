//! The fixed set of workers of one parallel run, seen from the dispatcher.

use super::worker::{Report, Task, WorkerChannels};
use crate::error::Error;
use crossbeam::channel::{bounded, Receiver, RecvError, Select, Sender};
use serde::{Deserialize, Serialize};

/// Liveness of a worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// The worker may still receive tasks, or has one in flight.
    Active,
    /// The dispatcher has no more tasks for this worker.
    Draining,
    /// The task channel has been released and the worker thread has terminated.
    Closed,
}

/// Dispatcher side of a single worker.
pub struct WorkerHandle<T> {
    id: usize,
    tasks: Option<Sender<Task>>,
    reports: Receiver<Report<T>>,
    state: WorkerState,
    in_flight: Option<usize>,
    dispatched: usize,
}

impl<T> WorkerHandle<T> {
    /// Create the handle of worker `id` together with the endpoints the worker itself uses. Both
    /// channels hold a single message, since a worker never owns more than one task.
    pub fn new(id: usize) -> (Self, WorkerChannels<T>) {
        let (task_tx, task_rx) = bounded(1);
        let (report_tx, report_rx) = bounded(1);

        let handle = Self {
            id,
            tasks: Some(task_tx),
            reports: report_rx,
            state: WorkerState::Active,
            in_flight: None,
            dispatched: 0,
        };
        let channels = WorkerChannels {
            tasks: task_rx,
            reports: report_tx,
        };

        (handle, channels)
    }

    /// Returns the index of this worker in its pool.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Returns the liveness state.
    pub const fn state(&self) -> WorkerState {
        self.state
    }

    /// Returns the index of the trial this worker is running, if any.
    pub const fn in_flight(&self) -> Option<usize> {
        self.in_flight
    }

    /// Returns how many tasks have been sent to this worker.
    pub const fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Hand `task` to the worker.
    pub fn assign(&mut self, task: Task) -> Result<(), Error> {
        debug_assert_eq!(self.state, WorkerState::Active);
        debug_assert!(self.in_flight.is_none());

        let index = task.index;
        let tasks = self
            .tasks
            .as_ref()
            .ok_or(Error::WorkerLost { worker: self.id })?;
        tasks
            .send(task)
            .map_err(|_| Error::WorkerLost { worker: self.id })?;

        tracing::debug!(worker = self.id, index, "dispatched trial");
        self.in_flight = Some(index);
        self.dispatched += 1;
        Ok(())
    }

    /// Mark the trial in flight as reported.
    pub fn complete(&mut self, index: usize) {
        debug_assert_eq!(self.in_flight, Some(index));
        self.in_flight = None;
    }

    /// No more tasks will be sent to this worker.
    pub fn drain(&mut self) {
        if self.state == WorkerState::Active {
            tracing::debug!(worker = self.id, dispatched = self.dispatched, "worker draining");
            self.state = WorkerState::Draining;
        }
    }

    /// Release the task channel, which lets the worker thread exit. The worker keeps draining
    /// until [`WorkerHandle::terminated`] confirms that its thread is gone.
    pub fn release(&mut self) {
        self.tasks = None;
        self.drain();
    }

    /// Record that the worker thread has been joined. Only a released worker can be closed.
    pub fn terminated(&mut self) {
        if self.tasks.is_none() {
            self.state = WorkerState::Closed;
        }
    }
}

/// What a finished pool looked like, for accounting and tests.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PoolSummary {
    /// Number of workers in the pool.
    pub workers: usize,
    /// Number of worker threads that were joined.
    pub joined: usize,
    /// Number of workers whose channel was released and whose thread has terminated.
    pub closed: usize,
    /// Number of tasks each worker received.
    pub tasks_per_worker: Vec<usize>,
}

/// The workers of one run. Dropping the pool releases every channel.
pub struct Pool<T> {
    workers: Vec<WorkerHandle<T>>,
}

impl<T> Pool<T> {
    /// Create a pool of `size` workers and return the endpoints for the worker threads, in the
    /// same order.
    pub fn new(size: usize) -> (Self, Vec<WorkerChannels<T>>) {
        let (workers, channels) = (0..size).map(WorkerHandle::new).unzip();
        (Self { workers }, channels)
    }

    /// Returns the number of workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Returns whether the pool has no workers.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Returns the worker with index `id`.
    pub fn worker_mut(&mut self, id: usize) -> &mut WorkerHandle<T> {
        &mut self.workers[id]
    }

    /// Returns the number of workers that owe the dispatcher a report.
    pub fn busy(&self) -> usize {
        self.workers
            .iter()
            .filter(|worker| worker.in_flight.is_some())
            .count()
    }

    /// Wait until any busy worker has a report and return it with the worker's index. Must only be
    /// called while at least one worker is busy.
    pub fn next_report(&self) -> (usize, Result<Report<T>, RecvError>) {
        let busy = self
            .workers
            .iter()
            .filter(|worker| worker.in_flight.is_some())
            .collect::<Vec<_>>();
        debug_assert!(!busy.is_empty());

        let mut select = Select::new();
        for worker in &busy {
            select.recv(&worker.reports);
        }

        let operation = select.select();
        let worker = busy[operation.index()];
        (worker.id, operation.recv(&worker.reports))
    }

    /// Release every task channel.
    pub fn release(&mut self) {
        for worker in &mut self.workers {
            worker.release();
        }
    }

    /// Summarize the pool after `joined` worker threads have been joined.
    pub fn summary(&self, joined: usize) -> PoolSummary {
        PoolSummary {
            workers: self.workers.len(),
            joined,
            closed: self
                .workers
                .iter()
                .filter(|worker| worker.state == WorkerState::Closed)
                .count(),
            tasks_per_worker: self.workers.iter().map(WorkerHandle::dispatched).collect(),
        }
    }
}

impl<T> Drop for Pool<T> {
    fn drop(&mut self) {
        self.release();
    }
}
