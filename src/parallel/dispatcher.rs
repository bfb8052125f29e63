//! Distributes trial indices over a fixed pool of worker threads.

use super::pool::{Pool, PoolSummary};
use super::worker::{self, Report, Task};
use crate::core::{StreamFactory, Trial};
use crate::error::Error;

/// Runs trials on a pool of `pool_size` long-lived worker threads.
///
/// Every worker owns a private pair of channels to the dispatcher. The dispatcher primes each
/// worker with one task and then waits on all busy workers at once; whichever worker reports
/// first is handed the next undispatched index. Results are therefore delivered in the order of
/// completion, while the stream of every trial still only depends on its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatcher {
    pool_size: usize,
}

impl Dispatcher {
    /// Constructor. A pool needs at least one worker.
    pub fn new(pool_size: usize) -> Result<Self, Error> {
        if pool_size == 0 {
            return Err(Error::InvalidPoolSize(pool_size));
        }

        Ok(Self { pool_size })
    }

    /// Returns the number of workers.
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Run trials `0..ntrials` and call `deliver` with the index and result of every trial as soon
    /// as it is reported.
    ///
    /// The pool is torn down before this function returns, also when it returns an error: every
    /// channel is released and every worker thread is joined. A failing trial aborts the run with
    /// [`Error::TrialFailed`]; trials that are still in flight at that moment are allowed to
    /// finish, but their results are discarded.
    pub fn run<T, F, D>(
        &self,
        trial: &F,
        factory: &StreamFactory,
        ntrials: usize,
        mut deliver: D,
    ) -> Result<PoolSummary, Error>
    where
        T: Send,
        F: Trial<T> + ?Sized,
        D: FnMut(usize, T),
    {
        let scoped = crossbeam::scope(|scope| -> Result<PoolSummary, Error> {
            let (mut pool, channels) = Pool::new(self.pool_size);
            let mut handles = Vec::with_capacity(self.pool_size);

            for (id, channels) in channels.into_iter().enumerate() {
                let handle = scope
                    .builder()
                    .name(format!("simcarlo-worker-{}", id))
                    .spawn(move |_| worker::run(id, trial, channels))
                    .map_err(|source| Error::Spawn { worker: id, source })?;
                handles.push(handle);
            }

            let dispatched = dispatch(&mut pool, factory, ntrials, &mut deliver);

            // let the workers run out of tasks, then wait for them
            pool.release();
            let mut joined = 0;
            let mut teardown = None;
            for (id, handle) in handles.into_iter().enumerate() {
                let outcome = handle.join();
                pool.worker_mut(id).terminated();

                match outcome {
                    Ok(completed) => {
                        tracing::trace!(worker = id, completed, "joined worker");
                        joined += 1;
                    }
                    Err(_) => {
                        teardown.get_or_insert(Error::Teardown { worker: id });
                    }
                }
            }
            tracing::debug!(workers = pool.len(), joined, "pool torn down");

            match (dispatched, teardown) {
                (Err(error), Some(teardown)) => {
                    tracing::warn!(%teardown, "teardown failed after an aborted run");
                    Err(error)
                }
                (Err(error), None) | (Ok(()), Some(error)) => Err(error),
                (Ok(()), None) => Ok(pool.summary(joined)),
            }
        });

        scoped.unwrap_or(Err(Error::WorkerPanicked))
    }
}

/// Prime every worker, then refill whichever worker reports until all `ntrials` indices have been
/// dispatched and reported.
fn dispatch<T, D>(
    pool: &mut Pool<T>,
    factory: &StreamFactory,
    ntrials: usize,
    deliver: &mut D,
) -> Result<(), Error>
where
    D: FnMut(usize, T),
{
    let mut next = 0;

    for id in 0..pool.len() {
        next = refill(pool, id, factory, next, ntrials)?;
    }

    while pool.busy() > 0 {
        let (id, report) = pool.next_report();
        let Report { index, outcome } = report.map_err(|_| Error::WorkerLost { worker: id })?;
        pool.worker_mut(id).complete(index);

        let output = outcome.map_err(|error| {
            tracing::error!(worker = id, %error, "aborting run");
            error
        })?;

        // keep the worker busy while the result is being processed
        next = refill(pool, id, factory, next, ntrials)?;
        deliver(index, output);
    }

    Ok(())
}

/// Send index `next` to worker `id`, or drain the worker if all indices are taken. Returns the
/// next undispatched index.
fn refill<T>(
    pool: &mut Pool<T>,
    id: usize,
    factory: &StreamFactory,
    next: usize,
    ntrials: usize,
) -> Result<usize, Error> {
    let worker = pool.worker_mut(id);

    if next < ntrials {
        worker.assign(Task {
            index: next,
            stream: factory.derive(next),
        })?;
        Ok(next + 1)
    } else {
        worker.drain();
        Ok(next)
    }
}
