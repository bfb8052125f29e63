//! Parallel execution of trials on a fixed pool of worker threads.
//!
//! # Architecture
//!
//! - A **dispatcher** owns the pool, derives the stream of every trial index and hands tasks to
//!   idle workers, collecting results in the order they complete.
//! - Every **worker** is a long-lived scoped thread that runs one task at a time and exits once
//!   its task channel is closed.
//! - The **pool** keeps the dispatcher side of each worker: its private channels, its liveness
//!   state and the task it has in flight.
//!
//! Worker threads are scoped to a single run, so no thread outlives [`Dispatcher::run`].

pub mod dispatcher;
pub mod pool;
pub mod worker;

pub use dispatcher::Dispatcher;
pub use pool::{PoolSummary, WorkerState};
pub use worker::live_workers;
