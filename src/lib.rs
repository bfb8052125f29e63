#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! The crate `simcarlo` runs [Monte Carlo] experiments: a user-supplied stochastic *trial* is
//! evaluated many times, every evaluation on its own random stream, and the results are collected
//! and folded into running statistics as they arrive.
//!
//! # Features
//!
//! - **Reproducibility**. The random stream of a trial only depends on the base seed and on the
//! index of the trial. It does not depend on the number of threads, on which thread evaluates the
//! trial or on the order in which trials complete. Running the same model with the same seed
//! always produces the same multiset of results, sequentially or in parallel.
//! - **Persistent worker pool**. Parallel runs use a fixed pool of long-lived worker threads. Each
//! worker gets a new trial as soon as it reports the previous one, so fast workers are never left
//! waiting for slow ones.
//! - **Defined failure**. A panicking trial aborts the run with [`Error::TrialFailed`], which names
//! the index of the trial. All worker threads are joined before the error is returned.
//! - **Callbacks**. Every result is handed to a callback together with the model's state, in the
//! order results are delivered. Ready-made callbacks count successes, compute running means and
//! variances, or write the results as JSON lines.
//!
//! # What is ...?
//!
//! - a *trial* is one evaluation of the user function on one random stream,
//! - `ntrials` is the number of trials of a run,
//! - the *pool* is the fixed set of worker threads of a parallel run,
//! - the *delivery order* is the order in which results reach the result log and the callback.
//! In parallel runs this is the order of completion unless [`ResultOrder::Index`] is requested.
//!
//! [Monte Carlo]: https://en.wikipedia.org/wiki/Monte_Carlo_method

pub mod callbacks;
pub mod config;
pub mod core;
pub mod error;
pub mod model;
pub mod parallel;

pub use crate::callbacks::{Callback, JsonLinesCallback, SinkCallback, Tally};
pub use crate::config::{ExecutionMode, ResultOrder, SimulationConfig};
pub use crate::core::*;
pub use crate::error::Error;
pub use crate::model::Model;
pub use crate::parallel::{Dispatcher, PoolSummary};
