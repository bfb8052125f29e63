//! Errors returned by simulations and their configuration.

use thiserror::Error;

/// Everything that can go wrong while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// The number of trials was never set.
    #[error("model attribute 'ntrials' must be specified")]
    MissingTrials,

    /// No trial function was registered.
    #[error("model attribute 'trial' must be specified")]
    MissingTrial,

    /// The configuration document contained keys that are not options.
    #[error("unknown configuration options: {}", .0.join(", "))]
    UnknownOptions(Vec<String>),

    /// A parallel run needs at least one worker.
    #[error("invalid pool size {0}: at least one worker is required")]
    InvalidPoolSize(usize),

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[source] serde_json::Error),

    /// The trial function panicked; the run is aborted.
    #[error("trial {index} failed: {message}")]
    TrialFailed {
        /// Index of the failing trial.
        index: usize,
        /// Panic message of the trial function.
        message: String,
    },

    /// A worker thread could not be started.
    #[error("failed to spawn worker {worker}")]
    Spawn {
        /// Index of the worker in the pool.
        worker: usize,
        /// Error reported by the operating system.
        #[source]
        source: std::io::Error,
    },

    /// A worker hung up while it still owed the dispatcher a result.
    #[error("worker {worker} disconnected with a task in flight")]
    WorkerLost {
        /// Index of the worker in the pool.
        worker: usize,
    },

    /// A worker thread did not terminate cleanly.
    #[error("worker {worker} could not be joined")]
    Teardown {
        /// Index of the worker in the pool.
        worker: usize,
    },

    /// A worker thread panicked outside of a trial.
    #[error("a worker thread panicked outside of a trial")]
    WorkerPanicked,

    /// Writing a result log failed.
    #[error("failed to write result log")]
    Io(#[from] std::io::Error),

    /// A result could not be serialized.
    #[error("failed to serialize result")]
    Serialize(#[source] serde_json::Error),
}
