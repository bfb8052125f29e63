//! Configuration of a simulation run.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Keys accepted by [`SimulationConfig::from_json`].
pub const OPTIONS: [&str; 6] = ["name", "ntrials", "seed", "mode", "pool_size", "order"];

/// How the trials of a run are executed.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// All trials run one after the other on the calling thread.
    Sequential,
    /// Trials are spread over a fixed pool of worker threads.
    Parallel,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Sequential
    }
}

/// The order in which results reach the result log and the callback.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrder {
    /// Results are delivered as soon as they are available. In parallel mode this is the order in
    /// which the workers complete their trials.
    Completion,
    /// Results are delivered in order of their trial index; parallel runs buffer results that
    /// complete early.
    Index,
}

impl Default for ResultOrder {
    fn default() -> Self {
        Self::Completion
    }
}

fn default_pool_size() -> usize {
    num_cpus::get()
}

/// Configuration of a simulation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SimulationConfig {
    /// Name of the simulation, only used for logging.
    #[serde(default)]
    pub name: Option<String>,
    /// Number of trials to run.
    #[serde(default)]
    pub ntrials: Option<usize>,
    /// Base seed of the random streams (`None` picks a fresh seed for every run).
    #[serde(default)]
    pub seed: Option<u64>,
    /// Sequential or parallel execution.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Number of worker threads used in parallel mode.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Delivery order of the results.
    #[serde(default)]
    pub order: ResultOrder,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            name: None,
            ntrials: None,
            seed: None,
            mode: ExecutionMode::default(),
            pool_size: default_pool_size(),
            order: ResultOrder::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses a configuration from a JSON object.
    ///
    /// Every key that is not one of [`OPTIONS`] is reported at once by
    /// [`Error::UnknownOptions`].
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(Error::InvalidConfig)?;

        if let Some(object) = value.as_object() {
            let mut unknown = object
                .keys()
                .filter(|key| !OPTIONS.contains(&key.as_str()))
                .cloned()
                .collect::<Vec<_>>();

            if !unknown.is_empty() {
                unknown.sort();
                return Err(Error::UnknownOptions(unknown));
            }
        }

        let config: Self = serde_json::from_value(value).map_err(Error::InvalidConfig)?;

        if config.pool_size == 0 {
            return Err(Error::InvalidPoolSize(config.pool_size));
        }

        Ok(config)
    }

    /// Set the name of the simulation.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the number of trials.
    pub fn with_ntrials(mut self, ntrials: usize) -> Self {
        self.ntrials = Some(ntrials);
        self
    }

    /// Set the base seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the base seed from an Option.
    pub fn with_seed_option(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Run the trials on `pool_size` worker threads.
    pub fn parallel(mut self, pool_size: usize) -> Self {
        self.mode = ExecutionMode::Parallel;
        self.pool_size = pool_size;
        self
    }

    /// Set the number of worker threads without changing the mode.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Run the trials on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.mode = ExecutionMode::Sequential;
        self
    }

    /// Set the delivery order of the results.
    pub fn with_order(mut self, order: ResultOrder) -> Self {
        self.order = order;
        self
    }

    /// Checks that the configuration describes a runnable simulation and returns the number of
    /// trials.
    pub fn validate(&self) -> Result<usize, Error> {
        let ntrials = self.ntrials.ok_or(Error::MissingTrials)?;

        if self.mode == ExecutionMode::Parallel && self.pool_size == 0 {
            return Err(Error::InvalidPoolSize(self.pool_size));
        }

        Ok(ntrials)
    }
}
