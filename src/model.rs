//! Simulation models: a configuration, a trial function and a result callback.

use crate::callbacks::Callback;
use crate::config::{ExecutionMode, ResultOrder, SimulationConfig};
use crate::core::{execute, RandomStream, StreamFactory, Trial};
use crate::error::Error;
use crate::parallel::{Dispatcher, PoolSummary};
use std::collections::BTreeMap;

type TrialFn<T> = Box<dyn Fn(&mut RandomStream) -> T + Send + Sync>;
type ResultFn<T, S> = Box<dyn FnMut(&mut S, &T)>;

/// A simulation model.
///
/// The model runs its trial function `ntrials` times, each time on the stream of the trial's
/// index, and keeps every result in its result log. Each result is also handed to the result
/// callback together with the model's state `S`, which is where running statistics live.
///
/// ```
/// use rand::Rng;
/// use simcarlo::{Model, SimulationConfig, Tally};
///
/// let config = SimulationConfig::default().with_ntrials(1000).with_seed(42).parallel(4);
/// let mut model = Model::new(config)
///     .with_trial(|stream| stream.gen::<f64>() < 0.25)
///     .with_callback_state(Tally::default());
///
/// model.simulate().unwrap();
/// assert_eq!(model.state().trials(), 1000);
/// ```
pub struct Model<T, S = ()> {
    config: SimulationConfig,
    trial: Option<TrialFn<T>>,
    process_result: Option<ResultFn<T, S>>,
    state: S,
    results: Vec<T>,
    seed_used: Option<u64>,
    pool_summary: Option<PoolSummary>,
}

impl<T> Model<T> {
    /// Create a model without trial function, callback or state.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            trial: None,
            process_result: None,
            state: (),
            results: Vec::new(),
            seed_used: None,
            pool_summary: None,
        }
    }
}

impl<T, S> Model<T, S> {
    /// Set the trial function.
    pub fn with_trial<F>(mut self, trial: F) -> Self
    where
        F: Fn(&mut RandomStream) -> T + Send + Sync + 'static,
    {
        self.set_trial(trial);
        self
    }

    /// Replace the trial function.
    pub fn set_trial<F>(&mut self, trial: F)
    where
        F: Fn(&mut RandomStream) -> T + Send + Sync + 'static,
    {
        self.trial = Some(Box::new(trial));
    }

    /// Set the function that folds every result into the model's state.
    pub fn on_result<P>(mut self, process_result: P) -> Self
    where
        P: FnMut(&mut S, &T) + 'static,
    {
        self.process_result = Some(Box::new(process_result));
        self
    }

    /// Replace the state. The result callback is removed, since it was written for the old state.
    pub fn with_state<U>(self, state: U) -> Model<T, U> {
        Model {
            config: self.config,
            trial: self.trial,
            process_result: None,
            state,
            results: self.results,
            seed_used: self.seed_used,
            pool_summary: self.pool_summary,
        }
    }

    /// Use `callback` as the state and feed every result to it.
    pub fn with_callback_state<C>(self, callback: C) -> Model<T, C>
    where
        C: Callback<T> + 'static,
    {
        self.with_state(callback)
            .on_result(|callback: &mut C, result: &T| callback.process(result))
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns the configuration for modification.
    pub fn config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    /// Returns the state the result callback has accumulated.
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Returns the state for modification, e.g. to reset it between runs.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Returns the results of the last run in delivery order.
    pub fn results(&self) -> &[T] {
        &self.results
    }

    /// Returns the base seed of the last run. When no seed was configured this is the seed that
    /// was drawn for the run, which reproduces it.
    pub const fn seed_used(&self) -> Option<u64> {
        self.seed_used
    }

    /// Returns what the worker pool of the last parallel run looked like.
    pub const fn pool_summary(&self) -> Option<&PoolSummary> {
        self.pool_summary.as_ref()
    }

    /// Consume the model and return its results and state.
    pub fn into_parts(self) -> (Vec<T>, S) {
        (self.results, self.state)
    }
}

impl<T: Send, S> Model<T, S> {
    /// Run the simulation.
    ///
    /// The result log is cleared first; the state is left alone, so callbacks keep accumulating
    /// across runs unless it is reset. If a trial fails, the run stops with
    /// [`Error::TrialFailed`] and the log keeps the results delivered until then.
    pub fn simulate(&mut self) -> Result<&[T], Error> {
        let ntrials = self.config.validate()?;
        let trial = self.trial.as_ref().ok_or(Error::MissingTrial)?;
        let factory = StreamFactory::from_seed(self.config.seed);

        self.results.clear();
        self.seed_used = Some(factory.seed());
        self.pool_summary = None;

        tracing::info!(
            name = self.config.name.as_deref().unwrap_or("unnamed"),
            ntrials,
            seed = factory.seed(),
            mode = ?self.config.mode,
            pool_size = self.config.pool_size,
            "starting simulation"
        );

        let results = &mut self.results;
        let state = &mut self.state;
        let process_result = &mut self.process_result;
        let mut emit = |output: T| {
            if let Some(process) = process_result.as_mut() {
                process(&mut *state, &output);
            }
            results.push(output);
        };

        let order = self.config.order;
        let mut reorder = ReorderBuffer::default();
        let deliver = |index: usize, output: T| match order {
            ResultOrder::Completion => emit(output),
            ResultOrder::Index => reorder.push(index, output, &mut emit),
        };

        match self.config.mode {
            ExecutionMode::Sequential => run_sequential(trial, &factory, ntrials, deliver)?,
            ExecutionMode::Parallel => {
                let summary =
                    Dispatcher::new(self.config.pool_size)?.run(trial, &factory, ntrials, deliver)?;
                self.pool_summary = Some(summary);
            }
        }

        tracing::info!(delivered = self.results.len(), "simulation finished");

        Ok(&self.results)
    }
}

/// Run trials `0..ntrials` one after the other on the calling thread.
fn run_sequential<T, F, D>(
    trial: &F,
    factory: &StreamFactory,
    ntrials: usize,
    mut deliver: D,
) -> Result<(), Error>
where
    F: Trial<T> + ?Sized,
    D: FnMut(usize, T),
{
    for index in 0..ntrials {
        let output = execute(trial, index, factory.derive(index)).map_err(|error| {
            tracing::error!(%error, "aborting run");
            error
        })?;
        deliver(index, output);
    }

    Ok(())
}

/// Holds back results that complete ahead of their turn and releases them in index order.
struct ReorderBuffer<T> {
    next: usize,
    pending: BTreeMap<usize, T>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<T> ReorderBuffer<T> {
    fn push(&mut self, index: usize, output: T, emit: &mut impl FnMut(T)) {
        if index != self.next {
            self.pending.insert(index, output);
            return;
        }

        emit(output);
        self.next += 1;

        while let Some(output) = self.pending.remove(&self.next) {
            emit(output);
            self.next += 1;
        }
    }
}
