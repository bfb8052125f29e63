//! Implementation of different callback functions.
//!
//! A callback sees every trial result once, in the order in which the simulation delivers them,
//! and folds it into its own state.
use crate::core::estimators::RunningEstimators;
use crate::error::Error;
use num_traits::Float;
use serde::Serialize;
use std::io::Write;

/// Trait for folding trial results into running state.
pub trait Callback<T> {
    /// This method is called once for every delivered trial result.
    fn process(&mut self, result: &T);
}

/// A callback function that does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct SinkCallback {}

impl<T> Callback<T> for SinkCallback {
    fn process(&mut self, _: &T) {}
}

/// Counts how many trials returned `true`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    trials: usize,
    successes: usize,
}

impl Tally {
    /// Returns the number of results seen so far.
    pub const fn trials(&self) -> usize {
        self.trials
    }

    /// Returns the number of `true` results seen so far.
    pub const fn successes(&self) -> usize {
        self.successes
    }

    /// Returns the fraction of `true` results, or `None` before the first result.
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        if self.trials == 0 {
            None
        } else {
            Some(self.successes as f64 / self.trials as f64)
        }
    }
}

impl Callback<bool> for Tally {
    fn process(&mut self, result: &bool) {
        self.trials += 1;
        if *result {
            self.successes += 1;
        }
    }
}

impl<T: Float> Callback<T> for RunningEstimators<T> {
    fn process(&mut self, result: &T) {
        self.update(*result);
    }
}

/// Writes every result as a single line of JSON.
///
/// Writing stops at the first error, which is kept and returned by [`JsonLinesCallback::finish`].
pub struct JsonLinesCallback<W: Write> {
    writer: W,
    written: usize,
    error: Option<Error>,
}

impl<W: Write> JsonLinesCallback<W> {
    /// Constructor.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            error: None,
        }
    }

    /// Returns the number of lines written so far.
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Flushes the writer and returns it, or the first error that occurred while writing.
    pub fn finish(mut self) -> Result<W, Error> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_line<T: Serialize>(&mut self, result: &T) -> Result<(), Error> {
        serde_json::to_writer(&mut self.writer, result).map_err(Error::Serialize)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<T: Serialize, W: Write> Callback<T> for JsonLinesCallback<W> {
    fn process(&mut self, result: &T) {
        if self.error.is_some() {
            return;
        }

        match self.write_line(result) {
            Ok(()) => self.written += 1,
            Err(error) => {
                tracing::warn!(%error, "result log is no longer written");
                self.error = Some(error);
            }
        }
    }
}
