//! This module contains everything related to estimators.
use num_traits::{Float, FromPrimitive};
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Basic estimators, like the mean, variance, and the standard deviation.
pub trait BasicEstimators<T: Float> {
    /// Returns the mean value.
    fn mean(&self) -> T;

    /// Returns the variance of the mean, $V$.
    fn var(&self) -> T;

    /// Returns the standard deviation, $\sigma = \sqrt{V}$.
    fn std(&self) -> T {
        self.var().sqrt()
    }
}

/// More estimators.
pub trait Estimators<T: Float>: BasicEstimators<T> {
    /// Returns the number of results, $N$, that have been folded in.
    fn calls(&self) -> usize;

    /// Returns the number of results, $N_\mathrm{nf}$, that were non-finite and therefore skipped.
    fn non_finite_calls(&self) -> usize;
}

/// Running sums over a stream of numeric trial results.
///
/// Non-finite results are counted but do not contribute to the sums, so a single `nan` does not
/// destroy the whole estimate.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RunningEstimators<T> {
    sum: T,
    sumsq: T,
    calls: usize,
    non_finite_calls: usize,
}

impl<T: Float> Default for RunningEstimators<T> {
    fn default() -> Self {
        Self {
            sum: T::zero(),
            sumsq: T::zero(),
            calls: 0,
            non_finite_calls: 0,
        }
    }
}

impl<T: Float> RunningEstimators<T> {
    /// Fold `value` into the sums.
    pub fn update(&mut self, value: T) {
        self.calls += 1;

        if value.is_finite() {
            self.sum = self.sum + value;
            self.sumsq = self.sumsq + value * value;
        } else {
            self.non_finite_calls += 1;
        }
    }
}

impl<T: Float> Add for RunningEstimators<T> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            sumsq: self.sumsq + other.sumsq,
            calls: self.calls + other.calls,
            non_finite_calls: self.non_finite_calls + other.non_finite_calls,
        }
    }
}

impl<T> BasicEstimators<T> for RunningEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn mean(&self) -> T {
        T::from_usize(self.calls).map_or_else(T::nan, |calls| self.sum / calls)
    }

    fn var(&self) -> T {
        T::from_usize(self.calls).map_or_else(T::nan, |calls| {
            (self.sumsq - self.sum * self.sum / calls) / calls / (calls - T::one())
        })
    }
}

impl<T> Estimators<T> for RunningEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn calls(&self) -> usize {
        self.calls
    }

    fn non_finite_calls(&self) -> usize {
        self.non_finite_calls
    }
}
