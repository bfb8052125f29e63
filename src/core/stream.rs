//! Deterministic random streams, one per trial index.
//!
//! The base seed fixes the 128-bit state of a PCG generator; the trial index selects its stream,
//! i.e. the increment of the underlying LCG. The stream of trial `n` therefore only depends on the
//! seed and on `n`, never on which worker evaluates the trial or when.

use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;

/// The random number generator handed to every trial.
pub type RandomStream = Pcg64;

/// Derives the random stream of a trial from its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamFactory {
    seed: u64,
    state: u128,
}

impl StreamFactory {
    /// Constructor.
    pub fn new(seed: u64) -> Self {
        // spread the 64 seed bits over the whole 128-bit state
        let mut expand = Pcg64::seed_from_u64(seed);
        let state = u128::from(expand.next_u64()) | (u128::from(expand.next_u64()) << 64);

        Self { seed, state }
    }

    /// Creates a factory for `seed`, or for a seed drawn from the operating system when `seed` is
    /// `None`. Use [`StreamFactory::seed`] to find out which seed was chosen.
    pub fn from_seed(seed: Option<u64>) -> Self {
        Self::new(seed.unwrap_or_else(|| OsRng.next_u64()))
    }

    /// Returns the base seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the stream for trial `index`, positioned at its first draw.
    pub fn derive(&self, index: usize) -> RandomStream {
        Pcg64::new(self.state, index as u128)
    }
}
