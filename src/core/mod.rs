//! Core functionality. You don't need to import this modules since all it's public members are
//! part of the crate namespace.
pub mod estimators;
pub mod stream;

pub use estimators::*;
pub use stream::*;

use crate::error::Error;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Trait which every trial must implement.
///
/// A trial draws everything it needs from the stream it is handed and returns its result. Trials
/// are shared between worker threads by reference, so they must be `Sync` and must not keep
/// mutable state of their own. Closures of the form `Fn(&mut RandomStream) -> T` implement this
/// trait.
pub trait Trial<T>: Sync {
    /// Runs the trial once, consuming random numbers from `stream`.
    fn run(&self, stream: &mut RandomStream) -> T;
}

impl<F, T> Trial<T> for F
where
    F: Fn(&mut RandomStream) -> T + Sync,
{
    fn run(&self, stream: &mut RandomStream) -> T {
        self(stream)
    }
}

/// Run trial `index` on `stream`, turning a panic of the trial into [`Error::TrialFailed`].
pub(crate) fn execute<T, F: Trial<T> + ?Sized>(
    trial: &F,
    index: usize,
    mut stream: RandomStream,
) -> Result<T, Error> {
    panic::catch_unwind(AssertUnwindSafe(|| trial.run(&mut stream))).map_err(|payload| {
        Error::TrialFailed {
            index,
            message: panic_message(payload.as_ref()),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "trial panicked".to_string()
    }
}
