//! Attempt and outcome types

use std::time::Duration;
use thiserror::Error;

use super::classifier::{Classification, FaultClassifier};
use super::fault::{Fault, Probe};

/// One evaluation of a condition, after classification
#[derive(Debug)]
pub enum Attempt<T> {
    /// The condition held and produced a value
    Ready(T),

    /// The condition did not hold yet; polling continues
    NotYetReady(Fault),

    /// The condition cannot succeed; polling stops
    Fatal(Fault),
}

impl<T> Attempt<T> {
    /// Classify the result of one probe
    pub fn from_probe<C>(probe: Probe<T>, classifier: &C) -> Self
    where
        C: FaultClassifier + ?Sized,
    {
        match probe {
            Ok(value) => Attempt::Ready(value),
            Err(fault) => match classifier.classify(&fault) {
                Classification::Soft => Attempt::NotYetReady(fault),
                Classification::Fatal => Attempt::Fatal(fault),
            },
        }
    }

    /// Check if the attempt produced a value
    pub fn is_ready(&self) -> bool {
        matches!(self, Attempt::Ready(_))
    }
}

/// Terminal result of a wait
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The condition held
    Success(T),

    /// The budget ran out (or the wait was cancelled) while the condition
    /// was still not ready
    TimedOut {
        /// The last soft fault observed
        last_fault: Fault,
        /// Number of attempts made
        attempts: u32,
        /// Time spent waiting
        elapsed: Duration,
        /// Whether an external cancellation ended the wait
        cancelled: bool,
    },

    /// A fatal fault ended the wait
    Aborted {
        /// The fatal fault
        fault: Fault,
        /// Number of attempts made, including the fatal one
        attempts: u32,
        /// Time spent waiting
        elapsed: Duration,
    },
}

impl<T> RetryOutcome<T> {
    /// Check if the wait succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success(_))
    }

    /// Check if the wait timed out (including cancellation)
    pub fn is_timed_out(&self) -> bool {
        matches!(self, RetryOutcome::TimedOut { .. })
    }

    /// Check if the wait was aborted by a fatal fault
    pub fn is_aborted(&self) -> bool {
        matches!(self, RetryOutcome::Aborted { .. })
    }

    /// Check if an external cancellation ended the wait
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryOutcome::TimedOut { cancelled: true, .. })
    }

    /// The value, if the wait succeeded
    pub fn success(self) -> Option<T> {
        match self {
            RetryOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The fault that ended the wait, if it did not succeed
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            RetryOutcome::Success(_) => None,
            RetryOutcome::TimedOut { last_fault, .. } => Some(last_fault),
            RetryOutcome::Aborted { fault, .. } => Some(fault),
        }
    }

    /// Number of attempts, if the wait did not succeed
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryOutcome::Success(_) => None,
            RetryOutcome::TimedOut { attempts, .. } | RetryOutcome::Aborted { attempts, .. } => {
                Some(*attempts)
            }
        }
    }

    /// Transform the success value
    pub fn map<U, F>(self, f: F) -> RetryOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            RetryOutcome::Success(value) => RetryOutcome::Success(f(value)),
            RetryOutcome::TimedOut {
                last_fault,
                attempts,
                elapsed,
                cancelled,
            } => RetryOutcome::TimedOut {
                last_fault,
                attempts,
                elapsed,
                cancelled,
            },
            RetryOutcome::Aborted {
                fault,
                attempts,
                elapsed,
            } => RetryOutcome::Aborted {
                fault,
                attempts,
                elapsed,
            },
        }
    }

    /// Translate into a `Result`, naming the awaited condition in the error
    pub fn into_result(self, alias: impl Into<String>) -> Result<T, WaitError> {
        match self {
            RetryOutcome::Success(value) => Ok(value),
            RetryOutcome::TimedOut {
                last_fault,
                attempts,
                elapsed,
                cancelled,
            } => Err(WaitError::TimedOut {
                alias: alias.into(),
                attempts,
                elapsed,
                cancelled,
                last_fault,
            }),
            RetryOutcome::Aborted {
                fault,
                attempts,
                elapsed,
            } => Err(WaitError::Aborted {
                alias: alias.into(),
                attempts,
                elapsed,
                fault,
            }),
        }
    }
}

/// A failed wait, named after the condition that was awaited
#[derive(Error, Debug)]
pub enum WaitError {
    /// The condition never became ready
    #[error("{alias} was not satisfied after {attempts} attempt(s) in {elapsed:?}: {last_fault}")]
    TimedOut {
        alias: String,
        attempts: u32,
        elapsed: Duration,
        cancelled: bool,
        #[source]
        last_fault: Fault,
    },

    /// The condition failed with a fatal fault
    #[error("{alias} failed on attempt {attempts}: {fault}")]
    Aborted {
        alias: String,
        attempts: u32,
        elapsed: Duration,
        #[source]
        fault: Fault,
    },
}

impl WaitError {
    /// Name of the awaited condition
    pub fn alias(&self) -> &str {
        match self {
            WaitError::TimedOut { alias, .. } | WaitError::Aborted { alias, .. } => alias,
        }
    }

    /// The fault that ended the wait
    pub fn fault(&self) -> &Fault {
        match self {
            WaitError::TimedOut { last_fault, .. } => last_fault,
            WaitError::Aborted { fault, .. } => fault,
        }
    }

    /// Number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            WaitError::TimedOut { attempts, .. } | WaitError::Aborted { attempts, .. } => *attempts,
        }
    }

    /// Check if the wait timed out
    pub fn is_timed_out(&self) -> bool {
        matches!(self, WaitError::TimedOut { .. })
    }

    /// Check if a fatal fault ended the wait
    pub fn is_aborted(&self) -> bool {
        matches!(self, WaitError::Aborted { .. })
    }

    /// Check if an external cancellation ended the wait
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::TimedOut { cancelled: true, .. })
    }
}
