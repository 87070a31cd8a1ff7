//! Bounded polling engine
//!
//! This module waits for an eventually-consistent external condition to
//! become true within a time budget, telling "not ready yet" apart from
//! "broken".
//!
//! # Features
//!
//! - Conditions return [`Probe<T>`]: a value, or a [`Fault`] tagged with a
//!   closed [`FaultKind`]
//! - Pluggable classification of faults into soft and fatal
//! - Blocking ([`Waiter::wait`]) and tokio ([`Waiter::wait_async`]) drivers
//!   sharing one loop
//! - Observable attempts via the [`WaitObserver`] trait, with a built-in
//!   [`TracingObserver`]
//! - External cancellation through [`CancellationSignal`]
//!
//! # Example
//!
//! ```rust
//! use eventual::{Fault, FaultKind, Waiter, WaitConfiguration};
//! use std::time::Duration;
//!
//! let config = WaitConfiguration::new(Duration::from_millis(5), Duration::from_millis(500)).unwrap();
//! let waiter = Waiter::builder()
//!     .with_config(config)
//!     .ignoring(FaultKind::Unavailable)
//!     .with_alias("health endpoint")
//!     .build();
//!
//! let mut responses = vec![200, 503, 503].into_iter();
//! let status = waiter.until(|| {
//!     let code = responses.next_back().unwrap_or(200);
//!     match Fault::from_http_status(code, "GET /health") {
//!         Some(fault) => Err(fault),
//!         None => Ok(code),
//!     }
//! });
//!
//! assert_eq!(status.unwrap(), 200);
//! ```

mod cancel;
mod classifier;
mod engine;
mod fault;
mod observer;
mod outcome;
mod schedule;

pub use cancel::CancellationSignal;
pub use classifier::{
    Classification, ClosureClassifier, FaultClassifier, IgnoreAll, OutcomeClassifier,
    StrictClassifier,
};
pub use engine::{wait_for, wait_for_async, Waiter, WaiterBuilder};
pub use fault::{Fault, FaultKind, FaultKinds, Probe};
pub use observer::{NoOpObserver, StatsObserver, TracingObserver, WaitObserver};
pub use outcome::{Attempt, RetryOutcome, WaitError};
pub use schedule::poll_delay;

#[cfg(test)]
mod tests;
