//! # eventual
//!
//! Bounded polling for integration tests against eventually-consistent
//! systems. A caller supplies a condition (a probe of some external system
//! plus an assertion about what it returned) and a [`WaitConfiguration`];
//! the engine re-evaluates the condition at a fixed cadence until it holds,
//! a fatal fault occurs, or the time budget runs out.
//!
//! - [`config`]: wait configurations, named presets and YAML profiles
//! - [`wait`]: faults, classification, the polling engine and observers
//! - [`adapter`]: narrowing of probe results (first row, non-empty, map)
//!
//! ```rust
//! use eventual::{Fault, FaultKind, ResultAdapter, Waiter, WaitConfiguration};
//! use std::time::Duration;
//!
//! let config = WaitConfiguration::new(Duration::from_millis(5), Duration::from_secs(1)).unwrap();
//! let waiter = Waiter::builder()
//!     .with_config(config)
//!     .ignoring(FaultKind::NotProvisioned)
//!     .with_alias("realm role 'auditor'")
//!     .build();
//!
//! let roles = ResultAdapter::new().describing("role 'auditor'");
//! let mut lookups = 0;
//! let role = waiter.until(|| {
//!     lookups += 1;
//!     if lookups == 1 {
//!         return Err(Fault::not_provisioned("realm not created yet"));
//!     }
//!     let visible: Vec<&str> = if lookups < 3 { vec![] } else { vec!["auditor"] };
//!     roles.require_first(visible)
//! });
//!
//! assert_eq!(role.unwrap(), "auditor");
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod wait;

pub use adapter::{EmptyPolicy, ResultAdapter};
pub use config::{
    PollStrategy, ProfileLoader, TimeUnit, WaitConfiguration, WaitConfigurationBuilder,
    WaitProfiles, WaitSettings,
};
pub use error::{Error, Result};
pub use wait::{
    poll_delay, wait_for, wait_for_async, Attempt, CancellationSignal, Classification,
    ClosureClassifier, Fault, FaultClassifier, FaultKind, FaultKinds, IgnoreAll, NoOpObserver,
    OutcomeClassifier, Probe, RetryOutcome, StatsObserver, StrictClassifier, TracingObserver,
    WaitError, WaitObserver, Waiter, WaiterBuilder,
};
