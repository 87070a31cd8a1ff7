//! Wait execution engine
//!
//! This module provides the polling loop with a configurable classifier,
//! observer and cancellation signal. [`Waiter::wait`] blocks the calling
//! thread; [`Waiter::wait_async`] runs the same loop on the caller's tokio
//! runtime.

use std::future::Future;
use std::time::Instant;

use crate::config::WaitConfiguration;

use super::cancel::CancellationSignal;
use super::classifier::{FaultClassifier, OutcomeClassifier};
use super::fault::{FaultKinds, Probe};
use super::observer::{NoOpObserver, WaitObserver};
use super::outcome::{Attempt, RetryOutcome, WaitError};
use super::schedule::{PollLoop, Step};

const DEFAULT_ALIAS: &str = "condition";

/// Block until `condition` holds, treating `ignorable` fault kinds as soft
///
/// This is a convenience function for simple waits. For more control, use
/// [`WaiterBuilder`].
///
/// # Example
///
/// ```rust
/// use eventual::{wait_for, Fault, FaultKinds, WaitConfiguration};
/// use std::time::Duration;
///
/// let config = WaitConfiguration::new(Duration::from_millis(5), Duration::from_millis(200)).unwrap();
/// let mut polls = 0;
///
/// let outcome = wait_for(&config, FaultKinds::empty(), || {
///     polls += 1;
///     Fault::ensure(polls >= 3, "job still queued")?;
///     Ok(polls)
/// });
///
/// assert_eq!(outcome.success(), Some(3));
/// ```
pub fn wait_for<T, F>(
    config: &WaitConfiguration,
    ignorable: impl Into<FaultKinds>,
    condition: F,
) -> RetryOutcome<T>
where
    F: FnMut() -> Probe<T>,
{
    Waiter::builder()
        .with_config(*config)
        .ignoring(ignorable)
        .build()
        .wait(condition)
}

/// Async counterpart of [`wait_for`]
pub async fn wait_for_async<T, F, Fut>(
    config: &WaitConfiguration,
    ignorable: impl Into<FaultKinds>,
    condition: F,
) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe<T>>,
{
    Waiter::builder()
        .with_config(*config)
        .ignoring(ignorable)
        .build()
        .wait_async(condition)
        .await
}

/// Builder for configuring a [`Waiter`]
///
/// # Example
///
/// ```rust
/// use eventual::{CancellationSignal, FaultKind, TracingObserver, WaitConfiguration, WaiterBuilder};
///
/// let waiter = WaiterBuilder::new()
///     .with_config(WaitConfiguration::ROLE_PROPAGATION)
///     .ignoring(FaultKind::NotProvisioned)
///     .with_observer(TracingObserver::new("realm role"))
///     .with_cancellation(CancellationSignal::new())
///     .with_alias("realm role")
///     .build();
///
/// assert_eq!(waiter.alias(), "realm role");
/// ```
pub struct WaiterBuilder<C = OutcomeClassifier, O = NoOpObserver> {
    config: WaitConfiguration,
    classifier: C,
    observer: O,
    signal: CancellationSignal,
    alias: String,
}

impl Default for WaiterBuilder<OutcomeClassifier, NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl WaiterBuilder<OutcomeClassifier, NoOpObserver> {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: WaitConfiguration::DEFAULT,
            classifier: OutcomeClassifier::default(),
            observer: NoOpObserver,
            signal: CancellationSignal::new(),
            alias: DEFAULT_ALIAS.to_string(),
        }
    }
}

impl<C, O> WaiterBuilder<C, O> {
    /// Set the wait configuration
    pub fn with_config(mut self, config: WaitConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Set the classifier
    pub fn with_classifier<C2>(self, classifier: C2) -> WaiterBuilder<C2, O> {
        WaiterBuilder {
            config: self.config,
            classifier,
            observer: self.observer,
            signal: self.signal,
            alias: self.alias,
        }
    }

    /// Use the default classifier with the given ignorable fault kinds
    pub fn ignoring(self, ignorable: impl Into<FaultKinds>) -> WaiterBuilder<OutcomeClassifier, O> {
        self.with_classifier(OutcomeClassifier::new(ignorable.into()))
    }

    /// Set the observer
    pub fn with_observer<O2>(self, observer: O2) -> WaiterBuilder<C, O2> {
        WaiterBuilder {
            config: self.config,
            classifier: self.classifier,
            observer,
            signal: self.signal,
            alias: self.alias,
        }
    }

    /// Set the cancellation signal
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.signal = signal;
        self
    }

    /// Name the awaited condition; used in [`WaitError`] messages
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Build the waiter
    pub fn build(self) -> Waiter<C, O> {
        Waiter {
            config: self.config,
            classifier: self.classifier,
            observer: self.observer,
            signal: self.signal,
            alias: self.alias,
        }
    }
}

/// A reusable wait with configuration, classifier, observer and
/// cancellation signal
///
/// Use [`WaiterBuilder`] to create an instance. A waiter holds no state
/// between waits, so one instance may serve concurrent waits from several
/// threads.
pub struct Waiter<C = OutcomeClassifier, O = NoOpObserver> {
    config: WaitConfiguration,
    classifier: C,
    observer: O,
    signal: CancellationSignal,
    alias: String,
}

impl Waiter {
    /// Create a waiter with the default classifier and no observer
    pub fn new(config: WaitConfiguration) -> Self {
        WaiterBuilder::new().with_config(config).build()
    }

    /// Start building a waiter
    pub fn builder() -> WaiterBuilder {
        WaiterBuilder::new()
    }
}

impl<C, O> Waiter<C, O> {
    /// The wait configuration
    pub fn config(&self) -> &WaitConfiguration {
        &self.config
    }

    /// Name of the awaited condition
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The cancellation signal shared with this waiter
    pub fn cancellation(&self) -> &CancellationSignal {
        &self.signal
    }
}

impl<C, O> Waiter<C, O>
where
    C: FaultClassifier,
    O: WaitObserver,
{
    /// Block the calling thread until the condition holds, fails fatally,
    /// or the budget runs out
    ///
    /// The first attempt runs immediately; a success or a fatal fault ends
    /// the wait without sleeping.
    ///
    /// At most `floor(timeout / poll_interval) + 1` attempts run. When the
    /// timeout is not a multiple of the poll interval, the last attempt is
    /// followed by a shorter sleep covering the rest of the budget, and the
    /// wait then returns [`RetryOutcome::TimedOut`] without calling the
    /// condition again. A condition that would only have held during that
    /// final partial interval is never observed.
    pub fn wait<T, F>(&self, mut condition: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Probe<T>,
    {
        let start = Instant::now();
        let mut poll = PollLoop::new(&self.config, &self.observer);

        loop {
            poll.begin_attempt();
            let attempt = Attempt::from_probe(condition(), &self.classifier);

            match poll.settle(attempt, start.elapsed(), self.signal.is_cancelled()) {
                Step::Finished(outcome) => return outcome,
                Step::Sleep { delay, fault } => {
                    let cancelled = self.signal.sleep(delay);
                    if let Some(outcome) = poll.resume(fault, start.elapsed(), cancelled) {
                        return outcome;
                    }
                }
            }
        }
    }

    /// Run the wait on the tokio runtime, sleeping with `tokio::time`
    ///
    /// Attempts and the final partial interval behave as in
    /// [`wait`](Self::wait).
    pub async fn wait_async<T, F, Fut>(&self, mut condition: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Probe<T>>,
    {
        let start = tokio::time::Instant::now();
        let mut poll = PollLoop::new(&self.config, &self.observer);

        loop {
            poll.begin_attempt();
            let attempt = Attempt::from_probe(condition().await, &self.classifier);

            match poll.settle(attempt, start.elapsed(), self.signal.is_cancelled()) {
                Step::Finished(outcome) => return outcome,
                Step::Sleep { delay, fault } => {
                    let cancelled = self.signal.sleep_async(delay).await;
                    if let Some(outcome) = poll.resume(fault, start.elapsed(), cancelled) {
                        return outcome;
                    }
                }
            }
        }
    }

    /// [`wait`](Self::wait), with failures translated into [`WaitError`]
    pub fn until<T, F>(&self, condition: F) -> Result<T, WaitError>
    where
        F: FnMut() -> Probe<T>,
    {
        self.wait(condition).into_result(self.alias.as_str())
    }

    /// [`wait_async`](Self::wait_async), with failures translated into
    /// [`WaitError`]
    pub async fn until_async<T, F, Fut>(&self, condition: F) -> Result<T, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Probe<T>>,
    {
        self.wait_async(condition)
            .await
            .into_result(self.alias.as_str())
    }
}
