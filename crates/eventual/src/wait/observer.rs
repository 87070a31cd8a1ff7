//! Wait observation and logging
//!
//! This module provides the `WaitObserver` trait for monitoring polling
//! attempts and a `TracingObserver` implementation that logs using the
//! `tracing` crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::fault::Fault;

/// Observer trait for wait events
///
/// Implement this trait to receive callbacks while a wait is polling.
/// This is useful for logging, metrics collection, or debugging.
///
/// # Example
///
/// ```rust
/// use eventual::{Fault, WaitObserver};
/// use std::time::Duration;
///
/// struct PrintObserver;
///
/// impl WaitObserver for PrintObserver {
///     fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
///         println!("attempt {}/{}", attempt, max_attempts);
///     }
///
///     fn on_not_ready(&self, attempt: u32, fault: &Fault, delay: Duration) {
///         println!("attempt {} not ready ({}), next in {:?}", attempt, fault, delay);
///     }
///
///     fn on_success(&self, attempt: u32, elapsed: Duration) {}
///
///     fn on_timed_out(&self, attempts: u32, last_fault: &Fault, elapsed: Duration) {}
///
///     fn on_aborted(&self, attempt: u32, fault: &Fault, elapsed: Duration) {}
/// }
/// ```
pub trait WaitObserver: Send + Sync {
    /// Called when an attempt is about to start
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed)
    /// * `max_attempts` - Upper bound on attempts for this configuration
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// Called when an attempt raised a soft fault and polling continues
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that was not ready (1-indexed)
    /// * `fault` - The soft fault
    /// * `delay` - The sleep before the next attempt
    fn on_not_ready(&self, attempt: u32, fault: &Fault, delay: Duration);

    /// Called when the condition holds
    fn on_success(&self, attempt: u32, elapsed: Duration);

    /// Called when the budget is exhausted
    fn on_timed_out(&self, attempts: u32, last_fault: &Fault, elapsed: Duration);

    /// Called when a fatal fault ends the wait
    fn on_aborted(&self, attempt: u32, fault: &Fault, elapsed: Duration);

    /// Called when an external cancellation ends the wait
    fn on_cancelled(&self, attempts: u32, last_fault: &Fault) {
        let _ = (attempts, last_fault);
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl WaitObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_not_ready(&self, _attempt: u32, _fault: &Fault, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _elapsed: Duration) {}

    fn on_timed_out(&self, _attempts: u32, _last_fault: &Fault, _elapsed: Duration) {}

    fn on_aborted(&self, _attempt: u32, _fault: &Fault, _elapsed: Duration) {}
}

/// An observer that logs wait events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_not_ready`: DEBUG for the first attempt, WARN afterwards
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_timed_out`: ERROR
/// - `on_aborted`: ERROR
/// - `on_cancelled`: WARN
///
/// # Example
///
/// ```rust
/// use eventual::TracingObserver;
///
/// let observer = TracingObserver::new("jenkins build");
/// assert_eq!(observer.condition(), "jenkins build");
/// ```
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the awaited condition (for log context)
    condition: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
        }
    }

    /// Get the condition name
    pub fn condition(&self) -> &str {
        &self.condition
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("wait")
    }
}

impl WaitObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            condition = %self.condition,
            attempt = attempt,
            max_attempts = max_attempts,
            "polling condition"
        );
    }

    fn on_not_ready(&self, attempt: u32, fault: &Fault, delay: Duration) {
        if attempt > 1 {
            tracing::warn!(
                condition = %self.condition,
                attempt = attempt,
                fault = %fault,
                delay_ms = delay.as_millis() as u64,
                "condition still not ready"
            );
        } else {
            tracing::debug!(
                condition = %self.condition,
                fault = %fault,
                delay_ms = delay.as_millis() as u64,
                "condition not ready yet"
            );
        }
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        if attempt > 1 {
            tracing::info!(
                condition = %self.condition,
                attempt = attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                "condition satisfied after polling"
            );
        } else {
            tracing::debug!(
                condition = %self.condition,
                elapsed_ms = elapsed.as_millis() as u64,
                "condition satisfied on first attempt"
            );
        }
    }

    fn on_timed_out(&self, attempts: u32, last_fault: &Fault, elapsed: Duration) {
        tracing::error!(
            condition = %self.condition,
            attempts = attempts,
            fault = %last_fault,
            elapsed_ms = elapsed.as_millis() as u64,
            "timed out waiting for condition"
        );
    }

    fn on_aborted(&self, attempt: u32, fault: &Fault, elapsed: Duration) {
        tracing::error!(
            condition = %self.condition,
            attempt = attempt,
            fault = %fault,
            elapsed_ms = elapsed.as_millis() as u64,
            "wait aborted by fatal fault"
        );
    }

    fn on_cancelled(&self, attempts: u32, last_fault: &Fault) {
        tracing::warn!(
            condition = %self.condition,
            attempts = attempts,
            fault = %last_fault,
            "wait cancelled"
        );
    }
}

/// An observer that counts wait events
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    not_ready: AtomicU32,
    successes: AtomicU32,
    timeouts: AtomicU32,
    aborts: AtomicU32,
    cancellations: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of attempt starts
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Get the number of not-ready attempts that were followed by a sleep
    pub fn not_ready(&self) -> u32 {
        self.not_ready.load(Ordering::SeqCst)
    }

    /// Get the number of successes
    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    /// Get the number of timeouts
    pub fn timeouts(&self) -> u32 {
        self.timeouts.load(Ordering::SeqCst)
    }

    /// Get the number of aborts
    pub fn aborts(&self) -> u32 {
        self.aborts.load(Ordering::SeqCst)
    }

    /// Get the number of cancellations
    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }
}

impl WaitObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_not_ready(&self, _attempt: u32, _fault: &Fault, _delay: Duration) {
        self.not_ready.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, _attempt: u32, _elapsed: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_timed_out(&self, _attempts: u32, _last_fault: &Fault, _elapsed: Duration) {
        self.timeouts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_aborted(&self, _attempt: u32, _fault: &Fault, _elapsed: Duration) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self, _attempts: u32, _last_fault: &Fault) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: WaitObserver + ?Sized> WaitObserver for Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_not_ready(&self, attempt: u32, fault: &Fault, delay: Duration) {
        (**self).on_not_ready(attempt, fault, delay)
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        (**self).on_success(attempt, elapsed)
    }

    fn on_timed_out(&self, attempts: u32, last_fault: &Fault, elapsed: Duration) {
        (**self).on_timed_out(attempts, last_fault, elapsed)
    }

    fn on_aborted(&self, attempt: u32, fault: &Fault, elapsed: Duration) {
        (**self).on_aborted(attempt, fault, elapsed)
    }

    fn on_cancelled(&self, attempts: u32, last_fault: &Fault) {
        (**self).on_cancelled(attempts, last_fault)
    }
}

impl<T: WaitObserver + ?Sized> WaitObserver for Box<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_not_ready(&self, attempt: u32, fault: &Fault, delay: Duration) {
        (**self).on_not_ready(attempt, fault, delay)
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        (**self).on_success(attempt, elapsed)
    }

    fn on_timed_out(&self, attempts: u32, last_fault: &Fault, elapsed: Duration) {
        (**self).on_timed_out(attempts, last_fault, elapsed)
    }

    fn on_aborted(&self, attempt: u32, fault: &Fault, elapsed: Duration) {
        (**self).on_aborted(attempt, fault, elapsed)
    }

    fn on_cancelled(&self, attempts: u32, last_fault: &Fault) {
        (**self).on_cancelled(attempts, last_fault)
    }
}
