//! Poll cadence and loop bookkeeping
//!
//! [`poll_delay`] computes the gap before the next attempt. `PollLoop` holds
//! the per-wait counters and turns each classified attempt into either a
//! terminal [`RetryOutcome`] or a sleep. It never reads a clock itself: the
//! blocking and async drivers pass in the elapsed time measured with their
//! own clocks.

use rand::Rng;
use std::time::Duration;

use crate::config::{PollStrategy, WaitConfiguration};

use super::fault::Fault;
use super::observer::WaitObserver;
use super::outcome::{Attempt, RetryOutcome};

/// Calculate the delay after a not-ready attempt
///
/// # Arguments
///
/// * `config` - The wait configuration
/// * `attempt` - The attempt that was not ready (1-indexed)
///
/// The delay is never shorter than the configured poll interval. Growth
/// strategies are capped at the configuration's max poll interval; jitter
/// then adds up to 25% on top.
///
/// # Example
///
/// ```rust
/// use eventual::{poll_delay, PollStrategy, WaitConfiguration};
/// use std::time::Duration;
///
/// let config = WaitConfiguration::builder()
///     .poll_interval(Duration::from_secs(1))
///     .timeout(Duration::from_secs(60))
///     .strategy(PollStrategy::Exponential)
///     .max_poll_interval(Duration::from_secs(10))
///     .build()
///     .unwrap();
///
/// assert_eq!(poll_delay(&config, 1), Duration::from_secs(1));
/// assert_eq!(poll_delay(&config, 3), Duration::from_secs(4));
/// assert_eq!(poll_delay(&config, 10), Duration::from_secs(10));
/// ```
pub fn poll_delay(config: &WaitConfiguration, attempt: u32) -> Duration {
    let attempt_index = attempt.saturating_sub(1);
    let poll = config.poll_interval();

    let base = match config.strategy() {
        PollStrategy::Fixed => poll,

        PollStrategy::Linear => poll.saturating_mul(attempt_index.saturating_add(1)),

        PollStrategy::Exponential => {
            let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
            let factor = config.backoff_multiplier().powi(exponent);
            Duration::try_from_secs_f64(poll.as_secs_f64() * factor).unwrap_or(Duration::MAX)
        }
    };

    let capped = base.min(config.max_poll_interval()).max(poll);

    if config.jitter() {
        let range = u64::try_from(capped.as_nanos() / 4).unwrap_or(u64::MAX);
        let extra = rand::rng().random_range(0..=range);
        capped.saturating_add(Duration::from_nanos(extra))
    } else {
        capped
    }
}

/// What the driver does after an attempt
#[derive(Debug)]
pub(crate) enum Step<T> {
    /// The wait is over
    Finished(RetryOutcome<T>),

    /// Sleep for `delay`, then call [`PollLoop::resume`] with `fault`
    Sleep { delay: Duration, fault: Fault },
}

/// Attempt counting and termination rules shared by both drivers
pub(crate) struct PollLoop<'a, O: ?Sized> {
    config: &'a WaitConfiguration,
    observer: &'a O,
    max_attempts: u32,
    attempts: u32,
}

impl<'a, O> PollLoop<'a, O>
where
    O: WaitObserver + ?Sized,
{
    pub(crate) fn new(config: &'a WaitConfiguration, observer: &'a O) -> Self {
        Self {
            config,
            observer,
            max_attempts: config.max_attempts(),
            attempts: 0,
        }
    }

    /// Record the start of the next attempt
    pub(crate) fn begin_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
        self.observer
            .on_attempt_start(self.attempts, self.max_attempts);
    }

    /// Decide what follows a classified attempt
    pub(crate) fn settle<T>(
        &mut self,
        attempt: Attempt<T>,
        elapsed: Duration,
        cancelled: bool,
    ) -> Step<T> {
        match attempt {
            Attempt::Ready(value) => {
                self.observer.on_success(self.attempts, elapsed);
                Step::Finished(RetryOutcome::Success(value))
            }

            Attempt::Fatal(fault) => {
                self.observer.on_aborted(self.attempts, &fault, elapsed);
                Step::Finished(RetryOutcome::Aborted {
                    fault,
                    attempts: self.attempts,
                    elapsed,
                })
            }

            Attempt::NotYetReady(fault) => {
                let timeout = self.config.timeout();
                if cancelled || elapsed >= timeout {
                    return Step::Finished(self.give_up(fault, elapsed, cancelled));
                }

                let delay = poll_delay(self.config, self.attempts).min(timeout - elapsed);
                self.observer.on_not_ready(self.attempts, &fault, delay);
                Step::Sleep { delay, fault }
            }
        }
    }

    /// Decide whether to attempt again after sleeping
    ///
    /// The last permitted attempt sleeps out the remaining budget and ends
    /// here, so elapsed time is at least the timeout when it gives up.
    pub(crate) fn resume<T>(
        &self,
        fault: Fault,
        elapsed: Duration,
        cancelled: bool,
    ) -> Option<RetryOutcome<T>> {
        if cancelled || self.attempts >= self.max_attempts {
            Some(self.give_up(fault, elapsed, cancelled))
        } else {
            None
        }
    }

    fn give_up<T>(&self, last_fault: Fault, elapsed: Duration, cancelled: bool) -> RetryOutcome<T> {
        if cancelled {
            self.observer.on_cancelled(self.attempts, &last_fault);
        } else {
            self.observer
                .on_timed_out(self.attempts, &last_fault, elapsed);
        }

        RetryOutcome::TimedOut {
            last_fault,
            attempts: self.attempts,
            elapsed,
            cancelled,
        }
    }
}
