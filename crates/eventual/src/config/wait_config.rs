//! Wait configuration: poll cadence and total time budget
//!
//! A [`WaitConfiguration`] is an immutable value built once per logical wait.
//! Its bounds are checked at construction time, so a configuration that
//! exists is always usable by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Unit attached to a numeric poll interval or timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Nanoseconds
    #[serde(alias = "ns", alias = "nanos")]
    Nanoseconds,

    /// Microseconds
    #[serde(alias = "us", alias = "micros")]
    Microseconds,

    /// Milliseconds
    #[serde(alias = "ms", alias = "millis")]
    Milliseconds,

    /// Seconds
    #[serde(alias = "s", alias = "secs")]
    Seconds,

    /// Minutes
    #[serde(alias = "m", alias = "mins")]
    Minutes,

    /// Hours
    #[serde(alias = "h")]
    Hours,
}

impl TimeUnit {
    /// Convert `value` expressed in this unit into a [`Duration`]
    pub fn to_duration(self, value: u64) -> Duration {
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(value),
            TimeUnit::Microseconds => Duration::from_micros(value),
            TimeUnit::Milliseconds => Duration::from_millis(value),
            TimeUnit::Seconds => Duration::from_secs(value),
            TimeUnit::Minutes => Duration::from_secs(value.saturating_mul(60)),
            TimeUnit::Hours => Duration::from_secs(value.saturating_mul(3600)),
        }
    }

    /// Length of one unit in nanoseconds
    const fn nanos(self) -> u128 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60_000_000_000,
            TimeUnit::Hours => 3_600_000_000_000,
        }
    }

    /// Express `duration` in the coarsest unit that represents it exactly
    ///
    /// `TimeUnit::to_duration` on the result gives back `duration`. Only
    /// durations beyond roughly 584 years with a sub-second part have no
    /// exact `u64` form; those are rounded up to whole seconds.
    pub fn split(duration: Duration) -> (u64, TimeUnit) {
        const COARSEST_FIRST: [TimeUnit; 6] = [
            TimeUnit::Hours,
            TimeUnit::Minutes,
            TimeUnit::Seconds,
            TimeUnit::Milliseconds,
            TimeUnit::Microseconds,
            TimeUnit::Nanoseconds,
        ];

        let nanos = duration.as_nanos();
        COARSEST_FIRST
            .into_iter()
            .filter(|unit| nanos % unit.nanos() == 0)
            .find_map(|unit| {
                u64::try_from(nanos / unit.nanos())
                    .ok()
                    .map(|value| (value, unit))
            })
            .unwrap_or((duration.as_secs().saturating_add(1), TimeUnit::Seconds))
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Nanoseconds => "nanoseconds",
            TimeUnit::Microseconds => "microseconds",
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
        };
        f.write_str(name)
    }
}

/// How the gap between attempts evolves over a wait
///
/// Every strategy starts at the configured poll interval and never goes
/// below it, so the attempt bound `floor(timeout / poll_interval) + 1`
/// holds for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PollStrategy {
    /// Same interval between every attempt (default)
    #[default]
    Fixed,

    /// Interval grows by one poll interval per attempt
    Linear,

    /// Interval is multiplied by the backoff multiplier per attempt
    Exponential,
}

/// Immutable polling policy for one logical wait
///
/// # Example
///
/// ```rust
/// use eventual::WaitConfiguration;
/// use std::time::Duration;
///
/// let config = WaitConfiguration::new(Duration::from_secs(1), Duration::from_secs(5)).unwrap();
/// assert_eq!(config.max_attempts(), 6);
///
/// // Construction is where bounds are enforced
/// assert!(WaitConfiguration::new(Duration::ZERO, Duration::from_secs(5)).is_err());
/// assert!(WaitConfiguration::new(Duration::from_secs(5), Duration::from_secs(1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitConfiguration {
    poll_interval: Duration,
    timeout: Duration,
    strategy: PollStrategy,
    backoff_multiplier: f64,
    max_poll_interval: Duration,
    jitter: bool,
}

impl WaitConfiguration {
    /// Fallback used when a caller has no better idea: 1 s poll, 1 min budget
    pub const DEFAULT: Self = Self::preset(1, 60);

    /// Waiting for a granted or revoked role to become visible
    pub const ROLE_PROPAGATION: Self = Self::preset(1, 60);

    /// Waiting for a row to appear in (or vanish from) a table
    pub const DATABASE_ROW: Self = Self::preset(1, 2 * 60);

    /// Waiting for a queued CI job to receive an executor
    pub const QUEUE_DEQUEUE: Self = Self::preset(2, 2 * 60);

    /// Waiting for a pipeline to pause on an input request
    pub const INPUT_REQUEST: Self = Self::preset(2, 5 * 60);

    /// Waiting for a CI build to reach a terminal status
    pub const BUILD_COMPLETION: Self = Self::preset(15, 30 * 60);

    /// Waiting for an HTTP endpoint to stop answering 503/504
    pub const SERVICE_READY: Self = Self::preset(1, 5 * 60);

    /// Fixed-cadence preset; both values in seconds, poll <= timeout
    const fn preset(poll_secs: u64, timeout_secs: u64) -> Self {
        Self {
            poll_interval: Duration::from_secs(poll_secs),
            timeout: Duration::from_secs(timeout_secs),
            strategy: PollStrategy::Fixed,
            backoff_multiplier: 2.0,
            max_poll_interval: Duration::from_secs(timeout_secs),
            jitter: false,
        }
    }

    /// Create a fixed-cadence configuration
    ///
    /// Fails with [`Error::InvalidConfiguration`] if `poll_interval` is zero
    /// or `timeout` is shorter than `poll_interval`.
    pub fn new(poll_interval: Duration, timeout: Duration) -> Result<Self> {
        Self::builder()
            .poll_interval(poll_interval)
            .timeout(timeout)
            .build()
    }

    /// Create a configuration from `(value, unit)` pairs
    pub fn from_units(
        poll_interval: u64,
        poll_interval_unit: TimeUnit,
        timeout: u64,
        timeout_unit: TimeUnit,
    ) -> Result<Self> {
        Self::new(
            poll_interval_unit.to_duration(poll_interval),
            timeout_unit.to_duration(timeout),
        )
    }

    /// Start building a configuration
    pub fn builder() -> WaitConfigurationBuilder {
        WaitConfigurationBuilder::default()
    }

    /// Minimum spacing between successive attempts
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Total time budget of the wait
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Interval growth strategy
    pub fn strategy(&self) -> PollStrategy {
        self.strategy
    }

    /// Multiplier used by [`PollStrategy::Exponential`]
    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Upper bound for a grown interval
    pub fn max_poll_interval(&self) -> Duration {
        self.max_poll_interval
    }

    /// Whether a random extra delay (up to 25%) is added to each interval
    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// Upper bound on the number of attempts: `floor(timeout / poll_interval) + 1`
    pub fn max_attempts(&self) -> u32 {
        let full_intervals = self.timeout.as_nanos() / self.poll_interval.as_nanos();
        u32::try_from(full_intervals)
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::invalid_configuration(
                "poll interval must be greater than zero",
            ));
        }

        if self.timeout < self.poll_interval {
            return Err(Error::invalid_configuration(format!(
                "timeout ({:?}) must not be shorter than the poll interval ({:?})",
                self.timeout, self.poll_interval
            )));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::invalid_configuration(format!(
                "backoff multiplier must be a finite number >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }

        if self.max_poll_interval < self.poll_interval {
            return Err(Error::invalid_configuration(format!(
                "max poll interval ({:?}) must not be shorter than the poll interval ({:?})",
                self.max_poll_interval, self.poll_interval
            )));
        }

        Ok(())
    }
}

impl Default for WaitConfiguration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Builder for [`WaitConfiguration`]
///
/// Defaults: 1 s poll interval, 1 min timeout, fixed cadence, no jitter.
/// The max poll interval defaults to the timeout.
#[derive(Debug, Clone)]
pub struct WaitConfigurationBuilder {
    poll_interval: Duration,
    timeout: Duration,
    strategy: PollStrategy,
    backoff_multiplier: f64,
    max_poll_interval: Option<Duration>,
    jitter: bool,
}

impl Default for WaitConfigurationBuilder {
    fn default() -> Self {
        Self {
            poll_interval: WaitConfiguration::DEFAULT.poll_interval,
            timeout: WaitConfiguration::DEFAULT.timeout,
            strategy: PollStrategy::Fixed,
            backoff_multiplier: 2.0,
            max_poll_interval: None,
            jitter: false,
        }
    }
}

impl WaitConfigurationBuilder {
    /// Set the poll interval
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the total timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the interval growth strategy
    pub fn strategy(mut self, strategy: PollStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the multiplier for exponential growth
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Cap grown intervals at `max`
    pub fn max_poll_interval(mut self, max: Duration) -> Self {
        self.max_poll_interval = Some(max);
        self
    }

    /// Enable or disable jitter
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<WaitConfiguration> {
        let config = WaitConfiguration {
            poll_interval: self.poll_interval,
            timeout: self.timeout,
            strategy: self.strategy,
            backoff_multiplier: self.backoff_multiplier,
            max_poll_interval: self.max_poll_interval.unwrap_or(self.timeout),
            jitter: self.jitter,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Serializable form of a wait configuration
///
/// Mirrors how test suites describe waits: a number plus a unit for both
/// the poll interval and the wait timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WaitSettings {
    /// Poll interval value
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Unit of `poll_interval`
    #[serde(default = "default_poll_interval_unit")]
    pub poll_interval_unit: TimeUnit,

    /// Wait timeout value
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: u64,

    /// Unit of `wait_timeout`
    #[serde(default = "default_wait_timeout_unit")]
    pub wait_timeout_unit: TimeUnit,

    /// Interval growth strategy
    #[serde(default)]
    pub strategy: PollStrategy,

    /// Multiplier for exponential growth
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Cap for grown intervals; defaults to the wait timeout
    #[serde(default)]
    pub max_poll_interval: Option<u64>,

    /// Unit of `max_poll_interval`
    #[serde(default = "default_max_poll_interval_unit")]
    pub max_poll_interval_unit: TimeUnit,

    /// Add up to 25% random delay to each interval
    #[serde(default)]
    pub jitter: bool,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            poll_interval_unit: default_poll_interval_unit(),
            wait_timeout: default_wait_timeout(),
            wait_timeout_unit: default_wait_timeout_unit(),
            strategy: PollStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            max_poll_interval: None,
            max_poll_interval_unit: default_max_poll_interval_unit(),
            jitter: false,
        }
    }
}

fn default_poll_interval() -> u64 {
    1
}
fn default_poll_interval_unit() -> TimeUnit {
    TimeUnit::Seconds
}
fn default_wait_timeout() -> u64 {
    1
}
fn default_wait_timeout_unit() -> TimeUnit {
    TimeUnit::Minutes
}
fn default_max_poll_interval_unit() -> TimeUnit {
    TimeUnit::Seconds
}
fn default_backoff_multiplier() -> f64 {
    2.0
}

impl TryFrom<WaitSettings> for WaitConfiguration {
    type Error = Error;

    fn try_from(settings: WaitSettings) -> Result<Self> {
        let mut builder = WaitConfiguration::builder()
            .poll_interval(settings.poll_interval_unit.to_duration(settings.poll_interval))
            .timeout(settings.wait_timeout_unit.to_duration(settings.wait_timeout))
            .strategy(settings.strategy)
            .backoff_multiplier(settings.backoff_multiplier)
            .jitter(settings.jitter);

        if let Some(max) = settings.max_poll_interval {
            builder = builder.max_poll_interval(settings.max_poll_interval_unit.to_duration(max));
        }

        builder.build()
    }
}

impl From<&WaitConfiguration> for WaitSettings {
    fn from(config: &WaitConfiguration) -> Self {
        let (poll_interval, poll_interval_unit) = TimeUnit::split(config.poll_interval);
        let (wait_timeout, wait_timeout_unit) = TimeUnit::split(config.timeout);
        let (max_poll_interval, max_poll_interval_unit) =
            if config.max_poll_interval == config.timeout {
                (None, default_max_poll_interval_unit())
            } else {
                let (value, unit) = TimeUnit::split(config.max_poll_interval);
                (Some(value), unit)
            };

        Self {
            poll_interval,
            poll_interval_unit,
            wait_timeout,
            wait_timeout_unit,
            strategy: config.strategy,
            backoff_multiplier: config.backoff_multiplier,
            max_poll_interval,
            max_poll_interval_unit,
            jitter: config.jitter,
        }
    }
}

impl TryFrom<&WaitSettings> for WaitConfiguration {
    type Error = Error;

    fn try_from(settings: &WaitSettings) -> Result<Self> {
        WaitConfiguration::try_from(settings.clone())
    }
}
