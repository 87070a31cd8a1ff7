//! Wait configuration and named profiles

mod profiles;
mod wait_config;

pub use profiles::{ProfileLoader, WaitProfiles, ENV_JITTER, ENV_POLL_INTERVAL_MS, ENV_TIMEOUT_MS};
pub use wait_config::{
    PollStrategy, TimeUnit, WaitConfiguration, WaitConfigurationBuilder, WaitSettings,
};
