//! Shared helpers for eventual integration tests

#![allow(dead_code)]

use eventual::WaitConfiguration;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Route `tracing` output through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("eventual=debug"))
        .with_test_writer()
        .try_init();
}

/// Build a configuration, panicking on invalid input
pub fn config(poll_interval: Duration, timeout: Duration) -> WaitConfiguration {
    WaitConfiguration::new(poll_interval, timeout).expect("valid wait configuration")
}

/// Clonable count of condition invocations
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicU32>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call and return its 1-based number
    pub fn tick(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}
