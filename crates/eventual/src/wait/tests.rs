//! Integration tests for the wait module
//!
//! These tests drive the complete polling flow including classification,
//! scheduling, observers and cancellation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{PollStrategy, WaitConfiguration};
use crate::wait::cancel::CancellationSignal;
use crate::wait::classifier::{Classification, ClosureClassifier, IgnoreAll, StrictClassifier};
use crate::wait::engine::{wait_for, Waiter};
use crate::wait::fault::{Fault, FaultKind, FaultKinds};
use crate::wait::observer::{StatsObserver, TracingObserver};
use crate::wait::outcome::RetryOutcome;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("eventual=debug"))
        .with_test_writer()
        .try_init();
}

fn config_ms(poll_ms: u64, timeout_ms: u64) -> WaitConfiguration {
    WaitConfiguration::new(
        Duration::from_millis(poll_ms),
        Duration::from_millis(timeout_ms),
    )
    .unwrap()
}

// ============================================================================
// Blocking driver
// ============================================================================

#[test]
fn test_first_attempt_success_never_sleeps() {
    let stats = Arc::new(StatsObserver::new());
    let waiter = Waiter::builder()
        .with_config(config_ms(500, 5000))
        .with_observer(stats.clone())
        .build();

    let start = Instant::now();
    let outcome = waiter.wait(|| Ok::<_, Fault>("ok"));

    assert_eq!(outcome.success(), Some("ok"));
    assert!(start.elapsed() < Duration::from_millis(500));
    assert_eq!(stats.attempt_starts(), 1);
    assert_eq!(stats.not_ready(), 0);
    assert_eq!(stats.successes(), 1);
}

#[test]
fn test_always_soft_times_out_within_attempt_bound() {
    let config = config_ms(20, 100);
    let stats = Arc::new(StatsObserver::new());
    let waiter = Waiter::builder()
        .with_config(config)
        .with_observer(stats.clone())
        .build();

    let start = Instant::now();
    let outcome = waiter.wait(|| Err::<(), _>(Fault::not_ready("row absent")));

    match outcome {
        RetryOutcome::TimedOut {
            last_fault,
            attempts,
            elapsed,
            cancelled,
        } => {
            assert_eq!(last_fault.reason(), "row absent");
            assert!(attempts <= config.max_attempts());
            assert!(elapsed >= config.timeout());
            assert!(!cancelled);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert_eq!(stats.timeouts(), 1);
}

#[test]
fn test_timeout_not_multiple_of_interval_keeps_bound() {
    // floor(100 / 30) + 1 = 4 attempts at most
    let config = config_ms(30, 100);
    let calls = AtomicU32::new(0);

    let outcome = wait_for(&config, FaultKinds::empty(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(Fault::not_ready("pending"))
    });

    assert!(outcome.is_timed_out());
    assert!(calls.load(Ordering::SeqCst) <= 4);
    match outcome {
        RetryOutcome::TimedOut { elapsed, .. } => assert!(elapsed >= config.timeout()),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[test]
fn test_fatal_fault_aborts_without_sleeping() {
    let config = config_ms(500, 5000);
    let stats = Arc::new(StatsObserver::new());
    let waiter = Waiter::builder()
        .with_config(config)
        .with_observer(stats.clone())
        .build();

    let outcome = waiter.wait(|| Err::<(), _>(Fault::transport("connection refused")));

    match outcome {
        RetryOutcome::Aborted {
            fault,
            attempts,
            elapsed,
        } => {
            assert_eq!(fault.kind(), FaultKind::Transport);
            assert_eq!(attempts, 1);
            assert!(elapsed < config.poll_interval());
        }
        other => panic!("expected abort, got {:?}", other),
    }
    assert_eq!(stats.not_ready(), 0);
    assert_eq!(stats.aborts(), 1);
}

#[test]
fn test_fatal_after_soft_faults_aborts_immediately() {
    let calls = AtomicU32::new(0);

    let outcome = wait_for(&config_ms(5, 5000), FaultKind::NotProvisioned, || {
        match calls.fetch_add(1, Ordering::SeqCst) {
            0 | 1 => Err::<(), _>(Fault::not_provisioned("role not created")),
            _ => Err(Fault::new(FaultKind::Unauthorized, "token revoked")),
        }
    });

    assert!(outcome.is_aborted());
    assert_eq!(outcome.attempts(), Some(3));
    assert_eq!(outcome.fault().unwrap().kind(), FaultKind::Unauthorized);
}

#[test]
fn test_ignore_all_retries_every_kind() {
    let calls = AtomicU32::new(0);
    let waiter = Waiter::builder()
        .with_config(config_ms(5, 1000))
        .with_classifier(IgnoreAll)
        .build();

    let outcome = waiter.wait(|| {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(Fault::transport("reset by peer"))
        } else {
            Ok("connected")
        }
    });

    assert_eq!(outcome.success(), Some("connected"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_strict_classifier_aborts_on_unavailable() {
    let waiter = Waiter::builder()
        .with_config(config_ms(5, 1000))
        .with_classifier(StrictClassifier)
        .build();

    let outcome = waiter.wait(|| Err::<(), _>(Fault::unavailable("HTTP 503")));
    assert!(outcome.is_aborted());
}

#[test]
fn test_closure_classifier() {
    let classifier = ClosureClassifier::new(|fault: &Fault| {
        if fault.reason().contains("locked") {
            Classification::Soft
        } else {
            Classification::Fatal
        }
    });
    let calls = AtomicU32::new(0);
    let waiter = Waiter::builder()
        .with_config(config_ms(5, 1000))
        .with_classifier(classifier)
        .build();

    let outcome = waiter.wait(|| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(Fault::new(FaultKind::Conflict, "table locked"))
        } else {
            Ok(1)
        }
    });

    assert_eq!(outcome.success(), Some(1));
}

#[test]
fn test_tracing_observer_logs_full_wait() {
    init_tracing();

    let calls = AtomicU32::new(0);
    let waiter = Waiter::builder()
        .with_config(config_ms(5, 1000))
        .with_observer(TracingObserver::new("jenkins build"))
        .build();

    let outcome = waiter.wait(|| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Fault::ensure_eq(&n, &2, "build status")?;
        Ok(n)
    });

    assert_eq!(outcome.success(), Some(2));
}

#[test]
fn test_until_translates_timeout() {
    let waiter = Waiter::builder()
        .with_config(config_ms(10, 30))
        .with_alias("change 1234 review")
        .build();

    let err = waiter
        .until(|| Err::<(), _>(Fault::not_ready("still NEW")))
        .unwrap_err();

    assert!(err.is_timed_out());
    assert!(err.to_string().starts_with("change 1234 review was not satisfied"));
    assert!(err.to_string().ends_with("[not-yet-ready] still NEW"));
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancel_wakes_blocking_wait() {
    let signal = CancellationSignal::new();
    let stats = Arc::new(StatsObserver::new());
    let waiter = Waiter::builder()
        .with_config(config_ms(1000, 60_000))
        .with_observer(stats.clone())
        .with_cancellation(signal.clone())
        .build();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        signal.cancel();
    });

    let start = Instant::now();
    let outcome = waiter.wait(|| Err::<(), _>(Fault::not_ready("queue not drained")));
    canceller.join().unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(outcome.fault().unwrap().reason(), "queue not drained");
    assert!(start.elapsed() < Duration::from_secs(30));
    assert_eq!(stats.cancellations(), 1);
    assert_eq!(stats.timeouts(), 0);
}

#[test]
fn test_cancelled_signal_still_runs_first_attempt() {
    let signal = CancellationSignal::new();
    signal.cancel();

    let waiter = Waiter::builder()
        .with_config(config_ms(1000, 60_000))
        .with_cancellation(signal)
        .build();

    assert_eq!(waiter.wait(|| Ok::<_, Fault>(5)).success(), Some(5));

    let calls = AtomicU32::new(0);
    let outcome = waiter.wait(|| {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(Fault::not_ready("pending"))
    });

    assert!(outcome.is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cancelled_signal_does_not_mask_fatal() {
    let signal = CancellationSignal::new();
    signal.cancel();

    let waiter = Waiter::builder()
        .with_config(config_ms(10, 100))
        .with_cancellation(signal)
        .build();

    let outcome = waiter.wait(|| Err::<(), _>(Fault::other("500 Internal Server Error")));
    assert!(outcome.is_aborted());
}

// ============================================================================
// Async driver
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_async_success_after_soft_faults() {
    let config = WaitConfiguration::new(Duration::from_secs(2), Duration::from_secs(120)).unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let stats = Arc::new(StatsObserver::new());
    let waiter = Waiter::builder()
        .with_config(config)
        .with_observer(stats.clone())
        .build();

    let start = tokio::time::Instant::now();
    let outcome = waiter
        .wait_async(|| {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Fault::ensure(n >= 4, "job still queued").map(|()| n)
            }
        })
        .await;

    assert_eq!(outcome.success(), Some(4));
    assert_eq!(start.elapsed(), Duration::from_secs(6));
    assert_eq!(stats.not_ready(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_async_exponential_backoff_timing() {
    let config = WaitConfiguration::builder()
        .poll_interval(Duration::from_secs(1))
        .timeout(Duration::from_secs(60))
        .strategy(PollStrategy::Exponential)
        .build()
        .unwrap();
    let waiter = Waiter::new(config);
    let start = tokio::time::Instant::now();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let outcome = waiter
        .wait_async(|| {
            let seen = seen.clone();
            async move {
                let mut seen = seen.lock();
                seen.push(start.elapsed().as_secs());
                Fault::ensure(seen.len() >= 4, "not yet")
            }
        })
        .await;

    assert!(outcome.is_success());
    assert_eq!(*seen.lock(), vec![0, 1, 3, 7]);
}

#[tokio::test(start_paused = true)]
async fn test_async_always_soft_times_out_at_budget() {
    let config = WaitConfiguration::BUILD_COMPLETION;
    let calls = Arc::new(AtomicU32::new(0));
    let waiter = Waiter::new(config);

    let start = tokio::time::Instant::now();
    let outcome = waiter
        .wait_async(|| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Fault::not_ready("RUNNING"))
            }
        })
        .await;

    assert!(outcome.is_timed_out());
    assert_eq!(start.elapsed(), Duration::from_secs(30 * 60));
    assert_eq!(calls.load(Ordering::SeqCst), config.max_attempts());
}

#[tokio::test(start_paused = true)]
async fn test_async_cancellation() {
    let signal = CancellationSignal::new();
    let waiter = Waiter::builder()
        .with_config(WaitConfiguration::INPUT_REQUEST)
        .with_cancellation(signal.clone())
        .build();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        signal.cancel();
    });

    let start = tokio::time::Instant::now();
    let err = waiter
        .until_async(|| async { Err::<(), _>(Fault::not_ready("input not requested")) })
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(10));
}
