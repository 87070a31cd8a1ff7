//! External cancellation of waits
//!
//! A [`CancellationSignal`] ends a wait early, exactly as an expired deadline
//! would: the wait returns [`RetryOutcome::TimedOut`](crate::RetryOutcome)
//! with `cancelled: true` and the last soft fault. Blocking waits park on a
//! condition variable between attempts and are woken by [`cancel`]; async
//! waits race their sleep against a [`CancellationToken`].
//!
//! [`cancel`]: CancellationSignal::cancel

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Clonable handle used to cancel one or more waits
///
/// # Example
///
/// ```rust
/// use eventual::CancellationSignal;
///
/// let signal = CancellationSignal::new();
/// let handle = signal.clone();
///
/// handle.cancel();
/// assert!(signal.is_cancelled());
/// ```
#[derive(Clone, Default)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: Mutex<bool>,
    wake: Condvar,
    token: CancellationToken,
}

impl CancellationSignal {
    /// Create a signal that has not fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal, waking every wait currently sleeping on it
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        *cancelled = true;
        self.inner.wake.notify_all();
        drop(cancelled);

        self.inner.token.cancel();
    }

    /// Check if the signal has fired
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Token cancelled together with this signal, for use in other tokio code
    pub fn child_token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    /// Resolve once the signal fires
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await
    }

    /// Block the current thread for `duration` or until the signal fires
    ///
    /// Returns `true` if the signal fired.
    pub fn sleep(&self, duration: Duration) -> bool {
        let mut cancelled = self.inner.cancelled.lock();

        match Instant::now().checked_add(duration) {
            Some(deadline) => {
                while !*cancelled {
                    if self
                        .inner
                        .wake
                        .wait_until(&mut cancelled, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
            }
            None => {
                while !*cancelled {
                    self.inner.wake.wait(&mut cancelled);
                }
            }
        }

        *cancelled
    }

    /// Sleep on the tokio timer for `duration` or until the signal fires
    ///
    /// Returns `true` if the signal fired.
    pub async fn sleep_async(&self, duration: Duration) -> bool {
        tokio::select! {
            () = tokio::time::sleep(duration) => self.is_cancelled(),
            () = self.inner.token.cancelled() => true,
        }
    }
}

impl fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSignal")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
