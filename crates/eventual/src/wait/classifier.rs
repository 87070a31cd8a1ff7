//! Fault classification
//!
//! A classifier decides whether a fault means "not ready yet, poll again"
//! ([`Classification::Soft`]) or "this wait cannot succeed"
//! ([`Classification::Fatal`]).

use std::sync::Arc;

use super::fault::{Fault, FaultKind, FaultKinds};

/// Verdict on a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Retry after the next poll interval
    Soft,
    /// Abort the wait now
    Fatal,
}

/// Decides whether a fault should be retried
///
/// # Example
///
/// ```rust
/// use eventual::{Classification, Fault, FaultClassifier, FaultKind};
///
/// struct RetryConflicts;
///
/// impl FaultClassifier for RetryConflicts {
///     fn classify(&self, fault: &Fault) -> Classification {
///         match fault.kind() {
///             FaultKind::NotYetReady | FaultKind::Conflict => Classification::Soft,
///             _ => Classification::Fatal,
///         }
///     }
/// }
/// ```
pub trait FaultClassifier: Send + Sync {
    /// Classify a fault raised by one attempt
    fn classify(&self, fault: &Fault) -> Classification;
}

/// The default classifier
///
/// "Not yet ready" faults are always soft, faults whose kind is in the
/// ignorable set are soft, and everything else is fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeClassifier {
    ignorable: FaultKinds,
}

impl OutcomeClassifier {
    /// Create a classifier treating `ignorable` kinds as soft
    pub const fn new(ignorable: FaultKinds) -> Self {
        Self { ignorable }
    }

    /// Also treat `kind` as soft
    pub const fn ignoring(self, kind: FaultKind) -> Self {
        Self {
            ignorable: self.ignorable.with(kind),
        }
    }

    /// The ignorable set
    pub fn ignorable(&self) -> FaultKinds {
        self.ignorable
    }
}

impl From<FaultKinds> for OutcomeClassifier {
    fn from(ignorable: FaultKinds) -> Self {
        Self::new(ignorable)
    }
}

impl FaultClassifier for OutcomeClassifier {
    fn classify(&self, fault: &Fault) -> Classification {
        if fault.is_not_ready() || self.ignorable.contains(fault.kind()) {
            Classification::Soft
        } else {
            Classification::Fatal
        }
    }
}

/// Treats every fault as soft
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreAll;

impl FaultClassifier for IgnoreAll {
    fn classify(&self, _fault: &Fault) -> Classification {
        Classification::Soft
    }
}

/// Treats only "not yet ready" as soft
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictClassifier;

impl FaultClassifier for StrictClassifier {
    fn classify(&self, fault: &Fault) -> Classification {
        if fault.is_not_ready() {
            Classification::Soft
        } else {
            Classification::Fatal
        }
    }
}

/// A classifier backed by a closure
///
/// # Example
///
/// ```rust
/// use eventual::{Classification, ClosureClassifier, FaultClassifier, Fault};
///
/// let classifier = ClosureClassifier::new(|fault: &Fault| {
///     if fault.reason().contains("503") {
///         Classification::Soft
///     } else {
///         Classification::Fatal
///     }
/// });
///
/// assert_eq!(classifier.classify(&Fault::other("HTTP 503")), Classification::Soft);
/// ```
pub struct ClosureClassifier<F> {
    f: F,
}

impl<F> ClosureClassifier<F>
where
    F: Fn(&Fault) -> Classification + Send + Sync,
{
    /// Create a new closure classifier
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> FaultClassifier for ClosureClassifier<F>
where
    F: Fn(&Fault) -> Classification + Send + Sync,
{
    fn classify(&self, fault: &Fault) -> Classification {
        (self.f)(fault)
    }
}

impl<C: FaultClassifier + ?Sized> FaultClassifier for &C {
    fn classify(&self, fault: &Fault) -> Classification {
        (**self).classify(fault)
    }
}

impl<C: FaultClassifier + ?Sized> FaultClassifier for Arc<C> {
    fn classify(&self, fault: &Fault) -> Classification {
        (**self).classify(fault)
    }
}

impl<C: FaultClassifier + ?Sized> FaultClassifier for Box<C> {
    fn classify(&self, fault: &Fault) -> Classification {
        (**self).classify(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_is_always_soft() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify(&Fault::not_ready("pending")),
            Classification::Soft
        );
    }

    #[test]
    fn test_unlisted_kinds_are_fatal() {
        let classifier = OutcomeClassifier::default();
        for kind in FaultKind::ALL {
            if kind == FaultKind::NotYetReady {
                continue;
            }
            assert_eq!(
                classifier.classify(&Fault::new(kind, "x")),
                Classification::Fatal,
                "{} should be fatal",
                kind
            );
        }
    }

    #[test]
    fn test_ignorable_kinds_are_soft() {
        let classifier = OutcomeClassifier::default()
            .ignoring(FaultKind::NotProvisioned)
            .ignoring(FaultKind::Unavailable);

        assert_eq!(
            classifier.classify(&Fault::not_provisioned("role missing")),
            Classification::Soft
        );
        assert_eq!(
            classifier.classify(&Fault::unavailable("HTTP 504")),
            Classification::Soft
        );
        assert_eq!(
            classifier.classify(&Fault::transport("reset")),
            Classification::Fatal
        );
        assert_eq!(classifier.ignorable().iter().count(), 2);
    }

    #[test]
    fn test_ignore_all_and_strict() {
        let fault = Fault::new(FaultKind::Unauthorized, "denied");
        assert_eq!(IgnoreAll.classify(&fault), Classification::Soft);
        assert_eq!(StrictClassifier.classify(&fault), Classification::Fatal);
        assert_eq!(
            StrictClassifier.classify(&Fault::not_ready("later")),
            Classification::Soft
        );
    }

    #[test]
    fn test_boxed_and_shared_classifiers() {
        let boxed: Box<dyn FaultClassifier> = Box::new(IgnoreAll);
        let shared = Arc::new(StrictClassifier);
        let fault = Fault::other("boom");

        assert_eq!(boxed.classify(&fault), Classification::Soft);
        assert_eq!(shared.classify(&fault), Classification::Fatal);
        assert_eq!((&shared).classify(&fault), Classification::Fatal);
    }
}
