//! Faults raised by conditions
//!
//! A condition reports a failed attempt as a [`Fault`] tagged with one of a
//! closed set of [`FaultKind`]s. The engine never inspects the fault beyond
//! its kind; whether it means "keep polling" or "give up" is decided by a
//! classifier.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// What a single attempt of a condition produces
pub type Probe<T> = Result<T, Fault>;

/// Category of a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultKind {
    /// The expected state has not been observed yet
    NotYetReady,

    /// The target resource has not been provisioned yet
    NotProvisioned,

    /// The remote service answered but is not serving (e.g. 503/504)
    Unavailable,

    /// Connection-level failure (refused, reset, timed out)
    Transport,

    /// The remote rejected the request because of a conflicting state
    Conflict,

    /// The addressed resource does not exist
    NotFound,

    /// Credentials were rejected
    Unauthorized,

    /// The remote answered with something that could not be interpreted
    InvalidResponse,

    /// Anything else
    Other,
}

impl FaultKind {
    /// Every fault kind, in declaration order
    pub const ALL: [FaultKind; 9] = [
        FaultKind::NotYetReady,
        FaultKind::NotProvisioned,
        FaultKind::Unavailable,
        FaultKind::Transport,
        FaultKind::Conflict,
        FaultKind::NotFound,
        FaultKind::Unauthorized,
        FaultKind::InvalidResponse,
        FaultKind::Other,
    ];

    /// Stable kebab-case name
    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::NotYetReady => "not-yet-ready",
            FaultKind::NotProvisioned => "not-provisioned",
            FaultKind::Unavailable => "unavailable",
            FaultKind::Transport => "transport",
            FaultKind::Conflict => "conflict",
            FaultKind::NotFound => "not-found",
            FaultKind::Unauthorized => "unauthorized",
            FaultKind::InvalidResponse => "invalid-response",
            FaultKind::Other => "other",
        }
    }

    /// Map an HTTP status code onto a fault kind
    ///
    /// Returns `None` for informational, success and redirect codes.
    pub fn from_http_status(code: u16) -> Option<FaultKind> {
        match code {
            100..=399 => None,
            401 | 403 => Some(FaultKind::Unauthorized),
            404 | 410 => Some(FaultKind::NotFound),
            409 | 412 | 423 => Some(FaultKind::Conflict),
            408 | 425 | 429 | 502 | 503 | 504 => Some(FaultKind::Unavailable),
            _ => Some(FaultKind::Other),
        }
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of fault kinds, used to declare which faults are ignorable
///
/// # Example
///
/// ```rust
/// use eventual::{FaultKind, FaultKinds};
///
/// let ignorable = FaultKinds::of(&[FaultKind::NotProvisioned, FaultKind::Unavailable]);
/// assert!(ignorable.contains(FaultKind::Unavailable));
/// assert!(!ignorable.contains(FaultKind::Unauthorized));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaultKinds(u16);

impl FaultKinds {
    /// The empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every kind
    pub const fn all() -> Self {
        Self::of(&FaultKind::ALL)
    }

    /// The set containing exactly `kinds`
    pub const fn of(kinds: &[FaultKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// This set plus `kind`
    pub const fn with(self, kind: FaultKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Check membership
    pub const fn contains(self, kind: FaultKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Check if the set is empty
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the kinds in the set
    pub fn iter(self) -> impl Iterator<Item = FaultKind> {
        FaultKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl fmt::Debug for FaultKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<FaultKind> for FaultKinds {
    fn from_iter<I: IntoIterator<Item = FaultKind>>(iter: I) -> Self {
        iter.into_iter()
            .fold(FaultKinds::empty(), FaultKinds::with)
    }
}

impl From<FaultKind> for FaultKinds {
    fn from(kind: FaultKind) -> Self {
        FaultKinds::empty().with(kind)
    }
}

/// A failed attempt: a kind, a reason, and optionally the underlying error
#[derive(Debug, Clone)]
pub struct Fault {
    kind: FaultKind,
    reason: String,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl Fault {
    /// Create a fault of any kind
    pub fn new(kind: FaultKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            source: None,
        }
    }

    /// The expected state has not been observed yet
    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self::new(FaultKind::NotYetReady, reason)
    }

    /// The target resource has not been provisioned yet
    pub fn not_provisioned(reason: impl Into<String>) -> Self {
        Self::new(FaultKind::NotProvisioned, reason)
    }

    /// The remote service is not serving
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::new(FaultKind::Unavailable, reason)
    }

    /// Connection-level failure
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::new(FaultKind::Transport, reason)
    }

    /// Fault of kind [`FaultKind::Other`]
    pub fn other(reason: impl Into<String>) -> Self {
        Self::new(FaultKind::Other, reason)
    }

    /// Wrap an error; the reason is the error's message
    pub fn from_error<E>(kind: FaultKind, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            kind,
            reason: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    /// Fault for an HTTP status, or `None` if the status is not an error
    pub fn from_http_status(code: u16, context: impl fmt::Display) -> Option<Self> {
        FaultKind::from_http_status(code)
            .map(|kind| Self::new(kind, format!("{}: HTTP {}", context, code)))
    }

    /// Attach an underlying error
    pub fn with_source<E>(mut self, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(error));
        self
    }

    /// Succeed if `condition` holds, otherwise report "not yet ready"
    ///
    /// The assertion-style building block for conditions:
    ///
    /// ```rust
    /// use eventual::Fault;
    ///
    /// let status = "RUNNING";
    /// let probe = Fault::ensure(status == "SUCCESS", "build has not finished");
    /// assert!(probe.unwrap_err().is_not_ready());
    /// ```
    pub fn ensure(condition: bool, reason: impl Into<String>) -> Result<(), Fault> {
        if condition {
            Ok(())
        } else {
            Err(Self::not_ready(reason))
        }
    }

    /// Succeed if `actual == expected`, otherwise report "not yet ready"
    pub fn ensure_eq<T>(actual: &T, expected: &T, what: impl fmt::Display) -> Result<(), Fault>
    where
        T: PartialEq + fmt::Debug + ?Sized,
    {
        if actual == expected {
            Ok(())
        } else {
            Err(Self::not_ready(format!(
                "{}: expected {:?}, observed {:?}",
                what, expected, actual
            )))
        }
    }

    /// Fault kind
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Human-readable reason
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Check if this is a "not yet ready" signal
    pub fn is_not_ready(&self) -> bool {
        self.kind == FaultKind::NotYetReady
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.reason)
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn Error + 'static))
    }
}

impl From<io::Error> for Fault {
    fn from(error: io::Error) -> Self {
        use io::ErrorKind::{
            BrokenPipe, ConnectionAborted, ConnectionRefused, ConnectionReset, InvalidData,
            NotFound, PermissionDenied, TimedOut, UnexpectedEof,
        };

        let kind = match error.kind() {
            ConnectionRefused | ConnectionReset | ConnectionAborted | BrokenPipe | TimedOut => {
                FaultKind::Transport
            }
            NotFound => FaultKind::NotFound,
            PermissionDenied => FaultKind::Unauthorized,
            InvalidData | UnexpectedEof => FaultKind::InvalidResponse,
            _ => FaultKind::Other,
        };

        Self::from_error(kind, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_kinds_set_operations() {
        let set = FaultKinds::empty()
            .with(FaultKind::Transport)
            .with(FaultKind::Unavailable);

        assert!(set.contains(FaultKind::Transport));
        assert!(set.contains(FaultKind::Unavailable));
        assert!(!set.contains(FaultKind::NotFound));
        assert!(!set.is_empty());
        assert_eq!(set.iter().count(), 2);
        assert!(FaultKinds::empty().is_empty());
    }

    #[test]
    fn test_fault_kinds_all() {
        let all = FaultKinds::all();
        for kind in FaultKind::ALL {
            assert!(all.contains(kind));
        }
    }

    #[test]
    fn test_fault_kinds_from_iterator() {
        let set: FaultKinds = [FaultKind::Conflict, FaultKind::Conflict, FaultKind::Other]
            .into_iter()
            .collect();
        assert_eq!(set, FaultKinds::of(&[FaultKind::Conflict, FaultKind::Other]));
        assert_eq!(format!("{:?}", set), "{Conflict, Other}");
    }

    #[test]
    fn test_fault_display() {
        let fault = Fault::not_ready("row absent");
        assert_eq!(fault.to_string(), "[not-yet-ready] row absent");
        assert!(fault.is_not_ready());
        assert_eq!(fault.reason(), "row absent");
    }

    #[test]
    fn test_ensure() {
        assert!(Fault::ensure(true, "never shown").is_ok());

        let fault = Fault::ensure(false, "role not visible").unwrap_err();
        assert_eq!(fault.kind(), FaultKind::NotYetReady);
        assert_eq!(fault.reason(), "role not visible");
    }

    #[test]
    fn test_ensure_eq() {
        assert!(Fault::ensure_eq(&204, &204, "status code").is_ok());

        let fault = Fault::ensure_eq(&500, &204, "status code").unwrap_err();
        assert!(fault.is_not_ready());
        assert_eq!(fault.reason(), "status code: expected 204, observed 500");
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(FaultKind::from_http_status(200), None);
        assert_eq!(FaultKind::from_http_status(302), None);
        assert_eq!(FaultKind::from_http_status(503), Some(FaultKind::Unavailable));
        assert_eq!(FaultKind::from_http_status(504), Some(FaultKind::Unavailable));
        assert_eq!(FaultKind::from_http_status(404), Some(FaultKind::NotFound));
        assert_eq!(FaultKind::from_http_status(401), Some(FaultKind::Unauthorized));
        assert_eq!(FaultKind::from_http_status(409), Some(FaultKind::Conflict));
        assert_eq!(FaultKind::from_http_status(500), Some(FaultKind::Other));

        let fault = Fault::from_http_status(503, "GET /api/health").unwrap();
        assert_eq!(fault.reason(), "GET /api/health: HTTP 503");
        assert!(Fault::from_http_status(204, "PUT /edit").is_none());
    }

    #[test]
    fn test_io_error_mapping_keeps_source() {
        let fault = Fault::from(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(fault.kind(), FaultKind::Transport);
        assert_eq!(fault.reason(), "refused");
        assert!(fault.source().is_some());

        let fault = Fault::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(fault.kind(), FaultKind::Unauthorized);
    }

    #[test]
    fn test_clone_shares_source() {
        let fault = Fault::other("boom").with_source(io::Error::other("inner"));
        let cloned = fault.clone();
        assert_eq!(cloned.source().unwrap().to_string(), "inner");
    }

    #[test]
    fn test_fault_kind_serde() {
        let yaml = serde_yaml_ng::to_string(&FaultKind::NotProvisioned).unwrap();
        assert_eq!(yaml.trim(), "not-provisioned");

        let kind: FaultKind = serde_yaml_ng::from_str("invalid-response").unwrap();
        assert_eq!(kind, FaultKind::InvalidResponse);
    }
}
