//! Narrowing of successful probe values
//!
//! Conditions often fetch a collection (rows from a table, builds in a
//! queue, messages in a mailbox) and only care about part of it. A
//! [`ResultAdapter`] narrows such raw values into a [`Probe`], so the
//! narrowing composes inside the condition with `?`.
//!
//! Emptiness is an explicit choice: with [`EmptyPolicy::NotReady`] (the
//! default) an empty result is a "not yet ready" fault and polling goes on;
//! with [`EmptyPolicy::Ready`] an empty result is a valid answer.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::wait::{Fault, Probe};

/// How an empty result is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyPolicy {
    /// Empty is a valid, final answer
    Ready,

    /// Empty means the awaited data has not appeared yet
    #[default]
    NotReady,
}

/// Narrows raw values produced by a condition
///
/// # Example
///
/// ```rust
/// use eventual::{wait_for, FaultKinds, ResultAdapter, WaitConfiguration};
/// use std::time::Duration;
///
/// let config = WaitConfiguration::new(Duration::from_millis(5), Duration::from_millis(500)).unwrap();
/// let rows = ResultAdapter::new().describing("order row");
/// let mut table: Vec<Vec<&str>> = vec![vec!["order-17"], vec![], vec![]];
///
/// let outcome = wait_for(&config, FaultKinds::empty(), || {
///     let snapshot = table.pop().unwrap_or_default();
///     rows.require_first(snapshot)
/// });
///
/// assert_eq!(outcome.success(), Some("order-17"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultAdapter {
    empty: EmptyPolicy,
    subject: Option<Cow<'static, str>>,
}

impl ResultAdapter {
    /// Create an adapter that treats empty results as not ready
    pub const fn new() -> Self {
        Self {
            empty: EmptyPolicy::NotReady,
            subject: None,
        }
    }

    /// Create an adapter with an explicit empty policy
    pub const fn with_policy(empty: EmptyPolicy) -> Self {
        Self {
            empty,
            subject: None,
        }
    }

    /// Name what is being looked for; used in fault reasons
    pub fn describing(mut self, subject: impl Into<Cow<'static, str>>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// The empty policy
    pub fn policy(&self) -> EmptyPolicy {
        self.empty
    }

    /// First element of `items`
    ///
    /// Empty input yields `Ok(None)` under [`EmptyPolicy::Ready`] and a
    /// "not yet ready" fault otherwise.
    pub fn first<I>(&self, items: I) -> Probe<Option<I::Item>>
    where
        I: IntoIterator,
    {
        match items.into_iter().next() {
            Some(item) => Ok(Some(item)),
            None => self.on_empty().map(|()| None),
        }
    }

    /// First element of `items`, whatever the empty policy
    pub fn require_first<I>(&self, items: I) -> Probe<I::Item>
    where
        I: IntoIterator,
    {
        items
            .into_iter()
            .next()
            .ok_or_else(|| self.not_observed())
    }

    /// All of `items`, collected
    ///
    /// An empty collection is returned as-is under [`EmptyPolicy::Ready`].
    pub fn all<I>(&self, items: I) -> Probe<Vec<I::Item>>
    where
        I: IntoIterator,
    {
        let items: Vec<_> = items.into_iter().collect();
        if items.is_empty() {
            self.on_empty()?;
        }
        Ok(items)
    }

    /// The value inside an `Option`
    pub fn single<T>(&self, value: Option<T>) -> Probe<Option<T>> {
        match value {
            Some(value) => Ok(Some(value)),
            None => self.on_empty().map(|()| None),
        }
    }

    /// Key/value pairs collected into an ordered map
    ///
    /// Later pairs win on duplicate keys.
    pub fn aggregate<K, V, I>(&self, pairs: I) -> Probe<BTreeMap<K, V>>
    where
        K: Ord,
        I: IntoIterator<Item = (K, V)>,
    {
        let map: BTreeMap<K, V> = pairs.into_iter().collect();
        if map.is_empty() {
            self.on_empty()?;
        }
        Ok(map)
    }

    /// Ready only once `items` is empty
    ///
    /// For waits on something disappearing, e.g. a row being deleted or a
    /// queue being drained.
    pub fn expect_empty<I>(&self, items: I) -> Probe<()>
    where
        I: IntoIterator,
    {
        let remaining = items.into_iter().count();
        if remaining == 0 {
            Ok(())
        } else {
            Err(Fault::not_ready(format!(
                "{} {} still present",
                remaining,
                self.subject()
            )))
        }
    }

    fn on_empty(&self) -> Probe<()> {
        match self.empty {
            EmptyPolicy::Ready => Ok(()),
            EmptyPolicy::NotReady => Err(self.not_observed()),
        }
    }

    fn not_observed(&self) -> Fault {
        Fault::not_ready(format!("no {} observed yet", self.subject()))
    }

    fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or("result")
    }
}
