//! The recording interface shared by the aggregators.

use crate::error::Result;
use crate::int_key::IntKey;
use core::ops::ControlFlow;

/// The tally for one observed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CounterRecord<K> {
    pub key: K,
    pub count: u64,
}

impl<K> CounterRecord<K> {
    pub(crate) fn new(key: K) -> Self {
        Self { key, count: 0 }
    }
}

/// Per-key event counting.
///
/// Implementations do no locking of their own. Callers that record from
/// several threads wrap the tally in a [`Shared`](crate::Shared) and hold its
/// lock for every call, including enumeration.
pub trait Tally<K: IntKey> {
    /// Count one event for `key`.
    fn record(&mut self, key: K) -> Result<()>;

    /// Number of records an enumeration will visit.
    fn distinct(&self) -> usize;

    /// Number of events recorded so far.
    fn total(&self) -> u64;

    /// Visit every record in storage order until `visit` breaks.
    ///
    /// The order is unrelated to observation order and may change whenever
    /// the tally grows.
    fn enumerate<B, F>(&self, visit: F) -> ControlFlow<B>
    where
        F: FnMut(&CounterRecord<K>) -> ControlFlow<B>;
}
