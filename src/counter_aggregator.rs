//! CounterAggregator: exact per-key counters over a ProbeTable, with a
//! one-entry cache for runs of the same key.
//!
//! Records live in a `SlotMap`; the table maps each key to the record's
//! generational handle. Event streams tend to repeat the same key many times
//! in a row, so the last key and its handle are kept aside and a repeat
//! bumps the record without touching the table.

use crate::config::TableConfig;
use crate::error::Result;
use crate::int_key::IntKey;
use crate::probe_table::ProbeTable;
use crate::tally::{CounterRecord, Tally};
use core::ops::ControlFlow;
use slotmap::{DefaultKey, SlotMap};

/// Generational handle to a record owned by a `CounterAggregator`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RecordHandle(DefaultKey);

#[derive(Debug)]
pub struct CounterAggregator<K> {
    index: ProbeTable<K, RecordHandle>,
    records: SlotMap<DefaultKey, CounterRecord<K>>,
    last: Option<(K, RecordHandle)>,
    total: u64,
}

impl<K: IntKey> CounterAggregator<K> {
    pub fn new() -> Result<Self> {
        Self::with_config(TableConfig::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Ok(Self {
            index: ProbeTable::with_config(config)?,
            records: SlotMap::with_key(),
            last: None,
            total: 0,
        })
    }

    /// Count for `key`, if it has been observed.
    pub fn count(&self, key: K) -> Option<u64> {
        let handle = self.index.get(key)?;
        self.records.get(handle.0).map(|r| r.count)
    }

    /// The key whose record is cached for the next event.
    pub fn cached_key(&self) -> Option<K> {
        self.last.map(|(k, _)| k)
    }

    /// Current slot capacity of the underlying table.
    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }

    /// Records in table slot order.
    pub fn iter(&self) -> impl Iterator<Item = &CounterRecord<K>> + '_ {
        self.index
            .iter()
            .filter_map(move |(_, handle)| self.records.get(handle.0))
    }

    #[inline]
    fn bump(&mut self, handle: RecordHandle) -> bool {
        match self.records.get_mut(handle.0) {
            Some(record) => {
                record.count += 1;
                self.total += 1;
                true
            }
            None => false,
        }
    }

    /// Handle for `key`, creating a zeroed record on first sight.
    fn resolve(&mut self, key: K) -> Result<RecordHandle> {
        if let Some(&handle) = self.index.get(key) {
            return Ok(handle);
        }
        let handle = RecordHandle(self.records.insert(CounterRecord::new(key)));
        match self.index.insert(key, handle) {
            Ok(Some(replaced)) => {
                // The lookup missed a key the insert then found; keep the
                // newer record.
                self.records.remove(replaced.0);
                Ok(handle)
            }
            Ok(None) => Ok(handle),
            Err(e) => {
                self.records.remove(handle.0);
                Err(e)
            }
        }
    }
}

impl<K: IntKey> Tally<K> for CounterAggregator<K> {
    fn record(&mut self, key: K) -> Result<()> {
        if let Some((last_key, handle)) = self.last {
            if last_key == key && self.bump(handle) {
                return Ok(());
            }
        }

        let handle = match self.resolve(key) {
            Ok(handle) => handle,
            Err(e) => {
                self.last = None;
                return Err(e);
            }
        };
        self.last = Some((key, handle));
        self.bump(handle);
        Ok(())
    }

    fn distinct(&self) -> usize {
        self.index.len()
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn enumerate<B, F>(&self, mut visit: F) -> ControlFlow<B>
    where
        F: FnMut(&CounterRecord<K>) -> ControlFlow<B>,
    {
        self.index.for_each(|_, handle| match self.records.get(handle.0) {
            Some(record) => visit(record),
            None => ControlFlow::Continue(()),
        })
    }
}
