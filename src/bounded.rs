//! BoundedAggregator: per-key counters in a fixed, preallocated record buffer.
//!
//! Records are handed out in order. When the buffer is exhausted the cursor
//! wraps to zero and the next new key overwrites record 0, then record 1, and
//! so on. The overwritten key keeps its table entry, so its later events are
//! counted against whichever key now owns that record. Counts become
//! approximate. Wrapping is logged, never reported as an error.
//!
//! The key index is bounded too: it may grow to `INDEX_SLOTS_PER_RECORD`
//! slots per record and no further. When a new key finds it full, the index
//! is rebuilt from the keys that still own a record, so evicted keys lose
//! their alias and claim a fresh record if they show up again. Total memory
//! is fixed by `limit` and the table configuration.

use crate::config::TableConfig;
use crate::error::{Result, TableError};
use crate::int_key::IntKey;
use crate::probe_table::ProbeTable;
use crate::tally::{CounterRecord, Tally};
use core::ops::ControlFlow;

/// Index slots allowed per record before the index is rebuilt.
pub const INDEX_SLOTS_PER_RECORD: usize = 4;

#[derive(Debug)]
pub struct BoundedAggregator<K> {
    index: ProbeTable<K, usize>,
    index_config: TableConfig,
    records: Vec<CounterRecord<K>>,
    limit: usize,
    cursor: usize,
    wraps: u64,
    observed: usize,
    last: Option<(K, usize)>,
    total: u64,
}

/// `config` with its growth limit lowered to what `limit` records need, but
/// never below the initial capacity.
fn index_config(limit: usize, config: TableConfig) -> TableConfig {
    let needed = limit
        .saturating_mul(INDEX_SLOTS_PER_RECORD)
        .min(config.max_capacity);
    config.with_max_capacity(needed.max(config.initial_capacity))
}

impl<K: IntKey> BoundedAggregator<K> {
    pub fn new(limit: usize) -> Result<Self> {
        Self::with_config(limit, TableConfig::default())
    }

    pub fn with_config(limit: usize, config: TableConfig) -> Result<Self> {
        if limit == 0 {
            return Err(TableError::ZeroCapacity);
        }
        let mut records = Vec::new();
        records
            .try_reserve_exact(limit)
            .map_err(|_| TableError::OutOfMemory { capacity: limit })?;
        let index_config = index_config(limit, config);
        Ok(Self {
            index: ProbeTable::with_config(index_config)?,
            index_config,
            records,
            limit,
            cursor: 0,
            wraps: 0,
            observed: 0,
            last: None,
            total: 0,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// How many times the record cursor has wrapped around.
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    /// Records claimed so far, including overwritten ones.
    ///
    /// A key that lost its alias in an index rebuild is counted again when
    /// it reappears.
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Slots in the key index; stays within `limit * INDEX_SLOTS_PER_RECORD`
    /// or the initial capacity, whichever is larger.
    pub fn index_capacity(&self) -> usize {
        self.index.capacity()
    }

    /// Count credited to `key`'s record slot.
    ///
    /// After a wrap this may be another key's count; see the module docs.
    pub fn count(&self, key: K) -> Option<u64> {
        let &i = self.index.get(key)?;
        self.records.get(i).map(|r| r.count)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, CounterRecord<K>> {
        self.records.iter()
    }

    /// Claim the next record for a newly observed key.
    fn claim(&mut self, key: K) -> Result<usize> {
        if self.cursor == self.limit {
            self.cursor = 0;
            self.wraps += 1;
            log::warn!(
                "bounded tally exceeded {} records; overwriting from the start (wrap {})",
                self.limit,
                self.wraps
            );
        }
        let i = self.cursor;
        match self.index.insert(key, i) {
            Ok(_) => {}
            Err(TableError::CapacityLimit { .. }) => match self.reindex(key, i) {
                Ok(()) => {}
                Err(TableError::CapacityLimit { limit }) => {
                    // The key still gets record `i`; it is only missing from
                    // the index, so its next uncached event claims again.
                    log::warn!(
                        "bounded tally index cannot hold the live keys within {} slots; key {:?} left unindexed",
                        limit,
                        key
                    );
                }
                Err(e) => return Err(e),
            },
            Err(e) => return Err(e),
        }
        if i < self.records.len() {
            self.records[i] = CounterRecord::new(key);
        } else {
            self.records.push(CounterRecord::new(key));
        }
        self.cursor += 1;
        self.observed += 1;
        Ok(i)
    }

    /// Replace the index with one holding only the keys that own a record,
    /// with `key` taking record `slot`.
    fn reindex(&mut self, key: K, slot: usize) -> Result<()> {
        let mut index = ProbeTable::with_config(self.index_config)?;
        for (i, record) in self.records.iter().enumerate() {
            if i != slot {
                index.insert(record.key, i)?;
            }
        }
        index.insert(key, slot)?;
        log::debug!(
            "bounded tally index rebuilt: {} aliases dropped, {} keys kept",
            (self.index.len() + 1).saturating_sub(index.len()),
            index.len()
        );
        self.index = index;
        Ok(())
    }
}

impl<K: IntKey> Tally<K> for BoundedAggregator<K> {
    fn record(&mut self, key: K) -> Result<()> {
        let i = match self.last {
            Some((last_key, i)) if last_key == key => i,
            _ => {
                let i = match self.index.get(key) {
                    Some(&i) => i,
                    None => match self.claim(key) {
                        Ok(i) => i,
                        Err(e) => {
                            self.last = None;
                            return Err(e);
                        }
                    },
                };
                self.last = Some((key, i));
                i
            }
        };
        if let Some(record) = self.records.get_mut(i) {
            record.count += 1;
        }
        self.total += 1;
        Ok(())
    }

    fn distinct(&self) -> usize {
        self.records.len()
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn enumerate<B, F>(&self, mut visit: F) -> ControlFlow<B>
    where
        F: FnMut(&CounterRecord<K>) -> ControlFlow<B>,
    {
        for record in &self.records {
            visit(record)?;
        }
        ControlFlow::Continue(())
    }
}
