//! ProbeTable: integer-keyed open-addressing store with bounded linear probing.
//!
//! Layout
//! - One contiguous `Vec` of optional slots; an occupied slot holds the key
//!   and its value, a vacant one is `None`.
//! - Home slot of `k` is `k mod capacity`; collisions step by one with
//!   wraparound, for at most `max_probe` slots.
//!
//! Growth
//! - An insert of a new key grows the table first when claiming a slot would
//!   push `len` past `capacity / 2`, or when no vacant slot exists in the
//!   key's probe window.
//! - Growth doubles the capacity and replays every entry through the ordinary
//!   insert path, which may grow again. Order is not preserved.
//! - If replay fails, the entries not yet replayed are lost and the table is
//!   poisoned: further inserts fail with [`TableError::Poisoned`].
//!
//! Removal
//! - `remove` vacates the slot in place: no tombstone, no back-shift.
//!   Lookups stop at the first vacant slot, so a key whose probe path crossed
//!   the removed slot becomes unreachable. The counting workload never
//!   removes; callers that do must accept this.

use crate::config::TableConfig;
use crate::error::{Result, TableError};
use crate::int_key::IntKey;
use crate::reentrancy::DebugReentrancy;
use core::mem;
use core::ops::ControlFlow;

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
}

#[derive(Debug)]
pub struct ProbeTable<K, V> {
    slots: Vec<Option<Slot<K, V>>>,
    len: usize,
    max_probe: usize,
    max_capacity: usize,
    poisoned: bool,
    reentrancy: DebugReentrancy,
}

/// Allocate `capacity` vacant slots, reporting allocation failure instead of
/// aborting.
fn vacant_slots<K, V>(capacity: usize) -> Result<Vec<Option<Slot<K, V>>>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| TableError::OutOfMemory { capacity })?;
    slots.resize_with(capacity, || None);
    Ok(slots)
}

/// Slot indices visited when probing from `home` in a table of `capacity`.
#[inline]
fn probe_window(home: usize, capacity: usize, max_probe: usize) -> impl Iterator<Item = usize> {
    (0..max_probe.min(capacity)).map(move |step| {
        let i = home + step;
        if i >= capacity {
            i - capacity
        } else {
            i
        }
    })
}

impl<K: IntKey, V> ProbeTable<K, V> {
    /// Create an empty table with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(TableConfig::default())
    }

    /// Create an empty table of `initial_capacity` slots.
    pub fn with_capacity(initial_capacity: usize) -> Result<Self> {
        Self::with_config(TableConfig::new(initial_capacity))
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        if config.initial_capacity == 0 {
            return Err(TableError::ZeroCapacity);
        }
        Ok(Self {
            slots: vacant_slots(config.initial_capacity)?,
            len: 0,
            max_probe: config.max_probe.max(1),
            max_capacity: config.max_capacity,
            poisoned: false,
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True once a growth has failed mid-migration.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Index of the occupied slot holding `key`, stopping at the first
    /// vacant slot or at the end of the probe window.
    fn find_index(&self, key: K) -> Option<usize> {
        let cap = self.capacity();
        for i in probe_window(key.home_slot(cap), cap, self.max_probe) {
            match &self.slots[i] {
                None => return None,
                Some(slot) if slot.key == key => return Some(i),
                Some(_) => {}
            }
        }
        None
    }

    pub fn get(&self, key: K) -> Option<&V> {
        let _g = self.reentrancy.enter("get");
        let i = self.find_index(key)?;
        self.slots[i].as_ref().map(|s| &s.value)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let _g = self.reentrancy.enter("get_mut");
        let i = self.find_index(key)?;
        self.slots[i].as_mut().map(|s| &mut s.value)
    }

    pub fn contains_key(&self, key: K) -> bool {
        let _g = self.reentrancy.enter("contains_key");
        self.find_index(key).is_some()
    }

    /// Insert `value` under `key`, returning the value it replaced.
    ///
    /// May grow the table. On error the value is dropped; on
    /// [`TableError::OutOfMemory`] or [`TableError::CapacityLimit`] raised
    /// before migration started, the table is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        // Nothing in `place` calls out of the table; checking on entry is enough.
        drop(self.reentrancy.enter("insert"));
        if self.poisoned {
            return Err(TableError::Poisoned);
        }
        self.place(key, value)
    }

    fn place(&mut self, key: K, value: V) -> Result<Option<V>> {
        loop {
            let cap = self.capacity();
            let mut vacant = None;
            for i in probe_window(key.home_slot(cap), cap, self.max_probe) {
                match &mut self.slots[i] {
                    Some(slot) if slot.key == key => {
                        return Ok(Some(mem::replace(&mut slot.value, value)));
                    }
                    Some(_) => {}
                    None if vacant.is_none() => vacant = Some(i),
                    None => {}
                }
            }

            match vacant {
                Some(i) if self.len < cap / 2 => {
                    self.slots[i] = Some(Slot { key, value });
                    self.len += 1;
                    return Ok(None);
                }
                _ => self.grow()?,
            }
        }
    }

    fn grow(&mut self) -> Result<()> {
        let old_capacity = self.capacity();
        let limit = self.max_capacity;
        let new_capacity = old_capacity
            .checked_mul(2)
            .filter(|&c| c <= limit)
            .ok_or(TableError::CapacityLimit { limit })?;

        let fresh = vacant_slots(new_capacity)?;
        let old = mem::replace(&mut self.slots, fresh);
        let entries = self.len;
        self.len = 0;
        log::debug!(
            "probe table growing from {} to {} slots ({} entries)",
            old_capacity,
            new_capacity,
            entries
        );

        for slot in old.into_iter().flatten() {
            if let Err(e) = self.place(slot.key, slot.value) {
                self.poisoned = true;
                log::warn!(
                    "probe table growth to {} slots failed after migrating {} of {} entries: {}",
                    new_capacity,
                    self.len,
                    entries,
                    e
                );
                return Err(e);
            }
        }
        Ok(())
    }

    /// Remove `key`, returning its value.
    ///
    /// The slot is vacated without repairing the probe chain through it;
    /// see the module documentation.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let _g = self.reentrancy.enter("remove");
        let i = self.find_index(key)?;
        let slot = self.slots[i].take()?;
        self.len -= 1;
        Some(slot.value)
    }

    /// Visit every entry in physical slot order until `visit` breaks.
    ///
    /// `visit` must not call back into this table; debug builds panic if it
    /// does.
    pub fn for_each<B, F>(&self, mut visit: F) -> ControlFlow<B>
    where
        F: FnMut(K, &V) -> ControlFlow<B>,
    {
        let _g = self.reentrancy.enter("for_each");
        for slot in self.slots.iter().flatten() {
            visit(slot.key, &slot.value)?;
        }
        ControlFlow::Continue(())
    }

    /// Entries in physical slot order. Each call starts a fresh pass.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
            remaining: self.len,
        }
    }
}

/// Iterator over entries of a `ProbeTable` in physical slot order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Option<Slot<K, V>>>,
    remaining: usize,
}

impl<'a, K: Copy, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.it.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((slot.key, &slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Copy, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K: IntKey, V> IntoIterator for &'a ProbeTable<K, V> {
    type Item = (K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn table(capacity: usize) -> ProbeTable<u64, &'static str> {
        ProbeTable::with_capacity(capacity).unwrap()
    }

    #[test]
    fn new_table_is_empty_with_default_capacity() {
        let t: ProbeTable<u64, u32> = ProbeTable::new().unwrap();
        assert_eq!(t.capacity(), 256);
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert!(!t.is_poisoned());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let r: Result<ProbeTable<u64, u32>> = ProbeTable::with_capacity(0);
        assert_eq!(r.unwrap_err(), TableError::ZeroCapacity);
    }

    /// A slot array that cannot be allocated is an error, not an abort.
    #[test]
    fn oversized_table_reports_out_of_memory() {
        let capacity = usize::MAX / 2;
        let r: Result<ProbeTable<u64, u64>> = ProbeTable::with_capacity(capacity);
        assert_eq!(r.unwrap_err(), TableError::OutOfMemory { capacity });
    }

    /// Invariant: inserting an existing key overwrites its value and leaves
    /// exactly one occupied slot.
    #[test]
    fn reinsert_overwrites_last_writer_wins() {
        let mut t = table(256);
        assert_eq!(t.insert(42, "a").unwrap(), None);
        assert_eq!(t.insert(42, "b").unwrap(), Some("a"));
        assert_eq!(t.get(42), Some(&"b"));
        assert_eq!(t.len(), 1);
        assert_eq!(t.iter().count(), 1);
    }

    #[test]
    fn get_missing_key_is_none() {
        let mut t = table(256);
        t.insert(1, "one").unwrap();
        assert_eq!(t.get(2), None);
        assert_eq!(t.get(257), None);
        assert!(!t.contains_key(2));
        assert!(t.contains_key(1));
    }

    #[test]
    fn colliding_keys_probe_linearly() {
        let mut t = table(256);
        t.insert(5, "a").unwrap();
        t.insert(261, "b").unwrap();
        t.insert(517, "c").unwrap();
        assert_eq!(t.get(5), Some(&"a"));
        assert_eq!(t.get(261), Some(&"b"));
        assert_eq!(t.get(517), Some(&"c"));
        let order: Vec<u64> = t.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec![5, 261, 517]);
    }

    #[test]
    fn probe_wraps_around_the_end() {
        let mut t = table(256);
        t.insert(255, "last").unwrap();
        t.insert(511, "wrapped").unwrap();
        assert_eq!(t.get(511), Some(&"wrapped"));
        let order: Vec<u64> = t.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec![511, 255], "511 lands in slot 0");
    }

    /// Invariant: growth happens exactly when the 129th key would push a
    /// 256-slot table past half full, and no key is lost.
    #[test]
    fn growth_fires_past_half_load() {
        let mut t: ProbeTable<u64, u64> = ProbeTable::with_capacity(256).unwrap();
        for k in 0..128 {
            t.insert(k, k * 10).unwrap();
        }
        assert_eq!(t.capacity(), 256);
        assert_eq!(t.len(), 128);

        t.insert(128, 1280).unwrap();
        assert_eq!(t.capacity(), 512);
        assert_eq!(t.len(), 129);
        for k in 0..129 {
            assert_eq!(t.get(k), Some(&(k * 10)));
        }
    }

    #[test]
    fn updating_at_half_load_does_not_grow() {
        let mut t: ProbeTable<u64, u64> = ProbeTable::with_capacity(8).unwrap();
        for k in 0..4 {
            t.insert(k, 0).unwrap();
        }
        t.insert(3, 99).unwrap();
        assert_eq!(t.capacity(), 8);
        assert_eq!(t.get(3), Some(&99));
    }

    /// Invariant: exhausting the probe window grows the table even at low load.
    #[test]
    fn probe_bound_overflow_triggers_growth() {
        let mut t: ProbeTable<u64, u64> = ProbeTable::with_capacity(256).unwrap();
        let keys: Vec<u64> = (0..9).map(|i| i * 256).collect();
        for &k in &keys[..8] {
            t.insert(k, k).unwrap();
        }
        assert_eq!(t.capacity(), 256);

        t.insert(keys[8], keys[8]).unwrap();
        assert_eq!(t.capacity(), 512);
        for &k in &keys {
            assert_eq!(t.get(k), Some(&k));
        }
    }

    #[test]
    fn tiny_tables_grow_on_first_insert() {
        let mut t: ProbeTable<u8, u8> = ProbeTable::with_capacity(1).unwrap();
        t.insert(9, 1).unwrap();
        assert_eq!(t.capacity(), 2);
        assert_eq!(t.get(9), Some(&1));
    }

    #[test]
    fn capacity_limit_stops_growth_without_losing_entries() {
        let config = TableConfig::new(256).with_max_capacity(256);
        let mut t: ProbeTable<u64, u64> = ProbeTable::with_config(config).unwrap();
        for k in 0..128 {
            t.insert(k, k).unwrap();
        }
        assert_eq!(
            t.insert(500, 500),
            Err(TableError::CapacityLimit { limit: 256 })
        );
        assert!(!t.is_poisoned());
        assert_eq!(t.len(), 128);
        assert_eq!(t.get(127), Some(&127));
        // Updates need no growth.
        assert_eq!(t.insert(5, 55), Ok(Some(5)));
    }

    /// Invariant: a failure while replaying entries into the grown table
    /// poisons it. Here, replaying 22 into 16 slots finds its window {6, 7}
    /// taken by 6 and 23 and cannot grow again.
    #[test]
    fn failed_migration_poisons_table() {
        let config = TableConfig::new(8).with_max_probe(2).with_max_capacity(16);
        let mut t: ProbeTable<u64, u64> = ProbeTable::with_config(config).unwrap();
        for k in [6, 22, 23] {
            t.insert(k, k).unwrap();
        }
        assert_eq!(t.capacity(), 8);

        assert_eq!(t.insert(30, 30), Err(TableError::CapacityLimit { limit: 16 }));
        assert!(t.is_poisoned());
        assert_eq!(t.capacity(), 16);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(22), None);
        assert_eq!(t.insert(1, 1), Err(TableError::Poisoned));
    }

    #[test]
    fn remove_then_get_is_none() {
        let mut t = table(256);
        t.insert(10, "x").unwrap();
        t.insert(11, "y").unwrap();
        assert_eq!(t.remove(10), Some("x"));
        assert_eq!(t.remove(10), None);
        assert_eq!(t.get(10), None);
        assert_eq!(t.get(11), Some(&"y"));
        assert_eq!(t.len(), 1);
    }

    /// Known limitation: removal leaves a hole that ends lookups early.
    /// 261 probes through 5's home slot; once 5 is removed, 261 is still
    /// stored but can no longer be found.
    #[test]
    fn removal_breaks_probe_chain_of_displaced_key() {
        let mut t = table(256);
        t.insert(5, "a").unwrap();
        t.insert(261, "b").unwrap();
        assert_eq!(t.get(261), Some(&"b"));

        assert_eq!(t.remove(5), Some("a"));
        assert_eq!(t.get(261), None);
        assert_eq!(t.remove(261), None);
        assert_eq!(t.len(), 1, "the stranded entry still counts");
        let stranded: Vec<u64> = t.iter().map(|(k, _)| k).collect();
        assert_eq!(stranded, vec![261]);
    }

    /// Reinserting a stranded key finds it within the probe window instead
    /// of duplicating it.
    #[test]
    fn reinsert_after_removal_does_not_duplicate() {
        let mut t = table(256);
        t.insert(5, "a").unwrap();
        t.insert(261, "b").unwrap();
        t.remove(5);
        assert_eq!(t.insert(261, "c").unwrap(), Some("b"));
        assert_eq!(t.len(), 1);
        assert_eq!(t.iter().count(), 1);
    }

    #[test]
    fn for_each_visits_all_in_slot_order() {
        let mut t = table(256);
        for k in [200u64, 3, 77] {
            t.insert(k, "v").unwrap();
        }
        let mut seen = Vec::new();
        let flow: ControlFlow<()> = t.for_each(|k, _| {
            seen.push(k);
            ControlFlow::Continue(())
        });
        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(seen, vec![3, 77, 200]);
    }

    #[test]
    fn for_each_stops_on_first_break() {
        let mut t: ProbeTable<u64, u64> = ProbeTable::with_capacity(64).unwrap();
        for k in 0..10 {
            t.insert(k, k).unwrap();
        }
        let mut visits = 0;
        let flow = t.for_each(|k, v| {
            visits += 1;
            if k == 4 {
                ControlFlow::Break(*v * 2)
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(flow, ControlFlow::Break(8));
        assert_eq!(visits, 5);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn visitor_reentry_panics_in_debug() {
        let mut t: ProbeTable<u64, u64> = ProbeTable::with_capacity(16).unwrap();
        t.insert(1, 1).unwrap();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.for_each(|k, _| {
                let _ = t.get(k);
                ControlFlow::<()>::Continue(())
            });
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }

    #[test]
    fn iter_is_restartable_and_exact_size() {
        let mut t: ProbeTable<u64, u64> = ProbeTable::with_capacity(32).unwrap();
        for k in [9, 1, 5] {
            t.insert(k, k + 100).unwrap();
        }
        let it = t.iter();
        assert_eq!(it.len(), 3);
        let first: BTreeSet<u64> = t.iter().map(|(k, _)| k).collect();
        let second: BTreeSet<u64> = (&t).into_iter().map(|(k, _)| k).collect();
        assert_eq!(first, second);
        assert_eq!(first, BTreeSet::from([1, 5, 9]));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut t: ProbeTable<u32, u64> = ProbeTable::with_capacity(16).unwrap();
        t.insert(3, 0).unwrap();
        *t.get_mut(3).unwrap() += 7;
        assert_eq!(t.get(3), Some(&7));
        assert!(t.get_mut(4).is_none());
    }
}
