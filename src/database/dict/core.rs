//! The `Dict` struct itself: construction, basic accessors, and `Drop`.

use std::cell::Cell;

use super::entry::Repr;
use super::table::HashTable;
use super::vtable::{DefaultDictType, DictType, HashSeed, ResizePolicy};

/// An in-memory associative container with incremental rehashing.
///
/// **Invariants** (see SPEC_FULL.md §3 for the full list):
/// - If `rehash_idx == -1`: `ht[1]` is unallocated and `used[1] == 0`.
/// - If `rehash_idx >= 0`: both tables exist, every bucket `< rehash_idx` in
///   `ht[0]` is empty, and a key lives in exactly one of the two tables.
pub struct Dict<K, V, T = DefaultDictType<K>> {
    pub(crate) ht: [HashTable<K, V>; 2],
    pub(crate) rehash_idx: isize,
    /// `Cell` rather than a plain counter so a `SafeIter`, which only holds
    /// a shared reference to the dict, can still bump/restore it from
    /// `Drop`.
    pub(crate) pause_rehash: Cell<i32>,
    pub(crate) policy: ResizePolicy,
    pub(crate) vtable: T,
}

impl<K, V> Dict<K, V, DefaultDictType<K>>
where
    K: std::hash::Hash + Eq,
{
    /// Creates an empty dict using the default SipHash-backed type and the
    /// `Enable` resize policy.
    pub fn new() -> Self {
        Self::with_type(DefaultDictType::default(), ResizePolicy::default())
    }

    /// Creates an empty dict seeded from process configuration.
    pub fn with_config(config: &crate::config::DictConfig) -> Self {
        Self::with_type(DefaultDictType::new(config.hash_seed), config.resize_policy)
    }

    /// Creates an empty dict whose entries never store a value — only keys.
    /// Matches the source's `no_value` dict flavor used for sets.
    pub fn new_set(seed: HashSeed) -> Self {
        Self::with_type(DefaultDictType::new_no_value(seed), ResizePolicy::default())
    }
}

impl<K, V> Default for Dict<K, V, DefaultDictType<K>>
where
    K: std::hash::Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, T> Dict<K, V, T>
where
    T: DictType<K, V>,
{
    /// Creates an empty dict with an explicit type vtable and resize
    /// policy.
    pub fn with_type(
        vtable: T,
        policy: ResizePolicy,
    ) -> Self {
        Dict {
            ht: [HashTable::unallocated(), HashTable::unallocated()],
            rehash_idx: -1,
            pause_rehash: Cell::new(0),
            policy,
            vtable,
        }
    }

    /// Total entries across both tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.ht[0].used + self.ht[1].used
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` while incremental rehashing is in progress.
    #[inline]
    pub fn is_rehashing(&self) -> bool {
        self.rehash_idx != -1
    }

    /// Drops every entry and returns the dict to its just-constructed state.
    pub fn clear(&mut self) {
        self.ht[0].clear();
        self.ht[1].clear();
        self.rehash_idx = -1;
        self.pause_rehash.set(0);
    }

    /// Allocated bucket-array sizes `(size(ht[0]), size(ht[1]))`; `0` means
    /// unallocated. Exposed for tests and the stats report.
    pub fn table_sizes(&self) -> (usize, usize) {
        (self.ht[0].size(), self.ht[1].size())
    }

    /// Entries currently in each table. Exposed for tests and the stats
    /// report.
    pub fn table_used(&self) -> (usize, usize) {
        (self.ht[0].used, self.ht[1].used)
    }

    #[inline]
    pub(crate) fn hash_of(
        &self,
        key: &K,
    ) -> u64 {
        self.vtable.hash(key)
    }

    #[inline]
    pub(crate) fn keys_are_odd_optimizable(
        &self,
        key: &K,
    ) -> bool {
        self.vtable.no_value() && self.vtable.keys_are_odd_key(key)
    }

    pub(crate) fn new_entry(
        &self,
        key: K,
        value: Option<super::entry::DictValue<V>>,
        next: super::entry::Link<K, V>,
    ) -> Repr<K, V> {
        if self.vtable.no_value() {
            if next.is_none() && self.keys_are_odd_optimizable(&key) {
                Repr::KeyOnly { key }
            } else {
                Repr::NoValue { key, next }
            }
        } else {
            Repr::Normal {
                key,
                value: value.unwrap_or(super::entry::DictValue::Int(0)),
                next,
                metadata: if self.vtable.metadata_len() > 0 {
                    Some(vec![0u8; self.vtable.metadata_len()])
                } else {
                    None
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dict_is_empty_and_unallocated() {
        let d: Dict<u32, u32> = Dict::new();
        assert!(d.is_empty());
        assert_eq!(d.table_sizes(), (0, 0));
        assert!(!d.is_rehashing());
    }

    #[test]
    fn clear_resets_to_initial_state() {
        let mut d: Dict<u32, u32> = Dict::new();
        d.insert(1, 1);
        d.clear();
        assert!(d.is_empty());
        assert_eq!(d.table_sizes(), (0, 0));
    }
}
