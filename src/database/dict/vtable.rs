//! The type vtable: every point of polymorphism the source's `dictType`
//! struct encodes, expressed as a trait object stored by the `Dict`.

use std::hash::Hash;

use siphasher::sip128::{Hash128, Hasher128, SipHasher24};

use super::entry::Repr;

/// Process-wide (or per-`Dict`, if overridden) resize policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizePolicy {
    /// Grow as soon as the load factor reaches 1.
    #[default]
    Enable,
    /// Only grow once the load factor is badly degenerate
    /// (`FORCE_RESIZE_RATIO`); used under memory pressure.
    Avoid,
    /// Never grow automatically; the caller must call `resize()` itself.
    Forbid,
}

/// Every point of polymorphism the `Dict` needs from its key/value type,
/// mirroring the source's `dictType` struct: hash, compare, dup, expand
/// veto, metadata sizing, and a post-replace hook.
pub trait DictType<K, V> {
    /// 64-bit digest of a key. Must be consistent with `key_eq`.
    fn hash(&self, key: &K) -> u64;

    /// Key equality used when walking a chain.
    fn key_eq(
        &self,
        a: &K,
        b: &K,
    ) -> bool;

    /// If `Some`, the Dict stores an independent duplicate of an inserted
    /// key rather than moving the caller's value in directly.
    fn key_dup(&self, _key: &K) -> Option<K> {
        None
    }

    /// If `Some`, the Dict stores an independent duplicate of an inserted
    /// value.
    fn val_dup(&self, _value: &V) -> Option<V> {
        None
    }

    /// Veto a specific expansion (e.g. under memory pressure). Returning
    /// `false` makes the grow a no-op rather than an error.
    fn expand_allowed(
        &self,
        _current_size: usize,
        _target_size: usize,
    ) -> bool {
        true
    }

    /// Values are never stored; only keys. Entries use the `NoValue` (or, if
    /// `keys_are_odd` also holds, `KeyOnly`) representation.
    fn no_value(&self) -> bool {
        false
    }

    /// Whether a given key is eligible for the `KeyOnly` optimization.
    /// Meaningful only when `no_value()` is also true. The source checks
    /// "the pointer is odd"; since keys here are not addresses, this is a
    /// caller-supplied predicate instead.
    fn keys_are_odd_key(
        &self,
        _key: &K,
    ) -> bool {
        false
    }

    /// Number of metadata bytes a `Normal` entry carries alongside its
    /// key/value. Zero unless the caller needs auxiliary per-entry state
    /// (e.g. an expiry timestamp).
    fn metadata_len(&self) -> usize {
        0
    }

    /// Called by `scan_defrag` after an entry is relocated, when the type
    /// carries metadata that needs fixing up post-move.
    fn after_replace(&self, _entry: &mut Repr<K, V>) {}
}

/// Process-wide hash seed plus the resize policy, loaded via `config`
/// (see `crate::config::DictConfig`) and injected at construction time
/// instead of living as a hidden singleton (source design note, §9).
#[derive(Debug, Clone, Copy)]
pub struct HashSeed(pub u64, pub u64);

impl Default for HashSeed {
    fn default() -> Self {
        // Fixed default seed so tests are deterministic; production callers
        // should supply a random seed via `DictConfig::load`.
        HashSeed(0x5bd1_e995_3033_3a1a, 0x27d4_eb2f_1656_67c5)
    }
}

/// Default `DictType` for any `K: Hash + Eq + Clone`, hashing with
/// SipHash-2-4 via `SipHasher24` keyed by a 128-bit seed — the real,
/// external hash collaborator named in SPEC_FULL §1, not reimplemented here.
pub struct DefaultDictType<K> {
    seed: HashSeed,
    no_value: bool,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K> DefaultDictType<K> {
    pub fn new(seed: HashSeed) -> Self {
        DefaultDictType {
            seed,
            no_value: false,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn new_no_value(seed: HashSeed) -> Self {
        DefaultDictType {
            seed,
            no_value: true,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<K> Default for DefaultDictType<K> {
    fn default() -> Self {
        Self::new(HashSeed::default())
    }
}

impl<K: Hash + Eq, V> DictType<K, V> for DefaultDictType<K> {
    fn hash(&self, key: &K) -> u64 {
        let mut hasher = SipHasher24::new_with_keys(self.seed.0, self.seed.1);
        key.hash(&mut hasher);
        let Hash128 { h1, .. } = hasher.hash128();
        h1
    }

    fn key_eq(
        &self,
        a: &K,
        b: &K,
    ) -> bool {
        a == b
    }

    fn no_value(&self) -> bool {
        self.no_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hash_is_deterministic_for_same_seed() {
        let t: DefaultDictType<&str> = DefaultDictType::default();
        assert_eq!(t.hash(&"abc"), t.hash(&"abc"));
    }

    #[test]
    fn different_seeds_usually_differ() {
        let a: DefaultDictType<&str> = DefaultDictType::new(HashSeed(1, 2));
        let b: DefaultDictType<&str> = DefaultDictType::new(HashSeed(3, 4));
        assert_ne!(a.hash(&"abc"), b.hash(&"abc"));
    }

    #[test]
    fn key_eq_matches_partial_eq() {
        let t: DefaultDictType<u32> = DefaultDictType::default();
        assert!(t.key_eq(&5, &5));
        assert!(!t.key_eq(&5, &6));
    }
}
