//! Random sampling: a single uniformly-ish random entry, a batch of
//! entries for statistical commands (`RANDOMKEY`-style callers), and a
//! fairness-corrected variant that compensates for skewed chain lengths.
//!
//! Every operation here has two entry points: a `fastrand`-backed default
//! using the thread-local generator, and a `_with_rng` counterpart taking
//! an injected `&mut dyn rand::RngCore` for callers that need a seeded or
//! otherwise reproducible source (deterministic tests, a fixed-seed
//! eviction policy) — both collaborators named, not reimplemented, in
//! SPEC_FULL §1.

use rand::{Rng, RngCore};

use super::entry::{DictValue, Repr};
use super::vtable::DictType;
use super::Dict;

/// Upper bound on how many candidates `get_fair_random_key` gathers before
/// picking uniformly among them.
const FAIR_SAMPLE_SIZE: usize = 15;

/// A source of `usize` values in `0..bound`, abstracting over `fastrand`'s
/// thread-local generator and an injected `rand::RngCore`.
trait RangeSource {
    fn next_usize(&mut self, bound: usize) -> usize;
}

struct FastrandSource;

impl RangeSource for FastrandSource {
    fn next_usize(&mut self, bound: usize) -> usize {
        fastrand::usize(0..bound)
    }
}

impl RangeSource for dyn RngCore + '_ {
    fn next_usize(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }
}

impl<K, V, T> Dict<K, V, T>
where
    T: DictType<K, V>,
{
    /// Returns a reference to a pseudo-randomly chosen key/value pair.
    /// Not perfectly uniform: buckets are chosen uniformly but entries
    /// within a bucket chain are then chosen uniformly within that chain,
    /// so keys in long chains are individually less likely than keys in
    /// short ones. Use `get_fair_random_key` when that bias matters.
    pub fn get_random_key(&mut self) -> Option<(&K, Option<&DictValue<V>>)> {
        self.get_random_key_from(&mut FastrandSource)
    }

    /// As `get_random_key`, but drawing from a caller-supplied generator
    /// instead of the thread-local one.
    pub fn get_random_key_with_rng(
        &mut self,
        rng: &mut dyn RngCore,
    ) -> Option<(&K, Option<&DictValue<V>>)> {
        self.get_random_key_from(rng)
    }

    fn get_random_key_from<S: RangeSource + ?Sized>(
        &mut self,
        src: &mut S,
    ) -> Option<(&K, Option<&DictValue<V>>)> {
        if self.is_empty() {
            return None;
        }

        self.rehash_steps(1);

        let (table, idx) = self.random_nonempty_bucket(src)?;
        let chain_len = self.ht[table].chain_len(idx);
        let target = src.next_usize(chain_len);

        let mut cur = self.ht[table].buckets[idx].as_deref();
        for _ in 0..target {
            cur = cur.and_then(Repr::next);
        }
        cur.map(|node| (node.key(), node.value()))
    }

    /// Fills `out` with up to `count` entries, for callers that need a
    /// batch (e.g. approximate eviction candidates). Returns the number of
    /// entries written. Skips long runs of empty buckets by jumping the
    /// cursor instead of visiting every one, matching the source's
    /// `emptylen` heuristic. Once `count` entries have been collected,
    /// further entries replace a uniformly-chosen existing slot with
    /// probability `count/entries_seen` (reservoir sampling) rather than
    /// being discarded outright, so a long sweep doesn't just keep
    /// whichever entries happened to be first.
    pub fn get_some_keys<'a>(
        &'a self,
        out: &mut Vec<(&'a K, Option<&'a DictValue<V>>)>,
        count: usize,
    ) -> usize {
        self.get_some_keys_from(out, count, &mut FastrandSource)
    }

    /// As `get_some_keys`, but drawing from a caller-supplied generator.
    pub fn get_some_keys_with_rng<'a>(
        &'a self,
        out: &mut Vec<(&'a K, Option<&'a DictValue<V>>)>,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> usize {
        self.get_some_keys_from(out, count, rng)
    }

    fn get_some_keys_from<'a, S: RangeSource + ?Sized>(
        &'a self,
        out: &mut Vec<(&'a K, Option<&'a DictValue<V>>)>,
        count: usize,
        src: &mut S,
    ) -> usize {
        out.clear();
        if self.is_empty() || count == 0 {
            return 0;
        }

        let table_count = if self.is_rehashing() { 2 } else { 1 };
        let mut max_steps = count * 10;
        let mut empty_run = 0usize;
        let mut seen = 0usize;

        let mut table = 0usize;
        let mut idx = if self.ht[0].is_allocated() {
            src.next_usize(self.ht[0].size())
        } else {
            0
        };

        while max_steps > 0 {
            max_steps -= 1;

            if !self.ht[table].is_allocated() {
                table = (table + 1) % table_count;
                continue;
            }

            if idx >= self.ht[table].size() {
                idx = 0;
            }

            let mut cur = self.ht[table].buckets[idx].as_deref();
            if cur.is_none() {
                empty_run += 1;
                if empty_run >= 5 {
                    empty_run = 0;
                    // jump ahead instead of scanning one-by-one through a
                    // long empty run
                    idx = idx.wrapping_add(1 + src.next_usize(16));
                }
            } else {
                empty_run = 0;
                while let Some(node) = cur {
                    seen += 1;
                    if out.len() < count {
                        out.push((node.key(), node.value()));
                    } else {
                        let r = src.next_usize(seen);
                        if r < count {
                            out[r] = (node.key(), node.value());
                        }
                    }
                    cur = node.next();
                }
            }

            idx += 1;
            if idx >= self.ht[table].size() {
                table = (table + 1) % table_count;
                idx = 0;
            }
        }

        out.len()
    }

    /// A fairness-corrected random key: samples up to `FAIR_SAMPLE_SIZE`
    /// candidates via `get_some_keys` and picks uniformly among them,
    /// falling back to `get_random_key` if the sample comes back empty
    /// (possible on a very sparse table).
    pub fn get_fair_random_key(&mut self) -> Option<(&K, Option<&DictValue<V>>)> {
        self.get_fair_random_key_from(&mut FastrandSource)
    }

    /// As `get_fair_random_key`, but drawing from a caller-supplied
    /// generator.
    pub fn get_fair_random_key_with_rng(
        &mut self,
        rng: &mut dyn RngCore,
    ) -> Option<(&K, Option<&DictValue<V>>)> {
        self.get_fair_random_key_from(rng)
    }

    fn get_fair_random_key_from<S: RangeSource + ?Sized>(
        &mut self,
        src: &mut S,
    ) -> Option<(&K, Option<&DictValue<V>>)> {
        if self.is_empty() {
            return None;
        }

        self.rehash_steps(1);

        let mut candidates = Vec::with_capacity(FAIR_SAMPLE_SIZE);
        let found = self.get_some_keys_from(&mut candidates, FAIR_SAMPLE_SIZE, src);

        if found == 0 {
            return self.get_random_key_from(src);
        }

        let pick = src.next_usize(found);
        candidates.into_iter().nth(pick)
    }

    fn random_nonempty_bucket<S: RangeSource + ?Sized>(
        &self,
        src: &mut S,
    ) -> Option<(usize, usize)> {
        let table_count = if self.is_rehashing() { 2 } else { 1 };

        loop {
            let table = if table_count == 2 && src.next_usize(2) == 1 {
                1
            } else {
                0
            };

            if !self.ht[table].is_allocated() || self.ht[table].used == 0 {
                if table_count == 1 {
                    return None;
                }
                continue;
            }

            let size = self.ht[table].size();
            let start = src.next_usize(size);

            for offset in 0..size {
                let idx = (start + offset) % size;
                if self.ht[table].buckets[idx].is_some() {
                    return Some((table, idx));
                }
            }

            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_random_key_returns_none_when_empty() {
        let mut d: Dict<u32, u32> = Dict::new();
        assert!(d.get_random_key().is_none());
    }

    #[test]
    fn get_random_key_returns_existing_entry() {
        let mut d: Dict<u32, u32> = Dict::new();
        d.insert(1, 100);
        let (key, value) = d.get_random_key().expect("should find the only key");
        assert_eq!(*key, 1);
        assert_eq!(value.and_then(DictValue::as_ptr), Some(&100));
    }

    #[test]
    fn get_some_keys_never_returns_more_than_requested() {
        let mut d: Dict<u32, u32> = Dict::new();
        for i in 0..50u32 {
            d.insert(i, i);
        }
        let mut out = Vec::new();
        let n = d.get_some_keys(&mut out, 10);
        assert!(n <= 10);
        assert_eq!(out.len(), n);
    }

    #[test]
    fn get_fair_random_key_finds_the_single_entry() {
        let mut d: Dict<u32, u32> = Dict::new();
        d.insert(7, 70);
        let (key, _) = d.get_fair_random_key().expect("should find the only key");
        assert_eq!(*key, 7);
    }

    #[test]
    fn injected_rng_is_deterministic_across_runs() {
        use rand::{rngs::StdRng, SeedableRng};

        let mut d: Dict<u32, u32> = Dict::new();
        for i in 0..64u32 {
            d.insert(i, i);
        }

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);

        let a = d.get_random_key_with_rng(&mut rng_a).map(|(k, _)| *k);
        let b = d.get_random_key_with_rng(&mut rng_b).map(|(k, _)| *k);
        assert_eq!(a, b);
    }

    #[test]
    fn get_some_keys_with_rng_respects_count_bound() {
        use rand::{rngs::StdRng, SeedableRng};

        let mut d: Dict<u32, u32> = Dict::new();
        for i in 0..100u32 {
            d.insert(i, i);
        }
        let mut rng = StdRng::seed_from_u64(7);
        let mut out = Vec::new();
        let n = d.get_some_keys_with_rng(&mut out, 20, &mut rng);
        assert!(n <= 20);
        assert_eq!(out.len(), n);
    }
}
