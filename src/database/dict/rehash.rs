//! The incremental rehashing engine: move a bounded number of buckets from
//! `ht[0]` into `ht[1]` (or vice versa, when shrinking) per call, so no
//! single operation pays for migrating the whole table.

use tracing::{debug, trace};

use super::entry::{EntryTag, Repr};
use super::table::HashTable;
use super::vtable::DictType;
use super::Dict;

/// Empty buckets visited per non-empty bucket migrated, bounding how much
/// work a single `rehash_steps` call can do scanning over long empty runs.
const EMPTY_BUCKET_VISIT_RATIO: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehashOutcome {
    /// Rehashing is still in progress; call again to continue.
    MoreWork,
    /// Rehashing finished (or there was nothing to do); `ht[0]` now holds
    /// all entries and `ht[1]` is unallocated.
    Done,
}

impl<K, V, T> Dict<K, V, T>
where
    T: DictType<K, V>,
{
    /// Migrates up to `n` non-empty buckets from the table being vacated
    /// into the table being filled. A no-op (returning `Done`) if rehashing
    /// isn't in progress. Honors `pause_rehash`: if rehashing is paused,
    /// returns `MoreWork` without doing anything, since rehashing is still
    /// pending — it is simply deferred.
    pub fn rehash_steps(
        &mut self,
        n: usize,
    ) -> RehashOutcome {
        if !self.is_rehashing() {
            return RehashOutcome::Done;
        }

        if self.pause_rehash.get() > 0 {
            trace!("rehash paused, deferring step");
            return RehashOutcome::MoreWork;
        }

        let mut steps_remaining = n;
        let mut empty_budget = EMPTY_BUCKET_VISIT_RATIO * n.max(1);

        let src_size = self.ht[0].size();

        while steps_remaining > 0 && empty_budget > 0 {
            let idx = self.rehash_idx as usize;

            if idx >= src_size {
                self.finish_rehash();
                return RehashOutcome::Done;
            }

            if self.ht[0].buckets[idx].is_none() {
                self.rehash_idx += 1;
                empty_budget -= 1;
                continue;
            }

            self.migrate_bucket(idx);
            self.rehash_idx += 1;
            steps_remaining -= 1;
        }

        if (self.rehash_idx as usize) >= src_size {
            self.finish_rehash();
            RehashOutcome::Done
        } else {
            RehashOutcome::MoreWork
        }
    }

    /// Runs `rehash_steps` repeatedly, a bucket-chunk at a time, until
    /// either rehashing completes or `budget_ms` has elapsed. Honors
    /// `pause_rehash` at entry the same way `rehash_steps` does, so the two
    /// entry points agree instead of one silently ignoring pause.
    pub fn rehash_ms(
        &mut self,
        budget_ms: u64,
    ) -> RehashOutcome {
        if !self.is_rehashing() {
            return RehashOutcome::Done;
        }

        if self.pause_rehash.get() > 0 {
            trace!("rehash paused, deferring time-boxed step");
            return RehashOutcome::MoreWork;
        }

        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(budget_ms);
        const CHUNK: usize = 100;

        loop {
            match self.rehash_steps(CHUNK) {
                RehashOutcome::Done => return RehashOutcome::Done,
                RehashOutcome::MoreWork => {
                    if std::time::Instant::now() >= deadline {
                        return RehashOutcome::MoreWork;
                    }
                }
            }
        }
    }

    /// Pauses incremental rehashing for the lifetime of the returned guard.
    /// Used by iterators and scans that must not observe a bucket moving
    /// out from under them mid-traversal.
    pub(crate) fn pause_rehash_guard(&mut self) -> RehashGuard<'_, K, V, T> {
        self.pause_rehash.set(self.pause_rehash.get() + 1);
        RehashGuard { dict: self }
    }

    fn migrate_bucket(
        &mut self,
        idx: usize,
    ) {
        let mut chain = self.ht[0].buckets[idx].take();
        let dst_mask = self.ht[1].mask();
        let collapsible = self.vtable.no_value();

        while let Some(boxed) = chain {
            let mut node: Repr<K, V> = *boxed;

            // `KeyOnly` has no `next` field to take from, and splicing it
            // ahead of an existing chain requires upgrading it to `NoValue`
            // first (see below) since it can't carry a successor as-is.
            let was_key_only = node.tag() == EntryTag::KeyOnly;
            chain = if was_key_only { None } else { node.take_next() };

            let hash = self.vtable.hash(node.key());
            let dst_idx = (hash as usize) & dst_mask;
            let dest_was_empty = self.ht[1].buckets[dst_idx].is_none();

            if was_key_only && !dest_was_empty {
                node = node.upgrade_to_no_value();
            }

            if dest_was_empty {
                // Sole occupant of an empty bucket: no successor to link,
                // and — for `no_value` dicts — eligible to collapse down to
                // `KeyOnly` if the type allows it for this key.
                if collapsible {
                    node = node.collapse_to_key_only();
                }
            } else {
                node.set_next(self.ht[1].buckets[dst_idx].take());
            }

            self.ht[1].buckets[dst_idx] = Some(Box::new(node));
            self.ht[0].used -= 1;
            self.ht[1].used += 1;
        }
    }

    fn finish_rehash(&mut self) {
        debug!("rehash complete");
        self.ht[0] = std::mem::replace(&mut self.ht[1], HashTable::unallocated());
        self.rehash_idx = -1;
    }
}

/// RAII guard returned by `pause_rehash_guard`; decrements the pause
/// counter on drop.
pub(crate) struct RehashGuard<'a, K, V, T> {
    dict: &'a mut Dict<K, V, T>,
}

impl<K, V, T> Drop for RehashGuard<'_, K, V, T> {
    fn drop(&mut self) {
        self.dict
            .pause_rehash
            .set(self.dict.pause_rehash.get() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rehash_steps_is_done_when_not_rehashing() {
        let mut d: Dict<u32, u32> = Dict::new();
        assert_eq!(d.rehash_steps(1), RehashOutcome::Done);
    }

    #[test]
    fn expand_then_rehash_moves_all_entries() {
        let mut d: Dict<u32, i64> = Dict::new();
        for i in 0..20u32 {
            d.insert(i, i as i64);
        }
        let mut guard = 0;
        while d.is_rehashing() && guard < 1000 {
            d.rehash_steps(1);
            guard += 1;
        }
        assert!(!d.is_rehashing());
        assert_eq!(d.table_sizes().1, 0);
        for i in 0..20u32 {
            assert_eq!(d.find(&i).and_then(|v| v.as_ptr().copied()), Some(i as i64));
        }
    }

    #[test]
    fn pause_guard_blocks_progress() {
        let mut d: Dict<u32, i64> = Dict::new();
        for i in 0..20u32 {
            d.insert(i, i as i64);
        }
        assert!(d.is_rehashing());
        let guard = d.pause_rehash_guard();
        let before = d.rehash_idx;
        drop(guard);
        assert_eq!(d.rehash_idx, before);
    }
}
