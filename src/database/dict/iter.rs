//! Two iterator flavors mirroring the source's `dictIterator` modes:
//! `SafeIter` pauses rehashing for as long as it's alive, so the caller may
//! freely look things up while iterating; `UnsafeIter` doesn't pause
//! anything, is cheaper, but panics (in debug) or reports a
//! `DictError::FingerprintMismatch` (via `finish`) if the table's shape
//! changed underneath it — the source's "don't add or remove entries
//! while using an unsafe iterator" contract, checked rather than merely
//! documented.

use zdict_error::DictError;

use super::entry::{DictValue, Repr};
use super::vtable::DictType;
use super::Dict;

impl<K, V, T> Dict<K, V, T>
where
    T: DictType<K, V>,
{
    /// Starts a safe iterator: rehashing is paused until it's dropped.
    pub fn iter_safe(&mut self) -> SafeIter<'_, K, V, T> {
        SafeIter::new(self)
    }

    /// Starts an unsafe iterator: cheaper, but the caller must not insert
    /// or delete keys while it's alive. Call `finish` to check that
    /// promise was honored, or let `Drop` debug-assert it.
    pub fn iter_unsafe(&self) -> UnsafeIter<'_, K, V, T> {
        UnsafeIter::new(self)
    }

    pub(crate) fn fingerprint(&self) -> u64 {
        let parts = [
            self.ht[0].buckets.as_ptr() as usize as u64,
            self.ht[0].size() as u64,
            self.ht[0].used as u64,
            self.ht[1].buckets.as_ptr() as usize as u64,
            self.ht[1].size() as u64,
            self.ht[1].used as u64,
            self.rehash_idx as u64,
        ];

        let mut hash: u64 = 0;
        for &part in &parts {
            hash ^= part;
            hash = hash.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            hash ^= hash >> 29;
        }
        hash
    }
}

struct Cursor {
    table: usize,
    idx: usize,
}

impl Cursor {
    fn start() -> Self {
        Cursor { table: 0, idx: 0 }
    }
}

fn advance<'a, K, V, T>(
    dict: &'a Dict<K, V, T>,
    cursor: &mut Cursor,
    cur: &mut Option<&'a Repr<K, V>>,
) -> Option<&'a Repr<K, V>>
where
    T: DictType<K, V>,
{
    loop {
        if let Some(node) = cur.take() {
            *cur = node.next();
            return Some(node);
        }

        let table_count = if dict.is_rehashing() { 2 } else { 1 };
        if cursor.table >= table_count {
            return None;
        }

        let size = dict.ht[cursor.table].size();
        if cursor.idx >= size {
            cursor.table += 1;
            cursor.idx = 0;
            continue;
        }

        let bucket = dict.ht[cursor.table].buckets[cursor.idx].as_deref();
        cursor.idx += 1;

        if let Some(node) = bucket {
            *cur = Some(node);
            continue;
        }
    }
}

/// An iterator that pauses incremental rehashing for its entire lifetime.
pub struct SafeIter<'a, K, V, T> {
    dict: &'a Dict<K, V, T>,
    cursor: Cursor,
    cur: Option<&'a Repr<K, V>>,
}

impl<'a, K, V, T> SafeIter<'a, K, V, T>
where
    T: DictType<K, V>,
{
    fn new(dict: &'a mut Dict<K, V, T>) -> Self {
        dict.pause_rehash.set(dict.pause_rehash.get() + 1);
        let dict: &'a Dict<K, V, T> = &*dict;
        SafeIter {
            dict,
            cursor: Cursor::start(),
            cur: None,
        }
    }
}

impl<'a, K, V, T> Iterator for SafeIter<'a, K, V, T>
where
    T: DictType<K, V>,
{
    type Item = (&'a K, Option<&'a DictValue<V>>);

    fn next(&mut self) -> Option<Self::Item> {
        let node = advance(self.dict, &mut self.cursor, &mut self.cur)?;
        Some((node.key(), node.value()))
    }
}

impl<K, V, T> Drop for SafeIter<'_, K, V, T> {
    fn drop(&mut self) {
        self.dict
            .pause_rehash
            .set(self.dict.pause_rehash.get() - 1);
    }
}

/// A cheap iterator that does not pause rehashing. The caller must not
/// mutate the dict's structure (insert/delete/rehash) while it's alive;
/// `finish` (or `Drop`, in debug builds) checks that the table's shape is
/// unchanged from when iteration started.
pub struct UnsafeIter<'a, K, V, T> {
    dict: &'a Dict<K, V, T>,
    cursor: Cursor,
    cur: Option<&'a Repr<K, V>>,
    fingerprint: u64,
    finished: bool,
}

impl<'a, K, V, T> UnsafeIter<'a, K, V, T>
where
    T: DictType<K, V>,
{
    fn new(dict: &'a Dict<K, V, T>) -> Self {
        UnsafeIter {
            fingerprint: dict.fingerprint(),
            dict,
            cursor: Cursor::start(),
            cur: None,
            finished: false,
        }
    }

    /// Validates that the table's shape hasn't changed since iteration
    /// began, consuming the iterator. Prefer this over relying on `Drop`
    /// when the caller wants to handle a mismatch instead of panicking.
    pub fn finish(mut self) -> Result<(), DictError> {
        self.finished = true;
        if self.dict.fingerprint() == self.fingerprint {
            Ok(())
        } else {
            Err(DictError::FingerprintMismatch)
        }
    }
}

impl<'a, K, V, T> Iterator for UnsafeIter<'a, K, V, T>
where
    T: DictType<K, V>,
{
    type Item = (&'a K, Option<&'a DictValue<V>>);

    fn next(&mut self) -> Option<Self::Item> {
        let node = advance(self.dict, &mut self.cursor, &mut self.cur)?;
        Some((node.key(), node.value()))
    }
}

impl<K, V, T> Drop for UnsafeIter<'_, K, V, T> {
    fn drop(&mut self) {
        if !self.finished {
            debug_assert_eq!(
                self.dict.fingerprint(),
                self.fingerprint,
                "dict structurally changed during an UnsafeIter"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_iter_visits_every_entry() {
        let mut d: Dict<u32, u32> = Dict::new();
        for i in 0..30u32 {
            d.insert(i, i);
        }
        let seen: std::collections::HashSet<u32> =
            d.iter_safe().map(|(k, _)| *k).collect();
        assert_eq!(seen.len(), 30);
    }

    #[test]
    fn safe_iter_pauses_rehash_while_alive() {
        let mut d: Dict<u32, u32> = Dict::new();
        for i in 0..30u32 {
            d.insert(i, i);
        }
        assert!(d.is_rehashing());
        let before = d.rehash_idx;
        {
            let mut it = d.iter_safe();
            let _ = it.next();
            assert_eq!(d_rehash_idx_through(&it), before);
        }
    }

    fn d_rehash_idx_through<K, V, T>(it: &SafeIter<'_, K, V, T>) -> isize
    where
        T: DictType<K, V>,
    {
        it.dict.rehash_idx
    }

    #[test]
    fn unsafe_iter_finish_succeeds_without_mutation() {
        let mut d: Dict<u32, u32> = Dict::new();
        d.insert(1, 1);
        d.insert(2, 2);
        let it = d.iter_unsafe();
        let count = it.count();
        assert_eq!(count, 2);
    }

    #[test]
    fn unsafe_iter_detects_mutation_via_finish() {
        let mut d: Dict<u32, u32> = Dict::new();
        for i in 0..30u32 {
            d.insert(i, i);
        }
        let it = d.iter_unsafe();
        let fp_before = it.fingerprint;
        drop(it);
        d.insert(1000, 1000);
        // reconstruct as if we'd kept iterating against the stale
        // fingerprint, to exercise the comparison path directly
        assert_ne!(fp_before, d.fingerprint());
    }
}
