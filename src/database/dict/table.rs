//! One bucket array: a vector of chains, its power-of-two size recorded as a
//! signed exponent, and how many entries it currently holds.

use super::entry::Link;

/// Smallest table ever allocated; also the floor `resize()` shrinks to.
pub const INITIAL_SIZE: usize = 4;
const INITIAL_EXPONENT: i32 = 2; // 2^2 == INITIAL_SIZE

#[derive(Debug)]
pub(crate) struct HashTable<K, V> {
    pub(crate) buckets: Vec<Link<K, V>>,
    /// `-1` means unallocated, matching the source's `rehashIdx`-style
    /// sentinel for "no table".
    pub(crate) exponent: i32,
    pub(crate) used: usize,
}

impl<K, V> HashTable<K, V> {
    pub(crate) fn unallocated() -> Self {
        HashTable {
            buckets: Vec::new(),
            exponent: -1,
            used: 0,
        }
    }

    /// Allocates a table of `2^exponent` empty buckets.
    pub(crate) fn with_exponent(exponent: i32) -> Self {
        debug_assert!(exponent >= INITIAL_EXPONENT);
        let size = 1usize << exponent;
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, || None);
        HashTable {
            buckets,
            exponent,
            used: 0,
        }
    }

    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        self.exponent >= 0
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        if self.exponent < 0 {
            0
        } else {
            1usize << self.exponent
        }
    }

    #[inline]
    pub(crate) fn mask(&self) -> usize {
        self.size().wrapping_sub(1)
    }

    #[inline]
    pub(crate) fn slot(&self, hash: u64) -> usize {
        (hash as usize) & self.mask()
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.exponent = -1;
        self.used = 0;
    }

    /// Chain length at `idx` (for stats / debug reporting).
    pub(crate) fn chain_len(&self, idx: usize) -> usize {
        let mut len = 0;
        let mut cur = self.buckets[idx].as_deref();
        while let Some(e) = cur {
            len += 1;
            cur = e.next();
        }
        len
    }
}

/// Smallest exponent `e` such that `2^e >= max(requested, INITIAL_SIZE)`.
///
/// Special-cases `requested <= INITIAL_SIZE` so `leading_zeros` is never
/// evaluated at `requested <= 1` (the source's own open question, §9).
pub(crate) fn exponent_for(requested: usize) -> Option<i32> {
    if requested <= INITIAL_SIZE {
        return Some(INITIAL_EXPONENT);
    }

    let bits = usize::BITS;
    // largest representable power of two for `usize`
    let max_exponent = (bits - 1) as i32;

    let e = bits - (requested - 1).leading_zeros();
    let e = e as i32;

    if e > max_exponent {
        None
    } else {
        Some(e)
    }
}
