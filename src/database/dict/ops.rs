//! Hot-path operations: find, insert, replace, delete, and the two-phase
//! unlink/free pair used by callers that need to inspect a removed entry
//! before releasing it.

use zdict_error::{DictError, StackError};

use super::entry::{DetachedEntry, DictValue, EntryTag, Link, Repr};
use super::vtable::DictType;
use super::Dict;

impl<K, V, T> Dict<K, V, T>
where
    T: DictType<K, V>,
{
    /// Looks up a key, returning its value. Searches the rehash-destination
    /// table too while a rehash is in progress.
    pub fn find(
        &self,
        key: &K,
    ) -> Option<&DictValue<V>> {
        self.find_repr(key).and_then(Repr::value)
    }

    /// Mutable counterpart of `find`.
    pub fn find_mut(
        &mut self,
        key: &K,
    ) -> Option<&mut DictValue<V>> {
        self.find_repr_mut(key).and_then(Repr::value_mut)
    }

    pub fn contains_key(
        &self,
        key: &K,
    ) -> bool {
        self.find_repr(key).is_some()
    }

    fn find_repr(
        &self,
        key: &K,
    ) -> Option<&Repr<K, V>> {
        if !self.ht[0].is_allocated() {
            return None;
        }

        let hash = self.vtable.hash(key);

        if let Some(found) = Self::search_chain(
            self.ht[0].buckets[self.ht[0].slot(hash)].as_deref(),
            &self.vtable,
            key,
        ) {
            return Some(found);
        }

        if self.is_rehashing() {
            return Self::search_chain(
                self.ht[1].buckets[self.ht[1].slot(hash)].as_deref(),
                &self.vtable,
                key,
            );
        }

        None
    }

    fn find_repr_mut(
        &mut self,
        key: &K,
    ) -> Option<&mut Repr<K, V>> {
        if !self.ht[0].is_allocated() {
            return None;
        }

        let hash = self.vtable.hash(key);
        let vtable = &self.vtable;

        let idx0 = self.ht[0].slot(hash);
        if let Some(found) =
            Self::search_chain_mut(self.ht[0].buckets[idx0].as_deref_mut(), vtable, key)
        {
            return Some(found);
        }

        if self.rehash_idx != -1 {
            let idx1 = self.ht[1].slot(hash);
            return Self::search_chain_mut(self.ht[1].buckets[idx1].as_deref_mut(), vtable, key);
        }

        None
    }

    fn search_chain<'a>(
        mut cur: Option<&'a Repr<K, V>>,
        vtable: &T,
        key: &K,
    ) -> Option<&'a Repr<K, V>> {
        while let Some(node) = cur {
            if vtable.key_eq(node.key(), key) {
                return Some(node);
            }
            cur = node.next();
        }
        None
    }

    fn search_chain_mut<'a>(
        mut cur: Option<&'a mut Repr<K, V>>,
        vtable: &T,
        key: &K,
    ) -> Option<&'a mut Repr<K, V>> {
        while let Some(node) = cur {
            if vtable.key_eq(node.key(), key) {
                return Some(node);
            }
            cur = node.next_mut();
        }
        None
    }

    /// Inserts a new key, failing if it already exists — the source's
    /// `dictAdd`/`dictAddRaw` semantics.
    pub fn try_insert(
        &mut self,
        key: K,
        value: V,
    ) -> Result<(), StackError> {
        self.rehash_steps(1);

        if self.contains_key(&key) {
            return Err(DictError::AlreadyExists.into());
        }

        self.expand_if_needed();
        self.insert_unchecked(key, DictValue::Ptr(value));
        Ok(())
    }

    /// Inserts or overwrites a key, returning the previous value if one
    /// existed — `HashMap::insert`-style upsert built on the source's
    /// `dictAdd`/`dictReplace` pair.
    pub fn insert(
        &mut self,
        key: K,
        value: V,
    ) -> Option<V> {
        self.rehash_steps(1);

        if let Some(existing) = self.find_repr_mut(&key) {
            // Build the replacement before dropping the old value: if `V`
            // is a reference-counted handle the caller holds elsewhere
            // (`Rc`/`Arc`), constructing the new value first and swapping
            // it in avoids a transient window where the slot holds neither.
            let new_value = DictValue::Ptr(value);
            let old = match existing.value_mut() {
                Some(slot) => std::mem::replace(slot, new_value),
                None => {
                    // Existing entry has no value slot (a `no_value` dict);
                    // nothing meaningful to return.
                    return None;
                }
            };
            self.vtable.after_replace(existing);
            return old.into_ptr();
        }

        self.expand_if_needed();
        self.insert_unchecked(key, DictValue::Ptr(value));
        None
    }

    /// Inserts or overwrites using an already-tagged `DictValue`, for
    /// callers that want the `Int`/`UInt`/`Double` encodings directly
    /// rather than paying for a boxed `Ptr`.
    pub fn replace_value(
        &mut self,
        key: K,
        value: DictValue<V>,
    ) -> Option<DictValue<V>> {
        self.rehash_steps(1);

        if let Some(existing) = self.find_repr_mut(&key) {
            let old = match existing.value_mut() {
                Some(slot) => std::mem::replace(slot, value),
                None => return None,
            };
            self.vtable.after_replace(existing);
            return Some(old);
        }

        self.expand_if_needed();
        self.insert_unchecked(key, value);
        None
    }

    fn insert_unchecked(
        &mut self,
        key: K,
        value: DictValue<V>,
    ) {
        let hash = self.vtable.hash(&key);

        let table = if self.is_rehashing() { 1 } else { 0 };
        let idx = self.ht[table].slot(hash);
        // Take whatever chain already occupies this bucket so `new_entry`
        // can see whether the new entry would need a successor — the
        // `KeyOnly` optimization is only valid when the bucket is empty;
        // otherwise the new head must carry the old head as its `next`.
        let existing = self.ht[table].buckets[idx].take();
        let repr = self.new_entry(key, Some(value), existing);

        self.ht[table].buckets[idx] = Some(Box::new(repr));
        self.ht[table].used += 1;
    }

    /// Removes a key, returning its value.
    pub fn delete(
        &mut self,
        key: &K,
    ) -> Option<DictValue<V>> {
        self.unlink(key).map(|detached| {
            let (_, value) = detached.into_parts();
            value.unwrap_or(DictValue::Int(0))
        })
    }

    /// Removes a key from its chain without dropping it, returning a
    /// `DetachedEntry` the caller can inspect before calling
    /// `free_unlinked`. Mirrors the source's `dictUnlink`/
    /// `dictFreeUnlinkedEntry` pair, used when releasing a value has
    /// side effects the caller wants to sequence explicitly (e.g. running
    /// it after releasing another lock).
    pub fn unlink(
        &mut self,
        key: &K,
    ) -> Option<DetachedEntry<K, V>> {
        self.rehash_steps(1);

        if !self.ht[0].is_allocated() {
            return None;
        }

        let hash = self.vtable.hash(key);
        let vtable = &self.vtable;

        let idx0 = self.ht[0].slot(hash);
        if let Some(repr) = Self::unlink_from(&mut self.ht[0].buckets[idx0], vtable, key) {
            self.ht[0].used -= 1;
            return Some(DetachedEntry { repr: *repr });
        }

        if self.rehash_idx != -1 {
            let idx1 = self.ht[1].slot(hash);
            if let Some(repr) = Self::unlink_from(&mut self.ht[1].buckets[idx1], vtable, key) {
                self.ht[1].used -= 1;
                return Some(DetachedEntry { repr: *repr });
            }
        }

        None
    }

    /// Releases an entry previously removed with `unlink`. Since Rust
    /// already drops owned values deterministically, this exists only to
    /// mirror the two-phase shape of the source API; it amounts to `drop`.
    pub fn free_unlinked(
        &self,
        entry: DetachedEntry<K, V>,
    ) {
        drop(entry);
    }

    fn unlink_from(
        link: &mut Link<K, V>,
        vtable: &T,
        key: &K,
    ) -> Option<Box<Repr<K, V>>> {
        let is_match = match link.as_deref() {
            Some(node) => vtable.key_eq(node.key(), key),
            None => return None,
        };

        if is_match {
            let mut node = link.take().unwrap();
            let next = if node.tag() == EntryTag::KeyOnly {
                None
            } else {
                node.take_next()
            };
            *link = next;
            return Some(node);
        }

        match link.as_mut().unwrap().next_link_mut() {
            Some(next_link) => Self::unlink_from(next_link, vtable, key),
            None => None,
        }
    }
}

impl<V> DictValue<V> {
    fn into_ptr(self) -> Option<V> {
        match self {
            Self::Ptr(v) => Some(v),
            _ => None,
        }
    }
}

impl<K, V> DetachedEntry<K, V> {
    fn into_parts(self) -> (K, Option<DictValue<V>>) {
        match self.repr {
            Repr::KeyOnly { key } => (key, None),
            Repr::NoValue { key, .. } => (key, None),
            Repr::Normal { key, value, .. } => (key, Some(value)),
        }
    }
}
