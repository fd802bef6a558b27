//! Entry representation.
//!
//! A real `dict.c` packs a 3-way representation discriminant into the low
//! bits of an entry pointer (see DESIGN.md). This workspace forbids
//! `unsafe_code`, and keys/values here are arbitrary `K`/`V`, not raw
//! pointers, so the discriminant is modeled directly as an enum tag instead.

/// The value stored by a `Normal` entry: a pointer-sized payload that the
/// caller chooses to interpret as an owned `V`, a signed integer, an
/// unsigned integer, or a float.
#[derive(Debug, Clone, PartialEq)]
pub enum DictValue<V> {
    Ptr(V),
    Int(i64),
    UInt(u64),
    Double(f64),
}

impl<V> DictValue<V> {
    #[inline]
    pub fn as_ptr(&self) -> Option<&V> {
        match self {
            Self::Ptr(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_ptr_mut(&mut self) -> Option<&mut V> {
        match self {
            Self::Ptr(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }
}

/// Discriminant mirroring the source's 3-bit pointer tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTag {
    /// `001` in the source: the entry *is* the key, no value, no chain slot.
    KeyOnly,
    /// `010` in the source: `{key, next}`, no value.
    NoValue,
    /// `000` in the source: `{key, value, next, metadata}`.
    Normal,
}

pub(crate) type Link<K, V> = Option<Box<Repr<K, V>>>;

/// One element of a collision chain, tagged by representation.
#[derive(Debug, Clone)]
pub(crate) enum Repr<K, V> {
    KeyOnly { key: K },
    NoValue { key: K, next: Link<K, V> },
    Normal {
        key: K,
        value: DictValue<V>,
        next: Link<K, V>,
        metadata: Option<Vec<u8>>,
    },
}

impl<K, V> Repr<K, V> {
    #[inline]
    pub(crate) fn tag(&self) -> EntryTag {
        match self {
            Self::KeyOnly { .. } => EntryTag::KeyOnly,
            Self::NoValue { .. } => EntryTag::NoValue,
            Self::Normal { .. } => EntryTag::Normal,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        match self {
            Self::KeyOnly { key } => key,
            Self::NoValue { key, .. } => key,
            Self::Normal { key, .. } => key,
        }
    }

    #[inline]
    pub(crate) fn next(&self) -> Option<&Repr<K, V>> {
        match self {
            Self::KeyOnly { .. } => None,
            Self::NoValue { next, .. } => next.as_deref(),
            Self::Normal { next, .. } => next.as_deref(),
        }
    }

    /// Mutable access to the successor slot itself (not its contents), so
    /// callers can splice the chain in place. `KeyOnly` has none; callers
    /// must check `tag()` before following a chain past a `KeyOnly` head.
    #[inline]
    pub(crate) fn next_link_mut(&mut self) -> Option<&mut Link<K, V>> {
        match self {
            Self::KeyOnly { .. } => None,
            Self::NoValue { next, .. } => Some(next),
            Self::Normal { next, .. } => Some(next),
        }
    }

    /// Mutable access to the successor node itself, for chain traversal.
    #[inline]
    pub(crate) fn next_mut(&mut self) -> Option<&mut Repr<K, V>> {
        match self {
            Self::KeyOnly { .. } => None,
            Self::NoValue { next, .. } => next.as_deref_mut(),
            Self::Normal { next, .. } => next.as_deref_mut(),
        }
    }

    /// Takes the `next` link, leaving `None` behind. Panics (debug_assert)
    /// on `KeyOnly`, which never has a successor — callers must check
    /// `tag()` first when a bucket might hold more than one element.
    #[inline]
    pub(crate) fn take_next(&mut self) -> Link<K, V> {
        match self {
            Self::KeyOnly { .. } => {
                debug_assert!(false, "KeyOnly entries are never chained");
                None
            }
            Self::NoValue { next, .. } => next.take(),
            Self::Normal { next, .. } => next.take(),
        }
    }

    #[inline]
    pub(crate) fn set_next(&mut self, new_next: Link<K, V>) {
        match self {
            Self::KeyOnly { .. } => {
                debug_assert!(false, "KeyOnly entries refuse set_next");
            }
            Self::NoValue { next, .. } => *next = new_next,
            Self::Normal { next, .. } => *next = new_next,
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<&DictValue<V>> {
        match self {
            Self::Normal { value, .. } => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> Option<&mut DictValue<V>> {
        match self {
            Self::Normal { value, .. } => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn metadata(&self) -> Option<&[u8]> {
        match self {
            Self::Normal { metadata, .. } => metadata.as_deref(),
            _ => None,
        }
    }

    /// Collapses a `NoValue` entry to `KeyOnly`. Only valid when the entry
    /// has no successor; the caller (the rehash engine) verifies that the
    /// destination bucket was empty before calling this.
    pub(crate) fn collapse_to_key_only(self) -> Self {
        match self {
            Self::NoValue { key, next: None } => Self::KeyOnly { key },
            other => other,
        }
    }

    /// Upgrades a `KeyOnly` entry to `NoValue` so it can gain a successor.
    pub(crate) fn upgrade_to_no_value(self) -> Self {
        match self {
            Self::KeyOnly { key } => Self::NoValue { key, next: None },
            other => other,
        }
    }
}

/// A detached entry returned by `Dict::unlink`: unlinked from its chain but
/// not yet dropped, so the caller may inspect key/value before releasing it
/// via `Dict::free_unlinked`.
pub struct DetachedEntry<K, V> {
    pub(crate) repr: Repr<K, V>,
}

impl<K, V> DetachedEntry<K, V> {
    #[inline]
    pub fn key(&self) -> &K {
        self.repr.key()
    }

    #[inline]
    pub fn value(&self) -> Option<&DictValue<V>> {
        self.repr.value()
    }

    #[inline]
    pub fn tag(&self) -> EntryTag {
        self.repr.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_only_has_no_next() {
        let e: Repr<u32, u32> = Repr::KeyOnly { key: 1 };
        assert!(e.next().is_none());
        assert_eq!(e.tag(), EntryTag::KeyOnly);
    }

    #[test]
    fn normal_value_accessors() {
        let e: Repr<u32, u32> = Repr::Normal {
            key: 1,
            value: DictValue::Int(42),
            next: None,
            metadata: None,
        };
        assert_eq!(e.value().unwrap().as_int(), Some(42));
        assert!(e.value().unwrap().as_ptr().is_none());
    }

    #[test]
    fn collapse_and_upgrade_roundtrip() {
        let e: Repr<u32, u32> = Repr::NoValue { key: 7, next: None };
        let collapsed = e.collapse_to_key_only();
        assert_eq!(collapsed.tag(), EntryTag::KeyOnly);

        let upgraded = collapsed.upgrade_to_no_value();
        assert_eq!(upgraded.tag(), EntryTag::NoValue);
        assert_eq!(*upgraded.key(), 7);
    }

    #[test]
    fn collapse_refuses_when_chained() {
        let inner: Repr<u32, u32> = Repr::NoValue { key: 2, next: None };
        let e: Repr<u32, u32> = Repr::NoValue {
            key: 1,
            next: Some(Box::new(inner)),
        };
        let still_chained = e.collapse_to_key_only();
        assert_eq!(still_chained.tag(), EntryTag::NoValue);
    }
}
