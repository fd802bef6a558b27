//! An associative container with incremental rehashing: insert, lookup,
//! and delete are always O(1) amortized, even while a resize is spreading
//! its cost across many subsequent operations instead of stalling the
//! caller with one large copy.

mod core;
mod entry;
mod growth;
mod iter;
mod ops;
mod rehash;
mod sample;
mod scan;
mod stats;
mod table;
mod vtable;

pub use core::Dict;
pub use entry::{DetachedEntry, DictValue, EntryTag};
pub use iter::{SafeIter, UnsafeIter};
pub use rehash::RehashOutcome;
pub use stats::{DictStats, TableStats};
pub use table::INITIAL_SIZE;
pub use vtable::{DefaultDictType, DictType, HashSeed, ResizePolicy};
