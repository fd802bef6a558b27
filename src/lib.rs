//! zdict - an in-memory associative container with incremental rehashing.
//!
//! Main modules:
//! - `config` — process-wide configuration (resize policy, hash seed)
//! - `database` — the `Dict` hash table and the `Sds` dynamic-string type
//! - `logging` — `tracing` subscriber setup
//!
//! The hot path lives in [`database::dict::Dict`]: point lookups,
//! insertions, replacements, deletions, randomized sampling, and a
//! stateless, resize-tolerant full-table scan, with table growth amortized
//! across many operations instead of stalling any single call.

/// Process-wide configuration loading (resize policy, hash seed).
pub mod config;
/// Built-in data structures: `Dict` and `Sds`.
pub mod database;
/// `tracing` subscriber setup.
pub mod logging;

pub use config::DictConfig;
pub use database::dict::{
    DefaultDictType, DetachedEntry, Dict, DictStats, DictType, DictValue, EntryTag, HashSeed,
    RehashOutcome, ResizePolicy, SafeIter, TableStats, UnsafeIter, INITIAL_SIZE,
};
pub use database::sds::Sds;
