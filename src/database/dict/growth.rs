//! Growth policy: deciding whether and when to start an incremental rehash
//! into a larger (or, for `resize()`, smaller) table.

use tracing::{trace, warn};

use super::table::{exponent_for, HashTable, INITIAL_SIZE};
use super::vtable::{DictType, ResizePolicy};
use super::Dict;

/// Load factor past which growth is considered under `Enable`.
const LOAD_FACTOR_GROW: usize = 1;

/// Ratio of used/size past which growth proceeds even under `Avoid`.
pub const FORCE_RESIZE_RATIO: usize = 5;

impl<K, V, T> Dict<K, V, T>
where
    T: DictType<K, V>,
{
    /// Starts an incremental rehash into a larger table if the load factor
    /// and resize policy call for it. A no-op while already rehashing.
    pub fn expand_if_needed(&mut self) {
        if self.is_rehashing() {
            return;
        }

        if !self.ht[0].is_allocated() {
            self.start_rehash_to(INITIAL_SIZE);
            return;
        }

        let size = self.ht[0].size();
        let used = self.ht[0].used;

        let should_grow = match self.policy {
            ResizePolicy::Forbid => false,
            ResizePolicy::Enable => used >= size * LOAD_FACTOR_GROW,
            ResizePolicy::Avoid => used > size * FORCE_RESIZE_RATIO,
        };

        if should_grow {
            self.start_rehash_to(used + 1);
        }
    }

    /// Explicitly requests the table be resized to fit `used` entries as
    /// tightly as `INITIAL_SIZE` allows, growing or shrinking. Useful after
    /// a bulk delete. Honors the type's `expand_allowed` veto.
    ///
    /// Under `ResizePolicy::Avoid`, a resize that isn't already past
    /// `FORCE_RESIZE_RATIO` is refused unless `force` is `true` — the same
    /// "refuses to start or continue a rehash ... unless forced" rule
    /// `expand_if_needed` applies to growth, extended to the explicit
    /// caller-initiated path.
    pub fn resize(
        &mut self,
        force: bool,
    ) {
        if self.is_rehashing() || matches!(self.policy, ResizePolicy::Forbid) {
            return;
        }

        if !force && matches!(self.policy, ResizePolicy::Avoid) {
            let size = self.ht[0].size();
            let used = self.ht[0].used;
            if size == 0 || used <= size * FORCE_RESIZE_RATIO {
                return;
            }
        }

        let target = std::cmp::max(INITIAL_SIZE, self.ht[0].used);
        self.start_rehash_to(target);
    }

    fn start_rehash_to(
        &mut self,
        requested: usize,
    ) {
        let Some(exponent) = exponent_for(requested) else {
            warn!(requested, "rehash target exponent overflowed, skipping");
            return;
        };

        let target_size = 1usize << exponent;
        let current_size = self.ht[0].size();

        if target_size == current_size && self.ht[0].is_allocated() {
            return;
        }

        if !self
            .vtable
            .expand_allowed(current_size, target_size)
        {
            warn!(current_size, target_size, "expansion vetoed by dict type");
            return;
        }

        trace!(current_size, target_size, "starting incremental rehash");

        self.ht[1] = HashTable::with_exponent(exponent);
        self.rehash_idx = 0;
    }
}
