//! Structural-equality interning of geometry values.

use crate::{
    config::CacheConfig,
    obs::sink::{self, MetricsEvent},
    value::{GeometryValue, WeakGeometryValue},
};
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

///
/// CONSTANTS
///

/// Upper bound on slot count regardless of configuration.
pub const MAX_SLOTS: usize = 1 << 20;

///
/// ValueCache
///
/// Returns a canonical shared instance for structurally equal values.
/// Implementations may forget entries at any time; interning is an
/// optimization, never a correctness requirement.
///

pub trait ValueCache: fmt::Debug + Send + Sync {
    fn intern(&self, value: GeometryValue) -> GeometryValue;
}

/// Build the cache described by `config`; capacity 0 disables interning.
#[must_use]
pub fn from_config(config: &CacheConfig) -> Arc<dyn ValueCache> {
    if config.capacity == 0 {
        Arc::new(NoCache)
    } else {
        Arc::new(SlotCache::new(config.capacity))
    }
}

///
/// NoCache
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl ValueCache for NoCache {
    fn intern(&self, value: GeometryValue) -> GeometryValue {
        value
    }
}

///
/// SlotCache
///
/// Direct-mapped table of weak references indexed by the value hash.
/// A slot never keeps its value alive; a colliding insert simply evicts.
///

pub struct SlotCache {
    slots: Mutex<Vec<WeakGeometryValue>>,
    mask: usize,
}

impl SlotCache {
    /// `capacity` is rounded up to a power of two and clamped to `MAX_SLOTS`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let len = capacity.clamp(1, MAX_SLOTS).next_power_of_two();

        Self {
            slots: Mutex::new(vec![WeakGeometryValue::new(); len]),
            mask: len - 1,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Number of slots whose value is still alive.
    #[must_use]
    pub fn live(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|slot| slot.upgrade().is_some())
            .count()
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn slot_index(&self, hash: u64) -> usize {
        hash as usize & self.mask
    }
}

impl ValueCache for SlotCache {
    fn intern(&self, value: GeometryValue) -> GeometryValue {
        let idx = self.slot_index(value.hash_code());

        let hit = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // a hit must come from the same context, not just the same backend kind
            match slots[idx].upgrade() {
                Some(cached)
                    if Arc::ptr_eq(cached.context(), value.context()) && cached == value =>
                {
                    Some(cached)
                }
                _ => {
                    slots[idx] = value.downgrade();
                    None
                }
            }
        };

        if let Some(cached) = hit {
            sink::record(MetricsEvent::CacheHit);
            cached
        } else {
            sink::record(MetricsEvent::CacheMiss);
            value
        }
    }
}

impl fmt::Debug for SlotCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotCache")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

///
/// TESTS
///
