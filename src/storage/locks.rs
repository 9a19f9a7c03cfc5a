// Striped key locks
//
// Every key maps to one stripe. A caller locks the stripes of all keys it
// touches, always in ascending stripe order, so two multi-key operations can
// never wait on each other in a cycle.

use crossbeam::utils::CachePadded;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_STRIPES: usize = 64;
pub const MAX_STRIPES: usize = 65536;

pub struct KeyLocks {
    stripes: Box<[CachePadded<Mutex<()>>]>,
    hasher: RandomState,
}

/// Holds the stripes of a set of keys until dropped.
#[must_use = "the keys are unlocked as soon as the guard is dropped"]
pub struct KeyGuard<'a> {
    _held: Vec<MutexGuard<'a, ()>>,
}

impl KeyLocks {
    /// `stripes` is rounded up to the next power of two and capped at
    /// `MAX_STRIPES`.
    pub fn new(stripes: usize) -> Self {
        let count = stripes.clamp(1, MAX_STRIPES).next_power_of_two();
        Self {
            stripes: (0..count).map(|_| CachePadded::new(Mutex::new(()))).collect(),
            hasher: RandomState::new(),
        }
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    pub fn stripe_of(&self, key: &[u8]) -> usize {
        self.hasher.hash_one(key) as usize & (self.stripes.len() - 1)
    }

    /// Lock every stripe covering `keys`. Keys sharing a stripe are locked once.
    pub fn lock<K, I>(&self, keys: I) -> KeyGuard<'_>
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = K>,
    {
        let mut indices: Vec<usize> = keys
            .into_iter()
            .map(|k| self.stripe_of(k.as_ref()))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        self.acquire(indices)
    }

    pub fn lock_all(&self) -> KeyGuard<'_> {
        self.acquire(0..self.stripes.len())
    }

    fn acquire(&self, ordered: impl IntoIterator<Item = usize>) -> KeyGuard<'_> {
        // A panic while a stripe was held cannot leave a set half-updated in
        // a way that breaks its invariants, so poisoning is ignored.
        let held = ordered
            .into_iter()
            .map(|i| self.stripes[i].lock().unwrap_or_else(PoisonError::into_inner))
            .collect();
        KeyGuard { _held: held }
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new(DEFAULT_STRIPES)
    }
}
