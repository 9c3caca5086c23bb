//! Per-character render cache guarded by generation tickets.
//!
//! A render takes a ticket before it starts fetching. Any mutation of the
//! character invalidates the entry, and a later ticket gets a fresh
//! generation. `store` only accepts a result whose ticket is still current,
//! so a slow render of old data can never replace a newer one.
//!
//! Requests that end without a render release their entry with `cancel`,
//! and the map holds at most `capacity` characters, evicting the least
//! recently used one beyond that.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::RecordId;

/// Proof that a render started at a particular generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    key: RecordId,
    generation: u64,
}

/// Characters kept by [`RenderCache::new`].
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug)]
struct Entry<T> {
    generation: u64,
    last_used: u64,
    value: Option<Arc<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    next_generation: u64,
    clock: u64,
    entries: HashMap<RecordId, Entry<T>>,
}

impl<T> Inner<T> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_oldest_except(&mut self, keep: &RecordId) {
        let oldest = self
            .entries
            .iter()
            .filter(|(key, _)| *key != keep)
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

#[derive(Debug)]
pub struct RenderCache<T> {
    capacity: usize,
    inner: Mutex<Inner<T>>,
}

impl<T> Default for RenderCache<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<T> RenderCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` characters (minimum one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                next_generation: 1,
                clock: 0,
                entries: HashMap::new(),
            }),
        }
    }

    // A poisoned lock only means another render panicked mid-update; the
    // map itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts a render of `key`, returning the ticket to store it with.
    pub fn begin(&self, key: &RecordId) -> RenderTicket {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let now = inner.tick();
        let generation = match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = now;
                entry.generation
            }
            None => {
                let generation = inner.next_generation;
                inner.next_generation += 1;
                inner.entries.insert(
                    key.clone(),
                    Entry {
                        generation,
                        last_used: now,
                        value: None,
                    },
                );
                if inner.entries.len() > self.capacity {
                    inner.evict_oldest_except(key);
                }
                generation
            }
        };
        RenderTicket {
            key: key.clone(),
            generation,
        }
    }

    /// The cached result for `key`, if one exists for the current generation.
    pub fn get(&self, key: &RecordId) -> Option<Arc<T>> {
        let mut inner = self.lock();
        let now = inner.tick();
        let entry = inner.entries.get_mut(key)?;
        entry.last_used = now;
        entry.value.clone()
    }

    /// Stores `value` if `ticket` is still current. Returns whether it was kept.
    pub fn store(&self, ticket: &RenderTicket, value: Arc<T>) -> bool {
        let mut inner = self.lock();
        match inner.entries.get_mut(&ticket.key) {
            Some(entry) if entry.generation == ticket.generation => {
                entry.value = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Releases the entry `ticket` created when the request ended without a
    /// render. A stored result, or an entry from a newer generation, stays.
    pub fn cancel(&self, ticket: &RenderTicket) {
        let mut inner = self.lock();
        let unused = inner.entries.get(&ticket.key).is_some_and(|entry| {
            entry.generation == ticket.generation && entry.value.is_none()
        });
        if unused {
            inner.entries.remove(&ticket.key);
        }
    }

    /// Drops any cached result for `key` and retires outstanding tickets.
    pub fn invalidate(&self, key: &RecordId) {
        self.lock().entries.remove(key);
    }

    pub fn is_current(&self, ticket: &RenderTicket) -> bool {
        self.lock()
            .entries
            .get(&ticket.key)
            .is_some_and(|entry| entry.generation == ticket.generation)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }
}
