//! Memo of parsed per-part configuration for background simulation.
//!
//! Background ticks may visit thousands of unloaded parts. Anything a module
//! derives from static part configuration (typically parsed rate lists) is
//! stored here once per vessel and part, under a structured [`CacheKey`].
//! Entries live until the vessel is purged from the background pool.
//!
//! The cache never changes results: a miss recomputes exactly what a hit
//! would have returned.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::id::{PartId, VesselId};

/// What a cached value was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    ResourcesProduced,
    ResourcesConsumed,
    /// Custom module data.
    Named(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub part: PartId,
    pub kind: CacheKind,
}

impl CacheKey {
    pub fn new(part: PartId, kind: CacheKind) -> Self {
        Self { part, kind }
    }
}

type Entries = HashMap<CacheKey, Box<dyn Any + Send + Sync>>;

#[derive(Default)]
pub struct BackgroundStepCache {
    vessels: HashMap<VesselId, Entries>,
}

impl std::fmt::Debug for BackgroundStepCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundStepCache")
            .field("vessels", &self.vessels.len())
            .field("entries", &self.len())
            .finish()
    }
}

impl BackgroundStepCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value stored under `key`, if any and of type `T`.
    pub fn get<T: Any>(&self, vessel: VesselId, key: CacheKey) -> Option<&T> {
        self.vessels
            .get(&vessel)
            .and_then(|entries| entries.get(&key))
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn set<T: Any + Send + Sync>(&mut self, vessel: VesselId, key: CacheKey, value: T) {
        self.vessels
            .entry(vessel)
            .or_default()
            .insert(key, Box::new(value));
    }

    pub fn contains(&self, vessel: VesselId, key: CacheKey) -> bool {
        self.vessels
            .get(&vessel)
            .is_some_and(|entries| entries.contains_key(&key))
    }

    /// The value stored under `key`, computed by `init` on a miss. A value
    /// of another type counts as a miss and is replaced. Always `Some`.
    pub fn get_or_insert_with<T, F>(&mut self, vessel: VesselId, key: CacheKey, init: F) -> Option<&T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let slot = match self.vessels.entry(vessel).or_default().entry(key) {
            Entry::Occupied(occupied) => {
                let slot = occupied.into_mut();
                if !slot.is::<T>() {
                    *slot = Box::new(init());
                }
                slot
            }
            Entry::Vacant(vacant) => vacant.insert(Box::new(init())),
        };
        slot.downcast_ref::<T>()
    }

    /// Remove one entry, returning whether it existed.
    pub fn remove(&mut self, vessel: VesselId, key: CacheKey) -> bool {
        self.vessels
            .get_mut(&vessel)
            .is_some_and(|entries| entries.remove(&key).is_some())
    }

    /// Drop every entry of a vessel leaving the background pool.
    pub fn purge_vessel(&mut self, vessel: VesselId) {
        self.vessels.remove(&vessel);
    }

    pub fn clear(&mut self) {
        self.vessels.clear();
    }

    /// Number of entries across all vessels.
    pub fn len(&self) -> usize {
        self.vessels.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
