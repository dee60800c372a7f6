//! SlotIndex: keyed arena with stable, generational slot ids.
//!
//! Entries live in a `SlotMap`; a `HashTable` of slot ids indexes them by
//! key. Each slot caches the key's hash so the table can rehash without
//! calling back into `K: Hash`.

use crate::probe_guard::ProbeGuard;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashTable;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generational id of one arena slot. Never reused for a different entry.
    pub(crate) struct EntryId;
}

#[derive(Clone, Debug)]
struct Slot<K, T> {
    key: K,
    payload: T,
    hash: u64,
}

#[derive(Debug)]
pub(crate) enum InsertError {
    DuplicateKey,
}

#[derive(Clone)]
pub(crate) struct SlotIndex<K, T, S> {
    hasher: S,
    index: HashTable<EntryId>,
    slots: SlotMap<EntryId, Slot<K, T>>,
    guard: ProbeGuard,
}

impl<K, T, S> SlotIndex<K, T, S> {
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            guard: ProbeGuard::new(),
        }
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get(&self, id: EntryId) -> Option<(&K, &T)> {
        self.slots.get(id).map(|s| (&s.key, &s.payload))
    }

    pub(crate) fn payload(&self, id: EntryId) -> Option<&T> {
        self.slots.get(id).map(|s| &s.payload)
    }

    pub(crate) fn payload_mut(&mut self, id: EntryId) -> Option<&mut T> {
        self.slots.get_mut(id).map(|s| &mut s.payload)
    }

    pub(crate) fn get_pair_mut(&mut self, id: EntryId) -> Option<(&K, &mut T)> {
        self.slots.get_mut(id).map(|s| (&s.key, &mut s.payload))
    }

    /// Free a slot and drop it from the index; stale ids resolve to `None`.
    /// Uses the cached hash, so no user code runs.
    pub(crate) fn remove(&mut self, id: EntryId) -> Option<(K, T)> {
        let _g = self.guard.enter();
        let slot = self.slots.remove(id)?;
        if let Ok(e) = self.index.find_entry(slot.hash, |&other| other == id) {
            let _ = e.remove();
        }
        Some((slot.key, slot.payload))
    }

    pub(crate) fn clear(&mut self) {
        let _g = self.guard.enter();
        self.index.clear();
        self.slots.clear();
    }
}

impl<K, T, S> SlotIndex<K, T, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn find<Q>(&self, q: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter();
        let hash = self.make_hash(q);
        self.index
            .find(hash, |&id| {
                self.slots
                    .get(id)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    /// Insert a key that must not already be indexed.
    pub(crate) fn insert(&mut self, key: K, payload: T) -> Result<EntryId, InsertError> {
        let _g = self.guard.enter();
        let hash = self.make_hash(&key);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&id| slots.get(id).map(|s| s.key == key).unwrap_or(false),
            |&id| slots.get(id).map(|s| s.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(_) => Err(InsertError::DuplicateKey),
            hashbrown::hash_table::Entry::Vacant(v) => {
                let id = slots.insert(Slot { key, payload, hash });
                let _ = v.insert(id);
                Ok(id)
            }
        }
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        let _g = self.guard.enter();
        let slots = &self.slots;
        self.index.reserve(additional, |&id| {
            slots.get(id).map(|s| s.hash).unwrap_or(0)
        });
        self.slots.reserve(additional);
    }
}
