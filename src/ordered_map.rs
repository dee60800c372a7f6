//! OrderedMap: insertion-ordered hash map with physical and logical deletes.
//!
//! Live entries are threaded through a doubly linked order list whose links
//! are slot ids, not pointers. A logically deleted entry is unlinked from the
//! list but keeps its slot (and therefore its key and value) in the index
//! until it is stored again or physically deleted.

use crate::entry::{EntryRef, Handle};
use crate::slot_index::{EntryId, SlotIndex};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use std::collections::hash_map::RandomState;

/// Whether an indexed entry is visible to lookups and iteration.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EntryState {
    /// Linked into the order list; visible to `load` and iteration.
    Live,
    /// Logically deleted: still indexed by key, but unlinked and invisible.
    Tombstoned,
}

#[derive(Clone, Debug)]
pub(crate) struct Node<V> {
    pub(crate) value: V,
    pub(crate) prev: Option<EntryId>,
    pub(crate) next: Option<EntryId>,
    pub(crate) state: EntryState,
}

impl<V> Node<V> {
    fn detached(value: V) -> Self {
        Self {
            value,
            prev: None,
            next: None,
            state: EntryState::Live,
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.state == EntryState::Live
    }
}

/// A hash map that remembers the order in which keys were first stored.
///
/// Storing to a live key overwrites its value in place; storing to a key
/// that was logically deleted revives it at the back of the order.
///
/// ```
/// use orderedmap::OrderedMap;
///
/// let mut m = OrderedMap::new();
/// m.store("foo", 1);
/// m.store("bar", 2);
/// m.logical_delete("foo");
/// m.store("foo", 3);
/// let keys: Vec<_> = m.keys().copied().collect();
/// assert_eq!(keys, ["bar", "foo"]);
/// assert_eq!(m.to_string(), "Map[bar:2 foo:3]");
/// ```
#[derive(Clone)]
pub struct OrderedMap<K, V, S = RandomState> {
    slots: SlotIndex<K, Node<V>, S>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    len: usize,
}

impl<K, V> OrderedMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S> Default for OrderedMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_capacity_and_hasher(0, S::default())
    }
}

// Accessors that never hash or compare keys.
impl<K, V, S> OrderedMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            slots: SlotIndex::with_capacity_and_hasher(capacity, hasher),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn hasher(&self) -> &S {
        self.slots.hasher()
    }

    /// Number of live entries. Tombstones are not counted.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of logically deleted entries still held by the index.
    pub fn tombstones(&self) -> usize {
        self.slots.len() - self.len
    }

    /// First live entry in insertion order.
    pub fn front(&self) -> Option<EntryRef<'_, K, V, S>> {
        self.head.map(|id| self.entry_ref(id))
    }

    /// Last live entry in insertion order.
    pub fn back(&self) -> Option<EntryRef<'_, K, V, S>> {
        self.tail.map(|id| self.entry_ref(id))
    }

    /// Call `f` on each live entry in order until it returns `false`.
    pub fn range<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for (k, v) in self.iter() {
            if !f(k, v) {
                break;
            }
        }
    }

    /// Like [`range`](Self::range), with mutable access to each value.
    pub fn range_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let (key, node) = self
                .slots
                .get_pair_mut(id)
                .expect("order list links only occupied slots");
            cursor = node.next;
            if !f(key, &mut node.value) {
                break;
            }
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            map: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.iter().map(|(_, v)| v)
    }

    /// Drop every entry, tombstones included. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Physically remove the first live entry.
    pub fn front_and_delete(&mut self) -> Option<(K, V)> {
        let id = self.head?;
        let (key, node) = self.remove_slot(id);
        Some((key, node.value))
    }

    /// Physically remove the last live entry.
    pub fn back_and_delete(&mut self) -> Option<(K, V)> {
        let id = self.tail?;
        let (key, node) = self.remove_slot(id);
        Some((key, node.value))
    }

    /// Tombstone the first live entry and return a view of it.
    pub fn front_and_logical_delete(&mut self) -> Option<EntryRef<'_, K, V, S>> {
        let id = self.head?;
        self.tombstone(id);
        Some(self.entry_ref(id))
    }

    /// Tombstone the last live entry and return a view of it.
    pub fn back_and_logical_delete(&mut self) -> Option<EntryRef<'_, K, V, S>> {
        let id = self.tail?;
        self.tombstone(id);
        Some(self.entry_ref(id))
    }

    pub(crate) fn slot(&self, id: EntryId) -> Option<(&K, &Node<V>)> {
        self.slots.get(id)
    }

    pub(crate) fn slot_value_mut(&mut self, id: EntryId) -> Option<&mut V> {
        self.slots.payload_mut(id).map(|n| &mut n.value)
    }

    pub(crate) fn entry_ref(&self, id: EntryId) -> EntryRef<'_, K, V, S> {
        let (key, node) = self
            .slots
            .get(id)
            .expect("entry ids handed out by the map refer to occupied slots");
        EntryRef::new(self, id, key, node)
    }

    fn node_mut(&mut self, id: EntryId) -> &mut Node<V> {
        self.slots
            .payload_mut(id)
            .expect("order list links only occupied slots")
    }

    /// Append a detached slot at the tail of the order list.
    fn link_back(&mut self, id: EntryId) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(id);
            node.prev = old_tail;
            node.next = None;
            node.state = EntryState::Live;
        }
        match old_tail {
            Some(t) => self.node_mut(t).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    /// Detach a live slot from the order list, repairing its neighbours.
    fn unlink(&mut self, id: EntryId) {
        let (prev, next) = {
            let node = self.node_mut(id);
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    fn is_live(&self, id: EntryId) -> bool {
        self.slots.payload(id).is_some_and(Node::is_live)
    }

    /// Unlink (if live) and free a slot.
    fn remove_slot(&mut self, id: EntryId) -> (K, Node<V>) {
        if self.is_live(id) {
            self.unlink(id);
        }
        self.slots
            .remove(id)
            .expect("ids found in the index refer to occupied slots")
    }

    fn tombstone(&mut self, id: EntryId) {
        self.unlink(id);
        self.node_mut(id).state = EntryState::Tombstoned;
    }
}

impl<K, V, S> OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }

    /// Handle to the live entry for `q`.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_live(q).map(Handle::new)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_live(q).is_some()
    }

    /// Set the value for `key`.
    ///
    /// A live key keeps its position. A new or tombstoned key is appended.
    pub fn store(&mut self, key: K, value: V) {
        match self.slots.find(&key) {
            Some(id) if self.is_live(id) => self.node_mut(id).value = value,
            found => {
                self.place(found, key, value);
            }
        }
    }

    /// Set the value for `key`, returning the previous value if it was live.
    ///
    /// Reviving a tombstone counts as a fresh insert and returns `None`.
    pub fn swap(&mut self, key: K, value: V) -> Option<V> {
        match self.slots.find(&key) {
            Some(id) if self.is_live(id) => {
                Some(core::mem::replace(&mut self.node_mut(id).value, value))
            }
            found => {
                self.place(found, key, value);
                None
            }
        }
    }

    /// Value of the live entry for `q`.
    pub fn load<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.find_live(q)?;
        self.slots.payload(id).map(|n| &n.value)
    }

    pub fn load_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.find_live(q)?;
        Some(&mut self.node_mut(id).value)
    }

    /// Return the live value for `key`, or store `value` and return it.
    ///
    /// The flag is `true` when the value was loaded rather than stored.
    pub fn load_or_store(&mut self, key: K, value: V) -> (&V, bool) {
        let found = self.slots.find(&key);
        if let Some(id) = found {
            if self.is_live(id) {
                return (&self.node_mut(id).value, true);
            }
        }
        let id = self.place(found, key, value);
        (&self.node_mut(id).value, false)
    }

    /// As [`load_or_store`](Self::load_or_store), but the value is only
    /// produced when a store is needed. A failing `f` leaves the map untouched.
    pub fn load_or_store_with<F, E>(&mut self, key: K, f: F) -> Result<(&V, bool), E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let found = self.slots.find(&key);
        if let Some(id) = found {
            if self.is_live(id) {
                return Ok((&self.node_mut(id).value, true));
            }
        }
        let value = f()?;
        let id = self.place(found, key, value);
        Ok((&self.node_mut(id).value, false))
    }

    /// Physically remove `q`, live or tombstoned.
    pub fn delete<Q>(&mut self, q: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(id) = self.slots.find(q) {
            self.remove_slot(id);
        }
    }

    /// Tombstone `q` if it is live: unlink it from the order but keep it indexed.
    pub fn logical_delete<Q>(&mut self, q: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(id) = self.find_live(q) {
            self.tombstone(id);
        }
    }

    /// Physically remove `q` and return its value if it was live.
    pub fn load_and_delete<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.slots.find(q)?;
        let (_, node) = self.remove_slot(id);
        node.is_live().then_some(node.value)
    }

    /// Tombstone `q` and return its value if it was live.
    ///
    /// The value stays owned by the tombstone until the key is stored again
    /// or physically deleted.
    pub fn load_and_logical_delete<Q>(&mut self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.find_live(q)?;
        self.tombstone(id);
        Some(&self.node_mut(id).value)
    }

    fn find_live<Q>(&self, q: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.slots.find(q).filter(|&id| self.is_live(id))
    }

    /// Append `key` at the tail, reviving its tombstone when `found` is one.
    fn place(&mut self, found: Option<EntryId>, key: K, value: V) -> EntryId {
        let id = match found {
            Some(id) => {
                self.node_mut(id).value = value;
                id
            }
            None => self
                .slots
                .insert(key, Node::detached(value))
                .expect("key was absent from the index"),
        };
        self.link_back(id);
        id
    }
}

/// Iterator over live entries in insertion order.
pub struct Iter<'a, K, V, S> {
    map: &'a OrderedMap<K, V, S>,
    front: Option<EntryId>,
    back: Option<EntryId>,
    remaining: usize,
}

impl<K, V, S> Clone for Iter<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        let (key, node) = self
            .map
            .slot(id)
            .expect("order list links only occupied slots");
        self.front = node.next;
        self.remaining -= 1;
        Some((key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> DoubleEndedIterator for Iter<'_, K, V, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        let (key, node) = self
            .map
            .slot(id)
            .expect("order list links only occupied slots");
        self.back = node.prev;
        self.remaining -= 1;
        Some((key, &node.value))
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S> {}
impl<K, V, S> FusedIterator for Iter<'_, K, V, S> {}

/// Owning iterator; drains live entries in order. Tombstones are dropped.
pub struct IntoIter<K, V, S> {
    map: OrderedMap<K, V, S>,
}

impl<K, V, S> Iterator for IntoIter<K, V, S> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.map.front_and_delete()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.map.len(), Some(self.map.len()))
    }
}

impl<K, V, S> DoubleEndedIterator for IntoIter<K, V, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.map.back_and_delete()
    }
}

impl<K, V, S> ExactSizeIterator for IntoIter<K, V, S> {}
impl<K, V, S> FusedIterator for IntoIter<K, V, S> {}

impl<K, V, S> IntoIterator for OrderedMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { map: self }
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.store(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::default();
        m.extend(iter);
        m
    }
}

/// Maps are equal when their live entries are equal in the same order.
impl<K, V, S1, S2> PartialEq<OrderedMap<K, V, S2>> for OrderedMap<K, V, S1>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &OrderedMap<K, V, S2>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, S> Eq for OrderedMap<K, V, S> {}

impl<K, V, S> fmt::Debug for OrderedMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Renders `Map[k1:v1 k2:v2]` in insertion order.
impl<K, V, S> fmt::Display for OrderedMap<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Map[")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:{}", k, v)?;
        }
        f.write_str("]")
    }
}
