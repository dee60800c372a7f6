//! Entry handles and borrowed entry views.
//!
//! [`EntryRef`] borrows the map and walks the order list the way a cursor
//! would. [`Handle`] is a detached, copyable id that outlives any borrow:
//! it keeps resolving through a logical delete and revival, and stops
//! resolving once its entry is physically deleted.

use crate::ordered_map::{EntryState, Node, OrderedMap};
use crate::slot_index::EntryId;
use core::fmt;

/// Stable identity of one map entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(EntryId);

impl Handle {
    pub(crate) fn new(id: EntryId) -> Self {
        Handle(id)
    }

    pub fn key<'a, K, V, S>(&self, map: &'a OrderedMap<K, V, S>) -> Option<&'a K> {
        map.slot(self.0).map(|(k, _)| k)
    }

    /// Current value, including the value held by a tombstone.
    pub fn value<'a, K, V, S>(&self, map: &'a OrderedMap<K, V, S>) -> Option<&'a V> {
        map.slot(self.0).map(|(_, n)| &n.value)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut OrderedMap<K, V, S>) -> Option<&'a mut V> {
        map.slot_value_mut(self.0)
    }

    /// `None` once the entry has been physically deleted.
    pub fn state<K, V, S>(&self, map: &OrderedMap<K, V, S>) -> Option<EntryState> {
        map.slot(self.0).map(|(_, n)| n.state)
    }

    pub fn is_live<K, V, S>(&self, map: &OrderedMap<K, V, S>) -> bool {
        self.state(map) == Some(EntryState::Live)
    }

    /// Next live entry in order. Tombstones have no neighbours.
    pub fn next<K, V, S>(&self, map: &OrderedMap<K, V, S>) -> Option<Handle> {
        map.slot(self.0).and_then(|(_, n)| n.next).map(Handle)
    }

    pub fn prev<K, V, S>(&self, map: &OrderedMap<K, V, S>) -> Option<Handle> {
        map.slot(self.0).and_then(|(_, n)| n.prev).map(Handle)
    }

    /// Borrowed view of the entry, if it still exists.
    pub fn get<'a, K, V, S>(
        &self,
        map: &'a OrderedMap<K, V, S>,
    ) -> Option<EntryRef<'a, K, V, S>> {
        map.slot(self.0)
            .map(|(key, node)| EntryRef::new(map, self.0, key, node))
    }
}

/// Read-only view of an entry, tied to a shared borrow of its map.
pub struct EntryRef<'a, K, V, S> {
    map: &'a OrderedMap<K, V, S>,
    id: EntryId,
    key: &'a K,
    node: &'a Node<V>,
}

impl<'a, K, V, S> EntryRef<'a, K, V, S> {
    pub(crate) fn new(
        map: &'a OrderedMap<K, V, S>,
        id: EntryId,
        key: &'a K,
        node: &'a Node<V>,
    ) -> Self {
        Self { map, id, key, node }
    }

    pub fn key(&self) -> &'a K {
        self.key
    }

    pub fn value(&self) -> &'a V {
        &self.node.value
    }

    pub fn state(&self) -> EntryState {
        self.node.state
    }

    pub fn is_live(&self) -> bool {
        self.node.is_live()
    }

    /// The following live entry, or `None` at the back (or on a tombstone).
    pub fn next(&self) -> Option<EntryRef<'a, K, V, S>> {
        self.node.next.map(|id| self.map.entry_ref(id))
    }

    /// The preceding live entry, or `None` at the front (or on a tombstone).
    pub fn prev(&self) -> Option<EntryRef<'a, K, V, S>> {
        self.node.prev.map(|id| self.map.entry_ref(id))
    }

    /// Detach a handle that can be kept across mutations of the map.
    pub fn handle(&self) -> Handle {
        Handle(self.id)
    }
}

impl<K, V, S> Clone for EntryRef<'_, K, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S> Copy for EntryRef<'_, K, V, S> {}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for EntryRef<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryRef")
            .field("key", self.key)
            .field("value", &self.node.value)
            .field("state", &self.node.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{EntryState, OrderedMap};

    fn map() -> OrderedMap<String, i32> {
        let mut m = OrderedMap::new();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            m.store(k.to_string(), i as i32);
        }
        m
    }

    #[test]
    fn entry_ref_walks_both_directions() {
        let m = map();
        let front = m.front().unwrap();
        assert_eq!(front.key(), "a");
        assert!(front.prev().is_none());

        let mid = front.next().unwrap();
        assert_eq!((mid.key().as_str(), *mid.value()), ("b", 1));
        assert_eq!(mid.prev().unwrap().key(), "a");

        let back = mid.next().unwrap();
        assert_eq!(back.key(), "c");
        assert!(back.next().is_none());
        assert_eq!(m.back().unwrap().handle(), back.handle());
    }

    #[test]
    fn handle_survives_unrelated_mutation() {
        let mut m = map();
        let h = m.find("b").unwrap();
        m.store("d".to_string(), 3);
        m.delete("a");
        *h.value_mut(&mut m).unwrap() += 100;
        assert_eq!(m.load("b"), Some(&101));
        assert_eq!(h.prev(&m), None);
        assert_eq!(h.next(&m), m.find("c"));
    }

    /// Invariant: a tombstone keeps its identity; reviving it reuses the
    /// same handle and moves it to the back.
    #[test]
    fn handle_tracks_entry_through_tombstone_and_revival() {
        let mut m = map();
        let h = m.find("a").unwrap();
        m.logical_delete("a");
        assert_eq!(h.state(&m), Some(EntryState::Tombstoned));
        assert!(!h.is_live(&m));
        assert_eq!(h.key(&m).map(String::as_str), Some("a"));
        assert_eq!(h.value(&m), Some(&0));
        assert_eq!(h.next(&m), None);
        assert!(m.find("a").is_none());

        m.store("a".to_string(), 5);
        assert!(h.is_live(&m));
        assert_eq!(m.find("a"), Some(h));
        assert_eq!(h.prev(&m), m.find("c"));
        assert_eq!(m.back().unwrap().handle(), h);
    }

    /// Invariant: a physically deleted entry's handle never resolves again,
    /// even after the same key is stored anew.
    #[test]
    fn handle_is_invalidated_by_physical_delete() {
        let mut m = map();
        let h = m.find("b").unwrap();
        m.delete("b");
        assert_eq!(h.state(&m), None);
        assert!(h.get(&m).is_none());

        m.store("b".to_string(), 7);
        let fresh = m.find("b").unwrap();
        assert_ne!(h, fresh);
        assert!(h.value(&m).is_none());
    }

    #[test]
    fn entry_ref_debug_shows_state() {
        let mut m: OrderedMap<&str, i32> = OrderedMap::new();
        m.store("k", 1);
        let rendered = format!("{:?}", m.front().unwrap());
        assert_eq!(rendered, r#"EntryRef { key: "k", value: 1, state: Live }"#);
    }
}
