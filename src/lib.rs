//! orderedmap: a hash map that remembers insertion order, supports logical
//! (tombstone) deletes, and encodes to JSON in that order.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an ordered map with O(1) average lookup, insert, delete and
//!   reorder, built in safe layers that can each be reasoned about alone.
//! - Layers:
//!   - ProbeGuard: debug-only reentrancy check around index probing.
//!   - SlotIndex<K, T, S>: slot storage addressed by generational ids,
//!     plus a hash index of those ids. Duplicate keys are rejected.
//!   - OrderedMap<K, V, S>: threads live slots through a doubly linked
//!     order list of ids and tracks which slots are tombstones.
//!   - Codec: `to_json`/`extend_from_json` and serde impls on top of the
//!     public map API, with keys going through `WireKey`.
//!
//! Constraints
//! - Single-threaded: the map is `!Sync` (debug guard uses `Cell`).
//! - No unsafe code. Order links are slot ids, so there are no pointer
//!   cycles and no per-entry allocations beyond the slot storage.
//! - Each slot stores its key's hash; rehashing never calls `K: Hash`.
//! - Handles are generational: once an entry is physically deleted its
//!   handle never resolves again, even if the slot is reused.
//!
//! Deletes
//! - `delete` drops the entry from the index and the order list.
//! - `logical_delete` only unlinks it from the order list. The key and its
//!   value stay indexed as a tombstone, invisible to `load` and iteration.
//!   Storing the key again revives the same slot at the back of the order.
//!
//! JSON
//! - Encoding writes keys as JSON strings (integers and booleans in their
//!   canonical text, floats in shortest `%g` form, `None` as `null`) and
//!   delegates values to serde_json.
//! - Decoding validates the object grammar itself, so malformed input is
//!   reported with a byte offset, and stores entries in input order. A
//!   failing decode leaves the target map untouched.
//!
//! Notes and non-goals
//! - No concurrent access; wrap the map in a lock if needed.
//! - No sorting or reordering other than by revival.
//! - Bare `f32`/`f64` are not `Eq + Hash`; float keys go through
//!   `OrderedFloat`.

mod entry;
mod error;
mod json;
mod ordered_map;
mod ordered_map_proptest;
mod probe_guard;
mod scanner;
mod serde_impls;
mod slot_index;
mod wire_key;

// Public surface
pub use entry::{EntryRef, Handle};
pub use error::CodecError;
pub use ordered_map::{EntryState, IntoIter, Iter, OrderedMap};
pub use ordered_float::OrderedFloat;
pub use wire_key::{KeyKind, WireKey};
