#![cfg(test)]

// Property tests for OrderedMap kept inside the crate so they can check the
// tombstone count and handles against a plain ordered model.

use crate::{Handle, OrderedMap};
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::HashMap;

// Pool-indexed operations: indices shrink to earlier keys, op lists shrink
// in length.
#[derive(Clone, Debug)]
enum Op {
    Store(usize, i32),
    Swap(usize, i32),
    LoadOrStore(usize, i32),
    Delete(usize),
    LogicalDelete(usize),
    LoadAndDelete(usize),
    LoadAndLogicalDelete(usize),
    FrontAndDelete,
    BackAndDelete,
    FrontAndLogicalDelete,
    BackAndLogicalDelete,
    Load(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=6).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Store(i, v)),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Swap(i, v)),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::LoadOrStore(i, v)),
            1 => idx.clone().prop_map(Op::Delete),
            2 => idx.clone().prop_map(Op::LogicalDelete),
            1 => idx.clone().prop_map(Op::LoadAndDelete),
            1 => idx.clone().prop_map(Op::LoadAndLogicalDelete),
            1 => Just(Op::FrontAndDelete),
            1 => Just(Op::BackAndDelete),
            1 => Just(Op::FrontAndLogicalDelete),
            1 => Just(Op::BackAndLogicalDelete),
            1 => idx.prop_map(Op::Load),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Live keys in order plus every indexed key with its value and liveness.
#[derive(Default)]
struct Model {
    order: Vec<String>,
    slots: HashMap<String, (i32, bool)>,
}

impl Model {
    fn live(&self, k: &str) -> Option<i32> {
        match self.slots.get(k) {
            Some(&(v, true)) => Some(v),
            _ => None,
        }
    }

    fn store(&mut self, k: &str, v: i32) {
        let revive = !matches!(self.slots.get(k), Some((_, true)));
        if revive {
            self.order.push(k.to_string());
        }
        self.slots.insert(k.to_string(), (v, true));
    }

    fn unlink(&mut self, k: &str) {
        self.order.retain(|o| o != k);
    }

    fn delete(&mut self, k: &str) -> Option<i32> {
        let (v, live) = self.slots.remove(k)?;
        self.unlink(k);
        live.then_some(v)
    }

    fn logical_delete(&mut self, k: &str) -> Option<i32> {
        let slot = self.slots.get_mut(k).filter(|s| s.1)?;
        slot.1 = false;
        let v = slot.0;
        self.unlink(k);
        Some(v)
    }

    fn tombstones(&self) -> usize {
        self.slots.values().filter(|s| !s.1).count()
    }
}

fn run<S: BuildHasher + Default + Clone>(pool: &[String], ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut sut: OrderedMap<String, i32, S> = OrderedMap::default();
    let mut model = Model::default();
    let mut handles: HashMap<String, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            Op::Store(i, v) => {
                sut.store(pool[i].clone(), v);
                model.store(&pool[i], v);
            }
            Op::Swap(i, v) => {
                let prev = sut.swap(pool[i].clone(), v);
                prop_assert_eq!(prev, model.live(&pool[i]));
                model.store(&pool[i], v);
            }
            Op::LoadOrStore(i, v) => {
                let expected = model.live(&pool[i]);
                let (got, loaded) = sut.load_or_store(pool[i].clone(), v);
                prop_assert_eq!(loaded, expected.is_some());
                prop_assert_eq!(*got, expected.unwrap_or(v));
                if expected.is_none() {
                    model.store(&pool[i], v);
                }
            }
            Op::Delete(i) => {
                sut.delete(pool[i].as_str());
                model.delete(&pool[i]);
            }
            Op::LogicalDelete(i) => {
                sut.logical_delete(pool[i].as_str());
                model.logical_delete(&pool[i]);
            }
            Op::LoadAndDelete(i) => {
                let got = sut.load_and_delete(pool[i].as_str());
                prop_assert_eq!(got, model.delete(&pool[i]));
            }
            Op::LoadAndLogicalDelete(i) => {
                let got = sut.load_and_logical_delete(pool[i].as_str()).copied();
                prop_assert_eq!(got, model.logical_delete(&pool[i]));
            }
            Op::FrontAndDelete => {
                let got = sut.front_and_delete();
                let expected = model.order.first().cloned();
                prop_assert_eq!(got.as_ref().map(|(k, _)| k), expected.as_ref());
                if let Some(k) = expected {
                    prop_assert_eq!(got.map(|(_, v)| v), model.delete(&k));
                }
            }
            Op::BackAndDelete => {
                let got = sut.back_and_delete();
                let expected = model.order.last().cloned();
                prop_assert_eq!(got.as_ref().map(|(k, _)| k), expected.as_ref());
                if let Some(k) = expected {
                    prop_assert_eq!(got.map(|(_, v)| v), model.delete(&k));
                }
            }
            Op::FrontAndLogicalDelete => {
                let got = sut.front_and_logical_delete().map(|e| (e.key().clone(), *e.value()));
                let expected = model.order.first().cloned();
                prop_assert_eq!(got.as_ref().map(|(k, _)| k), expected.as_ref());
                if let Some(k) = expected {
                    prop_assert_eq!(got.map(|(_, v)| v), model.logical_delete(&k));
                }
            }
            Op::BackAndLogicalDelete => {
                let got = sut.back_and_logical_delete().map(|e| (e.key().clone(), *e.value()));
                let expected = model.order.last().cloned();
                prop_assert_eq!(got.as_ref().map(|(k, _)| k), expected.as_ref());
                if let Some(k) = expected {
                    prop_assert_eq!(got.map(|(_, v)| v), model.logical_delete(&k));
                }
            }
            Op::Load(i) => {
                prop_assert_eq!(sut.load(pool[i].as_str()).copied(), model.live(&pool[i]));
                prop_assert_eq!(sut.contains_key(pool[i].as_str()), model.live(&pool[i]).is_some());
            }
        }

        // Handles: a tracked handle resolves while its key is indexed and
        // never again once the key has been physically removed.
        for k in pool {
            match (handles.get(k).copied(), model.slots.contains_key(k)) {
                (Some(h), false) => {
                    stale.push(h);
                    handles.remove(k);
                }
                (None, true) => {
                    if let Some(h) = sut.find(k.as_str()) {
                        handles.insert(k.clone(), h);
                    }
                }
                _ => {}
            }
        }
        for (k, h) in &handles {
            prop_assert_eq!(h.key(&sut), Some(k));
            prop_assert_eq!(h.is_live(&sut), model.live(k).is_some());
        }
        for h in &stale {
            prop_assert!(h.get(&sut).is_none());
        }

        // Order, length and tombstone count match the model in both directions.
        let fwd: Vec<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let want: Vec<_> = model
            .order
            .iter()
            .map(|k| (k.clone(), model.slots[k].0))
            .collect();
        prop_assert_eq!(&fwd, &want);
        let back: Vec<_> = sut.iter().rev().map(|(k, _)| k.clone()).collect();
        prop_assert!(back.iter().eq(model.order.iter().rev()));
        prop_assert_eq!(sut.len(), model.order.len());
        prop_assert_eq!(sut.tombstones(), model.tombstones());
    }
    Ok(())
}

// Property: OrderedMap behaves like an ordered list of live keys plus a set
// of tombstoned keys, across random operation sequences.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run::<std::collections::hash_map::RandomState>(&pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run::<ConstBuildHasher>(&pool, ops)?;
    }
}
