#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check
// internal accounting (tombstones, capacity) next to observable behaviour.

use crate::hash_table::HashTable;
use crate::key_info::{DefaultKeyInfo, KeyInfo};
use crate::InsertError;
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::BTreeSet;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Emplace(usize, i32),
    EmplaceWith(usize, i32),
    Insert(usize, i32),
    Erase(usize),
    EraseAt(usize),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    GetOrDefault(usize),
    RetainEven,
    Reserve(usize),
    Rehash,
    Clear,
    Iterate,
    CloneEq,
}

fn key_from(pool: &[String], i: usize) -> String {
    pool[i].clone()
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    // Non-empty keys: "" and "\u{1}" are the String sentinels.
    proptest::collection::vec("[a-z]{1,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Emplace(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::EmplaceWith(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            3 => idx.clone().prop_map(OpI::Erase),
            2 => idx.clone().prop_map(OpI::EraseAt),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![contains_pool, "[a-z]{1,5}"].prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => idx.clone().prop_map(OpI::GetOrDefault),
            1 => Just(OpI::RetainEven),
            1 => (0usize..100).prop_map(OpI::Reserve),
            1 => Just(OpI::Rehash),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::CloneEq),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives one scenario against a hashbrown::HashMap model. Invariants checked:
// - emplace never overwrites; `inserted` is true exactly when the key was absent.
// - emplace_with runs its constructor only when inserting.
// - find/contains_key/get parity; a found handle resolves to the same key.
// - erase/erase_at/remove remove exactly the named entry.
// - iteration yields each live entry exactly once.
// - after every op: len parity, power-of-two capacity, accounting bounds,
//   and no tombstones in an empty table.
fn run_scenario<I: KeyInfo<String>>(pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError> {
    let mut sut: HashTable<String, i32, I> = HashTable::default();
    let mut model: HashMap<String, i32> = HashMap::new();
    let calls = Cell::new(0u32);

    for op in ops {
        match op {
            OpI::Emplace(i, v) => {
                let k = key_from(pool, i);
                let (h, inserted) = sut.emplace(k.clone(), v);
                prop_assert_eq!(inserted, !model.contains_key(&k));
                model.entry(k.clone()).or_insert(v);
                prop_assert_eq!(h.key(&sut), Some(&k));
                prop_assert_eq!(h.value(&sut), model.get(&k));
            }
            OpI::EmplaceWith(i, v) => {
                let k = key_from(pool, i);
                let before = calls.get();
                let (_, inserted) = sut.emplace_with(k.clone(), || {
                    calls.set(calls.get() + 1);
                    v
                });
                let absent = !model.contains_key(&k);
                prop_assert_eq!(inserted, absent);
                prop_assert_eq!(calls.get(), before + u32::from(absent), "constructor runs only on insert");
                model.entry(k).or_insert(v);
            }
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                match sut.insert(k.clone(), v) {
                    Ok(h) => {
                        prop_assert!(!model.contains_key(&k));
                        prop_assert_eq!(h.value(&sut), Some(&v));
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => prop_assert!(model.contains_key(&k)),
                    Err(InsertError::ReservedKey) => prop_assert!(false, "pool keys are never sentinels"),
                }
            }
            OpI::Erase(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.erase(&k), model.remove(&k).is_some());
                prop_assert!(sut.find(&k).is_none());
            }
            OpI::EraseAt(i) => {
                let k = key_from(pool, i);
                match sut.find(&k) {
                    Some(h) => {
                        prop_assert!(sut.erase_at(h));
                        prop_assert!(h.value(&sut).is_none());
                        prop_assert!(model.remove(&k).is_some());
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove_entry(&k), model.remove_entry(&k));
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found.is_some(), model.contains_key(&k));
                if let Some(h) = found {
                    prop_assert_eq!(h.key(&sut), Some(&k));
                }
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.wrapping_add(d);
                        *mv = mv.wrapping_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "get_mut presence differs from model"),
                }
            }
            OpI::GetOrDefault(i) => {
                let k = key_from(pool, i);
                let v = *sut.get_or_insert_default(k.clone());
                prop_assert_eq!(v, *model.entry(k).or_default());
            }
            OpI::RetainEven => {
                sut.retain(|_, v| *v % 2 == 0);
                model.retain(|_, v| *v % 2 == 0);
            }
            OpI::Reserve(n) => {
                let cap = sut.capacity();
                let grown = sut.reserve(n);
                prop_assert_eq!(grown, n != 0 && n >= cap);
                prop_assert!(sut.capacity() >= cap, "reserve never shrinks");
                if grown {
                    prop_assert_eq!(sut.num_tombstones(), 0);
                }
            }
            OpI::Rehash => {
                let cap = sut.capacity();
                sut.rehash();
                prop_assert_eq!(sut.capacity(), cap);
                prop_assert_eq!(sut.num_tombstones(), 0);
            }
            OpI::Clear => {
                let cap = sut.capacity();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap);
            }
            OpI::Iterate => {
                let mut seen = BTreeSet::new();
                for (k, v) in sut.iter() {
                    prop_assert!(seen.insert(k.clone()), "key yielded twice");
                    prop_assert_eq!(model.get(k), Some(v));
                }
                prop_assert_eq!(seen.len(), model.len());
                let mut cursor_count = 0;
                let mut cur = sut.first();
                while let Some(h) = cur {
                    cursor_count += 1;
                    cur = sut.next_after(h);
                }
                prop_assert_eq!(cursor_count, model.len());
            }
            OpI::CloneEq => {
                let copy = sut.clone();
                prop_assert!(copy == sut);
                prop_assert_eq!(copy.capacity(), sut.capacity());
                prop_assert_eq!(copy.num_tombstones(), 0);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity().is_power_of_two());
        prop_assert!(sut.len() + sut.num_tombstones() <= sut.capacity());
        if sut.is_empty() {
            prop_assert_eq!(sut.num_tombstones(), 0);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario::<DefaultKeyInfo>(&pool, ops)?;
    }
}

// Constant-hash key policy: every key lands in one probe chain.
struct ConstInfo;

unsafe impl KeyInfo<String> for ConstInfo {
    fn empty() -> String {
        String::new()
    }
    fn tombstone() -> String {
        "\u{1}".to_string()
    }
    fn hash(_: &String) -> u64 {
        0
    }
    fn is_equal(lhs: &String, rhs: &String) -> bool {
        lhs == rhs
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior. This stresses tombstone reuse and probe termination.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario::<ConstInfo>(&pool, ops)?;
    }
}
