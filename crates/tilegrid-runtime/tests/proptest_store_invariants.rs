//! Property-based invariant tests for the ordered-list store.
//!
//! 1. Ranks stay dense and zero-based after any append/remove mix
//! 2. Replacing twice with the same order equals replacing once
//! 3. A rejected replace leaves stored rows untouched
//! 4. Remove keeps the relative order of the survivors

use proptest::prelude::*;
use tilegrid_core::ItemId;
use tilegrid_runtime::{MemoryStore, OrderStore, StoreError, UserId};

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Append(u8),
    Remove(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..24).prop_map(Op::Append),
        (0u8..24).prop_map(Op::Remove),
    ]
}

fn item(n: u8) -> ItemId {
    ItemId::new(format!("m{n}"))
}

fn distinct_order() -> impl Strategy<Value = Vec<ItemId>> {
    prop::sample::subsequence((0u8..30).collect::<Vec<_>>(), 0..30)
        .prop_shuffle()
        .prop_map(|ns| ns.into_iter().map(item).collect())
}

fn user() -> UserId {
    UserId::new("u")
}

proptest! {
    #[test]
    fn ranks_stay_dense(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let store = MemoryStore::new();
        for op in &ops {
            // Duplicate appends and unknown removes are rejected; both are fine here.
            let _ = match op {
                Op::Append(n) => store.append_item(&user(), &item(*n)).map(|_| ()),
                Op::Remove(n) => store.remove_item(&user(), &item(*n)).map(|_| ()),
            };
            let ranks: Vec<usize> = store.ranks(&user()).unwrap().iter().map(|r| r.rank).collect();
            prop_assert_eq!(ranks, (0..store.read_order(&user()).unwrap().len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn double_replace_is_idempotent(order in distinct_order()) {
        let once = MemoryStore::new();
        once.replace_order(&user(), &order).unwrap();
        let twice = MemoryStore::new();
        twice.replace_order(&user(), &order).unwrap();
        twice.replace_order(&user(), &order).unwrap();
        prop_assert_eq!(once.ranks(&user()).unwrap(), twice.ranks(&user()).unwrap());
        prop_assert_eq!(twice.read_order(&user()).unwrap(), order);
    }

    #[test]
    fn rejected_replace_is_atomic(seed in distinct_order(), mut bad in distinct_order()) {
        prop_assume!(!bad.is_empty());
        let store = MemoryStore::new();
        store.replace_order(&user(), &seed).unwrap();
        let before = store.ranks(&user()).unwrap();

        bad.push(bad[0].clone());
        let result = store.replace_order(&user(), &bad);
        prop_assert!(
            matches!(result, Err(StoreError::DuplicateItem { .. })),
            "expected DuplicateItem, got {:?}",
            result
        );
        prop_assert_eq!(store.ranks(&user()).unwrap(), before);
    }

    #[test]
    fn remove_preserves_survivor_order(order in distinct_order(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!order.is_empty());
        let store = MemoryStore::new();
        store.replace_order(&user(), &order).unwrap();
        let victim = order[pick.index(order.len())].clone();

        let after = store.remove_item(&user(), &victim).unwrap();
        let expected: Vec<ItemId> = order.into_iter().filter(|id| id != &victim).collect();
        prop_assert_eq!(&after, &expected);
        prop_assert_eq!(store.read_order(&user()).unwrap(), expected);
    }
}
