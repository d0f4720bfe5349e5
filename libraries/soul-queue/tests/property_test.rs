//! Property-based tests for the queue
//!
//! Uses proptest to check invariants across random queue shapes.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use soul_queue::{Collection, Queue, QueueItem, QueueState, Single};
use std::collections::HashSet;

// ===== Helpers =====

/// Queue shape: `None` is a Single, `Some(n)` a Collection with n children
fn arbitrary_shape() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(proptest::option::of(0usize..6), 0..12)
}

fn build_queue(shape: &[Option<usize>]) -> Queue<usize> {
    let mut queue = Queue::new();
    for (index, entry) in shape.iter().enumerate() {
        let item: QueueItem<usize> = match entry {
            None => Single::new(format!("s{index}"), index).into(),
            Some(children) => {
                let children = (0..*children)
                    .map(|child| Single::new(format!("c{index}-{child}"), index))
                    .collect();
                Collection::with_children(format!("c{index}"), index, children)
                    .unwrap()
                    .into()
            }
        };
        queue.add(item, None).unwrap();
    }
    queue
}

fn leaf_ids(queue: &Queue<usize>) -> Vec<String> {
    queue.traversal().map(|leaf| leaf.id().to_string()).collect()
}

fn collection_ids(queue: &Queue<usize>) -> Vec<String> {
    queue
        .items()
        .iter()
        .filter(|item| item.is_collection())
        .map(|item| item.id().to_string())
        .collect()
}

// ===== Property Tests =====

proptest! {
    /// Property: plain adds keep insertion order, top-level and flattened
    #[test]
    fn add_preserves_order(shape in arbitrary_shape()) {
        let queue = build_queue(&shape);

        let top: Vec<String> = queue.items().iter().map(|item| item.id().to_string()).collect();
        let expected_top: Vec<String> = shape
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                None => format!("s{index}"),
                Some(_) => format!("c{index}"),
            })
            .collect();
        prop_assert_eq!(top, expected_top);

        let expected_leaves: Vec<String> = shape
            .iter()
            .enumerate()
            .flat_map(|(index, entry)| match entry {
                None => vec![format!("s{index}")],
                Some(n) => (0..*n).map(|child| format!("c{index}-{child}")).collect(),
            })
            .collect();
        prop_assert_eq!(leaf_ids(&queue), expected_leaves);
    }

    /// Property: shuffle then unshuffle restores the exact prior order
    #[test]
    fn shuffle_round_trip(shape in arbitrary_shape(), seed in any::<u64>()) {
        let mut queue = build_queue(&shape);
        let before = leaf_ids(&queue);
        let mut rng = StdRng::seed_from_u64(seed);

        for id in collection_ids(&queue) {
            queue.shuffle_with(&id, &mut rng).unwrap();
        }

        // Shuffling permutes within collections only
        let mut shuffled = leaf_ids(&queue);
        let mut sorted_before = before.clone();
        shuffled.sort();
        sorted_before.sort();
        prop_assert_eq!(shuffled, sorted_before);

        for id in collection_ids(&queue) {
            queue.unshuffle(&id).unwrap();
        }
        prop_assert_eq!(leaf_ids(&queue), before);
    }

    /// Property: N next() calls visit every leaf exactly once, then None
    #[test]
    fn exhaustive_traversal(shape in arbitrary_shape(), seed in any::<u64>(), shuffle_mask in any::<u16>()) {
        let mut queue = build_queue(&shape);
        let mut rng = StdRng::seed_from_u64(seed);
        for (bit, id) in collection_ids(&queue).into_iter().enumerate() {
            if shuffle_mask & (1 << bit) != 0 {
                queue.shuffle_with(&id, &mut rng).unwrap();
            }
        }

        let expected = leaf_ids(&queue);
        let mut visited = Vec::new();
        for _ in 0..queue.leaf_count() {
            let leaf = queue.next();
            prop_assert!(leaf.is_some());
            if let Some(leaf) = leaf {
                visited.push(leaf.id().to_string());
            }
        }
        prop_assert!(queue.next().is_none());

        let unique: HashSet<&String> = visited.iter().collect();
        prop_assert_eq!(unique.len(), visited.len());
        prop_assert_eq!(visited, expected);
    }

    /// Property: removing the current leaf moves to the following leaf
    #[test]
    fn removing_current_advances(shape in arbitrary_shape(), pick in any::<prop::sample::Index>()) {
        let mut queue = build_queue(&shape);
        let leaves = leaf_ids(&queue);
        prop_assume!(!leaves.is_empty());

        let at = pick.index(leaves.len());
        queue.play_now(&leaves[at]).unwrap();
        queue.remove(&leaves[at]).unwrap();

        let current = queue.current().map(|leaf| leaf.id().to_string());
        prop_assert_eq!(current, leaves.get(at + 1).cloned());
        prop_assert!(!queue.contains(&leaves[at]));
        prop_assert_eq!(queue.leaf_count(), leaves.len() - 1);
    }

    /// Property: a queue emptied by removals in any order starts over
    #[test]
    fn emptied_queue_starts_over(shape in arbitrary_shape(), steps in 0usize..40, order in any::<u64>()) {
        let mut queue = build_queue(&shape);
        for _ in 0..steps {
            queue.next();
        }

        let mut ids: Vec<String> = queue.items().iter().map(|item| item.id().to_string()).collect();
        ids.shuffle(&mut StdRng::seed_from_u64(order));
        for id in &ids {
            queue.remove(id).unwrap();
            prop_assert_eq!(queue.leaf_count(), queue.traversal().count());
        }
        prop_assert_eq!(queue.state(), QueueState::Empty);
        prop_assert!(queue.current().is_none());

        queue.add(Single::new("fresh", 0), None).unwrap();
        prop_assert_eq!(queue.next().map(|leaf| leaf.id().to_string()), Some("fresh".to_string()));
    }

    /// Property: moves never change which leaf is current
    #[test]
    fn moves_keep_current(shape in arbitrary_shape(), pick in any::<prop::sample::Index>(), moves in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 1..10)) {
        let mut queue = build_queue(&shape);
        let leaves = leaf_ids(&queue);
        prop_assume!(!leaves.is_empty());

        let current = leaves[pick.index(leaves.len())].clone();
        queue.play_now(&current).unwrap();

        for (which, to) in moves {
            let len = queue.len();
            let id = queue.items()[which.index(len)].id().to_string();
            queue.move_item(&id, to.index(len)).unwrap();
        }

        prop_assert_eq!(queue.current().map(|leaf| leaf.id().to_string()), Some(current));
        prop_assert_eq!(queue.leaf_count(), leaves.len());
    }
}
