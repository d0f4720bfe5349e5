//! Per-collection shuffle state
//!
//! A Collection never reorders its stored children. Shuffling only installs a
//! permutation of storage indices that iteration goes through, so turning
//! shuffle off restores the original order exactly.

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Ordering overlay for one Collection's children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShuffleState {
    /// Whether iteration goes through `permutation`
    shuffled: bool,

    /// Storage indices in iteration order (empty while unshuffled)
    permutation: Vec<usize>,
}

impl ShuffleState {
    /// Create an unshuffled state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    /// Current permutation, if shuffled
    pub fn permutation(&self) -> Option<&[usize]> {
        self.shuffled.then_some(self.permutation.as_slice())
    }

    /// Shuffle `len` children using the thread-local RNG
    pub fn shuffle(&mut self, len: usize) {
        self.shuffle_with(len, &mut thread_rng());
    }

    /// Shuffle `len` children using Fisher-Yates with the given RNG
    ///
    /// The permutation is built in full before it replaces the old one.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, len: usize, rng: &mut R) {
        let mut permutation: Vec<usize> = (0..len).collect();
        permutation.shuffle(rng);
        self.permutation = permutation;
        self.shuffled = true;
    }

    /// Revert iteration to stored order
    pub fn unshuffle(&mut self) {
        self.shuffled = false;
        self.permutation.clear();
    }

    /// Toggle shuffle, returning the new state
    pub fn toggle(&mut self, len: usize) -> bool {
        if self.shuffled {
            self.unshuffle();
        } else {
            self.shuffle(len);
        }
        self.shuffled
    }

    /// Storage index of the child at iteration `position`
    pub fn storage_index(&self, position: usize, len: usize) -> Option<usize> {
        if position >= len {
            return None;
        }
        if self.shuffled {
            self.permutation.get(position).copied()
        } else {
            Some(position)
        }
    }

    /// Iteration position of the child stored at `storage`
    pub fn position_of(&self, storage: usize) -> Option<usize> {
        if self.shuffled {
            self.permutation.iter().position(|&index| index == storage)
        } else {
            Some(storage)
        }
    }

    /// A child was inserted into storage at `at`
    ///
    /// New arrivals go to the end of the permutation; nothing is reshuffled.
    pub(crate) fn on_insert(&mut self, at: usize) {
        if !self.shuffled {
            return;
        }
        for index in &mut self.permutation {
            if *index >= at {
                *index += 1;
            }
        }
        self.permutation.push(at);
    }

    /// The child stored at `at` was removed
    pub(crate) fn on_remove(&mut self, at: usize) {
        if !self.shuffled {
            return;
        }
        self.permutation.retain(|&index| index != at);
        for index in &mut self.permutation {
            if *index > at {
                *index -= 1;
            }
        }
    }

    /// The child stored at `from` now lives at `to`
    ///
    /// Iteration order while shuffled is unchanged by a storage move.
    pub(crate) fn on_move(&mut self, from: usize, to: usize) {
        if !self.shuffled || from == to {
            return;
        }
        for index in &mut self.permutation {
            *index = remap_moved(*index, from, to);
        }
    }
}

fn remap_moved(index: usize, from: usize, to: usize) -> usize {
    if index == from {
        to
    } else if from < to && index > from && index <= to {
        index - 1
    } else if to < from && index >= to && index < from {
        index + 1
    } else {
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn effective_order(state: &ShuffleState, children: &[&str]) -> Vec<String> {
        (0..children.len())
            .map(|position| {
                let storage = state.storage_index(position, children.len()).unwrap();
                children[storage].to_string()
            })
            .collect()
    }

    #[test]
    fn new_state_is_identity() {
        let state = ShuffleState::new();
        assert!(!state.is_shuffled());
        assert!(state.permutation().is_none());
        assert_eq!(state.storage_index(2, 3), Some(2));
        assert_eq!(state.storage_index(3, 3), None);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut state = ShuffleState::new();
        state.shuffle(20);

        let mut permutation = state.permutation().unwrap().to_vec();
        permutation.sort_unstable();
        assert_eq!(permutation, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn seeded_shuffle_is_deterministic() {
        let mut a = ShuffleState::new();
        let mut b = ShuffleState::new();
        a.shuffle_with(10, &mut StdRng::seed_from_u64(7));
        b.shuffle_with(10, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn unshuffle_restores_identity() {
        let mut state = ShuffleState::new();
        state.shuffle(5);
        state.unshuffle();

        assert!(!state.is_shuffled());
        for position in 0..5 {
            assert_eq!(state.storage_index(position, 5), Some(position));
        }
    }

    #[test]
    fn toggle_flips_state() {
        let mut state = ShuffleState::new();
        assert!(state.toggle(3));
        assert!(!state.toggle(3));
    }

    #[test]
    fn insert_appends_to_permutation() {
        let mut state = ShuffleState::new();
        state.shuffle_with(3, &mut StdRng::seed_from_u64(1));
        let before = effective_order(&state, &["a", "b", "c"]);

        // "x" inserted into storage at index 1
        state.on_insert(1);
        let after = effective_order(&state, &["a", "x", "b", "c"]);

        let mut expected = before;
        expected.push("x".to_string());
        assert_eq!(after, expected);
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut state = ShuffleState::new();
        state.shuffle_with(4, &mut StdRng::seed_from_u64(3));
        let before = effective_order(&state, &["a", "b", "c", "d"]);

        state.on_remove(1);
        let after = effective_order(&state, &["a", "c", "d"]);

        let expected: Vec<String> = before.into_iter().filter(|id| id != "b").collect();
        assert_eq!(after, expected);
    }

    #[test]
    fn move_keeps_iteration_order() {
        let mut state = ShuffleState::new();
        state.shuffle_with(5, &mut StdRng::seed_from_u64(11));
        let before = effective_order(&state, &["a", "b", "c", "d", "e"]);

        // storage: a b c d e -> b c d a e
        state.on_move(0, 3);
        let after = effective_order(&state, &["b", "c", "d", "a", "e"]);
        assert_eq!(after, before);

        // storage: b c d a e -> b e c d a
        state.on_move(4, 1);
        let after = effective_order(&state, &["b", "e", "c", "d", "a"]);
        assert_eq!(after, before);
    }

    #[test]
    fn mutations_ignored_while_unshuffled() {
        let mut state = ShuffleState::new();
        state.on_insert(0);
        state.on_remove(0);
        state.on_move(0, 1);
        assert!(state.permutation().is_none());
    }
}
