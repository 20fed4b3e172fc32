//! The circular island archipelago.
//!
//! Islands live in an arena and the board order is a ring of handles into it.
//! Merging two neighbours removes the absorbed handle from the ring and marks
//! its record as merged into the survivor, so the arena never shrinks and
//! handles never dangle.

use crate::students::StudentSet;
use serde::{Deserialize, Serialize};

/// Number of islands at the start of a match
pub const INITIAL_ISLANDS: usize = 12;

/// Index into the island arena (stable across merges)
pub type IslandHandle = usize;

/// One ring contraction: the node at `absorbed` was joined into the node at
/// `survivor`. Both are ring positions just before the contraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandMerge {
    pub survivor: usize,
    pub absorbed: usize,
}

/// A single island or a super-island made of several merged ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Island {
    pub students: StudentSet,
    /// Nickname of the player whose towers stand here
    pub owner: Option<String>,
    /// Number of original islands aggregated into this node
    pub size: u32,
    /// No-entry tiles placed by the Grandma card
    pub no_entry: u32,
    /// Set once this record has been absorbed by a neighbour
    pub merged_into: Option<IslandHandle>,
}

impl Island {
    pub fn new() -> Self {
        Self {
            size: 1,
            ..Self::default()
        }
    }

    /// Towers standing on this island
    pub fn towers(&self) -> u32 {
        if self.owner.is_some() {
            self.size
        } else {
            0
        }
    }

    /// Two neighbours join when both carry towers of the same player
    pub fn can_join(a: &Island, b: &Island) -> bool {
        match (&a.owner, &b.owner) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    fn absorb(&mut self, other: &mut Island) {
        self.students.add_set(&other.students.take_all());
        self.size += other.size;
        self.no_entry += std::mem::take(&mut other.no_entry);
    }
}

/// Circular container of islands addressed by ring position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandContainer {
    arena: Vec<Island>,
    ring: Vec<IslandHandle>,
}

impl IslandContainer {
    /// Create `count` empty islands
    pub fn new(count: usize) -> Self {
        Self {
            arena: (0..count).map(|_| Island::new()).collect(),
            ring: (0..count).collect(),
        }
    }

    /// Current number of (possibly merged) islands
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Whether `position` addresses an island on the ring
    pub fn is_feasible_index(&self, position: usize) -> bool {
        position < self.ring.len()
    }

    /// Position reached by moving `offset` steps from `position`, wrapping
    /// around the current ring size
    pub fn correct_index(&self, offset: isize, position: usize) -> usize {
        let len = self.ring.len() as isize;
        if len == 0 {
            return 0;
        }
        (position as isize + offset).rem_euclid(len) as usize
    }

    pub fn get(&self, position: usize) -> Option<&Island> {
        let handle = *self.ring.get(position)?;
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut Island> {
        let handle = *self.ring.get(position)?;
        self.arena.get_mut(handle)
    }

    /// Handle of the island at a ring position
    pub fn handle_at(&self, position: usize) -> Option<IslandHandle> {
        self.ring.get(position).copied()
    }

    /// Ring position of the node that now contains `handle`
    pub fn position_of(&self, handle: IslandHandle) -> Option<usize> {
        let mut current = handle;
        while let Some(parent) = self.arena.get(current)?.merged_into {
            current = parent;
        }
        self.ring.iter().position(|&h| h == current)
    }

    /// Islands in board order
    pub fn iter(&self) -> impl Iterator<Item = &Island> {
        self.ring.iter().filter_map(move |&h| self.arena.get(h))
    }

    /// Merge the island at `position` into its predecessor.
    ///
    /// Returns the ring position of the merged node, or `None` if the two
    /// islands cannot join.
    pub fn join_prev_island(&mut self, position: usize) -> Option<usize> {
        if self.ring.len() < 2 || !self.is_feasible_index(position) {
            return None;
        }
        let prev = self.correct_index(-1, position);
        self.join(prev, position)
    }

    /// Merge the successor of `position` into the island at `position`.
    pub fn join_next_island(&mut self, position: usize) -> Option<usize> {
        if self.ring.len() < 2 || !self.is_feasible_index(position) {
            return None;
        }
        let next = self.correct_index(1, position);
        self.join(position, next)
    }

    /// Check both neighbours of `position` and merge every eligible one.
    ///
    /// Returns the final ring position of the node containing the island
    /// originally at `position`, and the contractions in the order they
    /// happened.
    pub fn merge_neighbours(&mut self, position: usize) -> (usize, Vec<IslandMerge>) {
        let mut current = position;
        let mut merges = Vec::new();

        let prev = self.correct_index(-1, current);
        if let Some(merged) = self.join_prev_island(current) {
            merges.push(IslandMerge {
                survivor: prev,
                absorbed: current,
            });
            current = merged;
        }

        let next = self.correct_index(1, current);
        if let Some(merged) = self.join_next_island(current) {
            merges.push(IslandMerge {
                survivor: current,
                absorbed: next,
            });
            current = merged;
        }
        (current, merges)
    }

    /// `later` (the next position after `earlier`) is absorbed into `earlier`
    fn join(&mut self, earlier: usize, later: usize) -> Option<usize> {
        let survivor = self.ring[earlier];
        let absorbed = self.ring[later];
        if survivor == absorbed {
            return None;
        }
        if !Island::can_join(&self.arena[survivor], &self.arena[absorbed]) {
            return None;
        }

        let mut taken = std::mem::take(&mut self.arena[absorbed]);
        self.arena[survivor].absorb(&mut taken);
        taken.merged_into = Some(survivor);
        self.arena[absorbed] = taken;

        self.ring.remove(later);
        self.position_of(survivor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::students::Color;

    fn owned(container: &mut IslandContainer, position: usize, owner: &str) {
        container.get_mut(position).unwrap().owner = Some(owner.to_string());
    }

    #[test]
    fn test_correct_index_wraps_both_ways() {
        let container = IslandContainer::new(INITIAL_ISLANDS);
        assert_eq!(container.correct_index(3, 10), 1);
        assert_eq!(container.correct_index(-1, 0), 11);
        assert_eq!(container.correct_index(25, 0), 1);
    }

    #[test]
    fn test_join_next_absorbs_students() {
        let mut container = IslandContainer::new(INITIAL_ISLANDS);
        owned(&mut container, 4, "Ale");
        owned(&mut container, 5, "Ale");
        container.get_mut(5).unwrap().students.add(Color::Red, 2);

        let merged = container.join_next_island(4).unwrap();
        assert_eq!(merged, 4);
        assert_eq!(container.len(), 11);

        let island = container.get(4).unwrap();
        assert_eq!(island.size, 2);
        assert_eq!(island.students.get(Color::Red), 2);
        assert_eq!(island.towers(), 2);
    }

    #[test]
    fn test_join_prev_across_ring_start() {
        let mut container = IslandContainer::new(INITIAL_ISLANDS);
        owned(&mut container, 0, "Ale");
        owned(&mut container, 11, "Ale");

        let merged = container.join_prev_island(0).unwrap();
        assert_eq!(container.len(), 11);
        // the survivor was the last island, which shifts down by one
        assert_eq!(merged, 10);
        assert_eq!(container.get(merged).unwrap().size, 2);
    }

    #[test]
    fn test_join_requires_same_owner() {
        let mut container = IslandContainer::new(INITIAL_ISLANDS);
        owned(&mut container, 2, "Ale");
        owned(&mut container, 3, "Fede");

        assert!(container.join_next_island(2).is_none());
        container.get_mut(3).unwrap().owner = None;
        assert!(container.join_next_island(2).is_none());
        assert_eq!(container.len(), INITIAL_ISLANDS);
    }

    #[test]
    fn test_position_of_follows_merges() {
        let mut container = IslandContainer::new(INITIAL_ISLANDS);
        owned(&mut container, 6, "Ale");
        owned(&mut container, 7, "Ale");
        let handle = container.handle_at(7).unwrap();

        container.join_next_island(6);
        assert_eq!(container.position_of(handle), Some(6));
    }

    #[test]
    fn test_merge_neighbours_collapses_three() {
        let mut container = IslandContainer::new(INITIAL_ISLANDS);
        for pos in [3, 4, 5] {
            owned(&mut container, pos, "Ale");
        }

        let (position, merges) = container.merge_neighbours(4);
        assert_eq!(container.len(), 10);
        assert_eq!(position, 3);
        let step = IslandMerge {
            survivor: 3,
            absorbed: 4,
        };
        assert_eq!(merges, vec![step, step]);
        assert_eq!(container.get(position).unwrap().size, 3);
    }
}
