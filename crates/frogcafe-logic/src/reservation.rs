//! Cell reservation table.
//!
//! Each cell has at most one owning mover. A mover claims the next cell on
//! its path before stepping into it and releases the cell behind it once the
//! step completes, so it briefly holds two cells during the hand-off and one
//! cell the rest of the time. The check-and-set in [`ReservationTable::try_reserve`]
//! is the only arbitration between movers; whoever calls first in a tick wins.

use std::collections::HashMap;
use std::hash::Hash;

use crate::grid::Cell;

/// Mapping from cell to its single owner.
#[derive(Debug, Clone)]
pub struct ReservationTable<M> {
    owners: HashMap<Cell, M>,
}

impl<M> Default for ReservationTable<M> {
    fn default() -> Self {
        Self {
            owners: HashMap::new(),
        }
    }
}

impl<M: Copy + Eq + Hash> ReservationTable<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `cell` for `mover`. Succeeds if the cell is free or already ours.
    pub fn try_reserve(&mut self, cell: Cell, mover: M) -> bool {
        match self.owners.get(&cell) {
            Some(owner) => *owner == mover,
            None => {
                self.owners.insert(cell, mover);
                true
            }
        }
    }

    /// Drop the claim on `cell` if `mover` holds it; otherwise a no-op.
    pub fn release(&mut self, cell: Cell, mover: M) {
        if self.owners.get(&cell) == Some(&mover) {
            self.owners.remove(&cell);
        }
    }

    /// Drop every claim held by `mover`. Returns how many were removed.
    pub fn release_all(&mut self, mover: M) -> usize {
        let before = self.owners.len();
        self.owners.retain(|_, owner| *owner != mover);
        before - self.owners.len()
    }

    pub fn owner(&self, cell: Cell) -> Option<M> {
        self.owners.get(&cell).copied()
    }

    pub fn is_reserved(&self, cell: Cell) -> bool {
        self.owners.contains_key(&cell)
    }

    /// Cells currently held by `mover`, sorted for stable output.
    pub fn cells_owned_by(&self, mover: M) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .owners
            .iter()
            .filter(|(_, owner)| **owner == mover)
            .map(|(cell, _)| *cell)
            .collect();
        cells.sort();
        cells
    }

    /// Number of claimed cells.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn clear(&mut self) {
        self.owners.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, M)> + '_ {
        self.owners.iter().map(|(c, m)| (*c, *m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_wins_then_hand_over() {
        let mut table = ReservationTable::new();
        let cell = Cell::new(2, 2);

        assert!(table.try_reserve(cell, 1u32));
        assert!(!table.try_reserve(cell, 2u32));
        assert_eq!(table.owner(cell), Some(1));

        table.release(cell, 1);
        assert!(table.try_reserve(cell, 2));
        assert_eq!(table.owner(cell), Some(2));
    }

    #[test]
    fn test_reserve_is_reentrant_for_owner() {
        let mut table = ReservationTable::new();
        assert!(table.try_reserve(Cell::new(0, 0), 7u32));
        assert!(table.try_reserve(Cell::new(0, 0), 7u32));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_release_by_non_owner_is_noop() {
        let mut table = ReservationTable::new();
        table.try_reserve(Cell::new(1, 1), 1u32);
        table.release(Cell::new(1, 1), 2);
        table.release(Cell::new(9, 9), 2);
        assert_eq!(table.owner(Cell::new(1, 1)), Some(1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_release_all_only_touches_mover() {
        let mut table = ReservationTable::new();
        table.try_reserve(Cell::new(0, 0), 1u32);
        table.try_reserve(Cell::new(1, 0), 1u32);
        table.try_reserve(Cell::new(2, 0), 2u32);

        assert_eq!(table.release_all(1), 2);
        assert_eq!(table.cells_owned_by(1), vec![]);
        assert_eq!(table.cells_owned_by(2), vec![Cell::new(2, 0)]);
        assert_eq!(table.release_all(1), 0);
    }
}
