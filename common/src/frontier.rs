use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::grid::{BeliefGrid, CellState, Position};

/// Revealed counts that still border at least one unknown cell.
///
/// Cells join when they are revealed and are dropped for good the first
/// time a scan finds them settled.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    cells: BTreeSet<Position>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly revealed count.
    pub fn insert(&mut self, pos: Position) {
        self.cells.insert(pos);
    }

    /// Prunes settled cells and returns the rest in row-major order.
    pub fn active_cells(&mut self, grid: &BeliefGrid) -> Vec<Position> {
        self.cells.retain(|&pos| {
            matches!(grid.get(pos), CellState::Count(_))
                && grid
                    .neighbors(pos)
                    .any(|n| grid.get(n) == CellState::Unknown)
        });
        self.cells.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Cells proven safe but not revealed yet, handed out first in first out.
#[derive(Debug, Clone, Default)]
pub struct SafeQueue {
    order: VecDeque<Position>,
    queued: HashSet<Position>,
}

impl SafeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `pos` was already waiting.
    pub fn push(&mut self, pos: Position) -> bool {
        if !self.queued.insert(pos) {
            return false;
        }
        self.order.push_back(pos);
        true
    }

    pub fn pop(&mut self) -> Option<Position> {
        let pos = self.order.pop_front()?;
        self.queued.remove(&pos);
        Some(pos)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.queued.contains(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
