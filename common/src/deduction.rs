use crate::agent::AgentState;
use crate::error::AgentError;
use crate::frontier::SafeQueue;
use crate::grid::{BeliefGrid, CellState, Position};

/// A revealed count restricted to the neighbors that are still open.
/// For example, a '2' next to one flagged mine and three hidden cells is
/// "exactly 1 mine among those 3 cells".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// The revealed cell that produced this constraint.
    pub anchor: Position,
    /// Neighbors that are neither known mines nor known safe.
    pub cells: Vec<Position>,
    /// Mines still missing among `cells`.
    pub mines: usize,
}

impl Constraint {
    /// Reads the constraint of `pos` off the grid, or `None` if `pos` is not
    /// a revealed count. Neighbors already queued as safe are treated as
    /// known safe.
    pub fn at(
        grid: &BeliefGrid,
        queue: &SafeQueue,
        pos: Position,
    ) -> Result<Option<Constraint>, AgentError> {
        let CellState::Count(count) = grid.get(pos) else {
            return Ok(None);
        };

        let mut known_mines = 0;
        let mut cells = Vec::new();
        for neighbor in grid.neighbors(pos) {
            match grid.get(neighbor) {
                CellState::Mine => known_mines += 1,
                CellState::Unknown if !queue.contains(neighbor) => cells.push(neighbor),
                _ => {}
            }
        }

        let violation = || AgentError::ConsistencyViolation {
            position: pos,
            count,
            known_mines,
            unknown: cells.len(),
        };
        let mines = (count as usize)
            .checked_sub(known_mines)
            .ok_or_else(violation)?;
        if mines > cells.len() {
            return Err(violation());
        }

        Ok(Some(Constraint {
            anchor: pos,
            cells,
            mines,
        }))
    }

    /// Neither counting rule applies.
    pub fn is_ambiguous(&self) -> bool {
        0 < self.mines && self.mines < self.cells.len()
    }
}

/// What a single local pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub mines: usize,
    pub safe: usize,
    /// Frontier constraints that neither rule could settle.
    pub ambiguous: Vec<Constraint>,
}

impl PassReport {
    pub fn changed(&self) -> bool {
        self.mines > 0 || self.safe > 0
    }
}

/// Per-cell counting rules over the frontier.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDeduction;

impl LocalDeduction {
    /// Visits every frontier cell once, in row-major order.
    ///
    /// - cleared: no mines left, every open neighbor is safe (this is the
    ///   zero rule for a revealed '0').
    /// - saturated: as many mines left as open neighbors, all are mines.
    /// - otherwise the constraint is reported as ambiguous.
    pub fn run_pass(&self, state: &mut AgentState) -> Result<PassReport, AgentError> {
        let mut report = PassReport::default();

        for pos in state.frontier.active_cells(&state.grid) {
            let Some(constraint) = Constraint::at(&state.grid, &state.queue, pos)? else {
                continue;
            };
            if constraint.cells.is_empty() {
                continue;
            }

            if constraint.mines == 0 {
                for &cell in &constraint.cells {
                    if state.mark_safe(cell) {
                        report.safe += 1;
                    }
                }
            } else if constraint.mines == constraint.cells.len() {
                for &cell in &constraint.cells {
                    if state.mark_mine(cell)? {
                        report.mines += 1;
                    }
                }
            } else {
                report.ambiguous.push(constraint);
            }
        }

        log::trace!(
            "local pass: {} mines, {} safe, {} ambiguous",
            report.mines,
            report.safe,
            report.ambiguous.len()
        );
        Ok(report)
    }

    /// Compares the marked mines against the board's total. Once every mine
    /// is accounted for, all remaining unknown cells are safe.
    pub fn apply_mine_budget(
        &self,
        state: &mut AgentState,
        total: usize,
    ) -> Result<usize, AgentError> {
        let marked = state.grid.mine_count();
        if marked > total {
            return Err(AgentError::MineBudgetExceeded { marked, total });
        }
        if marked < total {
            return Ok(0);
        }

        let open: Vec<Position> = state
            .grid
            .positions()
            .filter(|&p| state.grid.get(p) == CellState::Unknown)
            .collect();
        Ok(open.into_iter().filter(|&p| state.mark_safe(p)).count())
    }
}
