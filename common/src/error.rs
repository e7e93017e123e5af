use crate::grid::{CellState, Position};

/// Fatal conditions raised while solving. Every variant means the agent's
/// beliefs can no longer be trusted, so the run is aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// An already determined cell was about to be overwritten.
    #[error("invalid transition at {position}: {from} -> {to}")]
    InvalidTransition {
        position: Position,
        from: CellState,
        to: CellState,
    },
    /// A revealed count cannot be met by its neighborhood: it needs more
    /// mines than it has unknown neighbors, or sees more known mines than it
    /// counts.
    #[error(
        "consistency violation at {position}: count {count} with {known_mines} known mines and {unknown} unknown neighbors"
    )]
    ConsistencyViolation {
        position: Position,
        count: u8,
        known_mines: usize,
        unknown: usize,
    },
    /// The constraints of an ambiguous region admit no assignment at all.
    #[error("unsatisfiable region around {anchor} ({variables} variables)")]
    Unsatisfiable { anchor: Position, variables: usize },
    /// The SAT backend gave an answer that can't be used.
    #[error("sat backend failed on region around {anchor}: {reason}")]
    SolverFailure { anchor: Position, reason: String },
    /// More cells are marked as mines than the board contains.
    #[error("{marked} cells marked as mines but the board only has {total}")]
    MineBudgetExceeded { marked: usize, total: usize },
    /// A cell already queued as safe was deduced to be a mine.
    #[error("cell {position} is queued as safe but was deduced to be a mine")]
    SafeCellMarkedMine { position: Position },
}
