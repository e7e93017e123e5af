//! An agent that plays minesweeper without guessing.
//!
//! Each turn it reveals a cell it has proven safe. Proofs come from simple
//! counting around revealed numbers and, when counting is not enough, from a
//! SAT solver asked which cells take the same value in every solution of the
//! surrounding constraints. When nothing can be proven the agent stops.

pub mod agent;
pub mod board;
pub mod cnf;
pub mod config;
pub mod deduction;
pub mod error;
pub mod frontier;
pub mod grid;
pub mod resolver;
pub mod sat;

#[cfg(test)]
mod tests;

pub use agent::{AgentState, DeductionReport, OPENING, Orchestrator, Outcome, Phase};
pub use board::{Board, MineField, RevealResult};
pub use config::AgentConfig;
pub use error::AgentError;
pub use grid::{BeliefGrid, CellState, Position};
pub use sat::{SatBackend, SatOutcome, SatSession, VarisatBackend};

/// A minesweeper solving strategy.
pub trait Agent {
    /// Plays until the game is won, lost or no safe move is left.
    fn solve(&mut self) -> Result<Outcome, AgentError>;

    /// Switches per-turn trace output on or off.
    fn set_trace(&mut self, on: bool);
}
