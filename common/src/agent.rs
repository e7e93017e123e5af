use crate::Agent;
use crate::board::{Board, RevealResult};
use crate::config::AgentConfig;
use crate::deduction::LocalDeduction;
use crate::error::AgentError;
use crate::frontier::{Frontier, SafeQueue};
use crate::grid::{BeliefGrid, CellState, Position};
use crate::resolver::AmbiguityResolver;
use crate::sat::{SatBackend, VarisatBackend};

/// The cell revealed on the first turn.
pub const OPENING: Position = Position::new(0, 0);

/// Everything the agent knows, owned by a single game.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub grid: BeliefGrid,
    pub frontier: Frontier,
    pub queue: SafeQueue,
}

impl AgentState {
    pub fn new(width: usize, height: usize) -> Self {
        AgentState {
            grid: BeliefGrid::new(width, height),
            frontier: Frontier::new(),
            queue: SafeQueue::new(),
        }
    }

    /// Stores a revealed count and puts it on the frontier.
    pub fn record_count(&mut self, pos: Position, count: u8) -> Result<(), AgentError> {
        self.grid.set_revealed(pos, count)?;
        self.frontier.insert(pos);
        Ok(())
    }

    /// Returns `true` if `pos` was not a known mine before.
    pub fn mark_mine(&mut self, pos: Position) -> Result<bool, AgentError> {
        if self.queue.contains(pos) {
            return Err(AgentError::SafeCellMarkedMine { position: pos });
        }
        self.grid.set_mine(pos)
    }

    /// Queues an unknown cell for revealing. Returns `true` if it was new.
    pub fn mark_safe(&mut self, pos: Position) -> bool {
        self.grid.get(pos) == CellState::Unknown && self.queue.push(pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Playing,
    Won,
    Lost,
    /// No cell is provably safe any more.
    Stuck,
}

impl Phase {
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Phase::Won => Some(Outcome::Won),
            Phase::Lost => Some(Outcome::Lost),
            Phase::Stuck => Some(Outcome::Stuck),
            Phase::NotStarted | Phase::Playing => None,
        }
    }
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    /// The agent gave up rather than guess.
    Stuck,
}

impl Outcome {
    pub fn is_win(self) -> bool {
        self == Outcome::Won
    }
}

/// Totals of one `deduce` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeductionReport {
    pub passes: usize,
    pub mines: usize,
    pub safe: usize,
    pub regions: usize,
    pub timed_out: usize,
}

impl DeductionReport {
    pub fn changed(&self) -> bool {
        self.mines > 0 || self.safe > 0
    }
}

/// Plays one game turn by turn: reveal a safe cell, learn from the answer,
/// deduce more safe cells when it runs out.
pub struct Orchestrator<B, S = VarisatBackend> {
    board: B,
    state: AgentState,
    phase: Phase,
    deduction: LocalDeduction,
    resolver: AmbiguityResolver<S>,
    trace: bool,
    turns: usize,
}

impl<B: Board> Orchestrator<B> {
    pub fn new(board: B, config: &AgentConfig) -> Self {
        Self::with_backend(board, VarisatBackend, config)
    }
}

impl<B: Board, S: SatBackend> Orchestrator<B, S> {
    pub fn with_backend(board: B, backend: S, config: &AgentConfig) -> Self {
        let state = AgentState::new(board.num_columns(), board.num_rows());
        Orchestrator {
            board,
            state,
            phase: Phase::NotStarted,
            deduction: LocalDeduction,
            resolver: AmbiguityResolver::new(backend, config),
            trace: config.trace,
            turns: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn into_board(self) -> B {
        self.board
    }

    /// Number of cells revealed so far.
    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Plays a single turn. Fatal errors dump the belief grid to the log.
    pub fn step(&mut self) -> Result<Phase, AgentError> {
        let result = self.turn();
        if let Err(err) = &result {
            log::error!("{err} after {} turns, beliefs:\n{}", self.turns, self.state.grid);
        }
        result
    }

    fn turn(&mut self) -> Result<Phase, AgentError> {
        match self.phase {
            Phase::NotStarted => self.reveal(OPENING),
            Phase::Playing => {
                let next = match self.next_safe() {
                    Some(pos) => Some(pos),
                    None => {
                        self.deduce()?;
                        self.next_safe()
                    }
                };
                match next {
                    Some(pos) => self.reveal(pos),
                    None => {
                        self.emit(format_args!("no provably safe cell left, stopping"));
                        self.phase = Phase::Stuck;
                        Ok(self.phase)
                    }
                }
            }
            Phase::Won | Phase::Lost | Phase::Stuck => Ok(self.phase),
        }
    }

    fn next_safe(&mut self) -> Option<Position> {
        while let Some(pos) = self.state.queue.pop() {
            if self.state.grid.get(pos) == CellState::Unknown {
                return Some(pos);
            }
        }
        None
    }

    fn reveal(&mut self, pos: Position) -> Result<Phase, AgentError> {
        self.turns += 1;
        let result = self.board.reveal(pos);
        self.emit(format_args!("turn {}: reveal {pos} -> {result}", self.turns));

        self.phase = match result {
            RevealResult::Mine => {
                self.state.grid.set_mine(pos)?;
                Phase::Lost
            }
            RevealResult::Count(n) => {
                self.state.record_count(pos, n)?;
                if self.board.is_solved() {
                    Phase::Won
                } else {
                    Phase::Playing
                }
            }
        };

        if self.trace {
            log::info!("\n{}", self.state.grid);
        }
        Ok(self.phase)
    }

    /// Runs the counting rules to a fixpoint, then, if that found no safe
    /// cell, the solver over what is still ambiguous. Repeats while the
    /// solver makes progress.
    pub fn deduce(&mut self) -> Result<DeductionReport, AgentError> {
        let mut report = DeductionReport::default();

        loop {
            let ambiguous = loop {
                let pass = self.deduction.run_pass(&mut self.state)?;
                report.passes += 1;
                report.mines += pass.mines;
                report.safe += pass.safe;
                if !pass.changed() {
                    break pass.ambiguous;
                }
            };

            if let Some(total) = self.board.mine_count() {
                report.safe += self.deduction.apply_mine_budget(&mut self.state, total)?;
            }

            if !self.state.queue.is_empty() || ambiguous.is_empty() {
                break;
            }

            let resolved = self.resolver.resolve_all(&mut self.state, ambiguous)?;
            report.regions += resolved.regions;
            report.timed_out += resolved.timed_out;
            report.mines += resolved.mines;
            report.safe += resolved.safe;
            if !resolved.changed() {
                break;
            }
        }

        log::debug!(
            "deduction: {} passes, {} mines, {} safe, {} regions ({} timed out)",
            report.passes,
            report.mines,
            report.safe,
            report.regions,
            report.timed_out
        );
        Ok(report)
    }

    fn emit(&self, args: std::fmt::Arguments<'_>) {
        if self.trace {
            log::info!("{args}");
        } else {
            log::debug!("{args}");
        }
    }
}

impl<B: Board, S: SatBackend> Agent for Orchestrator<B, S> {
    fn solve(&mut self) -> Result<Outcome, AgentError> {
        loop {
            if let Some(outcome) = self.step()?.outcome() {
                return Ok(outcome);
            }
        }
    }

    fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }
}
