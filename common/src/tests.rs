use std::sync::{Mutex, Once};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::deduction::LocalDeduction;
use crate::resolver::AmbiguityResolver;
use crate::*;

fn p(x: usize, y: usize) -> Position {
    Position::new(x, y)
}

fn agent_for(rows: &[&str]) -> Orchestrator<MineField> {
    let field = MineField::from_rows(rows).unwrap();
    Orchestrator::new(field, &AgentConfig::default())
}

/// A real field that reports a wrong count for one cell.
struct MiscountedField {
    field: MineField,
    at: Position,
    count: u8,
}

impl Board for MiscountedField {
    fn num_columns(&self) -> usize {
        self.field.num_columns()
    }

    fn num_rows(&self) -> usize {
        self.field.num_rows()
    }

    fn reveal(&mut self, pos: Position) -> RevealResult {
        let result = self.field.reveal(pos);
        if pos == self.at {
            RevealResult::Count(self.count)
        } else {
            result
        }
    }

    fn is_solved(&self) -> bool {
        self.field.is_solved()
    }
}

/// Keeps every error-level log line.
struct ErrorLog;

static ERROR_LOG: ErrorLog = ErrorLog;
static ERRORS: Mutex<Vec<String>> = Mutex::new(Vec::new());

impl log::Log for ErrorLog {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Error
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            ERRORS.lock().unwrap().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

fn capture_errors() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&ERROR_LOG).unwrap();
        log::set_max_level(log::LevelFilter::Error);
    });
}

#[test]
fn test_zero_opening_clears_the_board() {
    let mut agent = agent_for(&["...", "...", "..*"]);

    assert_eq!(agent.step().unwrap(), Phase::Playing);
    assert_eq!(agent.state().grid.get(p(0, 0)), CellState::Count(0));

    agent.deduce().unwrap();
    assert_eq!(
        agent.state().queue.iter().collect::<Vec<_>>(),
        vec![p(1, 0), p(0, 1), p(1, 1)]
    );

    assert_eq!(agent.solve().unwrap(), Outcome::Won);
    assert_eq!(agent.phase(), Phase::Won);
    assert_eq!(agent.turns(), 8);

    let field = agent.into_board();
    assert!(field.is_solved());
    assert!(!field.is_revealed(p(2, 2)));
}

#[test]
fn test_mine_under_opening_loses() {
    let mut agent = agent_for(&["*.", ".."]);
    let outcome = agent.solve().unwrap();

    assert_eq!(outcome, Outcome::Lost);
    assert!(!outcome.is_win());
    assert_eq!(agent.state().grid.get(OPENING), CellState::Mine);
    // Terminal phases stay put.
    assert_eq!(agent.step().unwrap(), Phase::Lost);
    assert_eq!(agent.turns(), 1);
}

#[test]
fn test_no_safe_move_is_stuck() {
    // The opening shows a '1' next to three hidden cells, one of which is
    // the mine. Nothing more can be proven.
    let mut agent = agent_for(&["..", ".*"]);
    let outcome = agent.solve().unwrap();

    assert_eq!(outcome, Outcome::Stuck);
    assert!(!outcome.is_win());
    assert_eq!(agent.turns(), 1);
    assert_eq!(agent.state().grid.unknown_count(), 3);
    assert_eq!(agent.state().grid.mine_count(), 0);
}

#[test]
fn test_impossible_count_aborts_the_game() {
    capture_errors();

    // The opening of a mine-free 3x3 field claims 4 mines among its 3
    // neighbors.
    let field = MineField::from_rows(&["...", "...", "..."]).unwrap();
    let board = MiscountedField {
        field,
        at: OPENING,
        count: 4,
    };
    let mut agent = Orchestrator::new(board, &AgentConfig::default());

    assert_eq!(agent.step().unwrap(), Phase::Playing);
    let err = agent.solve().unwrap_err();
    assert_eq!(
        err,
        AgentError::ConsistencyViolation {
            position: OPENING,
            count: 4,
            known_mines: 0,
            unknown: 3,
        }
    );
    assert_eq!(agent.phase(), Phase::Playing);
    assert_eq!(agent.turns(), 1);

    // The beliefs at the time of failure go to the error log.
    let expected = format!("{err} after 1 turns, beliefs:\n4##\n###\n###\n");
    assert!(ERRORS.lock().unwrap().contains(&expected));
}

#[test]
fn test_saturated_corner_is_flagged() {
    // A '3' in the corner of a 2x2 board: every other cell is a mine.
    let mut agent = agent_for(&[".*", "**"]);

    assert_eq!(agent.step().unwrap(), Phase::Won);
    assert_eq!(agent.state().grid.get(OPENING), CellState::Count(3));

    let report = agent.deduce().unwrap();
    assert_eq!(report.mines, 3);
    assert!(agent.state().queue.is_empty());
}

#[test]
fn test_deduction_is_idempotent() {
    let mut agent = agent_for(&["....", "....", "..*.", "*..*"]);
    agent.solve().unwrap();

    agent.deduce().unwrap();
    let grid = agent.state().grid.clone();
    let queued: Vec<Position> = agent.state().queue.iter().collect();

    let again = agent.deduce().unwrap();
    assert!(!again.changed());
    assert_eq!(agent.state().grid, grid);
    assert_eq!(agent.state().queue.iter().collect::<Vec<_>>(), queued);
}

#[test]
fn test_overlapping_counts_force_a_mine() {
    // Row 0 is hidden. (0, 1) shows 1 and (1, 1) shows 3 next to the known
    // mine at (2, 1): a + b = 1 and a + b + c = 2, so only c is forced.
    let mut state = AgentState::new(3, 2);
    state.record_count(p(0, 1), 1).unwrap();
    state.record_count(p(1, 1), 3).unwrap();
    state.grid.set_mine(p(2, 1)).unwrap();

    let pass = LocalDeduction.run_pass(&mut state).unwrap();
    assert!(!pass.changed());
    assert_eq!(pass.ambiguous.len(), 2);

    let resolver = AmbiguityResolver::new(VarisatBackend, &AgentConfig::default());
    let report = resolver.resolve_all(&mut state, pass.ambiguous).unwrap();

    assert_eq!(report.regions, 1);
    assert_eq!(report.mines, 1);
    assert_eq!(report.safe, 0);
    assert_eq!(state.grid.get(p(2, 0)), CellState::Mine);
    assert_eq!(state.grid.get(p(0, 0)), CellState::Unknown);
    assert_eq!(state.grid.get(p(1, 0)), CellState::Unknown);
    assert!(state.queue.is_empty());
}

#[test]
fn test_random_games_never_lose() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut won = 0;

    for _ in 0..25 {
        let field = MineField::new(9, 9, 10, &mut rng).unwrap();
        let mut agent = Orchestrator::new(field, &AgentConfig::default());
        let outcome = agent.solve().unwrap();
        assert_ne!(outcome, Outcome::Lost);

        let grid = agent.state().grid.clone();
        let field = agent.into_board();
        for pos in grid.positions() {
            match grid.get(pos) {
                CellState::Mine => assert!(field.is_mine(pos), "{pos} flagged but safe"),
                CellState::Count(n) => {
                    assert!(!field.is_mine(pos));
                    assert_eq!(field.adjacent_mines(pos), n);
                }
                CellState::Unknown => {}
            }
        }

        if outcome.is_win() {
            assert!(field.is_solved());
            won += 1;
        }
    }

    assert!(won > 0);
}

#[test]
fn test_trace_does_not_change_play() {
    let layout = ["......", "..*...", "......", "....*.", "*.....", "......"];

    let mut quiet = agent_for(&layout);
    let mut loud = agent_for(&layout);
    loud.set_trace(true);

    assert_eq!(quiet.solve().unwrap(), loud.solve().unwrap());
    assert_eq!(quiet.turns(), loud.turns());
    assert_eq!(quiet.state().grid, loud.state().grid);
}
