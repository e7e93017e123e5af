use std::cmp::Ordering;
use std::fmt;

use crate::error::AgentError;

/// Represents a 2D coordinate on the minesweeper board.
/// `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }
}

// Row-major, so ordered collections of positions iterate like a board scan.
impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What the agent believes about a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    Unknown,
    Mine,
    Count(u8), // Number of adjacent mines, 0..=8.
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellState::Unknown => write!(f, "unknown"),
            CellState::Mine => write!(f, "mine"),
            CellState::Count(n) => write!(f, "count {n}"),
        }
    }
}

/// The agent's private model of the board.
///
/// Cells only ever move out of `Unknown`; once a cell is a `Mine` or a
/// `Count` it stays that way for the rest of the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeliefGrid {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
}

impl BeliefGrid {
    pub fn new(width: usize, height: usize) -> Self {
        BeliefGrid {
            width,
            height,
            cells: vec![CellState::Unknown; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn get(&self, pos: Position) -> CellState {
        self.cells[self.index(pos)]
    }

    /// Marks `pos` as a mine. Returns `false` when it already was one.
    pub fn set_mine(&mut self, pos: Position) -> Result<bool, AgentError> {
        let idx = self.index(pos);
        match self.cells[idx] {
            CellState::Unknown => {
                self.cells[idx] = CellState::Mine;
                Ok(true)
            }
            CellState::Mine => Ok(false),
            from @ CellState::Count(_) => Err(AgentError::InvalidTransition {
                position: pos,
                from,
                to: CellState::Mine,
            }),
        }
    }

    /// Records the count disclosed by revealing `pos`.
    pub fn set_revealed(&mut self, pos: Position, count: u8) -> Result<(), AgentError> {
        let idx = self.index(pos);
        let from = self.cells[idx];
        if from != CellState::Unknown || count > 8 {
            return Err(AgentError::InvalidTransition {
                position: pos,
                from,
                to: CellState::Count(count),
            });
        }
        self.cells[idx] = CellState::Count(count);
        Ok(())
    }

    /// The in-bounds neighbors of `pos`, scanned row by row around it.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + use<> {
        neighbors(pos, self.width, self.height)
    }

    /// Every position of the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Position { x, y }))
    }

    pub fn mine_count(&self) -> usize {
        self.count_matching(|cell| cell == CellState::Mine)
    }

    pub fn unknown_count(&self) -> usize {
        self.count_matching(|cell| cell == CellState::Unknown)
    }

    fn count_matching(&self, pred: impl Fn(CellState) -> bool) -> usize {
        self.cells.iter().filter(|&&cell| pred(cell)).count()
    }

    fn index(&self, pos: Position) -> usize {
        debug_assert!(self.contains(pos), "{pos} is outside the grid");
        pos.y * self.width + pos.x
    }
}

impl fmt::Display for BeliefGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            for cell in row {
                let symbol = match cell {
                    CellState::Unknown => '#',
                    CellState::Mine => '*',
                    CellState::Count(0) => '.',
                    CellState::Count(n) => char::from(b'0' + n),
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The up-to-eight cells surrounding `pos` on a `width` x `height` board.
/// It correctly handles board edges and corners.
pub fn neighbors(pos: Position, width: usize, height: usize) -> impl Iterator<Item = Position> {
    (-1..=1).flat_map(move |dy| {
        (-1..=1).filter_map(move |dx| {
            if dx == 0 && dy == 0 {
                return None;
            }
            let nx = pos.x as isize + dx;
            let ny = pos.y as isize + dy;
            if nx >= 0 && nx < width as isize && ny >= 0 && ny < height as isize {
                Some(Position {
                    x: nx as usize,
                    y: ny as usize,
                })
            } else {
                None
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_unknown() {
        let grid = BeliefGrid::new(4, 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.unknown_count(), 12);
        assert!(grid.positions().all(|p| grid.get(p) == CellState::Unknown));
    }

    #[test]
    fn test_neighbors_counts() {
        let grid = BeliefGrid::new(3, 3);
        assert_eq!(grid.neighbors(Position::new(0, 0)).count(), 3);
        assert_eq!(grid.neighbors(Position::new(1, 0)).count(), 5);
        assert_eq!(grid.neighbors(Position::new(1, 1)).count(), 8);
    }

    #[test]
    fn test_neighbors_scan_order() {
        let grid = BeliefGrid::new(3, 3);
        let around: Vec<Position> = grid.neighbors(Position::new(1, 1)).collect();
        assert_eq!(
            around,
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(0, 1),
                Position::new(2, 1),
                Position::new(0, 2),
                Position::new(1, 2),
                Position::new(2, 2),
            ]
        );
    }

    #[test]
    fn test_transitions_are_monotonic() {
        let mut grid = BeliefGrid::new(2, 2);
        let a = Position::new(0, 0);
        let b = Position::new(1, 1);

        grid.set_revealed(a, 1).unwrap();
        assert!(grid.set_mine(b).unwrap());
        assert!(!grid.set_mine(b).unwrap());

        assert_eq!(
            grid.set_mine(a),
            Err(AgentError::InvalidTransition {
                position: a,
                from: CellState::Count(1),
                to: CellState::Mine,
            })
        );
        assert!(grid.set_revealed(a, 2).is_err());
        assert!(grid.set_revealed(b, 0).is_err());

        assert_eq!(grid.get(a), CellState::Count(1));
        assert_eq!(grid.get(b), CellState::Mine);
        assert_eq!(grid.mine_count(), 1);
    }

    #[test]
    fn test_count_above_eight_is_rejected() {
        let mut grid = BeliefGrid::new(3, 3);
        assert!(grid.set_revealed(Position::new(1, 1), 9).is_err());
        assert_eq!(grid.get(Position::new(1, 1)), CellState::Unknown);
    }

    #[test]
    fn test_position_ordering_is_row_major() {
        let mut points = vec![Position::new(2, 0), Position::new(0, 1), Position::new(1, 0)];
        points.sort();
        assert_eq!(
            points,
            vec![Position::new(1, 0), Position::new(2, 0), Position::new(0, 1)]
        );
    }

    #[test]
    fn test_display() {
        let mut grid = BeliefGrid::new(3, 2);
        grid.set_revealed(Position::new(0, 0), 0).unwrap();
        grid.set_revealed(Position::new(1, 0), 2).unwrap();
        grid.set_mine(Position::new(2, 1)).unwrap();
        assert_eq!(grid.to_string(), ".2#\n##*\n");
    }
}
