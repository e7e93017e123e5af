use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::grid::{Position, neighbors};

/// What the board discloses when a cell is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealResult {
    Mine,
    Count(u8),
}

impl fmt::Display for RevealResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevealResult::Mine => write!(f, "mine"),
            RevealResult::Count(n) => write!(f, "{n}"),
        }
    }
}

/// The hidden game the agent plays against. `reveal` is the agent's only
/// source of information about where the mines are.
pub trait Board {
    fn num_columns(&self) -> usize;

    fn num_rows(&self) -> usize;

    fn reveal(&mut self, pos: Position) -> RevealResult;

    /// Every safe cell has been revealed.
    fn is_solved(&self) -> bool;

    /// Total number of mines, when the board is willing to tell.
    fn mine_count(&self) -> Option<usize> {
        None
    }
}

/// A concrete board with a fixed mine layout.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MineField {
    pub width: usize,
    pub height: usize,
    /// Row-major mine layout.
    mines: Vec<bool>,
    /// Row-major record of which cells have been revealed.
    revealed: Vec<bool>,
    pub total_mines: usize,
}

impl MineField {
    /// Places `total_mines` at random. The corner `(0, 0)` and its
    /// neighbors are kept clear whenever there is room, so the opening move
    /// reveals a '0'.
    pub fn new(
        width: usize,
        height: usize,
        total_mines: usize,
        rng: &mut impl Rng,
    ) -> anyhow::Result<Self> {
        let cells = width * height;
        if cells == 0 {
            anyhow::bail!("board must have at least one cell");
        }
        if total_mines >= cells {
            anyhow::bail!("total mines must be less than the number of cells on the board");
        }

        let opening = Position::new(0, 0);
        let mut clear = vec![opening];
        clear.extend(neighbors(opening, width, height));
        if cells - clear.len() < total_mines {
            clear.truncate(1);
        }

        let mut candidates: Vec<usize> = (0..cells)
            .filter(|&idx| !clear.iter().any(|p| p.y * width + p.x == idx))
            .collect();
        candidates.shuffle(rng);

        let mut mines = vec![false; cells];
        for &idx in candidates.iter().take(total_mines) {
            mines[idx] = true;
        }

        Ok(MineField {
            width,
            height,
            mines,
            revealed: vec![false; cells],
            total_mines,
        })
    }

    /// Like `new`, seeded from the thread-local generator.
    pub fn random(width: usize, height: usize, total_mines: usize) -> anyhow::Result<Self> {
        Self::new(width, height, total_mines, &mut rand::rng())
    }

    /// Builds a field from text rows, `*` for a mine and `.` for a safe cell.
    pub fn from_rows(rows: &[&str]) -> anyhow::Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            anyhow::bail!("board must have at least one cell");
        }

        let mut mines = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                anyhow::bail!("row {y} has {} cells, expected {width}", row.chars().count());
            }
            for (x, c) in row.chars().enumerate() {
                match c {
                    '*' => mines.push(true),
                    '.' => mines.push(false),
                    other => anyhow::bail!("unexpected {other:?} at ({x}, {y})"),
                }
            }
        }

        let total_mines = mines.iter().filter(|&&m| m).count();
        Ok(MineField {
            width,
            height,
            revealed: vec![false; mines.len()],
            mines,
            total_mines,
        })
    }

    /// Deserializes a field, including what has been revealed so far.
    pub fn from_bytes(bts: &[u8]) -> anyhow::Result<Self> {
        let field: MineField = bcs::from_bytes(bts)?;
        let Some(cells) = field.width.checked_mul(field.height).filter(|&c| c > 0) else {
            anyhow::bail!("field snapshot has an invalid size: {}x{}", field.width, field.height);
        };
        if field.mines.len() != cells || field.revealed.len() != cells {
            anyhow::bail!("corrupt field snapshot");
        }
        if field.mines.iter().filter(|&&m| m).count() != field.total_mines {
            anyhow::bail!("field snapshot miscounts its mines");
        }
        Ok(field)
    }

    /// Serializes the field.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn is_mine(&self, pos: Position) -> bool {
        self.mines[self.index(pos)]
    }

    pub fn is_revealed(&self, pos: Position) -> bool {
        self.revealed[self.index(pos)]
    }

    /// Number of mines around `pos`.
    pub fn adjacent_mines(&self, pos: Position) -> u8 {
        neighbors(pos, self.width, self.height)
            .filter(|&n| self.is_mine(n))
            .count() as u8
    }

    /// What the player sees: `None` for a hidden cell.
    pub fn visible(&self, pos: Position) -> Option<RevealResult> {
        if !self.is_revealed(pos) {
            return None;
        }
        Some(if self.is_mine(pos) {
            RevealResult::Mine
        } else {
            RevealResult::Count(self.adjacent_mines(pos))
        })
    }

    fn index(&self, pos: Position) -> usize {
        pos.y * self.width + pos.x
    }
}

impl Board for MineField {
    fn num_columns(&self) -> usize {
        self.width
    }

    fn num_rows(&self) -> usize {
        self.height
    }

    fn reveal(&mut self, pos: Position) -> RevealResult {
        let idx = self.index(pos);
        self.revealed[idx] = true;
        if self.mines[idx] {
            RevealResult::Mine
        } else {
            RevealResult::Count(self.adjacent_mines(pos))
        }
    }

    fn is_solved(&self) -> bool {
        self.mines
            .iter()
            .zip(&self.revealed)
            .all(|(&mine, &revealed)| mine != revealed)
    }

    fn mine_count(&self) -> Option<usize> {
        Some(self.total_mines)
    }
}
