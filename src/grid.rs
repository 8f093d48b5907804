use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::{GridError, Landmark};

/// A (row, col) position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }

    /// Calculate Euclidean distance
    pub fn distance(&self, other: &Coord) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        (dr * dr + dc * dc).sqrt()
    }

    /// Number of unit moves between two cells on an open grid
    pub fn manhattan(&self, other: &Coord) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Apply a direction's unit offset; None if the result underflows
    pub fn step(&self, direction: Direction) -> Option<Coord> {
        let (dr, dc) = direction.offset();
        Some(Coord {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Coord { row, col }
    }
}

/// Static attributes of one cell as handed over by a map loader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellDescriptor {
    pub obstacle: bool,
    pub start: bool,
    pub reward: bool,
}

impl CellDescriptor {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn obstacle() -> Self {
        CellDescriptor { obstacle: true, ..Self::default() }
    }

    pub fn start() -> Self {
        CellDescriptor { start: true, ..Self::default() }
    }

    pub fn reward() -> Self {
        CellDescriptor { reward: true, ..Self::default() }
    }
}

/// One grid position. Flags never change after the grid is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub is_obstacle: bool,
    pub is_start: bool,
    pub is_reward: bool,
}

impl Cell {
    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

/// Rectangular grid of static cells with exactly one start and one reward.
///
/// Search-time state (scores, visited flags, parents, Q-values) is kept by
/// the engines, so a `GridWorld` can be shared read-only between runs.
#[derive(Debug, Clone)]
pub struct GridWorld {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    start: Coord,
    reward: Coord,
}

impl GridWorld {
    /// Build a grid from row-major descriptors, validating shape and landmarks
    pub fn from_rows(rows: Vec<Vec<CellDescriptor>>) -> Result<Self, GridError> {
        let row_count = rows.len();
        let col_count = rows.first().map(|r| r.len()).unwrap_or(0);
        if row_count == 0 || col_count == 0 {
            return Err(GridError::EmptyGrid);
        }

        let mut cells = Vec::with_capacity(row_count * col_count);
        let mut start: Option<Coord> = None;
        let mut reward: Option<Coord> = None;

        for (row, descriptors) in rows.into_iter().enumerate() {
            if descriptors.len() != col_count {
                return Err(GridError::RaggedRow {
                    row,
                    expected: col_count,
                    found: descriptors.len(),
                });
            }

            for (col, d) in descriptors.into_iter().enumerate() {
                let flags = [d.obstacle, d.start, d.reward].iter().filter(|&&f| f).count();
                if flags > 1 {
                    return Err(GridError::ConflictingCell { row, col });
                }
                if d.start {
                    record_landmark(&mut start, Landmark::Start, row, col)?;
                }
                if d.reward {
                    record_landmark(&mut reward, Landmark::Reward, row, col)?;
                }
                cells.push(Cell {
                    row,
                    col,
                    is_obstacle: d.obstacle,
                    is_start: d.start,
                    is_reward: d.reward,
                });
            }
        }

        let start = start.ok_or(GridError::MissingLandmark(Landmark::Start))?;
        let reward = reward.ok_or(GridError::MissingLandmark(Landmark::Reward))?;

        Ok(GridWorld {
            rows: row_count,
            cols: col_count,
            cells,
            start,
            reward,
        })
    }

    /// Create a grid with specific obstacle cells
    pub fn with_obstacles(
        rows: usize,
        cols: usize,
        start: (usize, usize),
        reward: (usize, usize),
        obstacles: &[(usize, usize)],
    ) -> Result<Self, GridError> {
        let mut descriptors = vec![vec![CellDescriptor::free(); cols]; rows];
        for &(row, col) in obstacles {
            let cell = descriptors
                .get_mut(row)
                .and_then(|r| r.get_mut(col))
                .ok_or(GridError::OutOfBounds { row, col, rows, cols })?;
            cell.obstacle = true;
        }
        for ((row, col), landmark) in [(start, Landmark::Start), (reward, Landmark::Reward)] {
            let cell = descriptors
                .get_mut(row)
                .and_then(|r| r.get_mut(col))
                .ok_or(GridError::OutOfBounds { row, col, rows, cols })?;
            match landmark {
                Landmark::Start => cell.start = true,
                Landmark::Reward => cell.reward = true,
            }
        }
        Self::from_rows(descriptors)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn reward(&self) -> Coord {
        self.reward
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major index of a coordinate known to be in bounds
    pub fn index(&self, coord: Coord) -> usize {
        coord.row * self.cols + coord.col
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Result<Cell, GridError> {
        if !self.in_bounds(row, col) {
            return Err(GridError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.cells[row * self.cols + col])
    }

    /// Whether a move in `direction` from (row, col) lands on a walkable cell.
    ///
    /// Out of bounds and obstacle targets are illegal. This is the only
    /// legality check either engine uses.
    pub fn can_move(&self, direction: Direction, row: usize, col: usize) -> bool {
        match Coord::new(row, col).step(direction) {
            Some(target) if self.in_bounds(target.row, target.col) => {
                !self.cells[self.index(target)].is_obstacle
            }
            _ => false,
        }
    }

    /// The cell adjacent to `cell` in `direction`; the move must be legal
    pub fn neighbor(&self, cell: &Cell, direction: Direction) -> Result<Cell, GridError> {
        if !self.can_move(direction, cell.row, cell.col) {
            return Err(GridError::InvalidMove {
                direction,
                row: cell.row,
                col: cell.col,
            });
        }
        let target = cell.coord().step(direction).ok_or(GridError::InvalidMove {
            direction,
            row: cell.row,
            col: cell.col,
        })?;
        self.cell_at(target.row, target.col)
    }

    /// Legal directions out of `coord`, in Up, Down, Left, Right order
    pub fn allowed_directions(&self, coord: Coord) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&d| self.can_move(d, coord.row, coord.col))
            .collect()
    }

    /// Non-obstacle cells in row-major order
    pub fn open_cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(|c| !c.is_obstacle)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

fn record_landmark(
    slot: &mut Option<Coord>,
    landmark: Landmark,
    row: usize,
    col: usize,
) -> Result<(), GridError> {
    if let Some(first) = slot {
        return Err(GridError::DuplicateLandmark {
            landmark,
            first_row: first.row,
            first_col: first.col,
            row,
            col,
        });
    }
    *slot = Some(Coord::new(row, col));
    Ok(())
}
