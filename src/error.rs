use std::fmt;
use thiserror::Error;

use crate::direction::Direction;

/// The two landmark cells every grid map must contain exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landmark {
    Start,
    Reward,
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Landmark::Start => write!(f, "agent start"),
            Landmark::Reward => write!(f, "reward"),
        }
    }
}

/// Errors raised by the grid model and both planning engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("cannot move {direction:?} from ({row}, {col})")]
    InvalidMove {
        direction: Direction,
        row: usize,
        col: usize,
    },
    #[error("grid map has no {0} cell")]
    MissingLandmark(Landmark),
    #[error("grid map has more than one {landmark} cell: ({first_row}, {first_col}) and ({row}, {col})")]
    DuplicateLandmark {
        landmark: Landmark,
        first_row: usize,
        first_col: usize,
        row: usize,
        col: usize,
    },
    #[error("cell ({row}, {col}) cannot be more than one of obstacle, start and reward")]
    ConflictingCell { row: usize, col: usize },
    #[error("grid must have at least one row and one column")]
    EmptyGrid,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("malformed grid map at line {line}: {reason}")]
    MalformedMap { line: usize, reason: String },
    #[error("parent chain broke at ({row}, {col}) before reaching the start cell")]
    BrokenPathChain { row: usize, col: usize },
    #[error("the reward cell has not been reached")]
    RewardNotReached,
    #[error("greedy policy stalls at ({row}, {col})")]
    PolicyStalled { row: usize, col: usize },
    #[error("cell ({row}, {col}) is an obstacle")]
    BlockedCell { row: usize, col: usize },
}
