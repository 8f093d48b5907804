pub mod astar;
pub mod config;
pub mod direction;
pub mod error;
pub mod grid;
pub mod map;
pub mod planner;
pub mod qlearning;
pub mod run_log;

pub use astar::{AStar, CellScores, SearchStatus};
pub use direction::Direction;
pub use error::{GridError, Landmark};
pub use grid::{Cell, CellDescriptor, Coord, GridWorld};
pub use planner::Planner;
pub use qlearning::{LearningStatus, QLearning, QLearningParams, QTable, REWARD_CONSTANT};
