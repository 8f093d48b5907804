use std::fmt::Debug;

use crate::astar::{AStar, SearchStatus};
use crate::error::GridError;
use crate::grid::Coord;
use crate::qlearning::{LearningStatus, QLearning};

/// A planning strategy a scheduler can tick without knowing which one it is
pub trait Planner {
    type Status: Copy + Debug + PartialEq;

    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Advance by exactly one tick
    fn step(&mut self) -> Result<Self::Status, GridError>;

    /// Cell the agent occupies after the last tick
    fn current_cell(&self) -> Coord;

    /// Path from the start to the reward, once one is known
    fn best_path(&self) -> Result<Vec<Coord>, GridError>;

    /// Whether the driver should stop ticking after `status`
    fn is_done(&self, status: Self::Status) -> bool;
}

impl Planner for AStar<'_> {
    type Status = SearchStatus;

    fn name(&self) -> &'static str {
        "astar"
    }

    fn step(&mut self) -> Result<SearchStatus, GridError> {
        AStar::step(self)
    }

    fn current_cell(&self) -> Coord {
        AStar::current_cell(self)
    }

    fn best_path(&self) -> Result<Vec<Coord>, GridError> {
        AStar::best_path(self)
    }

    fn is_done(&self, status: SearchStatus) -> bool {
        status.is_terminal()
    }
}

impl Planner for QLearning<'_> {
    type Status = LearningStatus;

    fn name(&self) -> &'static str {
        "qlearning"
    }

    fn step(&mut self) -> Result<LearningStatus, GridError> {
        QLearning::step(self)
    }

    fn current_cell(&self) -> Coord {
        QLearning::current_cell(self)
    }

    fn best_path(&self) -> Result<Vec<Coord>, GridError> {
        QLearning::best_path(self)
    }

    /// Training keeps going after each reward; testing stops on arrival
    fn is_done(&self, status: LearningStatus) -> bool {
        status == LearningStatus::ReachedReward && !self.is_training()
    }
}

/// Tick `planner` until it reports done or `max_ticks` runs out.
///
/// `on_tick` sees every status after it is produced. Returns the last status
/// and the number of ticks taken.
pub fn drive<P, F>(
    planner: &mut P,
    max_ticks: usize,
    mut on_tick: F,
) -> Result<(Option<P::Status>, usize), GridError>
where
    P: Planner,
    F: FnMut(usize, &P, P::Status),
{
    let mut last = None;
    for tick in 1..=max_ticks {
        let status = planner.step()?;
        on_tick(tick, planner, status);
        last = Some(status);
        if planner.is_done(status) {
            return Ok((last, tick));
        }
    }
    Ok((last, max_ticks))
}
