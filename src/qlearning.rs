use std::collections::HashSet;

use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::direction::{shuffled, Direction};
use crate::error::GridError;
use crate::grid::{Coord, GridWorld};

/// Reward for stepping onto the reward cell
pub const REWARD_CONSTANT: f64 = 100.0;

/// Training draws at or below this take the best known direction
const EXPLOIT_THRESHOLD: f64 = 0.6;
/// Training draws at or below this (and above the exploit one) favour unvisited cells
const EXPLORE_THRESHOLD: f64 = 0.8;

/// Learning hyper-parameters and episode limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLearningParams {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    pub max_steps_per_episode: usize,
    pub training_episodes: usize,
    /// Fixed seed for reproducible runs; entropy-seeded when None
    pub seed: Option<u64>,
}

impl Default for QLearningParams {
    fn default() -> Self {
        QLearningParams {
            alpha: 0.2,
            gamma: 0.99,
            max_steps_per_episode: 200,
            training_episodes: 100,
            seed: None,
        }
    }
}

/// What a Q-Learning tick observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningStatus {
    Training,
    Testing,
    ReachedReward,
}

/// Dense `rows x cols x 4` table of action values
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl QTable {
    pub fn new(rows: usize, cols: usize) -> Self {
        QTable {
            rows,
            cols,
            values: vec![0.0; rows * cols * Direction::ALL.len()],
        }
    }

    fn slot(&self, coord: Coord, direction: Direction) -> usize {
        (coord.row * self.cols + coord.col) * Direction::ALL.len() + direction.index()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value of taking `direction` from `coord`; coord must be in bounds
    pub fn get(&self, coord: Coord, direction: Direction) -> f64 {
        self.values[self.slot(coord, direction)]
    }

    pub fn set(&mut self, coord: Coord, direction: Direction, value: f64) {
        let slot = self.slot(coord, direction);
        self.values[slot] = value;
    }

    /// Best value over all four directions
    pub fn max_value(&self, coord: Coord) -> f64 {
        Direction::ALL
            .iter()
            .map(|&d| self.get(coord, d))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Allowed direction with the strictly highest positive value.
    ///
    /// The running maximum starts at zero, so None means no allowed
    /// direction has been rewarded yet. Ties go to the earliest entry.
    pub fn best_direction(&self, coord: Coord, allowed: &[Direction]) -> Option<Direction> {
        let mut best = None;
        let mut max = 0.0;
        for &direction in allowed {
            let value = self.get(coord, direction);
            if value > max {
                max = value;
                best = Some(direction);
            }
        }
        best
    }

    /// All values in (row, col, direction) order
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Reward for arriving at `coord`
pub fn reward_at(grid: &GridWorld, coord: Coord) -> f64 {
    if coord == grid.reward() {
        REWARD_CONSTANT
    } else {
        0.0
    }
}

/// Incremental tabular Q-Learning agent, advanced one transition per `step`.
pub struct QLearning<'g> {
    grid: &'g GridWorld,
    params: QLearningParams,
    q_table: QTable,
    visited: Vec<bool>,
    current: Coord,
    episode_start: Coord,
    training: bool,
    episode_finished: bool,
    step_count: usize,
    episode_count: usize,
    ticks: usize,
    rng: ChaCha8Rng,
}

impl<'g> QLearning<'g> {
    pub fn new(grid: &'g GridWorld, params: QLearningParams) -> Self {
        let rng = match params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let start = grid.start();
        let mut visited = vec![false; grid.len()];
        visited[grid.index(start)] = true;

        QLearning {
            grid,
            params,
            q_table: QTable::new(grid.rows(), grid.cols()),
            visited,
            current: start,
            episode_start: start,
            training: true,
            episode_finished: false,
            step_count: 0,
            episode_count: 0,
            ticks: 0,
            rng,
        }
    }

    /// Advance the agent by one transition
    pub fn step(&mut self) -> Result<LearningStatus, GridError> {
        self.ticks += 1;

        if self.step_count > self.params.max_steps_per_episode || self.episode_finished {
            self.restart_episode()?;
        }

        if self.training && self.episode_count > self.params.training_episodes {
            info!(
                episodes = self.episode_count,
                ticks = self.ticks,
                "Q-Learning training finished, switching to testing"
            );
            self.training = false;
        }

        if self.current == self.grid.reward() {
            return Ok(self.reached_reward());
        }

        let allowed = self.grid.allowed_directions(self.current);
        let best = self.q_table.best_direction(self.current, &allowed);

        let Some(direction) = self.transition(best, &allowed) else {
            // Walled in: the agent stays put but the step still counts
            self.step_count += 1;
            return Ok(self.mode_status());
        };

        let from = self.grid.cell_at(self.current.row, self.current.col)?;
        let next = self.grid.neighbor(&from, direction)?.coord();
        debug!(
            tick = self.ticks,
            episode = self.episode_count,
            ?direction,
            ?best,
            row = next.row,
            col = next.col,
            "Q-Learning transition"
        );

        self.current = next;
        let idx = self.grid.index(next);
        self.visited[idx] = true;
        self.step_count += 1;

        if self.training {
            self.update_q_values(next)?;
        }

        if next == self.grid.reward() {
            return Ok(self.reached_reward());
        }
        Ok(self.mode_status())
    }

    fn reached_reward(&mut self) -> LearningStatus {
        if self.training {
            self.episode_finished = true;
        }
        LearningStatus::ReachedReward
    }

    fn mode_status(&self) -> LearningStatus {
        if self.training {
            LearningStatus::Training
        } else {
            LearningStatus::Testing
        }
    }

    /// Pick the direction actually taken from `best` and the legal moves.
    fn transition(&mut self, best: Option<Direction>, allowed: &[Direction]) -> Option<Direction> {
        if allowed.is_empty() {
            return None;
        }

        let Some(best) = best else {
            return self.unexplored_direction(allowed);
        };
        if !self.training {
            return Some(best);
        }

        let u: f64 = self.rng.gen();
        if u <= EXPLOIT_THRESHOLD {
            Some(best)
        } else if u <= EXPLORE_THRESHOLD {
            self.unexplored_direction(allowed)
        } else {
            shuffled(allowed, &mut self.rng).first().copied()
        }
    }

    /// First shuffled direction leading to an unvisited cell, else any
    fn unexplored_direction(&mut self, allowed: &[Direction]) -> Option<Direction> {
        let order = shuffled(allowed, &mut self.rng);
        order
            .iter()
            .copied()
            .find(|&d| match self.current.step(d) {
                Some(target) => !self.visited[self.grid.index(target)],
                None => false,
            })
            .or_else(|| order.first().copied())
    }

    /// Apply the Q-learning rule to every legal move out of `coord`
    fn update_q_values(&mut self, coord: Coord) -> Result<(), GridError> {
        let cell = self.grid.cell_at(coord.row, coord.col)?;
        for direction in Direction::ALL {
            if !self.grid.can_move(direction, coord.row, coord.col) {
                continue;
            }
            let next = self.grid.neighbor(&cell, direction)?.coord();
            let q = self.q_table.get(coord, direction);
            let target = reward_at(self.grid, next) + self.params.gamma * self.q_table.max_value(next);
            self.q_table
                .set(coord, direction, q + self.params.alpha * (target - q));
        }
        Ok(())
    }

    /// Start a new episode from a random non-obstacle, non-reward cell
    pub fn restart_episode(&mut self) -> Result<(), GridError> {
        let reward = self.grid.reward();
        let fallback = self.grid.start();
        let target = self
            .grid
            .open_cells()
            .filter(|c| c.coord() != reward)
            .choose(&mut self.rng)
            .map(|c| c.coord())
            .unwrap_or(fallback);
        self.begin_episode(target);
        Ok(())
    }

    /// Start a new episode from a chosen cell
    pub fn restart_episode_at(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        let cell = self.grid.cell_at(row, col)?;
        if cell.is_obstacle {
            return Err(GridError::BlockedCell { row, col });
        }
        self.begin_episode(cell.coord());
        Ok(())
    }

    fn begin_episode(&mut self, at: Coord) {
        self.step_count = 0;
        self.episode_count += 1;
        self.episode_finished = false;
        self.visited.iter_mut().for_each(|v| *v = false);
        self.current = at;
        self.episode_start = at;
        let idx = self.grid.index(at);
        self.visited[idx] = true;
        debug!(episode = self.episode_count, row = at.row, col = at.col, "Q-Learning episode restart");
    }

    /// Direction the learned table prefers from (row, col), if any
    pub fn greedy_direction(&self, row: usize, col: usize) -> Result<Option<Direction>, GridError> {
        let cell = self.grid.cell_at(row, col)?;
        let allowed = self.grid.allowed_directions(cell.coord());
        Ok(self.q_table.best_direction(cell.coord(), &allowed))
    }

    /// Follow the greedy policy from the start cell to the reward.
    ///
    /// Fails with `PolicyStalled` where the table offers no direction or the
    /// rollout revisits a cell.
    pub fn best_path(&self) -> Result<Vec<Coord>, GridError> {
        let reward = self.grid.reward();
        let mut node = self.grid.start();
        let mut path = vec![node];
        let mut seen = HashSet::from([node]);

        for _ in 0..self.grid.len() {
            if node == reward {
                return Ok(path);
            }
            let direction = self
                .greedy_direction(node.row, node.col)?
                .ok_or(GridError::PolicyStalled { row: node.row, col: node.col })?;
            let cell = self.grid.cell_at(node.row, node.col)?;
            let next = self.grid.neighbor(&cell, direction)?.coord();
            if !seen.insert(next) {
                return Err(GridError::PolicyStalled { row: node.row, col: node.col });
            }
            path.push(next);
            node = next;
        }

        if node == reward {
            Ok(path)
        } else {
            Err(GridError::PolicyStalled { row: node.row, col: node.col })
        }
    }

    pub fn current_cell(&self) -> Coord {
        self.current
    }

    /// Cell the current episode began on
    pub fn episode_start(&self) -> Coord {
        self.episode_start
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn q_value(&self, row: usize, col: usize, direction: Direction) -> Result<f64, GridError> {
        let cell = self.grid.cell_at(row, col)?;
        Ok(self.q_table.get(cell.coord(), direction))
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Completed episode restarts so far
    pub fn episode(&self) -> usize {
        self.episode_count
    }

    pub fn steps_in_episode(&self) -> usize {
        self.step_count
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn is_visited(&self, coord: Coord) -> bool {
        self.grid.in_bounds(coord.row, coord.col) && self.visited[self.grid.index(coord)]
    }

    pub fn params(&self) -> &QLearningParams {
        &self.params
    }

    pub fn grid(&self) -> &'g GridWorld {
        self.grid
    }
}
