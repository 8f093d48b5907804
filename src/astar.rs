use std::collections::{HashMap, VecDeque};

use tracing::{debug, info};

use crate::direction::Direction;
use crate::error::GridError;
use crate::grid::{Coord, GridWorld};

/// Lifecycle of an A* run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Initialized,
    Searching,
    /// The reward cell was expanded
    Found,
    /// The open set ran dry without reaching the reward
    Exhausted,
}

impl SearchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SearchStatus::Found | SearchStatus::Exhausted)
    }
}

/// Per-cell search state, private to one engine instance
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellScores {
    pub g_score: f64,
    pub f_score: f64,
    pub visited: bool,
}

impl CellScores {
    /// Heuristic part of the last f-score written to this cell
    pub fn h_score(&self) -> f64 {
        self.f_score - self.g_score
    }
}

/// Straight-line distance to the reward
pub fn heuristic(cell: Coord, reward: Coord) -> f64 {
    cell.distance(&reward)
}

/// Incremental A* search, advanced one expansion per `step`.
///
/// The open set is an insertion-ordered sequence kept in descending f-score
/// order and popped from the end, so among equal f-scores the most recently
/// inserted cell is expanded first. A cell may sit in the open set more than
/// once; stale entries are skipped when popped.
pub struct AStar<'g> {
    grid: &'g GridWorld,
    scores: Vec<CellScores>,
    parents: HashMap<Coord, Coord>,
    open: Vec<Coord>,
    closed: Vec<Coord>,
    current: Coord,
    reward: Coord,
    status: SearchStatus,
    ticks: usize,
}

impl<'g> AStar<'g> {
    pub fn new(grid: &'g GridWorld) -> Self {
        let start = grid.start();
        let reward = grid.reward();

        let mut scores = vec![CellScores::default(); grid.len()];
        let start_scores = &mut scores[grid.index(start)];
        start_scores.g_score = 0.0;
        start_scores.f_score = heuristic(start, reward);

        AStar {
            grid,
            scores,
            parents: HashMap::new(),
            open: vec![start],
            closed: Vec::new(),
            current: start,
            reward,
            status: SearchStatus::Initialized,
            ticks: 0,
        }
    }

    /// Expand one cell. Calling this after a terminal status is a no-op.
    pub fn step(&mut self) -> Result<SearchStatus, GridError> {
        if self.status.is_terminal() {
            return Ok(self.status);
        }
        self.ticks += 1;

        // Pop the lowest f-score, skipping cells expanded through another entry
        let next = loop {
            match self.open.pop() {
                None => {
                    info!(ticks = self.ticks, expanded = self.closed.len(), "A* open set exhausted");
                    self.status = SearchStatus::Exhausted;
                    return Ok(self.status);
                }
                Some(coord) if self.scores[self.grid.index(coord)].visited => continue,
                Some(coord) => break coord,
            }
        };

        self.current = next;
        let idx = self.grid.index(next);
        self.scores[idx].visited = true;
        self.closed.push(next);

        debug!(
            tick = self.ticks,
            row = next.row,
            col = next.col,
            f = self.scores[idx].f_score,
            open = self.open.len(),
            "A* expanding"
        );

        if next == self.reward {
            info!(ticks = self.ticks, expanded = self.closed.len(), "A* found the reward");
            self.status = SearchStatus::Found;
            return Ok(self.status);
        }

        let cell = self.grid.cell_at(next.row, next.col)?;
        for direction in Direction::ALL {
            if self.grid.can_move(direction, next.row, next.col) {
                let neighbor = self.grid.neighbor(&cell, direction)?.coord();
                self.process_neighbor(neighbor);
            }
        }

        self.status = SearchStatus::Searching;
        Ok(self.status)
    }

    fn process_neighbor(&mut self, neighbor: Coord) {
        let n_idx = self.grid.index(neighbor);

        // Only the first discovery sets the parent
        if !self.open.contains(&neighbor) && !self.scores[n_idx].visited {
            self.parents.insert(neighbor, self.current);
        }

        // Uniform edge cost; scores are rewritten even for closed cells
        let g_score = self.scores[self.grid.index(self.current)].g_score + 1.0;
        let f_score = g_score + heuristic(neighbor, self.reward);
        self.scores[n_idx].g_score = g_score;
        self.scores[n_idx].f_score = f_score;

        let position = self
            .open
            .iter()
            .position(|c| self.scores[self.grid.index(*c)].f_score < f_score);
        match position {
            Some(i) => self.open.insert(i, neighbor),
            None => self.open.push(neighbor),
        }
    }

    /// Walk parent links back from the reward to the start.
    ///
    /// The walk is capped at `rows * cols` links so a corrupted chain can't
    /// loop forever.
    pub fn best_path(&self) -> Result<Vec<Coord>, GridError> {
        if self.status != SearchStatus::Found {
            return Err(GridError::RewardNotReached);
        }

        let start = self.grid.start();
        let mut path = VecDeque::new();
        let mut node = self.current;

        for _ in 0..self.grid.len() {
            path.push_front(node);
            if node == start {
                return Ok(path.into());
            }
            node = *self
                .parents
                .get(&node)
                .ok_or(GridError::BrokenPathChain { row: node.row, col: node.col })?;
        }

        Err(GridError::BrokenPathChain { row: node.row, col: node.col })
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Most recently expanded cell
    pub fn current_cell(&self) -> Coord {
        self.current
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Closed set in expansion order
    pub fn expanded_cells(&self) -> &[Coord] {
        &self.closed
    }

    /// Number of entries (including stale ones) waiting in the open set
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    pub fn score_at(&self, row: usize, col: usize) -> Result<CellScores, GridError> {
        let cell = self.grid.cell_at(row, col)?;
        Ok(self.scores[self.grid.index(cell.coord())])
    }

    /// Row-major snapshot of every cell's scores
    pub fn scores(&self) -> &[CellScores] {
        &self.scores
    }

    pub fn parent_of(&self, coord: Coord) -> Option<Coord> {
        self.parents.get(&coord).copied()
    }

    pub fn grid(&self) -> &'g GridWorld {
        self.grid
    }

    /// Run to a terminal status, stepping at most `max_ticks` times
    pub fn run_to_end(&mut self, max_ticks: usize) -> Result<SearchStatus, GridError> {
        for _ in 0..max_ticks {
            if self.step()?.is_terminal() {
                break;
            }
        }
        Ok(self.status)
    }
}

/// Format path for display
pub fn format_path(path: &[Coord]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    path.iter()
        .map(|c| format!("({},{})", c.row, c.col))
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let grid = GridWorld::with_obstacles(1, 5, (0, 0), (0, 4), &[]).unwrap();
        let search = AStar::new(&grid);

        assert_eq!(search.status(), SearchStatus::Initialized);
        assert_eq!(search.current_cell(), Coord::new(0, 0));
        assert_eq!(search.open_len(), 1);

        let start = search.score_at(0, 0).unwrap();
        assert_eq!(start.g_score, 0.0);
        assert_eq!(start.f_score, 4.0);
        assert!(!start.visited);
    }

    #[test]
    fn test_first_step_expands_start() {
        let grid = GridWorld::with_obstacles(1, 5, (0, 0), (0, 4), &[]).unwrap();
        let mut search = AStar::new(&grid);

        assert_eq!(search.step().unwrap(), SearchStatus::Searching);
        assert_eq!(search.expanded_cells(), &[Coord::new(0, 0)]);

        let next = search.score_at(0, 1).unwrap();
        assert_eq!(next.g_score, 1.0);
        assert_eq!(next.f_score, 4.0);
        assert_eq!(next.h_score(), 3.0);
        assert_eq!(search.parent_of(Coord::new(0, 1)), Some(Coord::new(0, 0)));
    }

    #[test]
    fn test_tie_break_prefers_latest_insertion() {
        // From (0,0) both (1,0) and (0,1) get f = 1 + sqrt(5); Right is
        // processed after Down, so (0,1) is expanded first.
        let grid = GridWorld::with_obstacles(3, 3, (0, 0), (2, 2), &[]).unwrap();
        let mut search = AStar::new(&grid);

        search.step().unwrap();
        search.step().unwrap();
        assert_eq!(search.current_cell(), Coord::new(0, 1));
        search.step().unwrap();
        assert_eq!(search.current_cell(), Coord::new(1, 0));
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let grid = GridWorld::with_obstacles(1, 2, (0, 0), (0, 1), &[]).unwrap();
        let mut search = AStar::new(&grid);

        assert_eq!(search.run_to_end(10).unwrap(), SearchStatus::Found);
        let ticks = search.ticks();
        assert_eq!(search.step().unwrap(), SearchStatus::Found);
        assert_eq!(search.ticks(), ticks);
    }

    #[test]
    fn test_best_path_before_found() {
        let grid = GridWorld::with_obstacles(1, 3, (0, 0), (0, 2), &[]).unwrap();
        let mut search = AStar::new(&grid);
        assert_eq!(search.best_path(), Err(GridError::RewardNotReached));

        search.step().unwrap();
        assert_eq!(search.best_path(), Err(GridError::RewardNotReached));
    }

    #[test]
    fn test_broken_parent_chain_is_reported() {
        let grid = GridWorld::with_obstacles(1, 3, (0, 0), (0, 2), &[]).unwrap();
        let mut search = AStar::new(&grid);
        search.run_to_end(10).unwrap();

        search.parents.remove(&Coord::new(0, 1));
        assert_eq!(
            search.best_path(),
            Err(GridError::BrokenPathChain { row: 0, col: 1 })
        );
    }

    #[test]
    fn test_cyclic_parent_chain_terminates() {
        let grid = GridWorld::with_obstacles(1, 4, (0, 0), (0, 3), &[]).unwrap();
        let mut search = AStar::new(&grid);
        search.run_to_end(10).unwrap();

        search.parents.insert(Coord::new(0, 1), Coord::new(0, 2));
        assert!(matches!(
            search.best_path(),
            Err(GridError::BrokenPathChain { .. })
        ));
    }

    #[test]
    fn test_format_path() {
        assert_eq!(format_path(&[]), "No path");
        assert_eq!(
            format_path(&[Coord::new(0, 0), Coord::new(0, 1)]),
            "(0,0) -> (0,1)"
        );
    }
}
