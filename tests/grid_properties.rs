mod common;

use std::collections::{HashSet, VecDeque};

use common::{assert_valid_path, grid_from_mask};
use gridplan::{AStar, Coord, Direction, GridWorld, SearchStatus};
use proptest::prelude::*;

fn reachable(grid: &GridWorld) -> HashSet<Coord> {
    let mut seen = HashSet::from([grid.start()]);
    let mut queue = VecDeque::from([grid.start()]);
    while let Some(at) = queue.pop_front() {
        for direction in grid.allowed_directions(at) {
            if let Some(next) = at.step(direction) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
    seen
}

fn arb_grid() -> impl Strategy<Value = GridWorld> {
    (1usize..7, 1usize..7)
        .prop_flat_map(|(rows, cols)| {
            let cells = rows * cols;
            (
                Just(rows),
                Just(cols),
                prop::collection::vec(prop::bool::weighted(0.3), cells),
                0..cells,
                0..cells,
            )
        })
        .prop_filter("start and reward must differ", |(_, _, _, s, r)| s != r)
        .prop_map(|(rows, cols, mask, s, r)| grid_from_mask(rows, cols, &mask, s, r))
}

proptest! {
    #[test]
    fn moves_are_symmetric(grid in arb_grid()) {
        for cell in grid.cells() {
            for direction in Direction::ALL {
                if !grid.can_move(direction, cell.row, cell.col) {
                    continue;
                }
                let target = grid.neighbor(cell, direction).unwrap();
                prop_assert!(!target.is_obstacle);
                // Moves out of an obstacle are allowed, the reverse move never is
                prop_assert_eq!(
                    grid.can_move(direction.opposite(), target.row, target.col),
                    !cell.is_obstacle
                );
            }
        }
    }

    #[test]
    fn search_terminates_with_valid_path(grid in arb_grid()) {
        let free_cells = grid.open_cells().count();
        let mut search = AStar::new(&grid);
        let status = search.run_to_end(grid.len() + 1).unwrap();

        prop_assert!(status.is_terminal());
        prop_assert!(search.ticks() <= free_cells);

        let reachable = reachable(&grid);
        if reachable.contains(&grid.reward()) {
            prop_assert_eq!(status, SearchStatus::Found);
            let path = search.best_path().unwrap();
            assert_valid_path(&grid, &path);
            prop_assert!(path.len() > grid.start().manhattan(&grid.reward()));
        } else {
            prop_assert_eq!(status, SearchStatus::Exhausted);
            prop_assert_eq!(search.expanded_cells().len(), reachable.len());
        }
    }

    #[test]
    fn allowed_directions_match_can_move(grid in arb_grid(), pick in any::<prop::sample::Index>()) {
        let open: Vec<Coord> = grid.open_cells().map(|c| c.coord()).collect();
        let at = open[pick.index(open.len())];
        let allowed = grid.allowed_directions(at);
        for direction in Direction::ALL {
            prop_assert_eq!(allowed.contains(&direction), grid.can_move(direction, at.row, at.col));
        }
    }
}
