#![allow(dead_code)]

use gridplan::{CellDescriptor, Coord, GridWorld};

/// Build a grid from an ASCII layout.
///
/// `S` start, `R` reward, `#` obstacle, `.` free. Whitespace around rows is
/// ignored and blank lines are skipped.
pub fn grid_from_ascii(layout: &str) -> GridWorld {
    let rows: Vec<Vec<CellDescriptor>> = layout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.chars()
                .map(|ch| match ch {
                    'S' => CellDescriptor::start(),
                    'R' => CellDescriptor::reward(),
                    '#' => CellDescriptor::obstacle(),
                    '.' => CellDescriptor::free(),
                    other => panic!("unexpected layout character {:?}", other),
                })
                .collect()
        })
        .collect();
    GridWorld::from_rows(rows).expect("layout should describe a valid grid")
}

/// Build a grid from a row-major obstacle mask
pub fn grid_from_mask(
    rows: usize,
    cols: usize,
    mask: &[bool],
    start: usize,
    reward: usize,
) -> GridWorld {
    let obstacles: Vec<(usize, usize)> = mask
        .iter()
        .enumerate()
        .filter(|&(i, &blocked)| blocked && i != start && i != reward)
        .map(|(i, _)| (i / cols, i % cols))
        .collect();
    GridWorld::with_obstacles(
        rows,
        cols,
        (start / cols, start % cols),
        (reward / cols, reward % cols),
        &obstacles,
    )
    .expect("mask should describe a valid grid")
}

/// Panic unless `path` runs from start to reward through 4-adjacent open cells
pub fn assert_valid_path(grid: &GridWorld, path: &[Coord]) {
    assert_eq!(path.first(), Some(&grid.start()), "path must begin at the start");
    assert_eq!(path.last(), Some(&grid.reward()), "path must end at the reward");

    for pair in path.windows(2) {
        assert_eq!(pair[0].manhattan(&pair[1]), 1, "{:?} -> {:?} is not a unit move", pair[0], pair[1]);
        let cell = grid.cell_at(pair[1].row, pair[1].col).expect("path stays in bounds");
        assert!(!cell.is_obstacle, "path crosses obstacle {:?}", pair[1]);
    }
}

/// Visualize a path on a grid
pub fn visualize_path(grid: &GridWorld, path: &[Coord]) -> String {
    let mut result = String::new();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let here = Coord::new(row, col);
            let cell = grid.cell_at(row, col).expect("in bounds");
            let symbol = if cell.is_start {
                'S'
            } else if cell.is_reward {
                'R'
            } else if path.contains(&here) {
                '*'
            } else if cell.is_obstacle {
                '#'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }
    result
}

pub fn coords(cells: &[(usize, usize)]) -> Vec<Coord> {
    cells.iter().map(|&c| Coord::from(c)).collect()
}
