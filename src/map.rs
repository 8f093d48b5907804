//! Text grid maps: one row per line, comma separated cell codes.
//!
//! Codes: `0` free, `1` agent start, `2` reward, `3` obstacle. Blank lines
//! are ignored and whitespace around codes is trimmed.

use crate::error::GridError;
use crate::grid::{CellDescriptor, GridWorld};

pub const FREE_CODE: &str = "0";
pub const START_CODE: &str = "1";
pub const REWARD_CODE: &str = "2";
pub const OBSTACLE_CODE: &str = "3";

/// Parse a grid map and validate it into a `GridWorld`
pub fn parse_grid_map(text: &str) -> Result<GridWorld, GridError> {
    let mut rows: Vec<Vec<CellDescriptor>> = Vec::new();
    let mut width: Option<usize> = None;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row = line
            .split(',')
            .map(|token| parse_code(token.trim(), line_no + 1))
            .collect::<Result<Vec<_>, _>>()?;

        match width {
            None => width = Some(row.len()),
            Some(w) if w != row.len() => {
                return Err(GridError::MalformedMap {
                    line: line_no + 1,
                    reason: format!("expected {} cells, found {}", w, row.len()),
                });
            }
            Some(_) => {}
        }
        rows.push(row);
    }

    GridWorld::from_rows(rows)
}

fn parse_code(token: &str, line: usize) -> Result<CellDescriptor, GridError> {
    match token {
        FREE_CODE => Ok(CellDescriptor::free()),
        START_CODE => Ok(CellDescriptor::start()),
        REWARD_CODE => Ok(CellDescriptor::reward()),
        OBSTACLE_CODE => Ok(CellDescriptor::obstacle()),
        other => Err(GridError::MalformedMap {
            line,
            reason: format!("unknown cell code {:?}", other),
        }),
    }
}

/// Render a grid back into map text
pub fn to_map_text(grid: &GridWorld) -> String {
    let mut out = String::new();
    for row in 0..grid.rows() {
        let codes: Vec<&str> = (0..grid.cols())
            .map(|col| {
                let idx = row * grid.cols() + col;
                let cell = &grid.cells()[idx];
                if cell.is_obstacle {
                    OBSTACLE_CODE
                } else if cell.is_start {
                    START_CODE
                } else if cell.is_reward {
                    REWARD_CODE
                } else {
                    FREE_CODE
                }
            })
            .collect();
        out.push_str(&codes.join(","));
        out.push('\n');
    }
    out
}
