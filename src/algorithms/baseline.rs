use crate::grid::{Grid, Position};
use pathfinding::prelude::astar;

/// Length in steps of the shortest route between two cells, computed with
/// the `pathfinding` crate's A* and no tracing. Used as a reference when
/// rating how far a traversal strayed from the best route.
///
/// Returns `None` when the goal cannot be reached.
pub fn shortest_path_length(grid: &Grid, start: Position, goal: Position) -> Option<usize> {
    if grid.is_blocked(start) || grid.is_blocked(goal) {
        return None;
    }

    astar(
        &start,
        |p| {
            grid.neighbors(*p)
                .into_iter()
                .map(|successor| (successor, 1usize))
                .collect::<Vec<_>>()
        },
        |p| p.row.abs_diff(goal.row) + p.col.abs_diff(goal.col),
        |p| *p == goal,
    )
    .map(|(_, cost)| cost)
}
