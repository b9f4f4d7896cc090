use crate::algorithms::common::{Algorithm, PathResult, TraceEvent, TraceRole};
use crate::grid::{Grid, Position};
use crate::heuristics::Heuristic;
use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Frontier entry. Ordering is reversed so `BinaryHeap` pops the lowest
/// priority first, and among equal priorities the earliest insertion.
#[derive(Clone, Copy, Debug)]
struct QueueEntry {
    priority: f64,
    seq: u64,
    pos: Position,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-priority queue with FIFO tie-breaking. Every push is mirrored into
/// the trace so consumers can replay the search.
struct Frontier {
    heap: BinaryHeap<QueueEntry>,
    next_seq: u64,
}

impl Frontier {
    fn new() -> Self {
        Frontier {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    fn push(&mut self, pos: Position, priority: f64, events: &mut Vec<TraceEvent>) {
        self.heap.push(QueueEntry {
            priority,
            seq: self.next_seq,
            pos,
        });
        self.next_seq += 1;
        events.push(TraceEvent {
            cell: pos,
            role: TraceRole::FrontierAdded,
        });
    }

    fn pop(&mut self) -> Option<QueueEntry> {
        self.heap.pop()
    }
}

/// Runs A* or greedy best-first search from `start` to `goal`.
///
/// Both algorithms share the frontier, closed set and parent map. They
/// differ only in the priority formula and in whether a cheaper route to an
/// already discovered cell re-opens it (A* only).
///
/// An unreachable goal is not an error: the returned result has an empty
/// path and still carries the full trace of what was explored.
pub fn search(
    grid: &Grid,
    start: Position,
    goal: Position,
    algorithm: Algorithm,
    heuristic: Heuristic,
) -> PathResult {
    debug!(
        "{} ({}) search from {} to {}",
        algorithm, heuristic, start, goal
    );

    if grid.is_blocked(start) || grid.is_blocked(goal) {
        debug!("Start or goal is blocked or out of bounds, nothing to search");
        return PathResult::default();
    }

    let mut frontier = Frontier::new();
    let mut events = Vec::new();
    let mut parents: FxHashMap<Position, Position> = FxHashMap::default();
    // Steps from start along the recorded parent chain. GBFS only uses the
    // keys, as its discovered set.
    let mut g_scores: FxHashMap<Position, usize> = FxHashMap::default();
    let mut closed: FxHashSet<Position> = FxHashSet::default();
    let mut nodes_visited = 0;

    g_scores.insert(start, 0);
    frontier.push(start, heuristic.estimate(start, goal), &mut events);

    while let Some(QueueEntry { pos: current, .. }) = frontier.pop() {
        // Stale duplicate left behind by an A* re-open.
        if !closed.insert(current) {
            continue;
        }
        nodes_visited += 1;
        events.push(TraceEvent {
            cell: current,
            role: TraceRole::Visited,
        });
        trace!("Expanding {}", current);

        if current == goal {
            let path = reconstruct_path(&parents, start, goal);
            let cost = if algorithm.tracks_cost() {
                g_scores.get(&goal).copied().unwrap_or_default()
            } else {
                path.len().saturating_sub(1)
            };
            debug!(
                "Goal reached: cost {}, {} nodes visited",
                cost, nodes_visited
            );
            return PathResult {
                path,
                cost,
                nodes_visited,
                trace: events,
            };
        }

        let g_current = g_scores.get(&current).copied().unwrap_or_default();
        for neighbor in grid.neighbors(current) {
            if closed.contains(&neighbor) {
                continue;
            }

            let tentative = g_current + 1;
            let improves = match g_scores.get(&neighbor) {
                None => true,
                Some(&known) => algorithm.tracks_cost() && tentative < known,
            };
            if !improves {
                continue;
            }

            g_scores.insert(neighbor, tentative);
            parents.insert(neighbor, current);

            let h = heuristic.estimate(neighbor, goal);
            let priority = match algorithm {
                Algorithm::AStar => tentative as f64 + h,
                Algorithm::Gbfs => h,
            };
            frontier.push(neighbor, priority, &mut events);
        }
    }

    debug!(
        "Frontier exhausted after {} nodes, goal unreachable",
        nodes_visited
    );
    PathResult {
        path: Vec::new(),
        cost: 0,
        nodes_visited,
        trace: events,
    }
}

/// Walks parent links back from the goal and flips the chain.
fn reconstruct_path(
    parents: &FxHashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;

    while current != start {
        match parents.get(&current) {
            Some(&parent) => {
                path.push(parent);
                current = parent;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::baseline::shortest_path_length;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn open_grid(rows: usize, cols: usize) -> Grid {
        Grid::new(rows, cols).unwrap()
    }

    fn assert_contiguous(grid: &Grid, path: &[Position]) {
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!(a.row.abs_diff(b.row) + a.col.abs_diff(b.col), 1);
            assert!(!grid.is_blocked(b));
        }
    }

    #[test]
    fn queue_pops_lowest_priority_then_oldest() {
        let mut frontier = Frontier::new();
        let mut log = Vec::new();
        frontier.push(Position::new(0, 0), 2.0, &mut log);
        frontier.push(Position::new(0, 1), 1.0, &mut log);
        frontier.push(Position::new(0, 2), 1.0, &mut log);
        frontier.push(Position::new(0, 3), 0.5, &mut log);

        let order: Vec<Position> = std::iter::from_fn(|| frontier.pop().map(|e| e.pos)).collect();
        assert_eq!(
            order,
            vec![
                Position::new(0, 3),
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(0, 0),
            ]
        );
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn five_by_five_astar_manhattan() {
        let grid = open_grid(5, 5);
        let result = search(
            &grid,
            grid.start(),
            grid.goal(),
            Algorithm::AStar,
            Heuristic::Manhattan,
        );
        assert_eq!(result.path.len(), 9);
        assert_eq!(result.cost, 8);
        assert!(result.nodes_visited <= 25);
        assert_eq!(result.path.first(), Some(&grid.start()));
        assert_eq!(result.path.last(), Some(&grid.goal()));
        assert_contiguous(&grid, &result.path);
    }

    #[test]
    fn open_grid_paths_match_manhattan_distance() {
        let grid = open_grid(7, 9);
        let start = Position::new(5, 1);
        let goal = Position::new(2, 7);
        for algorithm in Algorithm::ALL {
            let result = search(&grid, start, goal, algorithm, Heuristic::Manhattan);
            assert_eq!(result.cost, 9, "{}", algorithm);
            assert_eq!(result.path.len(), 10);
        }
    }

    #[test]
    fn enclosed_start_yields_empty_result() {
        let mut grid = open_grid(5, 5);
        grid.toggle_obstacle(Position::new(0, 1)).unwrap();
        grid.toggle_obstacle(Position::new(1, 0)).unwrap();

        for algorithm in Algorithm::ALL {
            let result = search(
                &grid,
                grid.start(),
                grid.goal(),
                algorithm,
                Heuristic::Manhattan,
            );
            assert!(!result.is_found());
            assert_eq!(result.cost, 0);
            assert_eq!(result.nodes_visited, 1);
            assert_eq!(result.visited_cells().collect::<Vec<_>>(), vec![grid.start()]);
        }
    }

    #[test]
    fn blocked_endpoint_short_circuits() {
        let mut grid = open_grid(4, 4);
        let wall = Position::new(2, 2);
        grid.toggle_obstacle(wall).unwrap();
        let result = search(&grid, wall, grid.goal(), Algorithm::AStar, Heuristic::Manhattan);
        assert_eq!(result, PathResult::default());

        let outside = Position::new(10, 0);
        let result = search(&grid, grid.start(), outside, Algorithm::Gbfs, Heuristic::Euclidean);
        assert!(result.trace.is_empty());
    }

    #[test]
    fn start_equal_to_goal_is_a_zero_cost_path() {
        let grid = open_grid(3, 3);
        let cell = Position::new(1, 1);
        let result = search(&grid, cell, cell, Algorithm::AStar, Heuristic::Euclidean);
        assert_eq!(result.path, vec![cell]);
        assert_eq!(result.cost, 0);
        assert_eq!(result.nodes_visited, 1);
    }

    #[test]
    fn trace_starts_with_start_and_visits_each_cell_once() {
        let mut grid = open_grid(8, 8);
        let mut rng = StdRng::seed_from_u64(11);
        grid.randomize(0.25, &mut rng).unwrap();

        for algorithm in Algorithm::ALL {
            let result = search(
                &grid,
                grid.start(),
                grid.goal(),
                algorithm,
                Heuristic::Euclidean,
            );
            assert_eq!(
                result.trace.first(),
                Some(&TraceEvent {
                    cell: grid.start(),
                    role: TraceRole::FrontierAdded
                })
            );
            let visited: Vec<Position> = result.visited_cells().collect();
            let unique: FxHashSet<Position> = visited.iter().copied().collect();
            assert_eq!(visited.len(), unique.len());
            assert_eq!(visited.len(), result.nodes_visited);
        }
    }

    #[test]
    fn gbfs_goes_straight_when_nothing_is_in_the_way() {
        let grid = open_grid(5, 5);
        let result = search(
            &grid,
            grid.start(),
            grid.goal(),
            Algorithm::Gbfs,
            Heuristic::Manhattan,
        );
        // Greedy search only expands cells on its own path here.
        assert_eq!(result.nodes_visited, result.path.len());
    }

    #[test]
    fn gbfs_finds_a_route_around_a_wall() {
        // Only gap in the wall is at the bottom row.
        let mut grid = open_grid(7, 7);
        for row in 0..6 {
            grid.toggle_obstacle(Position::new(row, 3)).unwrap();
        }
        grid.set_start(Position::new(0, 0)).unwrap();
        grid.set_goal(Position::new(0, 6)).unwrap();

        let astar = search(&grid, grid.start(), grid.goal(), Algorithm::AStar, Heuristic::Manhattan);
        let gbfs = search(&grid, grid.start(), grid.goal(), Algorithm::Gbfs, Heuristic::Manhattan);
        assert_eq!(astar.cost, 18);
        assert!(gbfs.is_found());
        assert!(astar.cost <= gbfs.cost);
        assert_contiguous(&grid, &gbfs.path);
    }

    #[test]
    fn astar_lowers_the_cost_of_a_cell_found_again_by_a_shorter_route() {
        // ......
        // .#..#S
        // G#....
        // The bottom row is expanded first and reaches (1,2) the long way.
        let mut grid = open_grid(3, 6);
        grid.set_start(Position::new(1, 5)).unwrap();
        grid.set_goal(Position::new(2, 0)).unwrap();
        for wall in [Position::new(1, 1), Position::new(1, 4), Position::new(2, 1)] {
            grid.toggle_obstacle(wall).unwrap();
        }

        let result = search(&grid, grid.start(), grid.goal(), Algorithm::AStar, Heuristic::Manhattan);
        assert_eq!(Some(result.cost), shortest_path_length(&grid, grid.start(), grid.goal()));
        assert_eq!(result.cost, 8);
        assert_eq!(
            result.path,
            vec![
                Position::new(1, 5),
                Position::new(0, 5),
                Position::new(0, 4),
                Position::new(0, 3),
                Position::new(0, 2),
                Position::new(0, 1),
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(2, 0),
            ]
        );
    }

    #[test]
    fn gbfs_keeps_the_first_parent_it_records() {
        // G#..S
        // .#...
        // .#..#
        // ..#..
        // .....
        // (2,3) is first reached through (2,2); the shorter link from (1,3)
        // arrives later and is ignored.
        let mut grid = open_grid(5, 5);
        grid.set_start(Position::new(0, 4)).unwrap();
        grid.set_goal(Position::new(0, 0)).unwrap();
        for wall in [
            Position::new(0, 1),
            Position::new(1, 1),
            Position::new(2, 1),
            Position::new(2, 4),
            Position::new(3, 2),
        ] {
            grid.toggle_obstacle(wall).unwrap();
        }

        let result = search(&grid, grid.start(), grid.goal(), Algorithm::Gbfs, Heuristic::Euclidean);
        assert_eq!(
            result.path,
            vec![
                Position::new(0, 4),
                Position::new(0, 3),
                Position::new(0, 2),
                Position::new(1, 2),
                Position::new(2, 2),
                Position::new(2, 3),
                Position::new(3, 3),
                Position::new(4, 3),
                Position::new(4, 2),
                Position::new(4, 1),
                Position::new(3, 1),
                Position::new(3, 0),
                Position::new(2, 0),
                Position::new(1, 0),
                Position::new(0, 0),
            ]
        );
        assert_eq!(result.cost, 14);
        assert_eq!(result.nodes_visited, 17);

        let pushes: Vec<Position> = result.frontier_cells().collect();
        let unique: FxHashSet<Position> = pushes.iter().copied().collect();
        assert_eq!(pushes.len(), unique.len());

        let astar = search(&grid, grid.start(), grid.goal(), Algorithm::AStar, Heuristic::Euclidean);
        assert_eq!(astar.cost, 12);
    }

    #[test]
    fn astar_matches_independent_shortest_path() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..40 {
            let mut grid = open_grid(12, 12);
            grid.randomize(0.3, &mut rng).unwrap();
            let oracle = shortest_path_length(&grid, grid.start(), grid.goal());

            for heuristic in Heuristic::ALL {
                let result = search(&grid, grid.start(), grid.goal(), Algorithm::AStar, heuristic);
                match oracle {
                    Some(length) => {
                        assert_eq!(result.cost, length);
                        assert_contiguous(&grid, &result.path);
                    }
                    None => assert!(!result.is_found()),
                }
            }
        }
    }
}
