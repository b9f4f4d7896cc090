use crate::error::{PlannerError, Result};
use log::{debug, warn};
use rand::Rng;
use rustc_hash::FxHashSet;
use std::fmt;

/// Smallest allowed extent of either grid dimension.
pub const MIN_DIMENSION: usize = 2;
/// Largest allowed extent of either grid dimension.
pub const MAX_DIMENSION: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Obstacle,
    Start,
    Goal,
}

/// Neighbor offsets in expansion order: up, down, left, right.
const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
    start: Position,
    goal: Position,
}

impl Grid {
    /// Builds an empty grid with the start in the top-left corner and the
    /// goal in the bottom-right corner.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        validate_dimensions(rows, cols)?;

        let start = Position::new(0, 0);
        let goal = Position::new(rows - 1, cols - 1);
        let mut cells = vec![vec![Cell::Empty; cols]; rows];
        cells[start.row][start.col] = Cell::Start;
        cells[goal.row][goal.col] = Cell::Goal;

        Ok(Grid {
            rows,
            cols,
            cells,
            start,
            goal,
        })
    }

    /// Replaces the grid with a fresh one of the new size. Obstacles are
    /// dropped and start/goal return to their default corners.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        *self = Grid::new(rows, cols)?;
        debug!("Grid resized to {}x{}", rows, cols);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Returns the cell kind, or `None` for coordinates outside the grid.
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        self.cells.get(pos.row).and_then(|row| row.get(pos.col)).copied()
    }

    /// Out-of-bounds cells count as blocked.
    pub fn is_blocked(&self, pos: Position) -> bool {
        !matches!(
            self.cell(pos),
            Some(Cell::Empty) | Some(Cell::Start) | Some(Cell::Goal)
        )
    }

    pub fn obstacle_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell == Cell::Obstacle)
            .count()
    }

    /// Flips a cell between empty and obstacle and returns its new kind.
    /// Start, goal and out-of-bounds cells are left alone.
    pub fn toggle_obstacle(&mut self, pos: Position) -> Result<Cell> {
        self.check_editable(pos)?;

        let next = match self.cells[pos.row][pos.col] {
            Cell::Obstacle => Cell::Empty,
            _ => Cell::Obstacle,
        };
        self.cells[pos.row][pos.col] = next;
        Ok(next)
    }

    /// One-way obstacle insertion. Fails if the cell is already blocked.
    pub fn place_obstacle(&mut self, pos: Position) -> Result<()> {
        self.check_editable(pos)?;

        if self.cells[pos.row][pos.col] == Cell::Obstacle {
            return Err(PlannerError::RejectedMutation {
                cell: pos,
                reason: "cell is already an obstacle",
            });
        }
        self.cells[pos.row][pos.col] = Cell::Obstacle;
        Ok(())
    }

    pub fn clear_obstacles(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            if *cell == Cell::Obstacle {
                *cell = Cell::Empty;
            }
        }
    }

    pub fn set_start(&mut self, pos: Position) -> Result<()> {
        self.check_placement(pos, self.goal, "start cannot share the goal cell")?;

        self.cells[self.start.row][self.start.col] = Cell::Empty;
        self.cells[pos.row][pos.col] = Cell::Start;
        self.start = pos;
        Ok(())
    }

    pub fn set_goal(&mut self, pos: Position) -> Result<()> {
        self.check_placement(pos, self.start, "goal cannot share the start cell")?;

        self.cells[self.goal.row][self.goal.col] = Cell::Empty;
        self.cells[pos.row][pos.col] = Cell::Goal;
        self.goal = pos;
        Ok(())
    }

    /// Clears existing obstacles, then blocks every other cell independently
    /// with probability `density`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, density: f64, rng: &mut R) -> Result<()> {
        if !(0.0..1.0).contains(&density) {
            return Err(PlannerError::InvalidConfig(format!(
                "obstacle density must be in [0, 1), got {}",
                density
            )));
        }

        self.clear_obstacles();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.cells[row][col] == Cell::Empty && rng.gen::<f64>() < density {
                    self.cells[row][col] = Cell::Obstacle;
                }
            }
        }
        debug!(
            "Randomized grid at density {:.2}: {} obstacles",
            density,
            self.obstacle_count()
        );
        Ok(())
    }

    /// The in-bounds, non-obstacle cells orthogonally adjacent to `pos`,
    /// always in up/down/left/right order.
    pub fn neighbors(&self, pos: Position) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(4);

        for (dr, dc) in DIRECTIONS {
            let (Some(row), Some(col)) = (
                pos.row.checked_add_signed(dr),
                pos.col.checked_add_signed(dc),
            ) else {
                continue;
            };
            let next = Position::new(row, col);
            if !self.is_blocked(next) {
                neighbors.push(next);
            }
        }
        neighbors
    }

    /// Text rendering with an optional agent marker and path overlay.
    pub fn render(&self, agent: Option<Position>, path: &[Position]) -> String {
        let on_path: FxHashSet<Position> = path.iter().copied().collect();
        let mut out = String::new();

        out.push_str("Legend: S=Start, G=Goal, A=Agent, #=Obstacle, *=Path, .=Empty\n");
        out.push_str("   ");
        for col in 0..self.cols {
            out.push_str(&format!("{:2}", col % 10));
        }
        out.push('\n');

        for row in 0..self.rows {
            out.push_str(&format!("{:2} ", row));
            for col in 0..self.cols {
                let pos = Position::new(row, col);
                let symbol = if Some(pos) == agent {
                    'A'
                } else {
                    match self.cells[row][col] {
                        Cell::Start => 'S',
                        Cell::Goal => 'G',
                        Cell::Obstacle => '#',
                        Cell::Empty if on_path.contains(&pos) => '*',
                        Cell::Empty => '.',
                    }
                };
                out.push(' ');
                out.push(symbol);
            }
            out.push('\n');
        }
        out
    }

    pub fn print_grid(&self, agent: Option<Position>, path: &[Position]) {
        println!("{}", self.render(agent, path));
    }

    fn check_editable(&self, pos: Position) -> Result<()> {
        let reason = if !self.in_bounds(pos) {
            "outside the grid"
        } else if pos == self.start {
            "start cell cannot be an obstacle"
        } else if pos == self.goal {
            "goal cell cannot be an obstacle"
        } else {
            return Ok(());
        };

        warn!("Rejected obstacle edit at {}: {}", pos, reason);
        Err(PlannerError::RejectedMutation { cell: pos, reason })
    }

    fn check_placement(&self, pos: Position, other: Position, clash: &'static str) -> Result<()> {
        let reason = if !self.in_bounds(pos) {
            "outside the grid"
        } else if pos == other {
            clash
        } else if self.cells[pos.row][pos.col] == Cell::Obstacle {
            "cell is an obstacle"
        } else {
            return Ok(());
        };

        Err(PlannerError::InvalidPlacement { cell: pos, reason })
    }
}

pub(crate) fn validate_dimensions(rows: usize, cols: usize) -> Result<()> {
    let range = MIN_DIMENSION..=MAX_DIMENSION;
    if range.contains(&rows) && range.contains(&cols) {
        Ok(())
    } else {
        Err(PlannerError::InvalidConfig(format!(
            "grid dimensions must be within {}..={}, got {}x{}",
            MIN_DIMENSION, MAX_DIMENSION, rows, cols
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(rows: usize, cols: usize) -> Grid {
        Grid::new(rows, cols).expect("valid dimensions")
    }

    #[test]
    fn new_grid_places_start_and_goal_in_corners() {
        let g = grid(5, 7);
        assert_eq!(g.start(), Position::new(0, 0));
        assert_eq!(g.goal(), Position::new(4, 6));
        assert_eq!(g.cell(g.start()), Some(Cell::Start));
        assert_eq!(g.cell(g.goal()), Some(Cell::Goal));
        assert_eq!(g.obstacle_count(), 0);
    }

    #[test]
    fn rejects_dimensions_out_of_range() {
        assert!(matches!(Grid::new(1, 5), Err(PlannerError::InvalidConfig(_))));
        assert!(matches!(
            Grid::new(5, MAX_DIMENSION + 1),
            Err(PlannerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn resize_clears_obstacles_and_resets_markers() {
        let mut g = grid(5, 5);
        g.toggle_obstacle(Position::new(2, 2)).unwrap();
        g.set_goal(Position::new(3, 1)).unwrap();

        g.resize(6, 4).unwrap();
        assert_eq!((g.rows(), g.cols()), (6, 4));
        assert_eq!(g.obstacle_count(), 0);
        assert_eq!(g.goal(), Position::new(5, 3));
    }

    #[test]
    fn failed_resize_keeps_old_grid() {
        let mut g = grid(5, 5);
        g.toggle_obstacle(Position::new(1, 1)).unwrap();
        assert!(g.resize(0, 3).is_err());
        assert_eq!(g.rows(), 5);
        assert_eq!(g.obstacle_count(), 1);
    }

    #[test]
    fn toggle_flips_empty_and_obstacle() {
        let mut g = grid(5, 5);
        let pos = Position::new(1, 2);
        assert_eq!(g.toggle_obstacle(pos).unwrap(), Cell::Obstacle);
        assert!(g.is_blocked(pos));
        assert_eq!(g.toggle_obstacle(pos).unwrap(), Cell::Empty);
        assert!(!g.is_blocked(pos));
    }

    #[test]
    fn toggle_on_start_or_goal_is_rejected() {
        let mut g = grid(5, 5);
        for pos in [g.start(), g.goal(), Position::new(9, 9)] {
            assert!(matches!(
                g.toggle_obstacle(pos),
                Err(PlannerError::RejectedMutation { .. })
            ));
        }
        assert_eq!(g.cell(g.start()), Some(Cell::Start));
        assert_eq!(g.cell(g.goal()), Some(Cell::Goal));
    }

    #[test]
    fn place_obstacle_rejects_blocked_cell() {
        let mut g = grid(5, 5);
        let pos = Position::new(3, 3);
        g.place_obstacle(pos).unwrap();
        assert!(g.place_obstacle(pos).is_err());
        assert_eq!(g.obstacle_count(), 1);
    }

    #[test]
    fn start_cannot_move_onto_goal_or_obstacle() {
        let mut g = grid(5, 5);
        let goal = g.goal();
        assert!(matches!(
            g.set_start(goal),
            Err(PlannerError::InvalidPlacement { .. })
        ));

        let wall = Position::new(2, 2);
        g.toggle_obstacle(wall).unwrap();
        assert!(g.set_start(wall).is_err());
        assert_eq!(g.start(), Position::new(0, 0));
        assert_eq!(g.cell(wall), Some(Cell::Obstacle));
    }

    #[test]
    fn moving_start_clears_old_marker() {
        let mut g = grid(5, 5);
        g.set_start(Position::new(2, 3)).unwrap();
        assert_eq!(g.cell(Position::new(0, 0)), Some(Cell::Empty));
        assert_eq!(g.cell(Position::new(2, 3)), Some(Cell::Start));

        let start = g.start();
        assert!(g.set_goal(start).is_err());
        assert_eq!(g.goal(), Position::new(4, 4));
    }

    #[test]
    fn neighbors_are_ordered_and_in_bounds() {
        let g = grid(5, 5);
        assert_eq!(
            g.neighbors(Position::new(2, 2)),
            vec![
                Position::new(1, 2),
                Position::new(3, 2),
                Position::new(2, 1),
                Position::new(2, 3),
            ]
        );
        assert_eq!(
            g.neighbors(Position::new(0, 0)),
            vec![Position::new(1, 0), Position::new(0, 1)]
        );
    }

    #[test]
    fn neighbors_skip_obstacles_but_include_goal() {
        let mut g = grid(5, 5);
        g.toggle_obstacle(Position::new(3, 4)).unwrap();
        let around = g.neighbors(Position::new(4, 3));
        assert!(around.contains(&g.goal()));
        assert!(!around.contains(&Position::new(3, 4)));
    }

    #[test]
    fn randomize_respects_markers_and_density_bounds() {
        let mut g = grid(20, 20);
        let mut rng = StdRng::seed_from_u64(7);
        g.randomize(0.5, &mut rng).unwrap();
        assert!(g.obstacle_count() > 0);
        assert_eq!(g.cell(g.start()), Some(Cell::Start));
        assert_eq!(g.cell(g.goal()), Some(Cell::Goal));

        let before = g.obstacle_count();
        assert!(g.randomize(1.0, &mut rng).is_err());
        assert!(g.randomize(-0.1, &mut rng).is_err());
        assert_eq!(g.obstacle_count(), before);

        g.randomize(0.0, &mut rng).unwrap();
        assert_eq!(g.obstacle_count(), 0);
    }

    #[test]
    fn render_marks_agent_and_path() {
        let mut g = grid(2, 3);
        g.toggle_obstacle(Position::new(1, 0)).unwrap();
        let text = g.render(Some(Position::new(0, 1)), &[Position::new(0, 2)]);
        let rows: Vec<&str> = text.lines().skip(2).collect();
        assert_eq!(rows, vec![" 0  S A *", " 1  # . G"]);
    }
}
