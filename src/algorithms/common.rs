use crate::grid::Position;
use clap::ValueEnum;
use std::fmt;

/// Which priority formula the search engine runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Algorithm {
    /// `f(n) = g(n) + h(n)`, re-opens nodes reached more cheaply.
    AStar,
    /// Greedy best-first search, `f(n) = h(n)`.
    Gbfs,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::AStar, Algorithm::Gbfs];

    pub(crate) fn tracks_cost(self) -> bool {
        matches!(self, Algorithm::AStar)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::AStar => write!(f, "A*"),
            Algorithm::Gbfs => write!(f, "Greedy BFS"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceRole {
    /// The cell was pushed onto the frontier.
    FrontierAdded,
    /// The cell was popped from the frontier and expanded.
    Visited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceEvent {
    pub cell: Position,
    pub role: TraceRole,
}

/// Outcome of a single search call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathResult {
    /// Start to goal inclusive, empty when the goal is unreachable.
    pub path: Vec<Position>,
    /// Number of unit steps along `path`.
    pub cost: usize,
    /// Cells popped from the frontier and expanded.
    pub nodes_visited: usize,
    /// Every frontier push and expansion in the order they happened.
    pub trace: Vec<TraceEvent>,
}

impl PathResult {
    pub fn is_found(&self) -> bool {
        !self.path.is_empty()
    }

    /// Expanded cells in expansion order.
    pub fn visited_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.trace
            .iter()
            .filter(|event| event.role == TraceRole::Visited)
            .map(|event| event.cell)
    }

    /// Cells in push order. A* may list a cell twice when it was re-opened.
    pub fn frontier_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.trace
            .iter()
            .filter(|event| event.role == TraceRole::FrontierAdded)
            .map(|event| event.cell)
    }
}
