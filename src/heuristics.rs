//! Distance estimates between two cells.
//!
//! Both estimates are admissible for 4-connected unit-cost movement, so A*
//! stays optimal with either. Manhattan is also consistent and usually
//! expands fewer nodes.

use crate::grid::Position;
use clap::ValueEnum;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Heuristic {
    Manhattan,
    Euclidean,
}

impl Heuristic {
    pub const ALL: [Heuristic; 2] = [Heuristic::Manhattan, Heuristic::Euclidean];

    pub fn estimate(self, from: Position, to: Position) -> f64 {
        match self {
            Heuristic::Manhattan => manhattan(from, to),
            Heuristic::Euclidean => euclidean(from, to),
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Heuristic::Manhattan => write!(f, "Manhattan"),
            Heuristic::Euclidean => write!(f, "Euclidean"),
        }
    }
}

/// `|Δrow| + |Δcol|`
pub fn manhattan(a: Position, b: Position) -> f64 {
    (a.row.abs_diff(b.row) + a.col.abs_diff(b.col)) as f64
}

/// Straight-line distance.
pub fn euclidean(a: Position, b: Position) -> f64 {
    let dr = a.row.abs_diff(b.row) as f64;
    let dc = a.col.abs_diff(b.col) as f64;
    dr.hypot(dc)
}
