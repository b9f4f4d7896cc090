//! Grid pathfinding with A* and greedy best-first search, plus a replanner
//! that recomputes the route only when a new obstacle cuts the part of the
//! path the agent has not walked yet.

pub mod algorithms;
pub mod config;
pub mod error;
pub mod grid;
pub mod heuristics;
pub mod replanner;
pub mod session;
pub mod simulation;
pub mod statistics;

pub use algorithms::{search, Algorithm, PathResult, TraceEvent, TraceRole};
pub use error::{PlannerError, Result};
pub use grid::{Cell, Grid, Position};
pub use heuristics::Heuristic;
pub use replanner::{InsertionOutcome, ReplanState, Replanner, StepOutcome};
pub use session::{SearchMetrics, Session};
