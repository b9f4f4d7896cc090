//! Single-owner facade over the grid, the search engine and the replanner.
//!
//! A presentation layer drives everything through this type: grid edits,
//! one-shot searches with timing, and tick-by-tick traversal with dynamic
//! obstacles.

use crate::algorithms::{search, Algorithm, PathResult};
use crate::error::{PlannerError, Result};
use crate::grid::{Cell, Grid, Position};
use crate::heuristics::Heuristic;
use crate::replanner::{spawn_roll, InsertionOutcome, Replanner, StepOutcome};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// Read-only numbers from the most recent `run_search` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchMetrics {
    pub algorithm: Algorithm,
    pub heuristic: Heuristic,
    pub nodes_visited: usize,
    pub path_cost: usize,
    pub duration: Duration,
}

#[derive(Clone)]
pub struct Session {
    grid: Grid,
    rng: StdRng,
    replanner: Option<Replanner>,
    metrics: Option<SearchMetrics>,
}

impl Session {
    /// A fresh `rows` x `cols` grid. A seed makes map generation and
    /// obstacle spawning reproducible.
    pub fn new(rows: usize, cols: usize, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Session {
            grid: Grid::new(rows, cols)?,
            rng,
            replanner: None,
            metrics: None,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn replanner(&self) -> Option<&Replanner> {
        self.replanner.as_ref()
    }

    /// Numbers from the last `run_search`. Re-plans during a traversal do
    /// not touch these; their running totals live on the `Replanner`
    /// (`nodes_visited`, `search_times`, `segment_cost_total`).
    pub fn metrics(&self) -> Option<&SearchMetrics> {
        self.metrics.as_ref()
    }

    pub fn configure(&mut self, rows: usize, cols: usize) -> Result<()> {
        self.grid.resize(rows, cols)?;
        self.metrics = None;
        self.end_traversal();
        Ok(())
    }

    pub fn toggle_obstacle(&mut self, cell: Position) -> Result<Cell> {
        let kind = self.grid.toggle_obstacle(cell)?;
        self.end_traversal();
        Ok(kind)
    }

    pub fn set_start(&mut self, cell: Position) -> Result<()> {
        self.grid.set_start(cell)?;
        self.end_traversal();
        Ok(())
    }

    pub fn set_goal(&mut self, cell: Position) -> Result<()> {
        self.grid.set_goal(cell)?;
        self.end_traversal();
        Ok(())
    }

    pub fn randomize(&mut self, density: f64) -> Result<()> {
        self.grid.randomize(density, &mut self.rng)?;
        self.end_traversal();
        Ok(())
    }

    pub fn clear_obstacles(&mut self) {
        self.grid.clear_obstacles();
        self.end_traversal();
    }

    /// Searches from the grid's start to its goal and records timing.
    /// Never touches the grid or an active traversal.
    pub fn run_search(&mut self, algorithm: Algorithm, heuristic: Heuristic) -> PathResult {
        let started = Instant::now();
        let result = search(
            &self.grid,
            self.grid.start(),
            self.grid.goal(),
            algorithm,
            heuristic,
        );
        let duration = started.elapsed();

        info!(
            "{} + {} | {} nodes | cost {} | {:.2?}",
            algorithm, heuristic, result.nodes_visited, result.cost, duration
        );
        self.metrics = Some(SearchMetrics {
            algorithm,
            heuristic,
            nodes_visited: result.nodes_visited,
            path_cost: result.cost,
            duration,
        });
        result
    }

    /// Plans a route and places the agent on the start, replacing any
    /// traversal already in progress.
    pub fn begin_traversal(&mut self, algorithm: Algorithm, heuristic: Heuristic) -> &Replanner {
        let mut replanner = Replanner::new(algorithm, heuristic);
        replanner.plan(&self.grid);
        debug!("Traversal started in state {}", replanner.state());
        self.replanner.insert(replanner)
    }

    pub fn step_agent(&mut self) -> StepOutcome {
        match self.replanner.as_mut() {
            Some(replanner) => replanner.step(),
            None => StepOutcome::Halted,
        }
    }

    /// Places an obstacle at `cell` if the spawn roll at `probability`
    /// succeeds. With an active traversal the replanner decides whether
    /// the path needs recomputing.
    pub fn insert_dynamic_obstacle(&mut self, cell: Position, probability: f64) -> Result<InsertionOutcome> {
        if !spawn_roll(probability, &mut self.rng)? {
            return Ok(InsertionOutcome::Skipped);
        }

        match self.replanner.as_mut() {
            Some(replanner) => replanner.insert_obstacle(&mut self.grid, cell),
            None => {
                self.grid.place_obstacle(cell)?;
                Ok(InsertionOutcome::Accepted)
            }
        }
    }

    /// Rolls the spawn gate and drops an obstacle on a random free cell.
    /// Requires an active traversal so the agent's cell can be avoided.
    pub fn spawn_dynamic_obstacle(&mut self, probability: f64) -> Result<Option<(Position, InsertionOutcome)>> {
        let Some(replanner) = self.replanner.as_mut() else {
            return Err(PlannerError::InvalidConfig(
                "no traversal in progress".to_string(),
            ));
        };
        replanner.try_spawn_obstacle(&mut self.grid, probability, &mut self.rng)
    }

    fn end_traversal(&mut self) {
        if self.replanner.take().is_some() {
            debug!("Grid edited, traversal dropped");
        }
    }
}
