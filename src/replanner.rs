//! Walks an agent along a planned path and re-plans only when a new
//! obstacle lands on the part of the path it has not walked yet.

use crate::algorithms::{search, Algorithm, PathResult};
use crate::error::{PlannerError, Result};
use crate::grid::{Grid, Position};
use crate::heuristics::Heuristic;
use log::{debug, info, trace, warn};
use rand::Rng;
use std::fmt;
use std::time::{Duration, Instant};

/// Cells tried per spawn attempt before giving up on that tick.
const SPAWN_ATTEMPTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplanState {
    Idle,
    Executing,
    Blocked,
    Replanning,
    Completed,
    Unreachable,
}

impl ReplanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReplanState::Completed | ReplanState::Unreachable)
    }
}

impl fmt::Display for ReplanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved(Position),
    /// The agent stepped onto the goal.
    Arrived(Position),
    /// Nothing to do: no active path, or the traversal already ended.
    Halted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertionOutcome {
    /// The spawn roll said no; the grid was not touched.
    Skipped,
    /// The obstacle is in place and the active path is unaffected.
    Accepted,
    /// The obstacle cut the remaining path and a new route was found.
    PathInvalidated(PathResult),
    /// The obstacle cut the remaining path and no route is left.
    PathUnreachable,
}

/// Rolls the spawn gate. `probability` must lie in `[0, 1]`.
pub fn spawn_roll<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> Result<bool> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(PlannerError::InvalidConfig(format!(
            "spawn probability must be in [0, 1], got {}",
            probability
        )));
    }
    Ok(rng.gen::<f64>() < probability)
}

#[derive(Debug, Clone)]
pub struct Replanner {
    algorithm: Algorithm,
    heuristic: Heuristic,
    state: ReplanState,
    history: Vec<ReplanState>,
    agent: Position,
    goal: Position,
    path: Vec<Position>,
    next_index: usize,
    last_result: PathResult,
    search_times: Vec<Duration>,
    replans: usize,
    moves: usize,
    nodes_visited: usize,
    segment_cost_total: usize,
}

impl Replanner {
    pub fn new(algorithm: Algorithm, heuristic: Heuristic) -> Self {
        Replanner {
            algorithm,
            heuristic,
            state: ReplanState::Idle,
            history: vec![ReplanState::Idle],
            agent: Position::new(0, 0),
            goal: Position::new(0, 0),
            path: Vec::new(),
            next_index: 0,
            last_result: PathResult::default(),
            search_times: Vec::new(),
            replans: 0,
            moves: 0,
            nodes_visited: 0,
            segment_cost_total: 0,
        }
    }

    /// Plans from the grid's start to its goal and places the agent on the
    /// start. Only valid from `Idle`; later calls return the active result.
    pub fn plan(&mut self, grid: &Grid) -> &PathResult {
        if self.state != ReplanState::Idle {
            warn!("plan() called in state {}, ignoring", self.state);
            return &self.last_result;
        }

        self.agent = grid.start();
        self.goal = grid.goal();
        let result = self.run_search(grid);
        self.adopt(result);
        &self.last_result
    }

    pub fn state(&self) -> ReplanState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[ReplanState] {
        &self.history
    }

    pub fn agent(&self) -> Position {
        self.agent
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
    }

    /// The active path, including cells already walked.
    pub fn path(&self) -> &[Position] {
        &self.path
    }

    /// Cells of the active path the agent has not reached yet.
    pub fn remaining_path(&self) -> &[Position] {
        self.path.get(self.next_index..).unwrap_or_default()
    }

    /// Result of the most recent search, initial or re-plan.
    pub fn last_result(&self) -> &PathResult {
        &self.last_result
    }

    pub fn search_invocations(&self) -> usize {
        self.search_times.len()
    }

    pub fn search_times(&self) -> &[Duration] {
        &self.search_times
    }

    pub fn replans(&self) -> usize {
        self.replans
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Nodes expanded over the initial search and every re-plan.
    pub fn nodes_visited(&self) -> usize {
        self.nodes_visited
    }

    /// Sum of the costs of every path found, initial search and re-plans.
    pub fn segment_cost_total(&self) -> usize {
        self.segment_cost_total
    }

    /// Advances the agent one cell along the active path.
    pub fn step(&mut self) -> StepOutcome {
        if self.state != ReplanState::Executing {
            return StepOutcome::Halted;
        }

        let Some(&next) = self.path.get(self.next_index) else {
            return StepOutcome::Halted;
        };
        self.agent = next;
        self.next_index += 1;
        self.moves += 1;
        trace!("Agent moved to {}", next);

        if next == self.goal {
            info!("Agent reached the goal at {} after {} moves", next, self.moves);
            self.transition(ReplanState::Completed);
            return StepOutcome::Arrived(next);
        }
        StepOutcome::Moved(next)
    }

    /// Inserts an obstacle at `cell`. The agent's cell and the goal are
    /// never accepted. While executing, an obstacle on the remaining path
    /// triggers exactly one re-plan from the agent's current cell; anywhere
    /// else it triggers none.
    pub fn insert_obstacle(&mut self, grid: &mut Grid, cell: Position) -> Result<InsertionOutcome> {
        if self.state != ReplanState::Idle {
            let reason = if cell == self.agent {
                Some("agent occupies the cell")
            } else if cell == self.goal {
                Some("goal cell cannot be an obstacle")
            } else {
                None
            };
            if let Some(reason) = reason {
                warn!("Rejected obstacle at {}: {}", cell, reason);
                return Err(PlannerError::RejectedMutation { cell, reason });
            }
        }

        grid.place_obstacle(cell)?;

        if self.state != ReplanState::Executing || !self.remaining_path().contains(&cell) {
            debug!("Obstacle at {} leaves the active path intact", cell);
            return Ok(InsertionOutcome::Accepted);
        }

        debug!("Obstacle at {} blocks the remaining path", cell);
        self.transition(ReplanState::Blocked);
        Ok(self.replan(grid))
    }

    /// Rolls the spawn gate and, on success, drops an obstacle on a random
    /// free cell that is not the start, the goal or the agent. Returns the
    /// cell that was filled, if any. Nothing spawns once the traversal has
    /// ended.
    pub fn try_spawn_obstacle<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        probability: f64,
        rng: &mut R,
    ) -> Result<Option<(Position, InsertionOutcome)>> {
        if self.state.is_terminal() {
            return Ok(None);
        }
        if !spawn_roll(probability, rng)? {
            return Ok(None);
        }

        for _ in 0..SPAWN_ATTEMPTS {
            let cell = Position::new(rng.gen_range(0..grid.rows()), rng.gen_range(0..grid.cols()));
            if cell == grid.start()
                || cell == grid.goal()
                || cell == self.agent
                || cell == self.goal
                || grid.is_blocked(cell)
            {
                continue;
            }
            let outcome = self.insert_obstacle(grid, cell)?;
            return Ok(Some((cell, outcome)));
        }
        Ok(None)
    }

    fn replan(&mut self, grid: &Grid) -> InsertionOutcome {
        self.transition(ReplanState::Replanning);
        self.replans += 1;

        let result = self.run_search(grid);
        let outcome = if result.is_found() {
            InsertionOutcome::PathInvalidated(result.clone())
        } else {
            InsertionOutcome::PathUnreachable
        };
        self.adopt(result);
        outcome
    }

    /// Searches from the agent's current cell, discarding earlier traces.
    fn run_search(&mut self, grid: &Grid) -> PathResult {
        let started = Instant::now();
        let result = search(grid, self.agent, self.goal, self.algorithm, self.heuristic);
        self.search_times.push(started.elapsed());
        self.nodes_visited += result.nodes_visited;
        self.segment_cost_total += result.cost;
        result
    }

    fn adopt(&mut self, result: PathResult) {
        if result.is_found() {
            self.path = result.path.clone();
            self.next_index = 1;
            if self.agent == self.goal {
                self.transition(ReplanState::Completed);
            } else {
                self.transition(ReplanState::Executing);
            }
        } else {
            info!("No route from {} to {}", self.agent, self.goal);
            self.path.clear();
            self.next_index = 0;
            self.transition(ReplanState::Unreachable);
        }
        self.last_result = result;
    }

    fn transition(&mut self, next: ReplanState) {
        debug!("Replanner {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}
