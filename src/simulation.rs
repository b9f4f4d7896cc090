use crate::algorithms::baseline::shortest_path_length;
use crate::algorithms::Algorithm;
use crate::config::Config;
use crate::error::{PlannerError, Result};
use crate::grid::Position;
use crate::heuristics::Heuristic;
use crate::replanner::{InsertionOutcome, ReplanState, StepOutcome};
use crate::session::{SearchMetrics, Session};
use crate::statistics::{Statistics, TimingData};
use log::{info, warn};
use std::thread;
use std::time::Duration;

/// Random maps tried before giving up on finding one with a reachable goal.
const MAP_ATTEMPTS: usize = 50;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub algorithm: Algorithm,
    pub heuristic: Heuristic,
    pub statistics: Statistics,
    pub timing_data: TimingData,
    pub initial_search: Option<SearchMetrics>,
    pub final_state: ReplanState,
    pub final_position: Position,
}

impl RunReport {
    pub fn name(&self) -> String {
        format!("{} + {}", self.algorithm, self.heuristic)
    }

    pub fn success(&self) -> bool {
        self.final_state == ReplanState::Completed
    }
}

pub struct Simulation {
    session: Session,
    config: Config,
    optimal_path_length: usize,
}

impl Simulation {
    /// Validates the config and generates a random map whose goal is
    /// reachable from its start.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let mut session = Session::new(config.rows, config.cols, config.seed)?;

        for attempt in 1..=MAP_ATTEMPTS {
            session.randomize(config.density)?;
            let grid = session.grid();
            if let Some(length) = shortest_path_length(grid, grid.start(), grid.goal()) {
                info!(
                    "Generated map on attempt {}: {} obstacles, optimal length {}",
                    attempt,
                    grid.obstacle_count(),
                    length
                );
                return Ok(Simulation {
                    session,
                    config,
                    optimal_path_length: length,
                });
            }
        }

        Err(PlannerError::InvalidConfig(format!(
            "no map with a reachable goal after {} attempts, try lowering --density",
            MAP_ATTEMPTS
        )))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn optimal_path_length(&self) -> usize {
        self.optimal_path_length
    }

    /// Searches once, then walks the agent tick by tick. Each tick is one
    /// move followed by one spawn attempt.
    pub fn run(&mut self) -> RunReport {
        let algorithm = self.config.algorithm;
        let heuristic = self.config.heuristic;
        let mut stats = Statistics::new(
            self.session.grid().obstacle_count(),
            self.optimal_path_length,
        );

        let result = self.session.run_search(algorithm, heuristic);
        let initial_search = self.session.metrics().copied();

        if !self.config.no_visualization {
            self.clear_screen();
            println!("=== PATHFINDING SIMULATION ===");
            println!("Algorithm: {} | Heuristic: {}", algorithm, heuristic);
            if let Some(metrics) = &initial_search {
                println!(
                    "Nodes visited: {} | Cost: {} | Search time: {:.2?}",
                    metrics.nodes_visited, metrics.path_cost, metrics.duration
                );
            }
            self.session.grid().print_grid(None, &result.path);
            thread::sleep(Duration::from_millis(self.config.delay_ms));
        }

        self.session.begin_traversal(algorithm, heuristic);
        let step_limit = self.config.step_limit();
        let mut steps = 0;

        while steps < step_limit {
            match self.session.step_agent() {
                StepOutcome::Moved(_) => {}
                StepOutcome::Arrived(_) | StepOutcome::Halted => break,
            }
            steps += 1;

            let status = match self.session.spawn_dynamic_obstacle(self.config.spawn_probability) {
                Ok(Some((cell, InsertionOutcome::PathInvalidated(replan)))) => Some(format!(
                    "Obstacle at {} blocked the path, replanned: new segment cost {}",
                    cell, replan.cost
                )),
                Ok(Some((cell, InsertionOutcome::PathUnreachable))) => Some(format!(
                    "Obstacle at {} sealed off the goal, agent is trapped",
                    cell
                )),
                Ok(Some((cell, _))) => Some(format!("Obstacle appeared at {}, path unaffected", cell)),
                Ok(None) => None,
                Err(e) => {
                    warn!("Obstacle spawn failed: {}", e);
                    break;
                }
            };

            if !self.config.no_visualization {
                self.render_tick(steps, status.as_deref());
            } else if let Some(status) = status {
                info!("{}", status);
            }

            if self.state().is_terminal() {
                break;
            }
        }

        if steps >= step_limit && !self.state().is_terminal() {
            warn!("Step limit of {} reached before the traversal ended", step_limit);
        }

        let mut timing_data = TimingData::new();
        if let Some(replanner) = self.session.replanner() {
            stats.record(replanner);
            timing_data = TimingData::from_replanner(replanner);
        }

        if !self.config.no_visualization {
            self.render_summary(steps);
        }

        RunReport {
            algorithm,
            heuristic,
            statistics: stats,
            timing_data,
            initial_search,
            final_state: self.state(),
            final_position: self.agent_position(),
        }
    }

    /// Runs every algorithm/heuristic pair on the same generated map with
    /// the same spawn sequence.
    pub fn run_comparison(config: Config) -> Result<Vec<RunReport>> {
        let base = Simulation::new(config)?;
        let mut reports = Vec::new();

        println!("Running comparison of {} combinations...", Algorithm::ALL.len() * Heuristic::ALL.len());
        println!(
            "Environment: Grid {}x{}, Obstacles: {}, Optimal path: {}",
            base.config.rows,
            base.config.cols,
            base.session.grid().obstacle_count(),
            base.optimal_path_length
        );
        println!();

        for algorithm in Algorithm::ALL {
            for heuristic in Heuristic::ALL {
                let mut run_config = base.config.clone();
                run_config.algorithm = algorithm;
                run_config.heuristic = heuristic;
                run_config.no_visualization = true;

                let mut simulation = Simulation {
                    session: base.session.clone(),
                    config: run_config,
                    optimal_path_length: base.optimal_path_length,
                };
                let report = simulation.run();
                println!(
                    "Completed: {} - Success: {}, Moves: {}",
                    report.name(),
                    report.success(),
                    report.statistics.total_moves
                );
                reports.push(report);
            }
        }
        Ok(reports)
    }

    pub fn print_comparison_results(results: &[RunReport]) {
        println!("\n=== ALGORITHM COMPARISON RESULTS ===");
        println!();
        println!(
            "{:<26} {:<8} {:<8} {:<8} {:<10} {:<12} {:<10} {:<15} {:<12}",
            "Algorithm", "Success", "Moves", "Optimal", "Replans", "Efficiency", "Nodes", "Avg Search", "Final"
        );
        println!("{}", "-".repeat(115));

        for result in results {
            let success_str = if result.success() { "yes" } else { "no" };
            let final_pos_str = result.final_position.to_string();
            println!(
                "{:<26} {:<8} {:<8} {:<8} {:<10} {:<12.3} {:<10} {:<15} {:<12}",
                result.name(),
                success_str,
                result.statistics.total_moves,
                result.statistics.optimal_path_length,
                result.statistics.replans,
                result.statistics.route_efficiency,
                result.statistics.nodes_visited,
                format!("{:.2?}", result.timing_data.average_search_time()),
                final_pos_str
            );
        }
        println!();

        let successful: Vec<&RunReport> = results.iter().filter(|r| r.success()).collect();
        if successful.is_empty() {
            println!("No combination reached the goal.");
            return;
        }

        println!("=== PERFORMANCE ANALYSIS ===");
        if let Some(best) = successful.iter().min_by_key(|r| r.statistics.total_moves) {
            println!("Best by moves: {} ({} moves)", best.name(), best.statistics.total_moves);
        }
        if let Some(leanest) = successful.iter().min_by_key(|r| r.statistics.nodes_visited) {
            println!(
                "Fewest nodes visited: {} ({} nodes)",
                leanest.name(),
                leanest.statistics.nodes_visited
            );
        }
        if let Some(fastest) = successful
            .iter()
            .min_by_key(|r| r.timing_data.average_search_time())
        {
            println!(
                "Fastest search: {} ({:.2?} avg)",
                fastest.name(),
                fastest.timing_data.average_search_time()
            );
        }
    }

    fn state(&self) -> ReplanState {
        self.session
            .replanner()
            .map_or(ReplanState::Idle, |r| r.state())
    }

    fn agent_position(&self) -> Position {
        self.session
            .replanner()
            .map_or(self.session.grid().start(), |r| r.agent())
    }

    fn render_tick(&self, step: usize, status: Option<&str>) {
        let Some(replanner) = self.session.replanner() else {
            return;
        };

        self.clear_screen();
        println!("=== PATHFINDING SIMULATION ===");
        println!(
            "Algorithm: {} + {} | Step: {} | Replans: {} | State: {}",
            replanner.algorithm(),
            replanner.heuristic(),
            step,
            replanner.replans(),
            replanner.state()
        );
        println!("Agent position: {} | Goal: {}", replanner.agent(), replanner.goal());
        println!("Optimal path at start: {}", self.optimal_path_length);
        if let Some(status) = status {
            println!("{}", status);
        }
        self.session
            .grid()
            .print_grid(Some(replanner.agent()), replanner.remaining_path());
        thread::sleep(Duration::from_millis(self.config.delay_ms));
    }

    fn render_summary(&self, steps: usize) {
        self.clear_screen();
        println!("=== SIMULATION COMPLETE ===");
        match self.state() {
            ReplanState::Completed => println!("SUCCESS: Agent reached the goal!"),
            ReplanState::Unreachable => println!("FAILED: No route to the goal remains"),
            state => println!("STOPPED: Agent halted in state {}", state),
        }
        println!("Final position: {}", self.agent_position());
        println!("Total ticks: {}", steps);
        self.session.grid().print_grid(Some(self.agent_position()), &[]);
    }

    /// Clear the terminal screen (only used when visualization is enabled)
    fn clear_screen(&self) {
        print!("\x1B[2J\x1B[1;1H");
    }
}
