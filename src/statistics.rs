use crate::replanner::Replanner;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Statistics {
    pub total_moves: usize,
    pub replans: usize,
    pub nodes_visited: usize,
    pub num_obstacles: usize,
    pub optimal_path_length: usize,
    pub route_efficiency: f64,
}

impl Statistics {
    pub fn new(num_obstacles: usize, optimal_path_length: usize) -> Self {
        Statistics {
            total_moves: 0,
            replans: 0,
            nodes_visited: 0,
            num_obstacles,
            optimal_path_length,
            route_efficiency: 0.0,
        }
    }

    /// Copies the traversal counters out of a finished replanner.
    pub fn record(&mut self, replanner: &Replanner) {
        self.total_moves = replanner.moves();
        self.replans = replanner.replans();
        self.nodes_visited = replanner.nodes_visited();
        self.calculate_efficiency();
    }

    /// Moves taken relative to the pre-traversal optimum; 1.0 is perfect.
    pub fn calculate_efficiency(&mut self) {
        if self.total_moves > 0 && self.optimal_path_length > 0 {
            self.route_efficiency = self.total_moves as f64 / self.optimal_path_length as f64;
        } else {
            self.route_efficiency = 0.0;
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Moves: {}", self.total_moves)?;
        writeln!(f, "Optimal Path Length: {}", self.optimal_path_length)?;
        writeln!(f, "Initial Obstacles: {}", self.num_obstacles)?;
        writeln!(f, "Replans: {}", self.replans)?;
        writeln!(f, "Nodes Visited (all searches): {}", self.nodes_visited)?;
        writeln!(f, "Route Efficiency: {:.3}", self.route_efficiency)?;

        if self.route_efficiency > 0.0 {
            let extra = self.total_moves.saturating_sub(self.optimal_path_length);
            writeln!(f, "Extra moves due to dynamic obstacles: {}", extra)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimingData {
    pub search_times: Vec<Duration>,
}

impl TimingData {
    pub fn new() -> Self {
        TimingData {
            search_times: Vec::new(),
        }
    }

    pub fn from_replanner(replanner: &Replanner) -> Self {
        TimingData {
            search_times: replanner.search_times().to_vec(),
        }
    }

    pub fn average_search_time(&self) -> Duration {
        if self.search_times.is_empty() {
            Duration::from_nanos(0)
        } else {
            self.total_search_time() / self.search_times.len() as u32
        }
    }

    pub fn total_search_time(&self) -> Duration {
        self.search_times.iter().sum()
    }

    pub fn total_calls(&self) -> usize {
        self.search_times.len()
    }
}
