use crate::algorithms::Algorithm;
use crate::error::{PlannerError, Result};
use crate::grid::validate_dimensions;
use crate::heuristics::Heuristic;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, default_value_t = 10)]
    pub rows: usize,

    #[arg(long, default_value_t = 10)]
    pub cols: usize,

    /// Share of cells turned into obstacles before the search, in [0, 1).
    #[arg(long, default_value_t = 0.3)]
    pub density: f64,

    #[arg(long, value_enum, default_value_t = Algorithm::AStar)]
    pub algorithm: Algorithm,

    #[arg(long, value_enum, default_value_t = Heuristic::Manhattan)]
    pub heuristic: Heuristic,

    /// Chance per agent move that a new obstacle appears, in [0, 1].
    #[arg(long, default_value_t = 0.1)]
    pub spawn_probability: f64,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 80)]
    pub delay_ms: u64,

    #[arg(long, default_value_t = false)]
    pub no_visualization: bool,

    /// Run every algorithm/heuristic pair on the same map and compare.
    #[arg(long, default_value_t = false)]
    pub compare: bool,

    /// Upper bound on agent moves before the run is abandoned.
    #[arg(long)]
    pub max_steps: Option<usize>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        validate_dimensions(self.rows, self.cols)?;

        if !(0.0..1.0).contains(&self.density) {
            return Err(PlannerError::InvalidConfig(format!(
                "--density must be in [0, 1), got {}",
                self.density
            )));
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(PlannerError::InvalidConfig(format!(
                "--spawn-probability must be in [0, 1], got {}",
                self.spawn_probability
            )));
        }
        Ok(())
    }

    /// Moves allowed before giving up: the explicit limit, or four times
    /// the cell count.
    pub fn step_limit(&self) -> usize {
        self.max_steps.unwrap_or(self.rows * self.cols * 4)
    }
}
