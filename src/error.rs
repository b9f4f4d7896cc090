//! Error types for grid edits and configuration.

use crate::grid::Position;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot place at {cell}: {reason}")]
    InvalidPlacement { cell: Position, reason: &'static str },

    #[error("mutation at {cell} rejected: {reason}")]
    RejectedMutation { cell: Position, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, PlannerError>;
