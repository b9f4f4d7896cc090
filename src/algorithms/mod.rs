pub mod baseline;
pub mod common;
pub mod search;

pub use common::{Algorithm, PathResult, TraceEvent, TraceRole};
pub use search::search;
