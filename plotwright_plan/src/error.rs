// Error type for planning operations.
//
// `NoPath` and `NoFit` are ordinary outcomes of planning on real terrain and
// callers are expected to carry on (skip the road, try a smaller building).
// The remaining variants signal a mismatch between the caller and its
// configuration or terrain source and should abort the run.

use crate::types::{Column, Coord, Size};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no path between {start} and {end}")]
    NoPath { start: Column, end: Column },

    #[error("no site for a {size} footprint scores below {max_score}")]
    NoFit { size: Size, max_score: f64 },

    #[error("invalid elevation criterion: {0}")]
    InvalidCriterion(String),

    #[error("region at {start} with size {size} is outside the loaded terrain")]
    RegionOutOfBounds { start: Coord, size: Size },

    #[error("invalid planner config: {0}")]
    Config(#[from] serde_json::Error),
}

impl PlanError {
    /// Whether the caller can treat this as "not built" and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlanError::NoPath { .. } | PlanError::NoFit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planning_misses_are_recoverable() {
        let no_path = PlanError::NoPath {
            start: Column::new(0, 0),
            end: Column::new(5, 5),
        };
        let no_fit = PlanError::NoFit {
            size: Size::new(7, 7),
            max_score: 49.0,
        };
        assert!(no_path.is_recoverable());
        assert!(no_fit.is_recoverable());
        assert_eq!(no_path.to_string(), "no path between (0, 0) and (5, 5)");
    }

    #[test]
    fn config_errors_are_fatal() {
        let err: PlanError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(!err.is_recoverable());
        assert!(err.to_string().starts_with("invalid planner config"));
    }
}
