//! Error types for the simulation core and its configuration.

use thiserror::Error;

use crate::sim::state::{GamePhase, SegmentId};

/// Bad input to the launch-velocity solver.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TrajectoryError {
    /// Horizontal speed must be strictly positive.
    #[error("horizontal speed must be > 0, got {0}")]
    NonPositiveSpeed(f32),

    /// Target must lie ahead of the source.
    #[error("horizontal distance must be > 0, got {0}")]
    NonPositiveDistance(f32),

    /// Gravity, height offset or the result was NaN/infinite.
    #[error("trajectory input or result is not finite")]
    NonFinite,
}

/// Segment pool inventory errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The configured cap was reached and no free segment is left.
    #[error("segment pool exhausted at capacity {capacity}")]
    Exhausted { capacity: usize },

    /// Release of a segment that is not currently active.
    #[error("segment {0:?} is not active")]
    NotActive(SegmentId),
}

/// Errors that can occur when loading or validating tuning data.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Tuning file could not be read.
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range.
    #[error("invalid tuning value '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level simulation error.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A component was already borrowed when an event reached it.
    #[error("component '{0}' is busy (re-entrant dispatch)")]
    ComponentBusy(&'static str),

    /// A lifecycle action was requested from a phase that does not allow it.
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: GamePhase,
    },
}
