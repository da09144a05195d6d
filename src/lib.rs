//! Skyhop - an endless-runner simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (event bus, path, ball, game flow)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Best-score persistence
//! - `error`: Error types

pub mod error;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, PoolError, SimError, TrajectoryError};
pub use highscores::BestScore;
pub use tuning::Tuning;

use std::borrow::Cow;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Label shown instead of a zero score
    pub const ZERO_SCORE_LABEL: &str = "-";
}

/// Score text for the HUD: a placeholder at zero, the number otherwise
pub fn score_label(score: u32) -> Cow<'static, str> {
    if score == 0 {
        Cow::Borrowed(consts::ZERO_SCORE_LABEL)
    } else {
        Cow::Owned(score.to_string())
    }
}
