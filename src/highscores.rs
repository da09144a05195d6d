//! Best score persistence
//!
//! A single named integer stored as JSON. Read once at startup, written only
//! when a run beats it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BestScore {
    pub best_score: u32,
}

impl BestScore {
    /// Default file name next to the working directory
    pub const FILE_NAME: &'static str = "skyhop_best.json";

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score would improve the record
    pub fn qualifies(&self, score: u32) -> bool {
        score > self.best_score
    }

    /// Record a finished run. Returns true if it is a new best.
    pub fn record(&mut self, score: u32) -> bool {
        if !self.qualifies(score) {
            return false;
        }
        self.best_score = score;
        true
    }

    /// Load from `path`; a missing or unreadable file starts fresh
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(best) => {
                log::info!("Loaded best score {}", best.best_score);
                best
            }
            Err(e) => {
                log::info!("No best score found ({e}), starting fresh");
                Self::new()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Best score saved ({})", self.best_score);
        Ok(())
    }
}
