//! Data-driven game balance
//!
//! Every constant that shapes the run lives here so it can be tweaked from a
//! JSON file without recompiling. Missing fields fall back to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One collectible item definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    /// Points added to the score on collection
    pub value: u32,
}

impl ItemDef {
    pub fn new(name: &str, value: u32) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// Items grouped by rarity tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemCatalog {
    pub common: Vec<ItemDef>,
    pub rare: Vec<ItemDef>,
    pub epic: Vec<ItemDef>,
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self {
            common: vec![ItemDef::new("coin", 1), ItemDef::new("gem", 2)],
            rare: vec![ItemDef::new("crystal", 5)],
            epic: vec![ItemDef::new("star", 10), ItemDef::new("crown", 15)],
        }
    }
}

impl ItemCatalog {
    pub fn is_empty(&self) -> bool {
        self.common.is_empty() && self.rare.is_empty() && self.epic.is_empty()
    }
}

/// Complete balance sheet for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Segments / pool ===
    /// Z-extent of every segment
    pub segment_length: f32,
    /// Half of the X-extent of every segment (landing footprint)
    pub segment_half_width: f32,
    /// Number of visual segment variants warmed per batch
    pub segment_archetypes: u32,
    /// Segments allocated per archetype on each warm-up
    pub pool_batch_size: usize,
    /// Hard cap on total segments; `None` grows without bound
    pub pool_cap: Option<usize>,

    // === Path generation ===
    /// Segments spawned synchronously on Initialize
    pub initial_segments: usize,
    /// Segments behind this Z are recycled
    pub recycle_z: f32,
    /// Maximum lateral offset of a segment
    pub max_offset_x: f32,
    /// Maximum segment height
    pub max_height: f32,
    /// Height change per spawn
    pub vertical_step: f32,
    pub horizontal_ramp_rate: f32,
    pub horizontal_ramp_max: f32,
    pub vertical_ramp_rate: f32,
    pub vertical_ramp_max: f32,

    // === Difficulty / score ===
    pub base_speed: f32,
    pub max_speed: f32,
    /// Item spawn probability reached at `max_speed`
    pub max_item_probability: f32,
    pub score_increment: u32,
    /// Speed steps up whenever the score is a multiple of this
    pub difficulty_interval: u32,

    // === Physics ===
    pub normal_gravity: f32,
    pub game_over_gravity: f32,

    // === Lifecycle ===
    /// Seconds between Initialize and GameStart
    pub start_delay: f32,
    /// Seconds between Reset and re-Initialize on replay
    pub reset_delay: f32,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_start_height: f32,
    /// Lateral position is clamped to [-limit, limit]
    pub lateral_limit: f32,
    /// Below this height the ball is dead
    pub death_height: f32,
    /// Below this height a dead ball stops simulating
    pub freeze_depth: f32,

    // === Items ===
    /// Height above the anchor segment's surface
    pub item_float_height: f32,
    pub item_radius: f32,
    /// Rolls in [0, rare_threshold) are common
    pub rare_threshold: f32,
    /// Rolls in [epic_threshold, 100) are epic
    pub epic_threshold: f32,
    pub items: ItemCatalog,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            segment_length: 5.0,
            segment_half_width: 1.5,
            segment_archetypes: 3,
            pool_batch_size: 10,
            pool_cap: None,

            initial_segments: 8,
            recycle_z: -10.0,
            max_offset_x: 2.5,
            max_height: 3.0,
            vertical_step: 0.5,
            horizontal_ramp_rate: 0.02,
            horizontal_ramp_max: 0.6,
            vertical_ramp_rate: 0.02,
            vertical_ramp_max: 0.5,

            base_speed: 10.0,
            max_speed: 25.0,
            max_item_probability: 0.35,
            score_increment: 1,
            difficulty_interval: 10,

            normal_gravity: 25.0,
            game_over_gravity: 60.0,

            start_delay: 0.5,
            reset_delay: 0.3,

            ball_radius: 0.5,
            ball_start_height: 0.6,
            lateral_limit: 3.0,
            death_height: -1.0,
            freeze_depth: -20.0,

            item_float_height: 1.0,
            item_radius: 0.5,
            rare_threshold: 50.0,
            epic_threshold: 80.0,
            items: ItemCatalog::default(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Item spawn probability derived from a speed
    pub fn item_probability_for(&self, speed: f32) -> f32 {
        speed * (self.max_item_probability / self.max_speed)
    }

    /// Lower bound of the forward gap at `speed`
    pub fn min_gap(&self, speed: f32) -> f32 {
        2.0 * self.segment_length + 0.3 * speed
    }

    /// Exclusive upper bound of the forward gap at `speed`
    pub fn max_gap(&self, speed: f32) -> f32 {
        self.segment_length * 0.6 * speed
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("segment_length", self.segment_length),
            ("segment_half_width", self.segment_half_width),
            ("base_speed", self.base_speed),
            ("max_speed", self.max_speed),
            ("normal_gravity", self.normal_gravity),
            ("game_over_gravity", self.game_over_gravity),
            ("ball_radius", self.ball_radius),
            ("vertical_step", self.vertical_step),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("must be > 0, got {value}")));
            }
        }

        if self.pool_batch_size == 0 {
            return Err(invalid("pool_batch_size", "must be > 0"));
        }
        if self.segment_archetypes == 0 {
            return Err(invalid("segment_archetypes", "must be > 0"));
        }
        if let Some(cap) = self.pool_cap {
            if cap < self.initial_segments {
                return Err(invalid(
                    "pool_cap",
                    format!("{cap} is below initial_segments {}", self.initial_segments),
                ));
            }
        }
        // The first hop needs a successor to aim at
        if self.initial_segments < 2 {
            return Err(invalid("initial_segments", "must be >= 2"));
        }
        if self.score_increment == 0 {
            return Err(invalid("score_increment", "must be > 0"));
        }
        if self.difficulty_interval == 0 {
            return Err(invalid("difficulty_interval", "must be > 0"));
        }
        if self.max_speed < self.base_speed {
            return Err(invalid(
                "max_speed",
                format!("{} is below base_speed {}", self.max_speed, self.base_speed),
            ));
        }
        // Speed never drops below base, so a valid range at base holds for the run
        if self.max_gap(self.base_speed) <= self.min_gap(self.base_speed) {
            return Err(invalid(
                "base_speed",
                format!(
                    "gap range [{}, {}) is empty",
                    self.min_gap(self.base_speed),
                    self.max_gap(self.base_speed)
                ),
            ));
        }

        let unit = [
            ("max_item_probability", self.max_item_probability),
            ("horizontal_ramp_max", self.horizontal_ramp_max),
            ("vertical_ramp_max", self.vertical_ramp_max),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("must be within [0, 1], got {value}")));
            }
        }
        if self.horizontal_ramp_rate < 0.0 || self.vertical_ramp_rate < 0.0 {
            return Err(invalid("ramp_rate", "must be >= 0"));
        }

        if self.max_offset_x < 0.0 || self.max_height < 0.0 || self.lateral_limit < 0.0 {
            return Err(invalid("extents", "offsets and limits must be >= 0"));
        }
        if self.start_delay < 0.0 || self.reset_delay < 0.0 {
            return Err(invalid("delays", "must be >= 0"));
        }
        if self.freeze_depth >= self.death_height {
            return Err(invalid(
                "freeze_depth",
                format!(
                    "{} must be below death_height {}",
                    self.freeze_depth, self.death_height
                ),
            ));
        }
        if !(0.0 <= self.rare_threshold
            && self.rare_threshold <= self.epic_threshold
            && self.epic_threshold <= 100.0)
        {
            return Err(invalid(
                "tier_thresholds",
                "expected 0 <= rare_threshold <= epic_threshold <= 100",
            ));
        }
        if self.items.is_empty() {
            return Err(invalid("items", "catalog has no items"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json_str(r#"{ "base_speed": 12.0 }"#).unwrap();
        assert_eq!(tuning.base_speed, 12.0);
        assert_eq!(tuning.segment_length, 5.0);
        assert_eq!(tuning.items, ItemCatalog::default());
    }

    #[test]
    fn test_rejects_empty_gap_range() {
        // len 5: need 3.0 * s > 10 + 0.3 * s, i.e. s > ~3.7
        let err = Tuning::from_json_str(r#"{ "base_speed": 3.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "base_speed", .. }));
    }

    #[test]
    fn test_rejects_zero_speed() {
        let tuning = Tuning {
            base_speed: 0.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_max_below_base() {
        let tuning = Tuning {
            max_speed: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::Invalid { field: "max_speed", .. })
        ));
    }

    #[test]
    fn test_rejects_single_segment_and_zero_increment() {
        let single = Tuning {
            initial_segments: 1,
            ..Default::default()
        };
        assert!(matches!(
            single.validate(),
            Err(ConfigError::Invalid { field: "initial_segments", .. })
        ));

        let err = Tuning::from_json_str(r#"{ "score_increment": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "score_increment", .. }));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            Tuning::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_item_probability_scales_with_speed() {
        let tuning = Tuning::default();
        let p = tuning.item_probability_for(tuning.max_speed);
        assert!((p - tuning.max_item_probability).abs() < 1e-6);
        let half = tuning.item_probability_for(tuning.max_speed / 2.0);
        assert!((half - tuning.max_item_probability / 2.0).abs() < 1e-6);
    }
}
