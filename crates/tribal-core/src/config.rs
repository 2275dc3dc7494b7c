//! Configuration System
//!
//! Loads tuning parameters from tuning.toml for easy adjustment without recompiling.
//! Every section falls back to its defaults, so partial files are fine.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relationship: RelationshipTuning,
    #[serde(default)]
    pub alliance: AllianceTuning,
    #[serde(default)]
    pub season: SeasonTuning,
}

/// Affinity initialization and mutation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipTuning {
    /// Starting point for a fresh relationship
    pub base_affinity: f32,
    /// Lower clamp for a freshly initialized relationship
    pub initial_min: f32,
    /// Upper clamp for a freshly initialized relationship
    pub initial_max: f32,
    /// Uniform noise applied on initialization (+/-)
    pub initial_noise: f32,
    /// Trait distance below which survivors get along
    pub proximity_window: f32,
    /// Bonus for identical personalities
    pub proximity_bonus: f32,
    /// Trait distance above which survivors clash
    pub divergence_threshold: f32,
    /// Penalty per point of trait distance past the threshold
    pub divergence_rate: f32,
    /// Noise on the reverse direction of an affinity change (+/-, whole points)
    pub mirror_noise: i32,
}

impl Default for RelationshipTuning {
    fn default() -> Self {
        Self {
            base_affinity: 50.0,
            initial_min: 20.0,
            initial_max: 80.0,
            initial_noise: 5.0,
            proximity_window: 20.0,
            proximity_bonus: 15.0,
            divergence_threshold: 40.0,
            divergence_rate: 0.5,
            mirror_noise: 1,
        }
    }
}

/// Alliance formation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllianceTuning {
    /// Minimum affinity for two survivors to start an alliance
    pub join_threshold: f32,
    /// Minimum affinity every member must hold toward a newcomer
    pub admit_threshold: f32,
    /// Mutual affinity below which a pair can no longer share an alliance
    pub break_threshold: f32,
}

impl Default for AllianceTuning {
    fn default() -> Self {
        Self {
            join_threshold: 60.0,
            admit_threshold: 50.0,
            break_threshold: 35.0,
        }
    }
}

/// Season runner parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonTuning {
    /// Number of survivors at the start (including the human)
    pub cast_size: usize,
    /// Number of starting tribes
    pub tribe_count: usize,
    /// Remaining survivors at which the tribes merge
    pub merge_at: usize,
    /// The run stops when this many survivors remain
    pub final_size: usize,
    /// Revotes before rocks are drawn
    pub max_revotes: u32,
    /// Days of camp life between tribal councils
    pub days_between_councils: u32,
    /// Chance per day that someone finds a hidden idol
    pub idol_find_chance: f32,
    /// Random camp interactions per tribe per day
    pub interactions_per_day: usize,
    /// Largest affinity swing from one interaction
    pub affinity_swing: f32,
    /// Name of the tribe formed at the merge
    pub merged_tribe_name: String,
}

impl Default for SeasonTuning {
    fn default() -> Self {
        Self {
            cast_size: 16,
            tribe_count: 2,
            merge_at: 10,
            final_size: 3,
            max_revotes: 1,
            days_between_councils: 3,
            idol_find_chance: 0.08,
            interactions_per_day: 6,
            affinity_swing: 8.0,
            merged_tribe_name: "Solana".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_TUNING_PATH, e);
            Self::default()
        })
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Tribal Council Tuning

[relationship]
base_affinity = 50.0
initial_min = 20.0
initial_max = 80.0
initial_noise = 5.0
proximity_window = 20.0
proximity_bonus = 15.0
divergence_threshold = 40.0
divergence_rate = 0.5
mirror_noise = 1

[alliance]
join_threshold = 60.0
admit_threshold = 50.0
break_threshold = 35.0

[season]
cast_size = 16
tribe_count = 2
merge_at = 10
final_size = 3
max_revotes = 1
days_between_councils = 3
idol_find_chance = 0.08
interactions_per_day = 6
affinity_swing = 8.0
merged_tribe_name = "Solana"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.relationship.base_affinity, 50.0);
        assert_eq!(config.alliance.join_threshold, 60.0);
        assert_eq!(config.alliance.admit_threshold, 50.0);
        assert_eq!(config.season.max_revotes, 1);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            [alliance]
            join_threshold = 70.0

            [season]
            cast_size = 10
        "#;

        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.alliance.join_threshold, 70.0);
        assert_eq!(config.alliance.admit_threshold, 50.0);
        assert_eq!(config.season.cast_size, 10);
        assert_eq!(config.season.tribe_count, 2);
        assert_eq!(config.relationship.initial_max, 80.0);
    }

    #[test]
    fn test_default_config_toml_parses() {
        let config = Config::from_str(&default_config_toml()).unwrap();
        assert_eq!(config.relationship.proximity_bonus, 15.0);
        assert_eq!(config.season.merge_at, 10);
    }

    #[test]
    fn test_config_to_toml() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("[relationship]"));
        assert!(toml.contains("[alliance]"));
        assert!(toml.contains("[season]"));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::from_str("[alliance\njoin_threshold = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::load("does/not/exist/tuning.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
