//! # Simulation Configuration
//!
//! Run parameters for the demo driver, loaded from TOML. Every field has a
//! default, so an empty file yields a runnable simulation.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a simulation config.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Unreadable(String),

    /// The file is not valid TOML or fails validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Run parameters for a headless simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimConfig {
    /// Entity slots in the world.
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,

    /// Seconds of simulated time per tick.
    #[serde(default = "default_tick_dt")]
    pub tick_dt: f32,

    /// Bodies spawned per burst.
    #[serde(default = "default_spawn_count")]
    pub spawn_count: usize,

    /// Half-width of the live region on both axes; bodies outside are culled.
    #[serde(default = "default_cull_bound")]
    pub cull_bound: f32,

    /// Ticks the demo runs before reporting.
    #[serde(default = "default_ticks")]
    pub ticks: usize,
}

fn default_max_entities() -> usize {
    128
}

fn default_tick_dt() -> f32 {
    1.0 / 60.0
}

fn default_spawn_count() -> usize {
    20
}

fn default_cull_bound() -> f32 {
    2.0
}

fn default_ticks() -> usize {
    240
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_entities: default_max_entities(),
            tick_dt: default_tick_dt(),
            spawn_count: default_spawn_count(),
            cull_bound: default_cull_bound(),
            ticks: default_ticks(),
        }
    }
}

impl SimConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the text is not valid TOML or
    /// a field fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unreadable`] when the file cannot be read and
    /// [`ConfigError::Invalid`] when its contents are rejected.
    pub fn from_toml_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_dt.is_finite() || self.tick_dt <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tick_dt must be a positive duration, got {}",
                self.tick_dt
            )));
        }
        if !self.cull_bound.is_finite() || self.cull_bound <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "cull_bound must be positive, got {}",
                self.cull_bound
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_runnable() {
        let config = SimConfig::default();
        assert_eq!(config.max_entities, 128);
        assert!(config.tick_dt > 0.0);
        assert_eq!(config.spawn_count, 20);
        assert_eq!(config.cull_bound, 2.0);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = SimConfig::from_toml_str("max_entities = 64\ncull_bound = 1.5\n").unwrap();
        assert_eq!(config.max_entities, 64);
        assert_eq!(config.cull_bound, 1.5);
        assert_eq!(config.spawn_count, 20);
        assert_eq!(config.ticks, 240);
    }

    #[test]
    fn test_full_toml_parses() {
        let text = r#"
            max_entities = 256
            tick_dt = 0.05
            spawn_count = 8
            cull_bound = 4.0
            ticks = 10
        "#;
        let config = SimConfig::from_toml_str(text).unwrap();
        assert_eq!(config.max_entities, 256);
        assert_eq!(config.tick_dt, 0.05);
        assert_eq!(config.spawn_count, 8);
        assert_eq!(config.cull_bound, 4.0);
        assert_eq!(config.ticks, 10);
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let err = SimConfig::from_toml_str("max_entities = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_non_positive_dt_is_rejected() {
        assert!(matches!(
            SimConfig::from_toml_str("tick_dt = 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SimConfig::from_toml_str("tick_dt = -1.0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = SimConfig::from_toml_path(Path::new("/nonexistent/sim.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable(_)));
    }
}
