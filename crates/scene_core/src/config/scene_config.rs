//! # Scene Configuration
//!
//! Settings for the spatial partitioning, the stage update loop and logging.
//! Every section has sensible defaults, and missing keys in a file fall back to
//! them.

use super::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// # Octree Configuration
///
/// The octree works on an aligned grid: a node at scale `s` has a tight edge
/// length of `min_node_width * 2^s` and a loose cube twice that. There is no
/// upper scale; the root grows until it covers every object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Tight edge length of the finest cell
    pub min_node_width: f32,

    /// Let pruning shrink the tree by promoting the only child of an empty root
    pub collapse_root: bool,
}

impl OctreeConfig {
    /// Check the values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_node_width.is_finite() || self.min_node_width <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_node_width must be positive and finite, got {}",
                self.min_node_width
            )));
        }
        Ok(())
    }

    /// Builder-style setter for the finest cell width
    pub fn with_min_node_width(mut self, width: f32) -> Self {
        self.min_node_width = width;
        self
    }

    /// Builder-style setter for root collapsing
    pub fn with_collapse_root(mut self, collapse: bool) -> Self {
        self.collapse_root = collapse;
        self
    }
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            min_node_width: 1.0,
            collapse_root: true,
        }
    }
}

/// Stage update behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Run `prune_empty_nodes` at the end of every `Stage::update`
    pub prune_on_update: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            prune_on_update: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter string
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level scene configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Octree settings
    pub octree: OctreeConfig,
    /// Stage settings
    pub stage: StageConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl SceneConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.octree.validate()
    }
}

impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scene_core_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_node_width() {
        let config = OctreeConfig::default().with_min_node_width(0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = OctreeConfig::default().with_min_node_width(f32::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_file_round_trip() {
        let path = temp_path("scene.toml");
        let mut config = SceneConfig::default();
        config.octree.min_node_width = 4.0;
        config.stage.prune_on_update = false;

        config.save_to_file(&path).unwrap();
        let loaded = SceneConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_file_round_trip() {
        let path = temp_path("scene.ron");
        let mut config = SceneConfig::default();
        config.logging.level = "debug".to_string();

        config.save_to_file(&path).unwrap();
        let loaded = SceneConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SceneConfig = toml::from_str("[octree]\nmin_node_width = 2.5\n").unwrap();
        assert_eq!(config.octree.min_node_width, 2.5);
        assert!(config.octree.collapse_root);
        assert!(config.stage.prune_on_update);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = SceneConfig::default().save_to_file("scene.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));

        let dir = Path::new("settings").join("scene");
        match SceneConfig::load_from_file(&dir) {
            Err(ConfigError::UnsupportedFormat(shown)) => assert_eq!(shown, dir.display().to_string()),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_stale_keys_are_ignored() {
        let path = temp_path("legacy.toml");
        std::fs::write(&path, "[octree]\nmin_node_width = 2.0\nmax_scale = 48\n").unwrap();
        let loaded = SceneConfig::load_from_file(path.as_path());
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.unwrap().octree.min_node_width, 2.0);
    }
}
