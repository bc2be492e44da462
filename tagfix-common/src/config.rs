//! Configuration loading for tagfix
//!
//! TOML configuration with compiled defaults. Resolution priority:
//! 1. Explicit path passed by the caller
//! 2. `TAGFIX_CONFIG` environment variable
//! 3. Compiled defaults (no file required)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Candidate scoring settings
    pub scoring: ScoringConfig,
    /// Apply-service settings
    pub apply: ApplyConfig,
    /// External catalog endpoint settings
    pub catalog: CatalogConfig,
}

/// Candidate scoring settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Strategy name: "normalized", "tiered", or "weighted"
    pub strategy: String,
    /// Candidates scoring below this are tagged low-confidence (0.0-1.0)
    pub low_confidence_threshold: f64,
}

/// Apply-service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// What to do with tracks the source no longer lists:
    /// "delete" removes the row, "orphan" detaches it from the tracklist
    pub removed_track_policy: String,
}

/// External catalog endpoint settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the catalog web service
    pub base_url: String,
    /// User-Agent header (catalog etiquette requires an identifying agent)
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("tagfix.db"),
            scoring: ScoringConfig::default(),
            apply: ApplyConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strategy: "weighted".to_string(),
            low_confidence_threshold: 0.5,
        }
    }
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            removed_track_policy: "delete".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://musicbrainz.org/ws/2".to_string(),
            user_agent: "tagfix/0.1.0 (https://github.com/tagfix/tagfix)".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve configuration: explicit path, then `TAGFIX_CONFIG`, then defaults
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var("TAGFIX_CONFIG") {
            return Self::load(Path::new(&path));
        }

        info!("No configuration file specified, using defaults");
        Ok(Self::default())
    }

    /// Validate settings that have constrained values
    pub fn validate(&self) -> Result<()> {
        match self.scoring.strategy.as_str() {
            "normalized" | "tiered" | "weighted" => {}
            other => {
                return Err(Error::Config(format!(
                    "Unknown scoring strategy '{}' (expected normalized, tiered, or weighted)",
                    other
                )))
            }
        }

        if !(0.0..=1.0).contains(&self.scoring.low_confidence_threshold) {
            return Err(Error::Config(format!(
                "low_confidence_threshold out of range: {}",
                self.scoring.low_confidence_threshold
            )));
        }

        match self.apply.removed_track_policy.as_str() {
            "delete" | "orphan" => {}
            other => {
                return Err(Error::Config(format!(
                    "Unknown removed_track_policy '{}' (expected delete or orphan)",
                    other
                )))
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.low_confidence_threshold, 0.5);
        assert_eq!(config.apply.removed_track_policy, "delete");
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            database_path = "/tmp/test.db"

            [scoring]
            strategy = "tiered"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.scoring.strategy, "tiered");
        // Unspecified sections fall back to defaults
        assert_eq!(config.scoring.low_confidence_threshold, 0.5);
        assert_eq!(config.catalog.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_strategy_rejected() {
        let mut config = Config::default();
        config.scoring.strategy = "psychic".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut config = Config::default();
        config.scoring.low_confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_track_policy_rejected() {
        let mut config = Config::default();
        config.apply.removed_track_policy = "ignore".to_string();
        assert!(config.validate().is_err());
    }
}
