//! League configuration — penalty shifts and scheduling limits.
//!
//! Stored as TOML. Every section and field is optional and falls back to the
//! league's standard rules:
//!
//! ```toml
//! [penalties]
//! late = 1
//! missing = 2
//! absent = 2
//! accident = 0
//!
//! [schedule]
//! max_pairs_per_slot = 24
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use pairladder_core::PenaltyTable;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read league config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse league config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize league config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid league config: {0}")]
    Invalid(String),
}

/// Limits for distributing pods over the playable time slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Soft cap on pairs per slot. Raised automatically when the whole field
    /// would not otherwise fit.
    pub max_pairs_per_slot: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_pairs_per_slot: 24,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub penalties: PenaltyTable,
    pub schedule: ScheduleConfig,
}

impl LeagueConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.max_pairs_per_slot == 0 {
            return Err(ConfigError::Invalid(
                "schedule.max_pairs_per_slot must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = LeagueConfig::from_toml("").unwrap();
        assert_eq!(config, LeagueConfig::default());
        assert_eq!(config.penalties.late, 1);
        assert_eq!(config.schedule.max_pairs_per_slot, 24);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = LeagueConfig::from_toml(
            r#"
            [penalties]
            missing = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.penalties.missing, 3);
        assert_eq!(config.penalties.late, 1);
        assert_eq!(config.penalties.absent, 2);
        assert_eq!(config.schedule, ScheduleConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = LeagueConfig::default();
        config.penalties.late = 2;
        config.schedule.max_pairs_per_slot = 12;
        let text = config.to_toml().unwrap();
        assert_eq!(LeagueConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn zero_slot_capacity_is_invalid() {
        let err = LeagueConfig::from_toml("[schedule]\nmax_pairs_per_slot = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_type_is_parse_error() {
        let err = LeagueConfig::from_toml("[penalties]\nlate = \"one\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_file_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("league.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[penalties]\nabsent = 1").unwrap();
        drop(file);

        let config = LeagueConfig::from_file(&path).unwrap();
        assert_eq!(config.penalties.absent, 1);

        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            LeagueConfig::from_file(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
