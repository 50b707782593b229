//! Estimator configuration loaded from TOML.
//!
//! ```toml
//! rhoz = 0.95
//! parallel = true
//!
//! [columns]
//! identity = "firm"
//! time = 1
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::ColumnSpec;

/// Instrument persistence used when none is given.
pub const DEFAULT_RHOZ: f64 = 0.95;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("rhoz must be finite and different from 1, got {0}")]
    InvalidRhoz(f64),
}

/// Settings for one estimation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub rhoz: f64,
    pub parallel: bool,
    pub columns: ColumnSpec,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            rhoz: DEFAULT_RHOZ,
            parallel: true,
            columns: ColumnSpec::default(),
        }
    }
}

impl EstimatorConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rhoz.is_finite() || self.rhoz == 1.0 {
            return Err(ConfigError::InvalidRhoz(self.rhoz));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnRef;

    #[test]
    fn empty_file_takes_defaults() {
        let config = EstimatorConfig::from_toml("").unwrap();
        assert_eq!(config, EstimatorConfig::default());
        assert_eq!(config.columns.independent, ColumnRef::Position(3));
    }

    #[test]
    fn partial_columns_keep_positional_defaults() {
        let config = EstimatorConfig::from_toml(
            r#"
            rhoz = 0.9
            parallel = false

            [columns]
            identity = "firm"
            dependent = "ret"
            "#,
        )
        .unwrap();
        assert_eq!(config.rhoz, 0.9);
        assert!(!config.parallel);
        assert_eq!(config.columns.identity, ColumnRef::Name("firm".into()));
        assert_eq!(config.columns.time, ColumnRef::Position(1));
    }

    #[test]
    fn unit_rhoz_is_rejected() {
        let err = EstimatorConfig::from_toml("rhoz = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRhoz(v) if v == 1.0));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = EstimatorConfig::from_toml("rhoz = \"high\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let config = EstimatorConfig {
            rhoz: 0.8,
            parallel: false,
            columns: ColumnSpec::named("firm", "year", "ret", "dp"),
        };
        let text = config.to_toml().unwrap();
        assert_eq!(EstimatorConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EstimatorConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
