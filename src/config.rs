use serde::Deserialize;
use std::path::Path;

use crate::extract::DuplicatePolicy;
use crate::stats::{EmptyPolicy, ZeroPolicy};

/// Top-level configuration loaded from sdfprops.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SdfConfig {
    pub extract: ExtractConfig,
    pub analyze: AnalyzeConfig,
    pub aggregate: AggregateConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ExtractConfig {
    /// Which occurrence wins when a tag repeats within one file.
    pub duplicates: DuplicatePolicy,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalyzeConfig {
    pub property: String,
    pub precision: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub precision: usize,
    /// Tags for which a zero value means "no data" rather than a measurement.
    pub skip_zero_tags: Vec<String>,
    pub empty_after_filter: EmptyPolicy,
}

impl AggregateConfig {
    /// Zero handling for `tag`, unless the caller forces skipping.
    pub fn zero_policy(&self, tag: &str, force_skip: bool) -> ZeroPolicy {
        if force_skip || self.skip_zero_tags.iter().any(|t| t == tag) {
            ZeroPolicy::Skip
        } else {
            ZeroPolicy::Include
        }
    }
}

// --- Default implementations ---

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            property: "FITNESS".to_string(),
            precision: 8,
        }
    }
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            precision: 2,
            skip_zero_tags: Vec::new(),
            empty_after_filter: EmptyPolicy::Fail,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: String,
        source: std::io::Error,
    },
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {path}: {source}")
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {path}: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Load config from `path`, or defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<SdfConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(SdfConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config(&dir.path().join("sdfprops.toml")).unwrap();
        assert_eq!(cfg.analyze.property, "FITNESS");
        assert_eq!(cfg.analyze.precision, 8);
        assert_eq!(cfg.aggregate.precision, 2);
        assert_eq!(cfg.aggregate.empty_after_filter, EmptyPolicy::Fail);
        assert_eq!(cfg.extract.duplicates, DuplicatePolicy::LastWins);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sdfprops.toml");
        std::fs::write(
            &path,
            "[aggregate]\nskip_zero_tags = [\"WEIGHT_2\"]\nempty_after_filter = \"zero\"\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.aggregate.skip_zero_tags, vec!["WEIGHT_2"]);
        assert_eq!(cfg.aggregate.empty_after_filter, EmptyPolicy::Zero);
        assert_eq!(cfg.aggregate.precision, 2);
        assert_eq!(cfg.analyze.property, "FITNESS");
    }

    #[test]
    fn duplicates_policy_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sdfprops.toml");
        std::fs::write(&path, "[extract]\nduplicates = \"first\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.extract.duplicates, DuplicatePolicy::FirstWins);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sdfprops.toml");
        std::fs::write(&path, "[analyze\nproperty = 3").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_policy_per_tag() {
        let cfg = AggregateConfig {
            skip_zero_tags: vec!["WEIGHT_2".to_string()],
            ..Default::default()
        };
        assert_eq!(cfg.zero_policy("WEIGHT_2", false), ZeroPolicy::Skip);
        assert_eq!(cfg.zero_policy("WEIGHT_1", false), ZeroPolicy::Include);
        assert_eq!(cfg.zero_policy("WEIGHT_1", true), ZeroPolicy::Skip);
    }
}
