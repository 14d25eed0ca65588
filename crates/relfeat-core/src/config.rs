//! relfeat Configuration Management
//!
//! Handles configuration from environment variables and TOML files,
//! with defaults matching the tab/`~^~` record format used by the
//! upstream sentence tables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Keyword dictionaries loaded at start-up
    pub dictionaries: Vec<DictionarySource>,

    /// Input record layout
    pub input: RecordFormat,

    /// Feature generation parameters
    pub features: FeatureConfig,

    /// Recall evaluation settings
    pub evaluation: EvaluationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Dictionaries: "id=path,id=path"
        if let Ok(sources) = std::env::var("RELFEAT_DICTIONARIES") {
            config.dictionaries = sources
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse())
                .collect::<Result<_, _>>()?;
        }

        if let Ok(delimiter) = std::env::var("RELFEAT_ARRAY_DELIMITER") {
            if delimiter.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "RELFEAT_ARRAY_DELIMITER".to_string(),
                    value: delimiter,
                });
            }
            config.input.array_delimiter = delimiter;
        }

        if let Ok(threshold) = std::env::var("RELFEAT_RECALL_THRESHOLD") {
            config.evaluation.threshold =
                threshold.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "RELFEAT_RECALL_THRESHOLD".to_string(),
                    value: threshold,
                })?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }

    /// Load from a TOML file; relative dictionary paths are resolved
    /// against the directory containing the file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        if let Some(base) = path.parent() {
            for source in &mut config.dictionaries {
                source.resolve_against(base);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        // Only override if env values differ from defaults
        if !env_config.dictionaries.is_empty() {
            self.dictionaries = env_config.dictionaries;
        }
        if env_config.input.array_delimiter != RecordFormat::default().array_delimiter {
            self.input.array_delimiter = env_config.input.array_delimiter;
        }
        if env_config.evaluation.threshold != EvaluationConfig::default().threshold {
            self.evaluation.threshold = env_config.evaluation.threshold;
        }
        if env_config.logging.level != LoggingConfig::default().level {
            self.logging.level = env_config.logging.level;
        }
        if env_config.logging.json_format {
            self.logging.json_format = true;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings that would make every record fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.array_delimiter.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "input.array_delimiter".to_string(),
                value: String::new(),
            });
        }
        if self.input.array_delimiter.contains(self.input.field_delimiter) {
            return Err(ConfigError::InvalidValue {
                key: "input.array_delimiter".to_string(),
                value: self.input.array_delimiter.clone(),
            });
        }
        if self.features.length_bin_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "features.length_bin_size".to_string(),
                value: "0".to_string(),
            });
        }
        self.evaluation.validate()
    }
}

/// A dictionary file registered under an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionarySource {
    /// Identifier used in feature names
    pub id: String,

    /// File with one word per line
    pub path: PathBuf,
}

impl DictionarySource {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    fn resolve_against(&mut self, base: &Path) {
        if self.path.is_relative() {
            self.path = base.join(&self.path);
        }
    }
}

impl std::str::FromStr for DictionarySource {
    type Err = ConfigError;

    /// Parse `id=path`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((id, path)) if !id.trim().is_empty() && !path.trim().is_empty() => {
                Ok(Self::new(id.trim(), path.trim()))
            }
            _ => Err(ConfigError::InvalidValue {
                key: "dictionary".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Layout of a relation record line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFormat {
    /// Separator between the ten record fields
    pub field_delimiter: char,

    /// Separator between entries of an annotation array
    pub array_delimiter: String,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self {
            field_delimiter: '\t',
            array_delimiter: "~^~".to_string(),
        }
    }
}

/// Feature generation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Dictionaries used for keyword features (empty = every loaded dictionary)
    pub dictionaries: Vec<String>,

    /// Widest context window left of and right of the mention pair
    pub window_size: usize,

    /// Longest n-gram taken from the words between the mentions
    pub ngram_max: usize,

    /// Bucket width for the between-mention length feature
    pub length_bin_size: usize,

    /// Longest gap (in tokens) for which full between-sequence features are emitted
    pub max_between: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            dictionaries: Vec::new(),
            window_size: 3,
            ngram_max: 3,
            length_bin_size: 5,
            max_between: 10,
        }
    }
}

/// Recall evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Expectation at or above which a relation counts as predicted
    pub threshold: f64,

    /// Expectation table column holding the relation id
    pub id_column: usize,

    /// Expectation table column holding the inferred probability
    pub expectation_column: usize,

    /// Skip correct labels with no expectation row instead of failing
    pub skip_unmatched: bool,
}

impl EvaluationConfig {
    /// Apply a threshold override and check the result
    pub fn with_threshold(mut self, threshold: Option<f64>) -> Result<Self, ConfigError> {
        if let Some(threshold) = threshold {
            self.threshold = threshold;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidValue {
                key: "evaluation.threshold".to_string(),
                value: self.threshold.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.9,
            id_column: 0,
            expectation_column: 4,
            skip_unmatched: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
