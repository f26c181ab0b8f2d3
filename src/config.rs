use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::analysis::risk::{RiskTable, RiskThreshold};
use crate::report::types::RiskLevel;

pub const CONFIG_FILE: &str = ".readiness.toml";
pub const API_KEY_ENV: &str = "READINESS_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration loaded from .readiness.toml.
/// Every field has a default, so an empty or missing file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Model-backed analyzer settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Risk classification thresholds
    #[serde(default)]
    pub risk: RiskConfig,

    /// Per-severity penalty weights used for file scores
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Output bounds and input ceilings
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,
    /// API key. If None, falls back to READINESS_API_KEY env var.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub thresholds: Vec<RiskThreshold>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            thresholds: RiskTable::default().rows().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub warning: u32,
    pub safe: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            critical: 40,
            high: 20,
            medium: 10,
            warning: 5,
            safe: 0,
        }
    }
}

impl ScoringConfig {
    /// Penalty subtracted from a file score for one issue at `level`.
    pub fn weight(&self, level: RiskLevel) -> u32 {
        match level {
            RiskLevel::Critical => self.critical,
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Warning => self.warning,
            RiskLevel::Safe => self.safe,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_top_issues: usize,
    pub max_worst_files: usize,
    /// Files below this comment ratio get a documentation issue
    pub min_comment_ratio: f64,
    /// Files above this line count get a size issue
    pub max_file_lines: usize,
    /// Files beyond this count are dropped before analysis
    pub max_files: usize,
    /// Character budget for the merged text sent to readiness analyzers
    pub max_merged_chars: usize,
    /// Files larger than this are skipped by the directory loader
    pub max_file_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_top_issues: 10,
            max_worst_files: 5,
            min_comment_ratio: 0.1,
            max_file_lines: 500,
            max_files: 500,
            max_merged_chars: 60_000,
            max_file_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from .readiness.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.llm.api_key.is_none() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                config.llm.api_key = Some(key);
            }
        }

        Ok(config)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate TOML text.
    pub fn parse(contents: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.risk.thresholds.is_empty() {
            return Err(ConfigError::Invalid(
                "risk.thresholds must contain at least one row".to_string(),
            ));
        }
        if self.risk.thresholds.iter().any(|t| t.level == RiskLevel::Safe) {
            return Err(ConfigError::Invalid(
                "risk.thresholds must not contain a SAFE row; SAFE is the fallthrough".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.limits.min_comment_ratio) {
            return Err(ConfigError::Invalid(format!(
                "limits.min_comment_ratio must be within [0, 1], got {}",
                self.limits.min_comment_ratio
            )));
        }
        Ok(())
    }

    /// Risk table built from the configured thresholds.
    pub fn risk_table(&self) -> RiskTable {
        RiskTable::new(self.risk.thresholds.clone())
    }

    /// Resolve the API key: config file value takes precedence,
    /// falls back to READINESS_API_KEY env var. Blank keys count as missing.
    pub fn api_key(&self) -> Option<String> {
        self.llm
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}
