//! Explainer configuration
//!
//! Loaded from a JSON file. Every field is optional:
//!
//! ```json
//! {
//!   "verbosity": "executionStats",
//!   "server_version": "3.4.7",
//!   "log_level": "info",
//!   "policy_overrides": [
//!     {"kind": "aggregate", "when": ">= 3.6", "verdict": "allow"}
//!   ]
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event, Event, Logger, Severity};
use crate::policy::{PolicyRule, PolicyTable};
use crate::version::{ServerVersion, VersionError};

/// Explain verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verbosity {
    #[default]
    QueryPlanner,
    ExecutionStats,
    AllPlansExecution,
}

impl Verbosity {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::QueryPlanner => "queryPlanner",
            Verbosity::ExecutionStats => "executionStats",
            Verbosity::AllPlansExecution => "allPlansExecution",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid server_version: {0}")]
    ServerVersion(#[source] VersionError),
}

/// Explainer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainConfig {
    /// Explain verbosity (default: queryPlanner)
    #[serde(default)]
    pub verbosity: Verbosity,

    /// Server version to assume instead of asking the server
    #[serde(default)]
    pub server_version: Option<String>,

    /// Lowest severity that is logged (default: warn)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,

    /// Rules consulted before the builtin policy table
    #[serde(default)]
    pub policy_overrides: Vec<PolicyRule>,
}

fn default_log_level() -> Severity {
    Severity::Warn
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            server_version: None,
            log_level: default_log_level(),
            policy_overrides: Vec::new(),
        }
    }
}

impl ExplainConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&content)?;
        log_event(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("verbosity", config.verbosity.as_str()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ExplainConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Version constraints are checked while parsing; the pinned server
    /// version is checked here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pinned_version()?;
        Ok(())
    }

    /// The configured server version, parsed
    pub fn pinned_version(&self) -> Result<Option<ServerVersion>, ConfigError> {
        self.server_version
            .as_deref()
            .map(ServerVersion::parse)
            .transpose()
            .map_err(ConfigError::ServerVersion)
    }

    /// Builtin policy with the configured overrides first
    pub fn policy_table(&self) -> PolicyTable {
        PolicyTable::with_overrides(self.policy_overrides.iter().cloned())
    }

    /// Apply the configured log level
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_level);
    }
}
