//! Run configuration: which algorithm to run, how to weight the heuristic,
//! and which budgets apply.
//!
//! The configuration is normative: it is embedded in every run report, so
//! the report digest commits to the conditions under which it was produced.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use wayfinder_search::error::SearchError;
use wayfinder_search::policy::{
    BestFirstConfig, FocalConfig, IterativeDeepeningConfig, ResourceLimits,
};

/// Algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmV1 {
    BestFirst,
    Focal,
    IterativeDeepening,
}

impl AlgorithmV1 {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BestFirst => "best_first",
            Self::Focal => "focal",
            Self::IterativeDeepening => "iterative_deepening",
        }
    }
}

/// A complete run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfigV1 {
    pub algorithm: AlgorithmV1,
    /// `w` in the primary ordering key `f = g + w * h`.
    pub heuristic_weight: f64,
    pub best_first: BestFirstConfig,
    pub focal: FocalConfig,
    pub iterative_deepening: IterativeDeepeningConfig,
    pub limits: ResourceLimits,
}

impl Default for RunConfigV1 {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmV1::BestFirst,
            heuristic_weight: 1.0,
            best_first: BestFirstConfig::default(),
            focal: FocalConfig::default(),
            iterative_deepening: IterativeDeepeningConfig::default(),
            limits: ResourceLimits::unlimited(),
        }
    }
}

impl RunConfigV1 {
    /// A default configuration running `algorithm`.
    #[must_use]
    pub fn for_algorithm(algorithm: AlgorithmV1) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Check that every field the selected algorithm reads is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWeight`] for a negative or non-finite
    /// heuristic weight, and [`ConfigError::Policy`] when the focal policy
    /// is rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.heuristic_weight.is_finite() || self.heuristic_weight < 0.0 {
            return Err(ConfigError::InvalidWeight {
                weight: self.heuristic_weight,
            });
        }
        if self.algorithm == AlgorithmV1::Focal {
            self.focal.validate()?;
        }
        Ok(())
    }
}

/// Error loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing run config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("heuristic weight must be finite and >= 0, got {weight}")]
    InvalidWeight { weight: f64 },
    #[error(transparent)]
    Policy(#[from] SearchError),
}

/// Parse and validate a configuration from JSON text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] on malformed JSON or unknown fields, or a
/// validation error from [`RunConfigV1::validate`].
pub fn parse_run_config(json: &str) -> Result<RunConfigV1, ConfigError> {
    let config: RunConfigV1 = serde_json::from_str(json)?;
    config.validate()?;
    debug!(algorithm = config.algorithm.as_str(), "run config parsed");
    Ok(config)
}

/// Load, parse, and validate a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
/// [`parse_run_config`].
pub fn load_run_config(path: &Path) -> Result<RunConfigV1, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_run_config(&text)?;
    info!(path = %path.display(), algorithm = config.algorithm.as_str(), "run config loaded");
    Ok(config)
}
