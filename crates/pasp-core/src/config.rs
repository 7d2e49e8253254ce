//! Configuration management for inference runs.
//!
//! Configuration can be loaded from:
//! - Environment variables (prefixed with `PASP_`)
//! - Configuration files (JSON, via serde)
//! - Programmatic defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use pasp_core::config::PaspConfig;
//! use pasp_core::Strategy;
//!
//! let config = PaspConfig::builder()
//!     .strategy(Strategy::ModelCounting)
//!     .workers(4)
//!     .build()?;
//! ```

use crate::aggregate::Semantics;
use crate::choice::MAX_FACTS;
use crate::error::{InferenceError, Result};
use crate::evaluate::Strategy;
use serde::{Deserialize, Serialize};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaspConfig {
    /// Inference configuration.
    pub inference: InferenceConfig,

    /// Worker pool configuration.
    pub execution: ExecutionConfig,

    /// External solver configuration.
    pub solver: SolverConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl PaspConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PaspConfigBuilder {
        PaspConfigBuilder::default()
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment variables prefixed with `PASP_`:
    /// - `PASP_STRATEGY` - `model_counting` or `consequences`
    /// - `PASP_SEMANTICS` - `credal` or `max_ent`
    /// - `PASP_MAX_FACTS` - Maximum number of probabilistic facts
    /// - `PASP_WORKERS` - Worker threads (0 = available parallelism)
    /// - `PASP_CLINGO` - Path to the clingo binary
    /// - `PASP_LOG_LEVEL` - Logging level (trace, debug, info, warn, error)
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(strategy) = std::env::var("PASP_STRATEGY") {
            self.inference.strategy = strategy.parse().map_err(|e| {
                InferenceError::ConfigError(format!("Invalid PASP_STRATEGY: {}", e))
            })?;
        }

        if let Ok(semantics) = std::env::var("PASP_SEMANTICS") {
            self.inference.semantics = semantics.parse().map_err(|e| {
                InferenceError::ConfigError(format!("Invalid PASP_SEMANTICS: {}", e))
            })?;
        }

        if let Ok(max) = std::env::var("PASP_MAX_FACTS") {
            self.inference.max_probabilistic_facts = max.parse().map_err(|e| {
                InferenceError::ConfigError(format!("Invalid PASP_MAX_FACTS: {}", e))
            })?;
        }

        if let Ok(workers) = std::env::var("PASP_WORKERS") {
            self.execution.workers = workers.parse().map_err(|e| {
                InferenceError::ConfigError(format!("Invalid PASP_WORKERS: {}", e))
            })?;
        }

        if let Ok(bin) = std::env::var("PASP_CLINGO") {
            self.solver.clingo_binary = bin;
        }

        if let Ok(level) = std::env::var("PASP_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        let max = self.inference.max_probabilistic_facts;
        if max == 0 || max > MAX_FACTS {
            return Err(InferenceError::ConfigError(format!(
                "max_probabilistic_facts must be between 1 and {}",
                MAX_FACTS
            )));
        }

        if self.inference.semantics == Semantics::MaxEnt
            && self.inference.strategy != Strategy::ModelCounting
        {
            return Err(InferenceError::ConfigError(
                "max_ent semantics requires the model_counting strategy".into(),
            ));
        }

        if self.solver.clingo_binary.trim().is_empty() {
            return Err(InferenceError::ConfigError(
                "clingo_binary must not be empty".into(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(InferenceError::ConfigError(format!(
                "log level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

/// Inference configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// How each total choice is evaluated.
    pub strategy: Strategy,

    /// Probability semantics over the stable models of a total choice.
    pub semantics: Semantics,

    /// Largest accepted number of probabilistic facts (the run visits 2^n choices).
    pub max_probabilistic_facts: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Consequences,
            semantics: Semantics::Credal,
            max_probabilistic_facts: 30,
        }
    }
}

/// Worker pool configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Number of worker threads; 0 uses the available hardware parallelism, 1 runs on the
    /// calling thread.
    pub workers: usize,
}

/// External solver configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Path or name of the clingo binary.
    pub clingo_binary: String,

    /// Extra arguments passed to every clingo invocation.
    pub extra_args: Vec<String>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            clingo_binary: "clingo".into(),
            extra_args: Vec::new(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// JSON output format.
    pub json_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json_output: false,
        }
    }
}

/// Builder for PaspConfig.
#[derive(Default)]
pub struct PaspConfigBuilder {
    config: PaspConfig,
}

impl PaspConfigBuilder {
    /// Set the evaluation strategy.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.inference.strategy = strategy;
        self
    }

    /// Set the probability semantics.
    pub fn semantics(mut self, semantics: Semantics) -> Self {
        self.config.inference.semantics = semantics;
        self
    }

    /// Set the probabilistic fact limit.
    pub fn max_probabilistic_facts(mut self, max: usize) -> Self {
        self.config.inference.max_probabilistic_facts = max;
        self
    }

    /// Set the number of worker threads.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.execution.workers = workers;
        self
    }

    /// Set the clingo binary.
    pub fn clingo_binary(mut self, bin: impl Into<String>) -> Self {
        self.config.solver.clingo_binary = bin.into();
        self
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Enable JSON log output.
    pub fn json_logs(mut self, enabled: bool) -> Self {
        self.config.logging.json_output = enabled;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<PaspConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PaspConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = PaspConfig::builder()
            .strategy(Strategy::ModelCounting)
            .semantics(Semantics::MaxEnt)
            .workers(4)
            .log_level("debug")
            .build()
            .expect("should build");

        assert_eq!(config.inference.strategy, Strategy::ModelCounting);
        assert_eq!(config.inference.semantics, Semantics::MaxEnt);
        assert_eq!(config.execution.workers, 4);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn max_ent_requires_model_counting() {
        let result = PaspConfig::builder()
            .strategy(Strategy::Consequences)
            .semantics(Semantics::MaxEnt)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn zero_fact_limit_rejected() {
        let result = PaspConfig::builder().max_probabilistic_facts(0).build();

        assert!(result.is_err());
    }

    #[test]
    fn oversized_fact_limit_rejected() {
        let result = PaspConfig::builder().max_probabilistic_facts(64).build();

        assert!(result.is_err());
    }

    #[test]
    fn unknown_log_level_rejected() {
        let result = PaspConfig::builder().log_level("verbose").build();

        assert!(result.is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{"inference": {"strategy": "model_counting"}}"#;
        let config: PaspConfig = serde_json::from_str(json).expect("should parse");

        assert_eq!(config.inference.strategy, Strategy::ModelCounting);
        assert_eq!(config.inference.max_probabilistic_facts, 30);
        assert_eq!(config.solver.clingo_binary, "clingo");
        assert!(config.validate().is_ok());
    }
}
