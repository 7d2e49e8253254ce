//! CLI Command Implementations

pub mod infer;
pub mod show;

use anyhow::{Context, Result};
use pasp_core::{PaspConfig, Program};
use std::path::{Path, PathBuf};

/// Load config from file (or defaults), then apply `PASP_*` environment overrides.
pub fn load_config(path: Option<PathBuf>) -> Result<PaspConfig> {
    let path = path.unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pasp")
            .join("config.json")
    });

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    } else {
        PaspConfig::default()
    };

    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a program file (JSON).
pub fn load_program(path: &Path) -> Result<Program> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read program file: {}", path.display()))?;
    let program: Program = serde_json::from_str(&content).context("Failed to parse program JSON")?;
    program.validate()?;
    Ok(program)
}
