//! CLI commands for implied-distribution analysis.

pub mod score;
pub mod violations;

pub use score::{run_score, ScoreArgs};
pub use violations::{run_violations, ViolationsArgs};

use std::path::Path;

use anyhow::{Context, Result};
use implied_dist_core::{AnalysisConfig, ConfigLoader};
use implied_dist_scoring::BatchInput;

/// Reads a JSON input bundle of markets, outcomes, and history.
pub(crate) fn load_bundle(path: &Path) -> Result<BatchInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input bundle {}", path.display()))?;
    let input: BatchInput = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse input bundle {}", path.display()))?;
    tracing::info!(
        markets = input.markets.len(),
        outcomes = input.outcomes.len(),
        path = %path.display(),
        "Loaded input bundle"
    );
    Ok(input)
}

/// Loads configuration from a file, with a named profile layered on top
/// when given.
pub(crate) fn load_config(config: &Path, profile: Option<&str>) -> Result<AnalysisConfig> {
    match profile {
        Some(profile) => ConfigLoader::load_from_with_profile(config, profile),
        None => ConfigLoader::load_from(config),
    }
}
