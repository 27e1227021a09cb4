//! CLI command to score every settled event in an input bundle.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use implied_dist_scoring::{BatchEvaluator, ReportFormatter};

/// Reconstruct implied distributions and compute CRPS against benchmarks.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// JSON bundle with `markets`, `outcomes`, and optional `history`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: PathBuf,

    /// Config profile (loads <stem>.<profile>.toml next to --config on top of it)
    #[arg(long)]
    pub profile: Option<String>,

    /// Write the full report as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Score events on the blocking thread pool
    #[arg(long)]
    pub parallel: bool,
}

/// Runs the score command.
pub async fn run_score(args: ScoreArgs) -> Result<()> {
    let config = super::load_config(&args.config, args.profile.as_deref())?;
    let input = super::load_bundle(&args.input)?;
    let evaluator = BatchEvaluator::new(&config)?;

    let report = if args.parallel || config.scoring.parallel {
        evaluator.evaluate_parallel(&input).await?
    } else {
        evaluator.evaluate(&input)
    };

    println!("{}", ReportFormatter::format(&report));

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote JSON report");
    }

    Ok(())
}
