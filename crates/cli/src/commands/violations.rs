//! CLI command to report arbitrage violations without scoring.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use implied_dist_core::MarketDataSource;
use implied_dist_reconstruct::{group_markets, SnapshotBuilder, ViolationAnalyzer};

/// Build snapshots for every event and summarize monotonicity violations.
///
/// Outcomes are not needed; unsettled events are included.
#[derive(Args, Debug)]
pub struct ViolationsArgs {
    /// JSON bundle with `markets`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: PathBuf,
}

/// Runs the violations command.
pub fn run_violations(args: ViolationsArgs) -> Result<()> {
    let config = super::load_config(&args.config, None)?;
    let input = super::load_bundle(&args.input)?;
    let builder = SnapshotBuilder::from_config(&config.snapshot);

    let grouping = group_markets(input.markets());
    let snapshots: Vec<(String, Vec<_>)> = grouping
        .events
        .values()
        .map(|event| (event.event_ticker.clone(), builder.build(event)))
        .collect();

    let report = ViolationAnalyzer::analyze(
        snapshots
            .iter()
            .map(|(ticker, snaps)| (ticker.as_str(), snaps.as_slice())),
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
