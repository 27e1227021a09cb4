use clap::{Parser, Subcommand};

mod commands;

use commands::{ScoreArgs, ViolationsArgs};

#[derive(Parser)]
#[command(name = "implied-dist")]
#[command(about = "Score Kalshi-implied distributions against realized outcomes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct and CRPS-score every settled event in a bundle
    Score(ScoreArgs),
    /// Report monotonicity violations and their reversion
    Violations(ViolationsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Score(args) => commands::run_score(args).await?,
        Commands::Violations(args) => commands::run_violations(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_score_command() {
        let cli = Cli::try_parse_from([
            "implied-dist",
            "score",
            "--input",
            "bundle.json",
            "--output",
            "report.json",
            "--parallel",
        ])
        .unwrap();

        match cli.command {
            Commands::Score(args) => {
                assert_eq!(args.input.to_str(), Some("bundle.json"));
                assert_eq!(args.config.to_str(), Some("config/Config.toml"));
                assert!(args.parallel);
                assert!(args.output.is_some());
            }
            Commands::Violations(_) => panic!("expected score command"),
        }
    }

    #[test]
    fn score_requires_input() {
        assert!(Cli::try_parse_from(["implied-dist", "score"]).is_err());
    }
}
