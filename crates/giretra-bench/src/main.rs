use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use giretra_bench::config::{BenchmarkConfig, ResolvedOutputs};
use giretra_bench::logging::init_logging;
use giretra_bench::tournament::TournamentRunner;
use giretra_core::AppInfo;

/// Tournament and validation harness for Giretra agents.
#[derive(Debug, Parser)]
#[command(
    name = "giretra-bench",
    author,
    version,
    about = "Deterministic Giretra tournament harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of matches to play.
    #[arg(long, value_name = "MATCHES")]
    matches: Option<usize>,

    /// Override the RNG seed for match generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of seat permutations per match.
    #[arg(long, value_name = "COUNT")]
    permutations: Option<usize>,

    /// Exit after validating the configuration (no tournament is run).
    #[arg(long)]
    validate_only: bool,
}

fn banner() -> String {
    format!(
        "{} engine {} ({})",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::codename()
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    println!("{}", banner());
    let mut config = BenchmarkConfig::from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(matches) = cli.matches {
        config.matches.count = matches;
    }

    if let Some(seed) = cli.seed {
        config.matches.seed = Some(seed);
    }

    if let Some(permutations) = cli.permutations {
        config.matches.permutations = permutations;
    }

    config.validate().context("validating overrides")?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let matches = config.matches.count;
    let permutations = config.matches.permutations;
    let lineup = config
        .agents
        .iter()
        .map(|agent| agent.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    println!(
        "Loaded configuration '{run_id}' with agents [{lineup}] ({matches} match{}, {permutations} permutation{})",
        if matches == 1 { "" } else { "es" },
        if permutations == 1 { "" } else { "s" }
    );

    let runner = TournamentRunner::new(config.clone(), outputs.clone())?;

    if cli.validate_only {
        println!("Validation-only mode: tournament execution skipped.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let summary = runner.run().await?;
    println!(
        "Tournament complete for '{run_id}': {} matches × {} permutations → {} deal rows at {}",
        summary.matches_played,
        summary.permutations,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    if summary.aborted_matches > 0 {
        println!("Aborted matches: {}", summary.aborted_matches);
    }
    println!("Rule violations recorded: {}", summary.violations);
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(guard) = logging_guard.as_ref() {
        println!("Trace log: {}", guard.trace_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_names_engine_version() {
        let banner = banner();
        assert!(banner.starts_with("giretra engine "));
        assert!(banner.contains(AppInfo::version()));
        assert!(banner.ends_with("(Belote Engine)"));
    }

    #[test]
    fn cli_defaults_to_bundled_config() {
        let cli = Cli::try_parse_from(["giretra-bench"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("bench/bench.yaml"));
        assert!(!cli.validate_only);
    }
}
