//! Scorecast CLI Module
//!
//! Command-line entry to the writing-score workflow.

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::workflow::{ConsoleReporter, Workflow, WorkflowConfig, WorkflowReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "scorecast",
    version = env!("CARGO_PKG_VERSION"),
    about = "Predict student writing scores with a grid-searched random forest"
)]
pub struct Cli {
    /// Input CSV file (overrides the configured path)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip the model comparison battery
    #[arg(long)]
    pub no_compare: bool,
}

impl Cli {
    /// Configuration after applying the file and flag overrides
    pub fn workflow_config(&self) -> anyhow::Result<WorkflowConfig> {
        let mut config = match &self.config {
            Some(path) => WorkflowConfig::from_json_file(path)?,
            None => WorkflowConfig::default(),
        };
        if let Some(data) = &self.data {
            config = config.with_data_path(data);
        }
        if self.no_compare {
            config = config.with_comparison(false);
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(cli: &Cli) -> anyhow::Result<WorkflowReport> {
    let config = cli.workflow_config()?;

    section("Scorecast");
    println!("  {}", kv("data   ", &config.data_path.display().to_string()));
    println!("  {}", kv("target ", &config.target_column));
    println!(
        "  {}",
        kv(
            "search ",
            &format!(
                "{} candidates × {} folds",
                config.search_grid.len(),
                config.cv_folds
            )
        )
    );

    let start = Instant::now();
    let mut reporter = ConsoleReporter::stdout();
    let report = Workflow::new(config).run(&mut reporter)?;

    println!();
    step_ok(&format!(
        "{} rows ({} train / {} test) in {}",
        report.n_rows,
        report.n_train,
        report.n_test,
        accent(&format!("{:.1}s", start.elapsed().as_secs_f64()))
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["scorecast"]).unwrap();
        let config = cli.workflow_config().unwrap();
        assert_eq!(config, WorkflowConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let cli =
            Cli::try_parse_from(["scorecast", "--data", "other.csv", "--no-compare"]).unwrap();
        let config = cli.workflow_config().unwrap();
        assert_eq!(config.data_path, PathBuf::from("other.csv"));
        assert!(!config.run_comparison);
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::try_parse_from(["scorecast", "--config", "/nonexistent/scorecast.json"])
            .unwrap();
        assert!(cli.workflow_config().is_err());
    }
}
