//! Console output of workflow results

use crate::data::UniqueValues;
use crate::error::Result;
use crate::optimizer::GridSearchResult;
use crate::training::{ComparisonRow, RegressionMetrics};
use colored::*;
use std::io::Write;

/// Receives workflow results as they become available.
///
/// Every hook defaults to doing nothing, so a reporter only implements the
/// stages it cares about.
pub trait Reporter {
    fn unique_values(&mut self, _values: &[UniqueValues]) -> Result<()> {
        Ok(())
    }

    fn comparison(&mut self, _rows: &[ComparisonRow]) -> Result<()> {
        Ok(())
    }

    fn search_result(&mut self, _result: &GridSearchResult) -> Result<()> {
        Ok(())
    }

    fn metrics(&mut self, _metrics: &RegressionMetrics) -> Result<()> {
        Ok(())
    }
}

/// Reporter that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

/// Writes results as plain labelled text
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn heading(&mut self, title: &str) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", title.bold())?;
        Ok(())
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn unique_values(&mut self, values: &[UniqueValues]) -> Result<()> {
        self.heading("Categorical values")?;
        for v in values {
            writeln!(self.out, "{}: {}", v.column, v)?;
        }
        Ok(())
    }

    fn comparison(&mut self, rows: &[ComparisonRow]) -> Result<()> {
        self.heading("Model comparison")?;
        writeln!(
            self.out,
            "{:<28} {:>12} {:>10} {:>10} {:>10}",
            "Model", "Adjusted R2", "R2", "RMSE", "Time (s)"
        )?;
        for row in rows {
            writeln!(
                self.out,
                "{:<28} {:>12.4} {:>10.4} {:>10.4} {:>10.3}",
                row.model, row.adjusted_r2, row.r2, row.rmse, row.fit_time_secs
            )?;
        }
        Ok(())
    }

    fn search_result(&mut self, result: &GridSearchResult) -> Result<()> {
        self.heading("Best parameters")?;
        let params = serde_json::to_string_pretty(&result.best_candidate.params())?;
        writeln!(self.out, "{}", params)?;
        writeln!(self.out, "CV R2: {:.4}", result.best_score)?;
        Ok(())
    }

    fn metrics(&mut self, metrics: &RegressionMetrics) -> Result<()> {
        self.heading("Test set")?;
        writeln!(self.out, "MAE: {}", metrics.mae)?;
        writeln!(self.out, "MSE: {}", metrics.mse)?;
        writeln!(self.out, "R2: {}", metrics.r2)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(reporter: ConsoleReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_metrics_lines() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        let metrics = RegressionMetrics {
            mae: 1.5,
            mse: 4.0,
            rmse: 2.0,
            r2: 0.9,
            n_samples: 10,
        };
        reporter.metrics(&metrics).unwrap();
        let text = output(reporter);
        assert!(text.contains("MAE: 1.5\n"));
        assert!(text.contains("MSE: 4\n"));
        assert!(text.contains("R2: 0.9\n"));
    }

    #[test]
    fn test_unique_values_and_comparison() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter
            .unique_values(&[UniqueValues {
                column: "gender".to_string(),
                values: vec!["female".to_string(), "male".to_string()],
                has_null: false,
            }])
            .unwrap();
        reporter
            .comparison(&[ComparisonRow {
                model: "Ridge".to_string(),
                r2: 0.5,
                adjusted_r2: 0.45,
                rmse: 3.0,
                fit_time_secs: 0.01,
            }])
            .unwrap();
        let text = output(reporter);
        assert!(text.contains("gender: ['female' 'male']"));
        assert!(text.lines().any(|l| l.starts_with("Ridge") && l.contains("0.4500")));
    }

    #[test]
    fn test_silent_reporter_accepts_everything() {
        let mut r = SilentReporter;
        assert!(r.unique_values(&[]).is_ok());
        assert!(r.comparison(&[]).is_ok());
    }
}
