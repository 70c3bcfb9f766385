//! Terminal and JSON rendering of matrices, verification reports and
//! benchmark results.

use std::fmt;

use serde::Serialize;

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::matrix::Matrix;
use crate::runner::{BenchmarkOutcome, BenchmarkResult};
use crate::verify::VerificationReport;

/// Largest corner of a matrix shown by [`matrix_preview`].
pub const PREVIEW_LIMIT: usize = 8;

/// Top-left corner of `matrix`, at most `limit`×`limit`, two decimals per
/// cell.
pub fn matrix_preview(matrix: &Matrix, limit: usize) -> String {
    let shown = matrix.size().min(limit);
    let mut out = String::new();
    for row in 0..shown {
        let cells: Vec<String> = (0..shown)
            .filter_map(|col| matrix.get(row, col))
            .map(|v| format!("{:>6.2}", v))
            .collect();
        out.push_str(&cells.join(" "));
        if shown < matrix.size() {
            out.push_str("  ...");
        }
        out.push('\n');
    }
    if shown < matrix.size() {
        out.push_str(&format!(
            "({}x{} shown of {}x{})\n",
            shown,
            shown,
            matrix.size(),
            matrix.size()
        ));
    }
    out
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Verification Results:")?;
        for check in &self.checks {
            writeln!(
                f,
                "Position [{},{}]: GPU = {:.6}, CPU = {:.6} Diff: {:.6} {}",
                check.row,
                check.col,
                check.gpu,
                check.cpu,
                check.diff,
                mark(check.is_correct)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Verification Statistics:")?;
        writeln!(f, "• Positions checked: {}", self.checks.len())?;
        writeln!(f, "• Maximum difference: {:.6}", self.max_diff)?;
        writeln!(f, "• Average difference: {:.6}", self.avg_diff)?;
        let failed: Vec<String> = self
            .failed_checks()
            .map(|c| format!("[{},{}]", c.row, c.col))
            .collect();
        if !failed.is_empty() {
            writeln!(f, "• Failed positions ({}): {}", failed.len(), failed.join(" "))?;
        }
        write!(
            f,
            "• Overall verification: {} {}",
            if self.passed { "PASSED" } else { "FAILED" },
            mark(self.passed)
        )
    }
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance Results:")?;
        writeln!(f, "• Average Time: {:.2} ms", self.avg_ms)?;
        if !self.latencies_ms.is_empty() {
            writeln!(
                f,
                "• Min / Max Time: {:.2} / {:.2} ms",
                self.min_ms(),
                self.max_ms()
            )?;
        }
        write!(f, "• GFLOPs: {:.2}", self.gflops())
    }
}

impl fmt::Display for BenchmarkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkOutcome::Completed { result, .. } => write!(f, "{}", result),
            BenchmarkOutcome::VerificationFailed { warmup_run, .. } => {
                write!(f, "Warmup verification failed (run {})", warmup_run)
            }
        }
    }
}

/// Everything about one invocation, for `--format json`.
#[derive(Debug, Serialize)]
pub struct RunRecord<'a> {
    /// RFC 3339 timestamp of when the record was produced.
    pub date: String,
    pub device: &'a str,
    pub config: &'a BenchConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<&'a VerificationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<&'a BenchmarkOutcome>,
}

impl<'a> RunRecord<'a> {
    pub fn new(device: &'a str, config: &'a BenchConfig) -> Self {
        RunRecord {
            date: chrono::Local::now().to_rfc3339(),
            device,
            config,
            verification: None,
            benchmark: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BenchError::config(format!("failed to serialize run record: {}", e)))
    }
}
