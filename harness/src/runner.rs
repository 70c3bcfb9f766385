//! Benchmark runner.
//!
//! A run goes through `WarmUp -> Timed -> Completed`, or stops in `Failed`
//! as soon as a warm-up verification fails. Backend errors abort the run
//! in whatever phase they happen.

use std::time::Instant;

use serde::Serialize;

use crate::backend::ComputeBackend;
use crate::error::Result;
use crate::matrix::MatmulDims;
use crate::verify::VerificationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WarmUp,
    Timed,
    Completed,
    Failed,
}

/// Latencies of the timed phase and the figures derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub dims: MatmulDims,
    /// Per-iteration latency in milliseconds.
    pub latencies_ms: Vec<f64>,
    pub avg_ms: f64,
    /// Floating-point operations per second.
    pub flops_per_sec: f64,
}

impl BenchmarkResult {
    pub fn new(dims: MatmulDims, latencies_ms: Vec<f64>) -> Self {
        let avg_ms = if latencies_ms.is_empty() {
            0.0
        } else {
            latencies_ms.iter().sum::<f64>() / latencies_ms.len() as f64
        };
        let flops_per_sec = if avg_ms > 0.0 {
            dims.flops() / (avg_ms / 1000.0)
        } else {
            0.0
        };
        BenchmarkResult {
            dims,
            latencies_ms,
            avg_ms,
            flops_per_sec,
        }
    }

    pub fn gflops(&self) -> f64 {
        self.flops_per_sec / 1e9
    }

    pub fn min_ms(&self) -> f64 {
        self.latencies_ms.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_ms(&self) -> f64 {
        self.latencies_ms.iter().copied().fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BenchmarkOutcome {
    Completed {
        result: BenchmarkResult,
        /// Report of the last warm-up run, if any warm-up ran.
        last_report: Option<VerificationReport>,
    },
    /// Warm-up run `warmup_run` (1-based) failed verification; no timed
    /// iteration was performed.
    VerificationFailed {
        warmup_run: usize,
        report: VerificationReport,
    },
}

impl BenchmarkOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, BenchmarkOutcome::Completed { .. })
    }

    pub fn phase(&self) -> Phase {
        match self {
            BenchmarkOutcome::Completed { .. } => Phase::Completed,
            BenchmarkOutcome::VerificationFailed { .. } => Phase::Failed,
        }
    }

    /// The failing warm-up report, or the last passing one.
    pub fn report(&self) -> Option<&VerificationReport> {
        match self {
            BenchmarkOutcome::Completed { last_report, .. } => last_report.as_ref(),
            BenchmarkOutcome::VerificationFailed { report, .. } => Some(report),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkRunner {
    pub warmup_runs: usize,
    pub iterations: usize,
}

impl BenchmarkRunner {
    pub fn new(warmup_runs: usize, iterations: usize) -> Self {
        BenchmarkRunner {
            warmup_runs,
            iterations,
        }
    }

    /// Warm up with verification, then time `iterations` sequential
    /// dispatches.
    ///
    /// `verify_once` receives each warm-up read-back.
    pub async fn run<B, F>(&self, backend: &mut B, mut verify_once: F) -> Result<BenchmarkOutcome>
    where
        B: ComputeBackend,
        F: FnMut(&[f32]) -> VerificationReport,
    {
        let dims = backend.dims();
        let mut phase = Phase::WarmUp;
        log::info!("{:?}: {} run(s) with verification", phase, self.warmup_runs);

        let mut last_report = None;
        for run in 1..=self.warmup_runs {
            let output = backend.compute_once().await?;
            let report = verify_once(&output);
            log::debug!(
                "warm-up {}/{}: max diff {:.6}, passed {}",
                run,
                self.warmup_runs,
                report.max_diff,
                report.passed
            );
            if !report.passed {
                phase = Phase::Failed;
                log::info!("{:?}: warm-up run {} failed verification", phase, run);
                return Ok(BenchmarkOutcome::VerificationFailed {
                    warmup_run: run,
                    report,
                });
            }
            last_report = Some(report);
        }

        phase = Phase::Timed;
        log::info!("{:?}: {} iteration(s)", phase, self.iterations);
        let mut latencies_ms = Vec::with_capacity(self.iterations);
        for i in 0..self.iterations {
            let start = Instant::now();
            backend.dispatch().await?;
            let elapsed = start.elapsed().as_secs_f64() * 1000.0;
            log::debug!("iteration {}: {:.3} ms", i + 1, elapsed);
            latencies_ms.push(elapsed);
        }

        let result = BenchmarkResult::new(dims, latencies_ms);
        log::info!(
            "{:?}: avg {:.3} ms, {:.2} GFLOP/s",
            Phase::Completed,
            result.avg_ms,
            result.gflops()
        );
        Ok(BenchmarkOutcome::Completed {
            result,
            last_report,
        })
    }
}
