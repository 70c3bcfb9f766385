//! Sampling verifier: compares device output against the host reference at
//! a bounded set of distinct random cells.

use rand::seq::index;
use rand::Rng;
use serde::Serialize;

use crate::matrix::MatmulDims;
use crate::reference::reference_value;

/// Largest absolute difference still counted as correct (exclusive).
pub const TOLERANCE: f64 = 0.01;

/// Outcome of comparing one output cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationCheck {
    pub row: usize,
    pub col: usize,
    /// Host reference value.
    pub cpu: f64,
    /// Value read back from the device.
    pub gpu: f32,
    pub diff: f64,
    pub is_correct: bool,
}

impl VerificationCheck {
    fn new(row: usize, col: usize, cpu: f64, gpu: f32) -> Self {
        let diff = (cpu - gpu as f64).abs();
        VerificationCheck {
            row,
            col,
            cpu,
            gpu,
            diff,
            // NaN never compares below the tolerance
            is_correct: diff < TOLERANCE,
        }
    }
}

/// All checks of one verification pass plus aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub checks: Vec<VerificationCheck>,
    pub max_diff: f64,
    pub avg_diff: f64,
    pub passed: bool,
}

impl VerificationReport {
    /// Aggregate a list of checks. An empty list passes with zero diffs.
    pub fn from_checks(checks: Vec<VerificationCheck>) -> Self {
        let max_diff = checks.iter().fold(0.0f64, |acc, c| {
            if c.diff.is_nan() || acc.is_nan() {
                f64::NAN
            } else {
                acc.max(c.diff)
            }
        });
        let avg_diff = if checks.is_empty() {
            0.0
        } else {
            checks.iter().map(|c| c.diff).sum::<f64>() / checks.len() as f64
        };
        let passed = checks.iter().all(|c| c.is_correct);
        VerificationReport {
            checks,
            max_diff,
            avg_diff,
            passed,
        }
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &VerificationCheck> {
        self.checks.iter().filter(|c| !c.is_correct)
    }
}

/// Draw `sample_count` distinct `(row, col)` cells of an `m×n` output.
///
/// The count is clamped to `m * n`; cells are drawn without replacement so
/// the draw always terminates.
pub fn sample_positions<R: Rng + ?Sized>(
    dims: MatmulDims,
    sample_count: usize,
    rng: &mut R,
) -> Vec<(usize, usize)> {
    let total = dims.output_len();
    let amount = sample_count.min(total);
    if amount < sample_count {
        log::warn!(
            "sample count {} exceeds the {} output cells; checking every cell",
            sample_count,
            total
        );
    }
    if amount == 0 {
        return Vec::new();
    }
    index::sample(rng, total, amount)
        .into_iter()
        .map(|idx| (idx / dims.n, idx % dims.n))
        .collect()
}

/// Verify `device_result` (the flattened `m×n` product) at `sample_count`
/// random cells.
///
/// Never fails: a device buffer that is too short makes the missing cells
/// fail their check.
pub fn verify<R: Rng + ?Sized>(
    a: &[f32],
    b: &[f32],
    device_result: &[f32],
    dims: MatmulDims,
    sample_count: usize,
    rng: &mut R,
) -> VerificationReport {
    let checks = sample_positions(dims, sample_count, rng)
        .into_iter()
        .map(|(row, col)| {
            let cpu = reference_value(a, b, dims, row, col);
            let gpu = device_result
                .get(row * dims.n + col)
                .copied()
                .unwrap_or(f32::NAN);
            let check = VerificationCheck::new(row, col, cpu, gpu);
            log::trace!(
                "[{},{}] cpu={} gpu={} diff={}",
                row,
                col,
                check.cpu,
                check.gpu,
                check.diff
            );
            check
        })
        .collect();
    VerificationReport::from_checks(checks)
}

/// [`verify`] using the thread-local generator.
pub fn verify_sampled(
    a: &[f32],
    b: &[f32],
    device_result: &[f32],
    dims: MatmulDims,
    sample_count: usize,
) -> VerificationReport {
    verify(a, b, device_result, dims, sample_count, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    /// Small integer-valued inputs so the f32 product is exact.
    fn exact_case(size: usize) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let a: Vec<f32> = (0..size * size).map(|i| (i % 5) as f32 - 2.0).collect();
        let b: Vec<f32> = (0..size * size).map(|i| (i % 3) as f32 - 1.0).collect();
        let dims = MatmulDims::square(size);
        let mut c = vec![0.0f32; size * size];
        for row in 0..size {
            for col in 0..size {
                c[row * size + col] = reference_value(&a, &b, dims, row, col) as f32;
            }
        }
        (a, b, c)
    }

    #[test]
    fn test_sample_count_and_distinct() {
        let mut rng = StdRng::seed_from_u64(1);
        let dims = MatmulDims::square(16);
        let positions = sample_positions(dims, 50, &mut rng);
        assert_eq!(positions.len(), 50);
        let unique: HashSet<_> = positions.iter().collect();
        assert_eq!(unique.len(), 50);
        assert!(positions.iter().all(|&(r, c)| r < 16 && c < 16));
    }

    #[test]
    fn test_sample_count_clamped_to_cells() {
        let mut rng = StdRng::seed_from_u64(2);
        let dims = MatmulDims::square(3);
        let positions = sample_positions(dims, 100, &mut rng);
        assert_eq!(positions.len(), 9);
        let unique: HashSet<_> = positions.into_iter().collect();
        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn test_rectangular_positions_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let dims = MatmulDims::new(2, 7, 4);
        let positions = sample_positions(dims, 14, &mut rng);
        assert_eq!(positions.len(), 14);
        assert!(positions.iter().all(|&(r, c)| r < 2 && c < 7));
    }

    #[test]
    fn test_exact_results_pass() {
        let (a, b, c) = exact_case(8);
        let mut rng = StdRng::seed_from_u64(4);
        let report = verify(&a, &b, &c, MatmulDims::square(8), 20, &mut rng);
        assert_eq!(report.len(), 20);
        assert!(report.passed);
        assert_eq!(report.max_diff, 0.0);
        assert_eq!(report.avg_diff, 0.0);
    }

    #[test]
    fn test_one_bad_cell_fails() {
        let (a, b, mut c) = exact_case(4);
        c[5] += 0.5;
        let mut rng = StdRng::seed_from_u64(5);
        // every cell is sampled so the corrupted one is always hit
        let report = verify(&a, &b, &c, MatmulDims::square(4), 16, &mut rng);
        assert!(!report.passed);
        assert_eq!(report.failed_checks().count(), 1);
        let bad = report.failed_checks().next().unwrap();
        assert_eq!((bad.row, bad.col), (1, 1));
        assert!((report.max_diff - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_tolerance_is_strict() {
        assert!(!VerificationCheck::new(0, 0, 0.01, 0.0).is_correct);
        assert!(VerificationCheck::new(0, 0, 0.009, 0.0).is_correct);
    }

    #[test]
    fn test_short_device_buffer_fails() {
        let (a, b, c) = exact_case(4);
        let mut rng = StdRng::seed_from_u64(6);
        let report = verify(&a, &b, &c[..8], MatmulDims::square(4), 16, &mut rng);
        assert!(!report.passed);
        assert_eq!(report.failed_checks().count(), 8);
        assert!(report.max_diff.is_nan());
    }

    #[test]
    fn test_empty_report_passes() {
        let report = VerificationReport::from_checks(Vec::new());
        assert!(report.passed);
        assert_eq!(report.max_diff, 0.0);
        assert_eq!(report.avg_diff, 0.0);
    }
}
