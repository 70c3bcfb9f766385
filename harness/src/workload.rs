//! The input matrices of one run plus the generator that drives sampling.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::BenchConfig;
use crate::matrix::{MatmulDims, Matrix};
use crate::verify::{verify, VerificationReport};

pub struct Workload {
    pub a: Matrix,
    pub b: Matrix,
    pub sample_count: usize,
    rng: StdRng,
}

impl Workload {
    /// Generate both inputs for `config`. With a seed, the matrices and every
    /// later sample draw are reproducible.
    pub fn generate(config: &BenchConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let a = Matrix::generate_with(config.matrix_size, &mut rng);
        let b = Matrix::generate_with(config.matrix_size, &mut rng);
        Workload {
            a,
            b,
            sample_count: config.sample_count,
            rng,
        }
    }

    pub fn dims(&self) -> MatmulDims {
        MatmulDims::square(self.a.size())
    }

    /// Check `device_result` at `sample_count` fresh random cells.
    pub fn verify(&mut self, device_result: &[f32]) -> VerificationReport {
        let dims = self.dims();
        verify(
            self.a.as_slice(),
            self.b.as_slice(),
            device_result,
            dims,
            self.sample_count,
            &mut self.rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_workloads_match() {
        let config = BenchConfig {
            matrix_size: 8,
            seed: Some(99),
            ..Default::default()
        };
        let first = Workload::generate(&config);
        let second = Workload::generate(&config);
        assert_eq!(first.a, second.a);
        assert_eq!(first.b, second.b);
        assert_ne!(first.a, first.b);
    }

    #[test]
    fn test_verify_against_garbage_fails() {
        let config = BenchConfig {
            matrix_size: 8,
            sample_count: 10,
            ..Default::default()
        };
        let mut workload = Workload::generate(&config);
        let report = workload.verify(&vec![100.0; 64]);
        assert_eq!(report.len(), 10);
        assert!(!report.passed);
    }
}
