//! Dense row-major matrices and multiplication shapes.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Shape of `A (m×k) · B (k×n) = C (m×n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatmulDims {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

impl MatmulDims {
    pub fn new(m: usize, n: usize, k: usize) -> Self {
        MatmulDims { m, n, k }
    }

    /// Dims for multiplying two `size×size` matrices.
    pub fn square(size: usize) -> Self {
        MatmulDims::new(size, size, size)
    }

    /// Number of cells in the output matrix.
    pub fn output_len(&self) -> usize {
        self.m * self.n
    }

    /// Floating-point operations for one product: one multiply and one add
    /// per inner-product term.
    pub fn flops(&self) -> f64 {
        2.0 * self.m as f64 * self.n as f64 * self.k as f64
    }
}

/// Square matrix of `f32` stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    size: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Random `size×size` matrix with values uniform in `[-1, 1)`, drawn
    /// from the thread-local generator.
    ///
    /// A `size` of zero gives an empty matrix.
    pub fn generate(size: usize) -> Self {
        Self::generate_with(size, &mut rand::rng())
    }

    /// Like [`Matrix::generate`], drawing from `rng`. Used for seeded runs.
    pub fn generate_with<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let data = (0..size * size)
            .map(|_| rng.random_range(-1.0f32..1.0))
            .collect();
        Matrix { size, data }
    }

    /// Wrap existing row-major data. Returns `None` unless
    /// `data.len() == size * size`.
    pub fn from_vec(size: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == size * size).then_some(Matrix { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.data.get(row * self.size + col).copied()
    }
}
