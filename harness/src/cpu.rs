//! Host implementation of [`ComputeBackend`].
//!
//! Useful on machines without an adapter and as a baseline when comparing
//! a shader's throughput.

use rayon::prelude::*;

use crate::backend::ComputeBackend;
use crate::error::{BenchError, Result};
use crate::matrix::MatmulDims;

pub struct CpuBackend {
    a: Vec<f32>,
    b: Vec<f32>,
    dims: MatmulDims,
}

impl CpuBackend {
    pub fn new(a: Vec<f32>, b: Vec<f32>, dims: MatmulDims) -> Result<Self> {
        if a.len() != dims.m * dims.k {
            return Err(BenchError::config(format!(
                "left matrix has {} elements, expected {}x{}",
                a.len(),
                dims.m,
                dims.k
            )));
        }
        if b.len() != dims.k * dims.n {
            return Err(BenchError::config(format!(
                "right matrix has {} elements, expected {}x{}",
                b.len(),
                dims.k,
                dims.n
            )));
        }
        Ok(CpuBackend { a, b, dims })
    }

    fn multiply(&self) -> Vec<f32> {
        let MatmulDims { m, n, k } = self.dims;
        let mut c = vec![0.0f32; m * n];
        if c.is_empty() {
            return c;
        }
        c.par_chunks_mut(n).enumerate().for_each(|(row, out)| {
            let a_row = &self.a[row * k..(row + 1) * k];
            for (i, &x) in a_row.iter().enumerate() {
                let b_row = &self.b[i * n..(i + 1) * n];
                for (acc, &y) in out.iter_mut().zip(b_row) {
                    *acc += x * y;
                }
            }
        });
        c
    }
}

impl ComputeBackend for CpuBackend {
    fn dims(&self) -> MatmulDims {
        self.dims
    }

    async fn compute_once(&mut self) -> Result<Vec<f32>> {
        Ok(self.multiply())
    }
}
