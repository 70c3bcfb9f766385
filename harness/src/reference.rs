//! Host-side reference evaluation of single output cells.

use crate::matrix::MatmulDims;

/// One cell of `A · B` for row-major `A (m×k)` and `B (k×n)`, accumulated
/// in `f64`.
///
/// `row` must be below `dims.m` and `col` below `dims.n`.
pub fn reference_value(a: &[f32], b: &[f32], dims: MatmulDims, row: usize, col: usize) -> f64 {
    debug_assert!(row < dims.m && col < dims.n, "cell ({row},{col}) outside {dims:?}");
    let MatmulDims { n, k, .. } = dims;
    let a_row = &a[row * k..(row + 1) * k];
    a_row
        .iter()
        .enumerate()
        .map(|(i, &x)| x as f64 * b[i * n + col] as f64)
        .sum()
}
