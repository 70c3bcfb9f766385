//! WGSL source handling: the built-in kernel and the metadata the host needs
//! from a user-supplied kernel before it can dispatch it.

use harness::{BenchError, Result};
use regex::Regex;

/// Entry point of [`DEFAULT_SHADER`].
pub const DEFAULT_ENTRY_POINT: &str = "main";

/// Naive matmul: one invocation per output cell, 16×16 workgroups.
///
/// Bindings: A, B (read-only storage), C (read-write storage), each a
/// `Matrix` whose first two words are the size header, then
/// `Uniforms { M, N, K, alpha, beta }`. Computes
/// `C = alpha * A·B + beta * C`.
pub const DEFAULT_SHADER: &str = r#"const BLOCK_DIM_X = 16u;
const BLOCK_DIM_Y = 16u;

struct Matrix {
    size : vec2u,
    numbers : array<f32>,
};

struct Uniforms {
    M : u32,
    N : u32,
    K : u32,
    alpha : f32,
    beta : f32,
};

@group(0) @binding(0) var<storage, read> A : Matrix;
@group(0) @binding(1) var<storage, read> B : Matrix;
@group(0) @binding(2) var<storage, read_write> C : Matrix;
@group(0) @binding(3) var<uniform> uniforms : Uniforms;

@compute @workgroup_size(16, 16)
fn main(
    @builtin(workgroup_id) blockIdx : vec3<u32>,
    @builtin(local_invocation_id) threadIdx : vec3<u32>
) {
    let x = blockIdx.x * BLOCK_DIM_X + threadIdx.x;
    let y = blockIdx.y * BLOCK_DIM_Y + threadIdx.y;

    if (x < uniforms.M && y < uniforms.N) {
        var tmp: f32 = 0.0;
        for (var i: u32 = 0u; i < uniforms.K; i = i + 1u) {
            tmp = tmp + A.numbers[x * uniforms.K + i] * B.numbers[i * uniforms.N + y];
        }
        let idx = x * uniforms.N + y;
        C.numbers[idx] = uniforms.alpha * tmp + uniforms.beta * C.numbers[idx];
    }
}
"#;

/// Workgroup dimensions declared by a compute entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    /// Workgroups needed to cover an `rows×cols` output, x over rows.
    pub fn grid_for(&self, rows: usize, cols: usize) -> (usize, usize) {
        (rows.div_ceil(self.x as usize), cols.div_ceil(self.y as usize))
    }
}

/// Extract the 2D `@workgroup_size(X, Y)` of the `@compute` entry point.
pub fn parse_workgroup_size(source: &str) -> Result<WorkgroupSize> {
    let pattern = Regex::new(r"@compute\s+@workgroup_size\s*\((\d+)\s*,\s*(\d+)\)")
        .map_err(|e| BenchError::config(format!("invalid workgroup pattern: {}", e)))?;
    let caps = pattern.captures(source).ok_or_else(|| {
        BenchError::config(
            "could not find workgroup size in shader code; \
             ensure @compute @workgroup_size(X, Y) is defined",
        )
    })?;

    let dim = |i: usize| -> Result<u32> {
        let text = &caps[i];
        let value: u32 = text
            .parse()
            .map_err(|_| BenchError::config(format!("workgroup dimension {} is out of range", text)))?;
        if value == 0 {
            return Err(BenchError::config("workgroup dimensions must be non-zero"));
        }
        Ok(value)
    };

    Ok(WorkgroupSize { x: dim(1)?, y: dim(2)? })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shader_metadata() {
        let size = parse_workgroup_size(DEFAULT_SHADER).unwrap();
        assert_eq!(size, WorkgroupSize { x: 16, y: 16 });
        assert!(DEFAULT_SHADER.contains(&format!("fn {}(", DEFAULT_ENTRY_POINT)));
        assert!(DEFAULT_SHADER.contains("var<uniform> uniforms : Uniforms"));
    }

    #[test]
    fn test_spacing_variants() {
        let src = "@compute   @workgroup_size( 8 ,4 )\nfn main() {}";
        assert_eq!(
            parse_workgroup_size(src).unwrap(),
            WorkgroupSize { x: 8, y: 4 }
        );
    }

    #[test]
    fn test_missing_workgroup_size() {
        let err = parse_workgroup_size("@compute fn main() {}").unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));
        assert!(err.to_string().contains("workgroup size"));

        // one-dimensional sizes are not accepted
        assert!(parse_workgroup_size("@compute @workgroup_size(64)\nfn main() {}").is_err());
    }

    #[test]
    fn test_zero_and_overflow_rejected() {
        assert!(parse_workgroup_size("@compute @workgroup_size(0, 16)").is_err());
        assert!(parse_workgroup_size("@compute @workgroup_size(99999999999, 1)").is_err());
    }

    #[test]
    fn test_grid_rounds_up() {
        let size = WorkgroupSize { x: 16, y: 8 };
        assert_eq!(size.grid_for(256, 256), (16, 32));
        assert_eq!(size.grid_for(17, 9), (2, 2));
    }
}
