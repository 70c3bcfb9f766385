//! WebGPU backend for matbench.
//!
//! Runs a WGSL matrix-multiplication kernel through wgpu. The kernel is
//! either [`shader::DEFAULT_SHADER`] or user-supplied; in both cases it must
//! declare `@compute @workgroup_size(X, Y)` and the binding layout described
//! on [`shader::DEFAULT_SHADER`].

pub mod backend;
pub mod shader;
pub mod wgpu_backend;

pub use backend::GpuMatmul;
pub use shader::{parse_workgroup_size, WorkgroupSize, DEFAULT_ENTRY_POINT, DEFAULT_SHADER};
pub use wgpu_backend::device_init::WgpuContext;

/// Whether a WebGPU adapter exists on this system.
pub fn is_available() -> bool {
    WgpuContext::is_available()
}
