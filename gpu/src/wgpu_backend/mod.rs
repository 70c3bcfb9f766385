//! WebGPU plumbing via wgpu: device setup, pipeline compilation, buffers
//! and dispatch.

pub mod buffer_ops;
pub mod compile;
pub mod device_init;
pub mod dispatch;
