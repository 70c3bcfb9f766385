//! WGSL shader compilation: WGSL source to a compute pipeline with the
//! fixed matmul binding layout.

use harness::{BenchError, Result};

use super::device_init::WgpuContext;

/// A compiled compute kernel ready for dispatch.
pub struct WgpuCompiledKernel {
    pub pipeline: wgpu::ComputePipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Layout every matmul kernel must declare: A, B read-only storage at 0
/// and 1, C storage at 2, uniforms at 3.
fn matmul_layout(ctx: &WgpuContext) -> wgpu::BindGroupLayout {
    ctx.device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("matbench_matmul_layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        })
}

/// Compile `source` into a compute pipeline for `entry_point`.
///
/// Shader and pipeline validation errors are captured and returned as
/// [`BenchError::Config`] with the compiler's message.
pub fn compile_wgsl(
    ctx: &WgpuContext,
    source: &str,
    entry_point: &str,
) -> Result<WgpuCompiledKernel> {
    ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

    let shader_module = ctx
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("matbench_compute_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

    let bind_group_layout = matmul_layout(ctx);
    let pipeline_layout = ctx
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("matbench_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

    let pipeline = ctx
        .device
        .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("matbench_compute_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some(entry_point),
            compilation_options: Default::default(),
            cache: None,
        });

    if let Some(err) = pollster::block_on(ctx.device.pop_error_scope()) {
        return Err(BenchError::config(format!("shader compilation failed: {}", err)));
    }
    log::debug!("compiled entry point '{}'", entry_point);

    Ok(WgpuCompiledKernel {
        pipeline,
        bind_group_layout,
    })
}
