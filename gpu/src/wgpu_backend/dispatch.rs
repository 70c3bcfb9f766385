//! Compute dispatch: encodes one pass, submits it and waits for the queue.

use harness::{BenchError, Result};

use super::buffer_ops::WgpuBuffer;
use super::compile::WgpuCompiledKernel;
use super::device_init::WgpuContext;

/// Bind `buffers` to consecutive bindings of the kernel's group 0.
///
/// A buffer the layout rejects (wrong usage, over the binding size limit)
/// fails with [`BenchError::DeviceOperation`].
pub fn bind_buffers(
    ctx: &WgpuContext,
    kernel: &WgpuCompiledKernel,
    buffers: &[&WgpuBuffer],
) -> Result<wgpu::BindGroup> {
    let entries: Vec<wgpu::BindGroupEntry> = buffers
        .iter()
        .enumerate()
        .map(|(i, buf)| wgpu::BindGroupEntry {
            binding: i as u32,
            resource: buf.buffer.as_entire_binding(),
        })
        .collect();

    ctx.checked("failed to bind matmul buffers", || {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("matbench_bind_group"),
            layout: &kernel.bind_group_layout,
            entries: &entries,
        })
    })
}

/// Dispatch `workgroups` and block until the device has finished.
///
/// Validation and out-of-memory errors raised by the submission, and a
/// queue that is still busy after the wait, are returned as
/// [`BenchError::DeviceOperation`].
pub fn dispatch_workgroups(
    ctx: &WgpuContext,
    kernel: &WgpuCompiledKernel,
    bind_group: &wgpu::BindGroup,
    workgroups: (u32, u32),
) -> Result<()> {
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("matbench_dispatch"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("matbench_compute_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&kernel.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroups.0, workgroups.1, 1);
    }

    let (maintain, err) = ctx.capture_errors(|| {
        ctx.queue.submit(std::iter::once(encoder.finish()));
        ctx.device.poll(wgpu::Maintain::Wait)
    });
    if let Some(err) = err {
        return Err(BenchError::device_operation(format!("dispatch failed: {}", err)));
    }
    if !maintain.is_queue_empty() {
        return Err(BenchError::device_operation(
            "device did not finish the dispatch",
        ));
    }

    Ok(())
}
