//! Device buffers for the matmul operands.
//!
//! Each matrix buffer starts with a two-`f32` size header `[rows, cols]`
//! followed by the row-major numbers, matching the `Matrix` struct the
//! kernels declare.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use harness::{BenchError, MatmulDims, Result};

use super::device_init::WgpuContext;

/// Bytes taken by the size header in front of every matrix buffer.
pub const HEADER_BYTES: usize = 2 * std::mem::size_of::<f32>();

/// Uniform block read by the kernel: `C = alpha * A·B + beta * C`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MatmulUniforms {
    pub m: u32,
    pub n: u32,
    pub k: u32,
    pub alpha: f32,
    pub beta: f32,
    _pad: [u32; 3],
}

impl MatmulUniforms {
    pub fn new(dims: MatmulDims) -> Self {
        MatmulUniforms {
            m: dims.m as u32,
            n: dims.n as u32,
            k: dims.k as u32,
            alpha: 1.0,
            beta: 0.0,
            _pad: [0; 3],
        }
    }
}

/// Bytes of a `rows`x`cols` matrix buffer including its header, or `None`
/// if that overflows.
pub fn matrix_bytes(rows: usize, cols: usize) -> Option<u64> {
    let cells = rows.checked_mul(cols)?;
    let bytes = cells
        .checked_mul(std::mem::size_of::<f32>())?
        .checked_add(HEADER_BYTES)?;
    u64::try_from(bytes).ok()
}

/// Check that every operand of `dims` fits in a single storage binding
/// under `limits`.
pub fn check_buffer_fits(dims: MatmulDims, limits: &wgpu::Limits) -> Result<()> {
    let largest = [(dims.m, dims.k), (dims.k, dims.n), (dims.m, dims.n)]
        .into_iter()
        .map(|(rows, cols)| matrix_bytes(rows, cols))
        .try_fold(0u64, |max, bytes| bytes.map(|b| max.max(b)));
    let Some(bytes) = largest else {
        return Err(BenchError::config(format!(
            "{}x{} matrices overflow the addressable buffer size",
            dims.m, dims.n
        )));
    };

    let limit = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    if bytes > limit {
        return Err(BenchError::config(format!(
            "{}x{} matrices need {} bytes per buffer, device allows {}",
            dims.m, dims.n, bytes, limit
        )));
    }
    Ok(())
}

/// A wgpu buffer plus its byte size.
pub struct WgpuBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) byte_size: usize,
}

impl WgpuBuffer {
    /// Storage buffer holding the header and `data`.
    pub fn matrix(
        ctx: &WgpuContext,
        label: &str,
        rows: usize,
        cols: usize,
        data: &[f32],
        usage: wgpu::BufferUsages,
    ) -> Result<Self> {
        let mut contents = Vec::with_capacity(2 + data.len());
        contents.push(rows as f32);
        contents.push(cols as f32);
        contents.extend_from_slice(data);

        let bytes: &[u8] = bytemuck::cast_slice(&contents);
        let buffer = ctx.checked(&format!("failed to create {}", label), || {
            ctx.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytes,
                    usage: wgpu::BufferUsages::STORAGE | usage,
                })
        })?;

        Ok(WgpuBuffer {
            buffer,
            byte_size: bytes.len(),
        })
    }

    /// Result buffer: header followed by zeros, readable via copy.
    pub fn result_matrix(ctx: &WgpuContext, rows: usize, cols: usize) -> Result<Self> {
        Self::matrix(
            ctx,
            "matbench_result",
            rows,
            cols,
            &vec![0.0f32; rows * cols],
            wgpu::BufferUsages::COPY_SRC,
        )
    }

    pub fn uniforms(ctx: &WgpuContext, dims: MatmulDims) -> Result<Self> {
        let uniforms = MatmulUniforms::new(dims);
        let buffer = ctx.checked("failed to create matbench_uniforms", || {
            ctx.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("matbench_uniforms"),
                    contents: bytemuck::bytes_of(&uniforms),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                })
        })?;

        Ok(WgpuBuffer {
            buffer,
            byte_size: std::mem::size_of::<MatmulUniforms>(),
        })
    }

    /// Copy the buffer to a staging buffer, map it and return the numbers
    /// after the size header.
    pub fn read_matrix(&self, ctx: &WgpuContext) -> Result<Vec<f32>> {
        let staging = ctx.checked("failed to copy result buffer", || {
            let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("matbench_staging"),
                size: self.byte_size as u64,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let mut encoder = ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("matbench_readback"),
                });
            encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, self.byte_size as u64);
            ctx.queue.submit(std::iter::once(encoder.finish()));
            staging
        })?;

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        if !ctx.device.poll(wgpu::Maintain::Wait).is_queue_empty() {
            return Err(BenchError::device_operation(
                "device did not finish the result read-back",
            ));
        }

        match rx.recv() {
            Ok(Ok(())) => {
                let data = {
                    let view = slice.get_mapped_range();
                    let numbers: &[f32] = bytemuck::cast_slice(&view[HEADER_BYTES..]);
                    numbers.to_vec()
                };
                staging.unmap();
                Ok(data)
            }
            Ok(Err(e)) => Err(BenchError::device_operation(format!(
                "failed to map result buffer: {}",
                e
            ))),
            Err(_) => Err(BenchError::device_operation(
                "result buffer mapping was never signalled",
            )),
        }
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }
}
