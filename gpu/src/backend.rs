//! [`ComputeBackend`] over a wgpu device: uploads both operands once,
//! then each call dispatches the user's kernel over the whole output.

use harness::{BenchError, ComputeBackend, MatmulDims, Matrix, Result};

use crate::shader::parse_workgroup_size;
use crate::wgpu_backend::buffer_ops::{check_buffer_fits, WgpuBuffer};
use crate::wgpu_backend::compile::{compile_wgsl, WgpuCompiledKernel};
use crate::wgpu_backend::device_init::WgpuContext;
use crate::wgpu_backend::dispatch::{bind_buffers, dispatch_workgroups};

pub struct GpuMatmul {
    ctx: WgpuContext,
    kernel: WgpuCompiledKernel,
    bind_group: wgpu::BindGroup,
    result: WgpuBuffer,
    // kept alive for the bind group
    _inputs: [WgpuBuffer; 3],
    dims: MatmulDims,
    workgroups: (u32, u32),
}

impl GpuMatmul {
    /// Compile `source` and upload `a` and `b`.
    ///
    /// Fails with [`BenchError::Config`] if the shader has no 2D workgroup
    /// size or does not compile, or if the matrices need more workgroups or
    /// bigger buffers than the device allows. Failed uploads are
    /// [`BenchError::DeviceOperation`].
    pub fn new(
        ctx: WgpuContext,
        source: &str,
        entry_point: &str,
        a: &Matrix,
        b: &Matrix,
    ) -> Result<Self> {
        if a.size() != b.size() {
            return Err(BenchError::config(format!(
                "operands differ in size: {} and {}",
                a.size(),
                b.size()
            )));
        }
        let dims = MatmulDims::square(a.size());
        let workgroup_size = parse_workgroup_size(source)?;

        let (grid_x, grid_y) = workgroup_size.grid_for(dims.m, dims.n);
        let limit = ctx.max_workgroups_per_dimension() as usize;
        if grid_x > limit || grid_y > limit {
            return Err(BenchError::config(format!(
                "{}x{} workgroups exceed the device limit of {} per dimension",
                grid_x, grid_y, limit
            )));
        }

        check_buffer_fits(dims, &ctx.device.limits())?;

        let kernel = compile_wgsl(&ctx, source, entry_point)?;

        let lhs = WgpuBuffer::matrix(
            &ctx,
            "matbench_lhs",
            dims.m,
            dims.k,
            a.as_slice(),
            wgpu::BufferUsages::empty(),
        )?;
        let rhs = WgpuBuffer::matrix(
            &ctx,
            "matbench_rhs",
            dims.k,
            dims.n,
            b.as_slice(),
            wgpu::BufferUsages::empty(),
        )?;
        let result = WgpuBuffer::result_matrix(&ctx, dims.m, dims.n)?;
        let uniforms = WgpuBuffer::uniforms(&ctx, dims)?;
        let bind_group = bind_buffers(&ctx, &kernel, &[&lhs, &rhs, &result, &uniforms])?;
        log::info!(
            "uploaded {}x{} operands ({} bytes each), workgroup {}x{}, grid {}x{}",
            dims.m,
            dims.n,
            lhs.byte_size(),
            workgroup_size.x,
            workgroup_size.y,
            grid_x,
            grid_y
        );

        Ok(GpuMatmul {
            ctx,
            kernel,
            bind_group,
            result,
            _inputs: [lhs, rhs, uniforms],
            dims,
            workgroups: (grid_x as u32, grid_y as u32),
        })
    }

    pub fn device(&self) -> String {
        self.ctx.describe()
    }

    fn run_pass(&self) -> Result<()> {
        dispatch_workgroups(&self.ctx, &self.kernel, &self.bind_group, self.workgroups)
    }
}

impl ComputeBackend for GpuMatmul {
    fn dims(&self) -> MatmulDims {
        self.dims
    }

    async fn compute_once(&mut self) -> Result<Vec<f32>> {
        self.run_pass()?;
        let output = self.result.read_matrix(&self.ctx)?;
        if output.len() != self.dims.output_len() {
            return Err(BenchError::device_operation(format!(
                "read back {} values, expected {}",
                output.len(),
                self.dims.output_len()
            )));
        }
        Ok(output)
    }

    async fn dispatch(&mut self) -> Result<()> {
        self.run_pass()
    }
}
