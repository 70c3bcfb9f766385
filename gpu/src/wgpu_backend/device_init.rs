//! WebGPU device initialization via wgpu

use harness::{BenchError, Result};

/// Device, queue and a description of the adapter they came from.
pub struct WgpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub info: wgpu::AdapterInfo,
}

impl WgpuContext {
    /// Open the high-performance adapter with its full limits.
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::open(None))
    }

    /// Open the adapter with `limits` instead of its full limits. The
    /// limits must not exceed what the adapter supports.
    pub fn with_limits(limits: wgpu::Limits) -> Result<Self> {
        pollster::block_on(Self::open(Some(limits)))
    }

    async fn open(limits: Option<wgpu::Limits>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| BenchError::device_unavailable("no WebGPU adapter found"))?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("matbench"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits.unwrap_or_else(|| adapter.limits()),
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| BenchError::device_unavailable(e.to_string()))?;

        // Device calls run inside error scopes; anything that
        // still escapes would otherwise panic.
        device.on_uncaptured_error(Box::new(|e: wgpu::Error| {
            log::error!("uncaptured device error: {}", e);
        }));

        Ok(WgpuContext {
            device,
            queue,
            info,
        })
    }

    /// Whether any adapter can be opened on this system.
    pub fn is_available() -> bool {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .is_some()
    }

    /// One-line adapter description, e.g. `"NVIDIA RTX 4090 (Vulkan, DiscreteGpu)"`.
    pub fn describe(&self) -> String {
        format!(
            "{} ({:?}, {:?})",
            self.info.name, self.info.backend, self.info.device_type
        )
    }

    /// Run `f` inside validation and out-of-memory error scopes and return
    /// its value together with the first error raised, if any.
    pub fn capture_errors<T>(&self, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        (value, validation.or(out_of_memory))
    }

    /// Like [`capture_errors`](Self::capture_errors), turning an error into
    /// [`BenchError::DeviceOperation`] prefixed with `what`.
    pub fn checked<T>(&self, what: &str, f: impl FnOnce() -> T) -> Result<T> {
        match self.capture_errors(f) {
            (value, None) => Ok(value),
            (_, Some(err)) => Err(BenchError::device_operation(format!("{}: {}", what, err))),
        }
    }

    pub fn max_workgroups_per_dimension(&self) -> u32 {
        self.device.limits().max_compute_workgroups_per_dimension
    }
}
