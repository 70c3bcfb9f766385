//! matbench - verify and benchmark WGSL matrix-multiplication shaders
//!
//! # Usage
//!
//! ```bash
//! # Verify and time the built-in shader on 256x256 matrices
//! matbench run
//!
//! # Your own kernel, bigger matrices, more samples
//! matbench run --shader tiled.wgsl --size 1024 --samples 200
//!
//! # One verified dispatch, no timing
//! matbench verify --shader tiled.wgsl --show-matrices
//!
//! # Print the built-in shader as a starting point
//! matbench shader > my_kernel.wgsl
//!
//! # Show the adapter that would be used
//! matbench info
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;

use harness::report::{matrix_preview, RunRecord, PREVIEW_LIMIT};
use harness::{
    BackendKind, BenchConfig, BenchError, BenchmarkRunner, ComputeBackend, ConfigOverrides,
    CpuBackend, MatmulDims, Result, Workload,
};
use matbench_gpu::{parse_workgroup_size, GpuMatmul, WgpuContext, DEFAULT_SHADER};

#[derive(Parser)]
#[command(name = "matbench")]
#[command(version)]
#[command(about = "Verify and benchmark WGSL matrix-multiplication shaders", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG is used otherwise.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Warm up with verification, then time repeated dispatches
    Run {
        #[command(flatten)]
        workload: WorkloadArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Dispatch once and print the verification report
    Verify {
        #[command(flatten)]
        workload: WorkloadArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the built-in shader
    Shader,

    /// Show the WebGPU adapter that would be used
    Info,
}

#[derive(Args, Clone, Debug)]
struct WorkloadArgs {
    /// WGSL shader file (defaults to the built-in shader)
    #[arg(long)]
    shader: Option<PathBuf>,

    /// Side length of the square matrices
    #[arg(long)]
    size: Option<usize>,

    /// Output cells checked per verification
    #[arg(long)]
    samples: Option<usize>,

    /// Verified runs before timing
    #[arg(long)]
    warmup: Option<usize>,

    /// Timed runs
    #[arg(long)]
    iterations: Option<usize>,

    /// Seed for matrix generation and sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Shader entry point
    #[arg(long)]
    entry_point: Option<String>,

    /// Where to run the product
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Config file (defaults to ./matbench.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
struct OutputArgs {
    /// Print the top-left corner of the matrices
    #[arg(long)]
    show_matrices: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Gpu,
    Cpu,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Gpu => BackendKind::Gpu,
            BackendArg::Cpu => BackendKind::Cpu,
        }
    }
}

impl WorkloadArgs {
    fn into_config(self) -> Result<BenchConfig> {
        let mut config = BenchConfig::resolve(self.config.as_deref())?;
        ConfigOverrides {
            matrix_size: self.size,
            sample_count: self.samples,
            warmup_runs: self.warmup,
            iterations: self.iterations,
            seed: self.seed,
            shader: self.shader,
            entry_point: self.entry_point,
            backend: self.backend.map(BackendKind::from),
        }
        .apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose > 0 {
        harness::logging::init_with_level(harness::logging::level_from_verbosity(cli.verbose));
    } else {
        harness::logging::init_from_env();
    }

    let result = match cli.command {
        Commands::Run { workload, output } => {
            workload.into_config().and_then(|config| run_benchmark(&config, &output))
        }
        Commands::Verify { workload, output } => {
            workload.into_config().and_then(|config| run_verify(&config, &output))
        }
        Commands::Shader => {
            print!("{}", DEFAULT_SHADER);
            Ok(true)
        }
        Commands::Info => show_info().map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// The backend a run was configured for.
enum Device {
    Gpu(GpuMatmul),
    Cpu(CpuBackend),
}

impl Device {
    /// Set up the configured backend with the workload's operands.
    ///
    /// Shader problems that can be found without a device are reported
    /// before one is opened.
    fn open(config: &BenchConfig, workload: &Workload) -> Result<Self> {
        match config.backend {
            BackendKind::Gpu => {
                let source = config
                    .shader_source()?
                    .unwrap_or_else(|| DEFAULT_SHADER.to_string());
                parse_workgroup_size(&source)?;
                let ctx = WgpuContext::new()?;
                let gpu = GpuMatmul::new(
                    ctx,
                    &source,
                    &config.entry_point,
                    &workload.a,
                    &workload.b,
                )?;
                Ok(Device::Gpu(gpu))
            }
            BackendKind::Cpu => {
                if config.shader.is_some() {
                    log::warn!("--shader is ignored by the cpu backend");
                }
                let cpu = CpuBackend::new(
                    workload.a.as_slice().to_vec(),
                    workload.b.as_slice().to_vec(),
                    workload.dims(),
                )?;
                Ok(Device::Cpu(cpu))
            }
        }
    }

    fn name(&self) -> String {
        match self {
            Device::Gpu(gpu) => gpu.device(),
            Device::Cpu(_) => "host CPU".to_string(),
        }
    }
}

impl ComputeBackend for Device {
    fn dims(&self) -> MatmulDims {
        match self {
            Device::Gpu(gpu) => gpu.dims(),
            Device::Cpu(cpu) => cpu.dims(),
        }
    }

    async fn compute_once(&mut self) -> Result<Vec<f32>> {
        match self {
            Device::Gpu(gpu) => gpu.compute_once().await,
            Device::Cpu(cpu) => cpu.compute_once().await,
        }
    }

    async fn dispatch(&mut self) -> Result<()> {
        match self {
            Device::Gpu(gpu) => gpu.dispatch().await,
            Device::Cpu(cpu) => cpu.dispatch().await,
        }
    }
}

fn print_header(config: &BenchConfig, device: &Device, workload: &Workload, output: &OutputArgs) {
    println!(
        "Running {}x{} matrix multiplication on {}",
        config.matrix_size,
        config.matrix_size,
        device.name()
    );
    match &config.shader {
        Some(path) => println!("Shader: {} (entry point '{}')", path.display(), config.entry_point),
        None => println!("Shader: built-in (entry point '{}')", config.entry_point),
    }
    if output.show_matrices {
        println!("\nMatrix A:\n{}", matrix_preview(&workload.a, PREVIEW_LIMIT));
        println!("Matrix B:\n{}", matrix_preview(&workload.b, PREVIEW_LIMIT));
    }
}

fn run_benchmark(config: &BenchConfig, output: &OutputArgs) -> Result<bool> {
    let mut workload = Workload::generate(config);
    let mut device = Device::open(config, &workload)?;
    if output.format == OutputFormat::Text {
        print_header(config, &device, &workload, output);
        println!("\nRunning warmup with verification...");
    }

    let runner = BenchmarkRunner::new(config.warmup_runs, config.iterations);
    let outcome = pollster::block_on(runner.run(&mut device, |c| workload.verify(c)))?;

    match output.format {
        OutputFormat::Json => {
            let name = device.name();
            let mut record = RunRecord::new(&name, config);
            // the outcome carries the report already
            record.benchmark = Some(&outcome);
            println!("{}", record.to_json()?);
        }
        OutputFormat::Text => {
            if let Some(report) = outcome.report() {
                println!("\n{}", report);
            }
            println!("\n{}", outcome);
        }
    }

    Ok(outcome.is_completed())
}

fn run_verify(config: &BenchConfig, output: &OutputArgs) -> Result<bool> {
    let mut workload = Workload::generate(config);
    let mut device = Device::open(config, &workload)?;
    if output.format == OutputFormat::Text {
        print_header(config, &device, &workload, output);
    }

    let product = pollster::block_on(device.compute_once())?;
    let report = workload.verify(&product);

    match output.format {
        OutputFormat::Json => {
            let name = device.name();
            let mut record = RunRecord::new(&name, config);
            record.verification = Some(&report);
            println!("{}", record.to_json()?);
        }
        OutputFormat::Text => {
            if output.show_matrices {
                let size = config.matrix_size;
                let c = harness::Matrix::from_vec(size, product).ok_or_else(|| {
                    BenchError::device_operation("result has the wrong number of elements")
                })?;
                println!("Result C:\n{}", matrix_preview(&c, PREVIEW_LIMIT));
            }
            println!("\n{}", report);
        }
    }

    Ok(report.passed)
}

fn show_info() -> Result<()> {
    if !matbench_gpu::is_available() {
        println!("WebGPU: not available (no adapter found)");
        return Ok(());
    }
    let ctx = WgpuContext::new()?;
    let limits = ctx.device.limits();
    println!("WebGPU: enabled");
    println!("  Adapter:               {}", ctx.describe());
    println!("  Driver:                {} {}", ctx.info.driver, ctx.info.driver_info);
    println!(
        "  Max workgroups/dim:    {}",
        limits.max_compute_workgroups_per_dimension
    );
    println!(
        "  Max invocations/group: {}",
        limits.max_compute_invocations_per_workgroup
    );
    println!(
        "  Max storage binding:   {} bytes",
        limits.max_storage_buffer_binding_size
    );
    Ok(())
}
