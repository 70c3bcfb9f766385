//! Verification and benchmarking of matrix multiplication backends.
//!
//! The harness generates random inputs, drives a [`ComputeBackend`] through
//! a verification-gated warm-up and a timed phase, and checks device output
//! against a host reference at randomly sampled cells.
//!
//! ```rust,ignore
//! let config = BenchConfig::default();
//! let mut workload = Workload::generate(&config);
//! let mut backend = CpuBackend::new(
//!     workload.a.as_slice().to_vec(),
//!     workload.b.as_slice().to_vec(),
//!     workload.dims(),
//! )?;
//! let runner = BenchmarkRunner::new(config.warmup_runs, config.iterations);
//! let outcome = pollster::block_on(runner.run(&mut backend, |c| workload.verify(c)))?;
//! ```

pub mod backend;
pub mod config;
pub mod cpu;
pub mod error;
pub mod logging;
pub mod matrix;
pub mod reference;
pub mod report;
pub mod runner;
pub mod verify;
pub mod workload;

pub use backend::ComputeBackend;
pub use config::{BackendKind, BenchConfig, ConfigOverrides};
pub use cpu::CpuBackend;
pub use error::{BenchError, Result};
pub use matrix::{MatmulDims, Matrix};
pub use reference::reference_value;
pub use runner::{BenchmarkOutcome, BenchmarkResult, BenchmarkRunner, Phase};
pub use verify::{verify, verify_sampled, VerificationCheck, VerificationReport, TOLERANCE};
pub use workload::Workload;
