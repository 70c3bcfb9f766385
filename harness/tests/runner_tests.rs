//! Runner behaviour against a scripted backend.

use harness::{
    BenchError, BenchmarkOutcome, BenchmarkRunner, ComputeBackend, CpuBackend, MatmulDims,
    BenchConfig, Phase, Result, VerificationCheck, VerificationReport, Workload,
};

/// Backend whose read-backs are just a call counter, paired with a
/// verifier that fails on chosen warm-up runs.
struct ScriptedBackend {
    dims: MatmulDims,
    computes: usize,
    dispatches: usize,
    fail_compute_at: Option<usize>,
    fail_dispatch_at: Option<usize>,
}

impl ScriptedBackend {
    fn new() -> Self {
        ScriptedBackend {
            dims: MatmulDims::square(64),
            computes: 0,
            dispatches: 0,
            fail_compute_at: None,
            fail_dispatch_at: None,
        }
    }
}

impl ComputeBackend for ScriptedBackend {
    fn dims(&self) -> MatmulDims {
        self.dims
    }

    async fn compute_once(&mut self) -> Result<Vec<f32>> {
        self.computes += 1;
        if self.fail_compute_at == Some(self.computes) {
            return Err(BenchError::device_operation("queue lost"));
        }
        Ok(vec![self.computes as f32])
    }

    async fn dispatch(&mut self) -> Result<()> {
        self.dispatches += 1;
        if self.fail_dispatch_at == Some(self.dispatches) {
            return Err(BenchError::device_operation("device lost"));
        }
        Ok(())
    }
}

fn report_for(passed: bool) -> VerificationReport {
    let gpu = if passed { 1.0 } else { 2.0 };
    VerificationReport::from_checks(vec![VerificationCheck {
        row: 0,
        col: 0,
        cpu: 1.0,
        gpu,
        diff: (1.0 - gpu as f64).abs(),
        is_correct: passed,
    }])
}

/// Passes every warm-up read-back except the one produced by call `bad`.
fn fail_on(bad: usize) -> impl FnMut(&[f32]) -> VerificationReport {
    move |output: &[f32]| report_for(output[0] as usize != bad)
}

#[test]
fn test_failed_second_warmup_stops_run() {
    harness::logging::init_test();
    let mut backend = ScriptedBackend::new();
    let outcome = pollster::block_on(BenchmarkRunner::new(2, 5).run(&mut backend, fail_on(2)))
        .unwrap();

    match &outcome {
        BenchmarkOutcome::VerificationFailed { warmup_run, report } => {
            assert_eq!(*warmup_run, 2);
            assert!(!report.passed);
        }
        other => panic!("expected failed verification, got {:?}", other),
    }
    assert_eq!(outcome.phase(), Phase::Failed);
    assert_eq!(backend.computes, 2);
    assert_eq!(backend.dispatches, 0);
}

#[test]
fn test_failed_first_warmup_skips_rest() {
    let mut backend = ScriptedBackend::new();
    let outcome = pollster::block_on(BenchmarkRunner::new(4, 5).run(&mut backend, fail_on(1)))
        .unwrap();
    assert!(!outcome.is_completed());
    assert_eq!(backend.computes, 1);
    assert_eq!(backend.dispatches, 0);
}

#[test]
fn test_passing_run_times_every_iteration() {
    let mut backend = ScriptedBackend::new();
    let dims = backend.dims;
    let outcome = pollster::block_on(BenchmarkRunner::new(1, 5).run(&mut backend, fail_on(0)))
        .unwrap();

    let BenchmarkOutcome::Completed {
        result,
        last_report,
    } = outcome
    else {
        panic!("expected a completed run");
    };
    assert_eq!(result.latencies_ms.len(), 5);
    assert_eq!(result.dims, dims);
    let avg = result.latencies_ms.iter().sum::<f64>() / 5.0;
    assert_eq!(result.avg_ms, avg);
    if avg > 0.0 {
        assert_eq!(result.flops_per_sec, dims.flops() / (avg / 1000.0));
    }
    assert!(last_report.unwrap().passed);
    assert_eq!(backend.computes, 1);
    assert_eq!(backend.dispatches, 5);
}

#[test]
fn test_zero_warmup_goes_straight_to_timing() {
    let mut backend = ScriptedBackend::new();
    let outcome = pollster::block_on(BenchmarkRunner::new(0, 3).run(&mut backend, fail_on(1)))
        .unwrap();
    let BenchmarkOutcome::Completed { last_report, .. } = outcome else {
        panic!("expected a completed run");
    };
    assert!(last_report.is_none());
    assert_eq!(backend.computes, 0);
    assert_eq!(backend.dispatches, 3);
}

#[test]
fn test_compute_error_during_warmup_propagates() {
    let mut backend = ScriptedBackend::new();
    backend.fail_compute_at = Some(2);
    let err = pollster::block_on(BenchmarkRunner::new(3, 5).run(&mut backend, fail_on(0)))
        .unwrap_err();
    assert_eq!(err, BenchError::DeviceOperation("queue lost".to_string()));
    assert_eq!(backend.dispatches, 0);
}

#[test]
fn test_dispatch_error_during_timing_propagates() {
    let mut backend = ScriptedBackend::new();
    backend.fail_dispatch_at = Some(3);
    let err = pollster::block_on(BenchmarkRunner::new(1, 10).run(&mut backend, fail_on(0)))
        .unwrap_err();
    assert!(err.to_string().contains("device lost"));
    assert_eq!(backend.dispatches, 3);
}

#[test]
fn test_cpu_backend_end_to_end() {
    let config = BenchConfig {
        matrix_size: 24,
        sample_count: 30,
        warmup_runs: 2,
        iterations: 4,
        seed: Some(11),
        ..Default::default()
    };
    let mut workload = Workload::generate(&config);
    let mut backend = CpuBackend::new(
        workload.a.as_slice().to_vec(),
        workload.b.as_slice().to_vec(),
        workload.dims(),
    )
    .unwrap();
    let runner = BenchmarkRunner::new(config.warmup_runs, config.iterations);
    let outcome =
        pollster::block_on(runner.run(&mut backend, |c| workload.verify(c))).unwrap();

    let BenchmarkOutcome::Completed {
        result,
        last_report,
    } = outcome
    else {
        panic!("cpu backend should verify");
    };
    assert_eq!(result.latencies_ms.len(), 4);
    let report = last_report.unwrap();
    assert_eq!(report.len(), 30);
    assert!(report.passed);
}
