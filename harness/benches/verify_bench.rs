use criterion::{black_box, criterion_group, criterion_main, Criterion};
use harness::{reference_value, verify_sampled, CpuBackend, ComputeBackend, MatmulDims, Matrix};

fn bench_reference(c: &mut Criterion) {
    let a = Matrix::generate(256);
    let b = Matrix::generate(256);
    let dims = MatmulDims::square(256);
    c.bench_function("reference_value_256", |bench| {
        bench.iter(|| {
            reference_value(
                black_box(a.as_slice()),
                black_box(b.as_slice()),
                dims,
                black_box(17),
                black_box(203),
            )
        })
    });
}

fn bench_verify(c: &mut Criterion) {
    let a = Matrix::generate(256);
    let b = Matrix::generate(256);
    let dims = MatmulDims::square(256);
    let mut backend =
        CpuBackend::new(a.as_slice().to_vec(), b.as_slice().to_vec(), dims).unwrap();
    let product = pollster::block_on(backend.compute_once()).unwrap();

    let mut group = c.benchmark_group("verify_256");
    for samples in [50, 500, 5000] {
        group.bench_function(format!("{}_samples", samples), |bench| {
            bench.iter(|| {
                verify_sampled(a.as_slice(), b.as_slice(), &product, dims, black_box(samples))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reference, bench_verify);
criterion_main!(benches);
