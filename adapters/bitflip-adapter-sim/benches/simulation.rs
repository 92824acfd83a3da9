//! Benchmarks for the statevector simulator
//!
//! Run with: cargo bench -p bitflip-adapter-sim

use bitflip_adapter_sim::SimulatorBackend;
use bitflip_hal::Backend;
use bitflip_ir::{ClassicalCondition, Circuit, QubitId};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Encode |1⟩, flip the middle qubit, undo it and measure.
fn mirror_pipeline() -> Circuit {
    let mut circuit = Circuit::with_size("mirror", 3, 3);
    circuit.x(QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    circuit.x(QubitId(1)).unwrap();
    circuit.x(QubitId(1)).unwrap();
    circuit.measure_all().unwrap();
    circuit
}

/// Same pipeline with a measured syndrome and conditional correction.
fn syndrome_pipeline() -> Circuit {
    let mut circuit = Circuit::with_size("syndrome", 3, 3);
    circuit.x(QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    circuit.x(QubitId(1)).unwrap();
    let syndrome = circuit.add_creg("syndrome", 3);
    for (q, c) in syndrome.iter().enumerate() {
        circuit.measure(QubitId(q as u32), *c).unwrap();
    }
    for (pattern, qubit) in [("011", 0), ("101", 1), ("110", 2)] {
        let cond = ClassicalCondition::from_pattern(syndrome.clone(), pattern).unwrap();
        circuit.x_if(QubitId(qubit), cond).unwrap();
    }
    circuit.measure_all().unwrap();
    circuit
}

fn bench_pipelines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let backend = SimulatorBackend::new().with_seed(1);
    let mut group = c.benchmark_group("pipeline");

    for shots in &[100u32, 1000, 10_000] {
        let mirror = mirror_pipeline();
        group.bench_with_input(BenchmarkId::new("mirror", shots), shots, |b, &s| {
            b.iter(|| rt.block_on(backend.submit(black_box(&mirror), s)).unwrap());
        });

        let syndrome = syndrome_pipeline();
        group.bench_with_input(BenchmarkId::new("syndrome", shots), shots, |b, &s| {
            b.iter(|| rt.block_on(backend.submit(black_box(&syndrome), s)).unwrap());
        });
    }

    group.finish();
}

fn bench_register_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_width");

    for n in &[3u32, 8, 12, 16] {
        let mut circuit = Circuit::with_size("ghz", *n, *n);
        circuit.h(QubitId(0)).unwrap();
        for q in 1..*n {
            circuit.cx(QubitId(0), QubitId(q)).unwrap();
        }
        circuit.measure_all().unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let backend = SimulatorBackend::new().with_seed(2);

        group.bench_with_input(BenchmarkId::new("ghz", n), &circuit, |b, circ| {
            b.iter(|| rt.block_on(backend.submit(black_box(circ), 1000)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipelines, bench_register_width);
criterion_main!(benches);
