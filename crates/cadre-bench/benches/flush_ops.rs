//! Criterion benchmarks for a full submit → flush → query cycle.

use std::hint::black_box;

use cadre_bench::{agent_requests, discrete_profile, reference_profile, REFERENCE_OBS_LEN};
use cadre_core::{ActionSpec, AgentId};
use cadre_engine::{ModelRunner, RunnerConfig};
use cadre_test_utils::MemoryEchoExecutor;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

/// Benchmark: continuous flush at increasing batch sizes.
fn bench_flush_continuous(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush_continuous");
    for &n in &[1usize, 64, 1024] {
        let mut runner = reference_profile(42).into_runner().unwrap();
        let requests = agent_requests(n, REFERENCE_OBS_LEN, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n), &requests, |b, reqs| {
            b.iter(|| {
                for req in reqs {
                    runner.submit(req.clone()).unwrap();
                }
                let metrics = runner.decide_batch().unwrap();
                black_box(metrics);
            });
        });
    }
    group.finish();
}

/// Benchmark: discrete flush with multinomial sampling over 3 branches.
fn bench_flush_discrete(c: &mut Criterion) {
    let mut runner = discrete_profile(42).into_runner().unwrap();
    let requests = agent_requests(256, REFERENCE_OBS_LEN, 7);
    c.bench_function("flush_discrete_256", |b| {
        b.iter(|| {
            for req in &requests {
                runner.submit(req.clone()).unwrap();
            }
            runner.decide_batch().unwrap();
            black_box(runner.get_action(AgentId(0)));
        });
    });
}

/// Benchmark: recurrent flush carrying 64 floats of memory per agent.
fn bench_flush_recurrent(c: &mut Criterion) {
    let mut runner = ModelRunner::new(
        RunnerConfig::new(ActionSpec::continuous(64)),
        MemoryEchoExecutor::new(64),
    )
    .unwrap();
    let requests = agent_requests(256, 8, 7);
    c.bench_function("flush_recurrent_256", |b| {
        b.iter(|| {
            for req in &requests {
                runner.submit(req.clone()).unwrap();
            }
            runner.decide_batch().unwrap();
            black_box(runner.memory(AgentId(0)));
        });
    });
}

criterion_group!(
    benches,
    bench_flush_continuous,
    bench_flush_discrete,
    bench_flush_recurrent
);
criterion_main!(benches);
