//! Criterion micro-benchmarks for input tensor generation.

use std::hint::black_box;

use cadre_bench::{agent_requests, REFERENCE_OBS_LEN};
use cadre_core::{ActionSpec, AgentId};
use cadre_infer::{AgentStores, DecisionRequest, ModelInterface, TensorGenerator};
use cadre_tensor::{names, TensorArena};
use cadre_test_utils::fixtures::{vector, PatternImageSensor};
use criterion::{criterion_group, criterion_main, Criterion};

/// Benchmark: 1024 agents × 32 vector observations.
fn bench_generate_vector_1k(c: &mut Criterion) {
    let iface = ModelInterface::new(
        "bench",
        [names::VECTOR_OBSERVATION, names::BATCH_SIZE],
        [names::ACTION_OUTPUT],
    );
    let mut generator = TensorGenerator::new(&iface, &ActionSpec::continuous(4), 0).unwrap();
    let batch = agent_requests(1024, REFERENCE_OBS_LEN, 7);
    let stores = AgentStores::new();
    let mut arena = TensorArena::new();

    c.bench_function("generate_vector_1k", |b| {
        b.iter(|| {
            generator.generate(&batch, &stores, &mut arena).unwrap();
            black_box(arena.live_count());
        });
    });
}

/// Benchmark: 128 agents with an 84×84×3 image and a short vector.
fn bench_generate_visual_128(c: &mut Criterion) {
    let visual = names::visual_observation(0);
    let iface = ModelInterface::new(
        "bench",
        [names::VECTOR_OBSERVATION, visual.as_str()],
        [names::ACTION_OUTPUT],
    );
    let mut generator = TensorGenerator::new(&iface, &ActionSpec::continuous(4), 0).unwrap();
    let batch: Vec<DecisionRequest> = (0..128)
        .map(|i| {
            DecisionRequest::new(
                AgentId(i),
                vec![
                    vector(&[0.0; 4]),
                    PatternImageSensor::handle(84, 84, 3, i as f32),
                ],
            )
        })
        .collect();
    let stores = AgentStores::new();
    let mut arena = TensorArena::new();

    c.bench_function("generate_visual_128", |b| {
        b.iter(|| {
            generator.generate(&batch, &stores, &mut arena).unwrap();
            black_box(arena.memory_bytes());
        });
    });
}

criterion_group!(benches, bench_generate_vector_1k, bench_generate_visual_128);
criterion_main!(benches);
