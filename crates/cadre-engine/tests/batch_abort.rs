//! Integration test: a failing flush discards its whole batch and leaves
//! every store as it was.
//!
//! Covers each stage that can fail: generation (shape drift, sensor
//! overflow), execution (backend error) and application (an output the
//! runner has no decoder for), plus the runner state an abort must leave
//! alone.

use std::sync::Arc;

use cadre_core::{ActionSpec, AgentId, ApplyError, ExecutionError, GenerateError, WriteError};
use cadre_engine::{FlushError, ModelRunner, RunnerConfig, SubmitError};
use cadre_infer::DecisionRequest;
use cadre_sensor::SensorHandle;
use cadre_tensor::names;
use cadre_test_utils::fixtures::{vector, ConstantImageSensor, OverflowingSensor, ResizableSensor};
use cadre_test_utils::{ConstantExecutor, EchoExecutor, FailingExecutor, MemoryEchoExecutor};

fn visual_echo(validate: bool) -> ModelRunner {
    let mut config = RunnerConfig::new(ActionSpec::continuous(2));
    config.validate_sensor_shapes = validate;
    let exec = EchoExecutor::new().with_inputs(&[names::visual_observation(0).as_str()]);
    ModelRunner::new(config, exec).unwrap()
}

fn with_image(id: u64, values: &[f32], side: usize) -> DecisionRequest {
    DecisionRequest::new(
        AgentId(id),
        vec![vector(values), ConstantImageSensor::handle(side, side, 1, 0.5)],
    )
}

// ── Generation failures ──────────────────────────────────────────

#[test]
fn visual_shape_drift_aborts_the_whole_batch() {
    let mut r = visual_echo(false);
    r.submit(with_image(1, &[1.0, 2.0], 2)).unwrap();
    r.decide_batch().unwrap();
    assert_eq!(r.get_action(AgentId(1)).unwrap().continuous, vec![1.0, 2.0]);

    r.submit(with_image(1, &[10.0, 20.0], 2)).unwrap();
    r.submit(with_image(2, &[30.0, 40.0], 3)).unwrap();
    match r.decide_batch() {
        Err(FlushError::Generate(GenerateError::ShapeMismatch { agent, mismatch })) => {
            assert_eq!(agent, AgentId(2));
            assert_eq!(mismatch.sensor_index, 1);
        }
        other => panic!("expected a generation shape mismatch, got {other:?}"),
    }

    // Agent 1 was valid but shared the failed batch.
    assert_eq!(r.get_action(AgentId(1)).unwrap().continuous, vec![1.0, 2.0]);
    assert!(r.get_action(AgentId(2)).is_none());
    assert_eq!(r.pending_len(), 0);
    assert_eq!(r.metrics().aborted_flushes, 1);
    assert_eq!(r.metrics().executor_calls, 1);
}

#[test]
fn submit_rejects_drift_when_validation_is_on() {
    let mut r = visual_echo(true);
    r.submit(with_image(1, &[1.0, 2.0], 2)).unwrap();
    let err = r.submit(with_image(2, &[1.0, 2.0], 3)).unwrap_err();
    assert!(matches!(
        err,
        SubmitError::ShapeMismatch { agent: AgentId(2), .. }
    ));
    assert_eq!(r.pending_len(), 1);
    assert_eq!(r.metrics().rejected_submissions, 1);
}

#[test]
fn sensor_that_changes_shape_after_submit_is_caught_at_flush() {
    let mut config = RunnerConfig::new(ActionSpec::continuous(2));
    config.validate_sensor_shapes = true;
    let mut r = ModelRunner::new(config, EchoExecutor::new()).unwrap();

    let (first, _) = ResizableSensor::new(2);
    r.submit(DecisionRequest::new(AgentId(1), vec![first])).unwrap();
    r.decide_batch().unwrap();

    let (sensor, len) = ResizableSensor::new(2);
    r.submit(DecisionRequest::new(AgentId(2), vec![sensor])).unwrap();
    len.store(4, std::sync::atomic::Ordering::SeqCst);
    assert!(matches!(
        r.decide_batch(),
        Err(FlushError::Generate(GenerateError::ShapeMismatch { agent: AgentId(2), .. }))
    ));
}

#[test]
fn overflowing_sensor_aborts_the_batch() {
    let mut r = ModelRunner::new(
        RunnerConfig::new(ActionSpec::continuous(2)),
        EchoExecutor::new(),
    )
    .unwrap();
    let bad: SensorHandle = Arc::new(OverflowingSensor { len: 2 });
    r.submit(DecisionRequest::new(AgentId(1), vec![vector(&[1.0, 1.0])]))
        .unwrap();
    r.submit(DecisionRequest::new(AgentId(2), vec![bad])).unwrap();

    assert_eq!(
        r.decide_batch(),
        Err(FlushError::Generate(GenerateError::SensorWrite {
            agent: AgentId(2),
            sensor_index: 0,
            source: WriteError::IndexOutOfBounds { index: 2, len: 2 },
        }))
    );
    assert!(r.get_action(AgentId(1)).is_none());
}

#[test]
fn overflow_into_the_next_sensor_is_caught() {
    let mut r = ModelRunner::new(
        RunnerConfig::new(ActionSpec::continuous(2)),
        EchoExecutor::new(),
    )
    .unwrap();
    let bad: SensorHandle = Arc::new(OverflowingSensor { len: 1 });
    r.submit(DecisionRequest::new(AgentId(1), vec![bad, vector(&[5.0])]))
        .unwrap();

    assert_eq!(
        r.decide_batch(),
        Err(FlushError::Generate(GenerateError::SensorWrite {
            agent: AgentId(1),
            sensor_index: 0,
            source: WriteError::IndexOutOfBounds { index: 1, len: 1 },
        }))
    );
    assert!(r.get_action(AgentId(1)).is_none());
}

// ── Execution failures ───────────────────────────────────────────

#[test]
fn backend_failure_discards_batch_and_keeps_memory() {
    let mut r = ModelRunner::new(
        RunnerConfig::new(ActionSpec::continuous(1)),
        FailingExecutor::new("device lost"),
    )
    .unwrap();
    r.submit(DecisionRequest::new(AgentId(1), vec![vector(&[1.0])]))
        .unwrap();

    assert_eq!(
        r.decide_batch(),
        Err(FlushError::Execute(ExecutionError::Backend {
            reason: "device lost".into(),
        }))
    );
    assert_eq!(r.pending_len(), 0);
    assert!(!r.is_pending(AgentId(1)));
    assert!(r.get_action(AgentId(1)).is_none());

    // The agent can be resubmitted immediately.
    r.submit(DecisionRequest::new(AgentId(1), vec![vector(&[1.0])]))
        .unwrap();
    assert!(r.is_pending(AgentId(1)));
}

#[test]
fn failed_flush_leaves_recurrent_memory_untouched() {
    let mut r = ModelRunner::new(
        RunnerConfig::new(ActionSpec::continuous(2)),
        MemoryEchoExecutor::new(2),
    )
    .unwrap();
    r.submit(DecisionRequest::new(AgentId(1), vec![vector(&[0.0])]))
        .unwrap();
    r.decide_batch().unwrap();
    assert_eq!(r.memory(AgentId(1)).unwrap(), &[1.0, 1.0][..]);

    let bad: SensorHandle = Arc::new(OverflowingSensor { len: 1 });
    r.submit(DecisionRequest::new(AgentId(1), vec![bad])).unwrap();
    assert!(r.decide_batch().is_err());
    assert_eq!(r.memory(AgentId(1)).unwrap(), &[1.0, 1.0][..]);
    assert_eq!(r.get_action(AgentId(1)).unwrap().continuous, vec![0.0, 0.0]);
}

// ── Application failures ─────────────────────────────────────────

#[test]
fn undeclared_output_aborts_before_any_action_is_written() {
    let exec = ConstantExecutor::new(vec![0.5]).with_undeclared_output("value_estimate");
    let mut r = ModelRunner::new(RunnerConfig::new(ActionSpec::continuous(1)), exec).unwrap();
    r.submit(DecisionRequest::new(AgentId(1), vec![vector(&[1.0])]))
        .unwrap();

    assert_eq!(
        r.decide_batch(),
        Err(FlushError::Apply(ApplyError::UnknownOutputTensor {
            name: "value_estimate".into(),
        }))
    );
    assert!(r.get_action(AgentId(1)).is_none());
    assert_eq!(r.metrics().flushes, 0);
    assert_eq!(r.metrics().aborted_flushes, 1);
    assert!(r.last_flush_metrics().is_none());
}

#[test]
fn wrong_action_width_is_a_shape_mismatch() {
    let mut r = ModelRunner::new(
        RunnerConfig::new(ActionSpec::continuous(3)),
        ConstantExecutor::new(vec![1.0, 2.0]),
    )
    .unwrap();
    r.submit(DecisionRequest::new(AgentId(1), vec![vector(&[1.0])]))
        .unwrap();
    assert_eq!(
        r.decide_batch(),
        Err(FlushError::Apply(ApplyError::ShapeMismatch {
            name: names::ACTION_OUTPUT.into(),
            expected: 3,
            actual: 2,
        }))
    );
}

// ── Runner state after an abort ──────────────────────────────────

fn echo_1() -> ModelRunner {
    ModelRunner::new(
        RunnerConfig::new(ActionSpec::continuous(1)),
        EchoExecutor::new(),
    )
    .unwrap()
}

fn overflowing(id: u64) -> DecisionRequest {
    let bad: SensorHandle = Arc::new(OverflowingSensor { len: 1 });
    DecisionRequest::new(AgentId(id), vec![bad])
}

#[test]
fn aborted_flush_keeps_retired_action_readable() {
    let mut r = echo_1();
    r.submit(DecisionRequest::new(AgentId(1), vec![vector(&[4.0])]).with_done(true))
        .unwrap();
    r.decide_batch().unwrap();
    assert_eq!(r.get_action(AgentId(1)).unwrap().continuous, vec![4.0]);

    r.submit(overflowing(2)).unwrap();
    assert!(r.decide_batch().is_err());
    assert_eq!(r.get_action(AgentId(1)).unwrap().continuous, vec![4.0]);

    // The next successful flush purges it.
    r.submit(DecisionRequest::new(AgentId(2), vec![vector(&[6.0])]))
        .unwrap();
    r.decide_batch().unwrap();
    assert!(r.get_action(AgentId(1)).is_none());
    assert_eq!(r.get_action(AgentId(2)).unwrap().continuous, vec![6.0]);
}

#[test]
fn aborted_flush_keeps_last_batch_agents() {
    let mut r = echo_1();
    r.submit(DecisionRequest::new(AgentId(1), vec![vector(&[1.0])]))
        .unwrap();
    r.submit(DecisionRequest::new(AgentId(3), vec![vector(&[3.0])]))
        .unwrap();
    r.decide_batch().unwrap();
    assert_eq!(r.last_batch_agents(), &[AgentId(1), AgentId(3)]);

    r.submit(overflowing(2)).unwrap();
    assert!(r.decide_batch().is_err());
    assert_eq!(r.last_batch_agents(), &[AgentId(1), AgentId(3)]);

    r.submit(DecisionRequest::new(AgentId(2), vec![vector(&[2.0])]))
        .unwrap();
    r.decide_batch().unwrap();
    assert_eq!(r.last_batch_agents(), &[AgentId(2)]);
}
