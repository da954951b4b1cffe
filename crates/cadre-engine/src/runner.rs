//! The [`ModelRunner`]: accumulate, flush, query.
//!
//! A runner cycles through three phases driven by the simulation loop:
//!
//! 1. **Accumulate**: [`submit`](ModelRunner::submit) appends one request
//!    per agent. Terminated agents have their memory and last action
//!    dropped here.
//! 2. **Flush**: [`decide_batch`](ModelRunner::decide_batch) generates the
//!    inputs, calls the executor once, and applies every output. Any
//!    failure discards the batch before a store is touched.
//! 3. **Query**: [`get_action`](ModelRunner::get_action) reads the most
//!    recent action of one agent.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::mem;
use std::time::Instant;

use cadre_core::{
    ActionBuffer, AgentId, ApplyError, ExecutionError, FlushId, GenerateError, ShapeMismatch,
};
use cadre_infer::{
    AgentStores, ApplierRegistry, DecisionRequest, InferenceExecutor, ModelInterface,
    ObservationLayout, TensorGenerator,
};
use cadre_sensor::SensorShapeValidator;
use cadre_tensor::TensorArena;

use crate::config::{ConfigError, RunnerConfig};
use crate::metrics::{FlushMetrics, RunnerMetrics};

// ── Error types ──────────────────────────────────────────────────

/// A rejected submission. The request is dropped; nothing else changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The agent already has a request in the pending batch.
    DuplicateAgent {
        /// The repeated identity.
        agent: AgentId,
    },
    /// The pending batch is at `max_batch_size`.
    BatchFull {
        /// The configured cap.
        capacity: usize,
    },
    /// The agent's sensors differ from the first submission's.
    ShapeMismatch {
        /// The offending agent.
        agent: AgentId,
        /// What disagreed.
        mismatch: ShapeMismatch,
    },
    /// The action mask does not cover exactly one flag per logit.
    InvalidActionMask {
        /// The offending agent.
        agent: AgentId,
        /// Flags required (0 for continuous action specs).
        expected: usize,
        /// Flags supplied.
        actual: usize,
    },
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateAgent { agent } => {
                write!(f, "agent {agent} already has a pending request")
            }
            Self::BatchFull { capacity } => write!(f, "batch full ({capacity} pending)"),
            Self::ShapeMismatch { agent, mismatch } => write!(f, "agent {agent}: {mismatch}"),
            Self::InvalidActionMask {
                agent,
                expected,
                actual,
            } => write!(
                f,
                "agent {agent}: action mask has {actual} flags, expected {expected}"
            ),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ShapeMismatch { mismatch, .. } => Some(mismatch),
            _ => None,
        }
    }
}

/// A failed flush. The batch it was processing has been discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlushError {
    /// Input tensors could not be built.
    Generate(GenerateError),
    /// The backend failed.
    Execute(ExecutionError),
    /// Outputs could not be decoded.
    Apply(ApplyError),
}

impl fmt::Display for FlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate(e) => write!(f, "generate: {e}"),
            Self::Execute(e) => write!(f, "execute: {e}"),
            Self::Apply(e) => write!(f, "apply: {e}"),
        }
    }
}

impl Error for FlushError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Generate(e) => Some(e),
            Self::Execute(e) => Some(e),
            Self::Apply(e) => Some(e),
        }
    }
}

impl From<GenerateError> for FlushError {
    fn from(e: GenerateError) -> Self {
        Self::Generate(e)
    }
}

impl From<ExecutionError> for FlushError {
    fn from(e: ExecutionError) -> Self {
        Self::Execute(e)
    }
}

impl From<ApplyError> for FlushError {
    fn from(e: ApplyError) -> Self {
        Self::Apply(e)
    }
}

// ── ModelRunner ──────────────────────────────────────────────────

/// Batches decision requests through one shared model.
///
/// Single-threaded and synchronous: the caller submits every agent for
/// a step, then flushes once. See [`RunnerThread`](crate::RunnerThread)
/// to drive a runner from several threads.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cadre_core::{ActionSpec, AgentId};
/// use cadre_engine::{ModelRunner, RunnerConfig};
/// use cadre_infer::DecisionRequest;
/// use cadre_sensor::VectorSensor;
/// use cadre_test_utils::EchoExecutor;
///
/// let mut runner = ModelRunner::new(
///     RunnerConfig::new(ActionSpec::continuous(3)),
///     EchoExecutor::new(),
/// )
/// .unwrap();
/// let obs = VectorSensor::from_values("obs", vec![1.0, 2.0, 3.0]);
/// runner
///     .submit(DecisionRequest::new(AgentId(1), vec![Arc::new(obs)]))
///     .unwrap();
/// runner.decide_batch().unwrap();
/// assert_eq!(runner.get_action(AgentId(1)).unwrap().continuous, vec![1.0, 2.0, 3.0]);
/// ```
pub struct ModelRunner {
    config: RunnerConfig,
    executor: Box<dyn InferenceExecutor>,
    generator: TensorGenerator,
    appliers: ApplierRegistry,
    arena: TensorArena,
    stores: AgentStores,
    validator: SensorShapeValidator,
    pending: Vec<DecisionRequest>,
    pending_ids: HashSet<AgentId>,
    /// Ordered identities of the batch being flushed, or of the last
    /// successful one between flushes.
    agents: Vec<AgentId>,
    /// Agents terminated in the last flush; their actions go at the next
    /// successful one.
    retired: Vec<AgentId>,
    next_flush: FlushId,
    last_flush: Option<FlushMetrics>,
    metrics: RunnerMetrics,
}

impl ModelRunner {
    /// Build a runner around `executor`.
    ///
    /// Validates `config` on its own and against the executor's model
    /// interface, then selects input generators and output appliers.
    pub fn new<E>(config: RunnerConfig, executor: E) -> Result<Self, ConfigError>
    where
        E: InferenceExecutor + 'static,
    {
        Self::with_boxed(config, Box::new(executor))
    }

    /// Build a runner around an already boxed executor.
    pub fn with_boxed(
        config: RunnerConfig,
        executor: Box<dyn InferenceExecutor>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let interface = executor.interface();
        config.validate_interface(interface)?;
        let generator = TensorGenerator::new(interface, &config.action_spec, config.seed)?;
        let appliers = ApplierRegistry::new(&config.action_spec, interface, config.seed);
        let slot_names: Vec<&str> = interface.inputs.iter().map(String::as_str).collect();
        let arena = TensorArena::with_capacity(&slot_names, config.arena_capacity);
        tracing::debug!(
            model = %interface.name,
            inputs = interface.inputs.len(),
            outputs = interface.outputs.len(),
            memory_size = interface.memory_size,
            "model runner created"
        );
        Ok(Self {
            config,
            executor,
            generator,
            appliers,
            arena,
            stores: AgentStores::new(),
            validator: SensorShapeValidator::new(),
            pending: Vec::new(),
            pending_ids: HashSet::new(),
            agents: Vec::new(),
            retired: Vec::new(),
            next_flush: FlushId(0),
            last_flush: None,
            metrics: RunnerMetrics::default(),
        })
    }

    /// Queue `request` for the next flush.
    ///
    /// A terminated request drops the agent's stored memory and last
    /// action; the agent still receives an action from this batch.
    pub fn submit(&mut self, request: DecisionRequest) -> Result<(), SubmitError> {
        if let Err(e) = self.check_submission(&request) {
            self.metrics.rejected_submissions += 1;
            tracing::warn!(agent = %request.agent, error = %e, "submission rejected");
            return Err(e);
        }
        if request.done {
            self.stores.forget(request.agent);
        }
        self.pending_ids.insert(request.agent);
        self.pending.push(request);
        Ok(())
    }

    fn check_submission(&mut self, request: &DecisionRequest) -> Result<(), SubmitError> {
        let agent = request.agent;
        if let Some(capacity) = self.config.max_batch_size {
            if self.pending.len() >= capacity {
                return Err(SubmitError::BatchFull { capacity });
            }
        }
        if self.pending_ids.contains(&agent) {
            return Err(SubmitError::DuplicateAgent { agent });
        }
        if let Some(mask) = &request.action_mask {
            let expected = if self.config.action_spec.is_continuous() {
                0
            } else {
                self.config.action_spec.logit_count()
            };
            if mask.len() != expected {
                return Err(SubmitError::InvalidActionMask {
                    agent,
                    expected,
                    actual: mask.len(),
                });
            }
        }
        if self.config.validate_sensor_shapes {
            self.validator
                .validate(&request.sensors)
                .map_err(|mismatch| SubmitError::ShapeMismatch { agent, mismatch })?;
        }
        Ok(())
    }

    /// Flush the pending batch through the model.
    ///
    /// Returns `Ok(None)` without doing anything when no request is
    /// pending. Otherwise runs generation, one executor call, and
    /// application, in that order, and returns the flush's metrics.
    ///
    /// On error the batch is discarded and no store is modified; the
    /// affected agents must be resubmitted.
    pub fn decide_batch(&mut self) -> Result<Option<FlushMetrics>, FlushError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let flush_id = self.next_flush;
        self.next_flush = flush_id.next();

        let batch = mem::take(&mut self.pending);
        self.pending_ids.clear();
        let previous = mem::replace(&mut self.agents, batch.iter().map(|r| r.agent).collect());

        let result = self.run_flush(flush_id, &batch);
        self.arena.reset();
        match result {
            Ok(metrics) => {
                for agent in mem::take(&mut self.retired) {
                    if !self.agents.contains(&agent) {
                        self.stores.actions.remove(agent);
                    }
                }
                for req in batch.iter().filter(|r| r.done) {
                    self.stores.memories.remove(req.agent);
                    self.retired.push(req.agent);
                }
                self.metrics.flushes += 1;
                self.metrics.agents_decided += batch.len() as u64;
                tracing::debug!(
                    flush = %flush_id,
                    batch = metrics.batch_size,
                    generate_us = metrics.generate_us,
                    execute_us = metrics.execute_us,
                    apply_us = metrics.apply_us,
                    total_us = metrics.total_us,
                    "flush complete"
                );
                self.last_flush = Some(metrics.clone());
                Ok(Some(metrics))
            }
            Err(e) => {
                self.agents = previous;
                self.metrics.aborted_flushes += 1;
                tracing::warn!(
                    flush = %flush_id,
                    batch = batch.len(),
                    error = %e,
                    "flush aborted, batch discarded"
                );
                Err(e)
            }
        }
    }

    fn run_flush(
        &mut self,
        flush_id: FlushId,
        batch: &[DecisionRequest],
    ) -> Result<FlushMetrics, FlushError> {
        let start = Instant::now();

        self.generator
            .generate(batch, &self.stores, &mut self.arena)?;
        let generate_us = start.elapsed().as_micros() as u64;

        let exec_start = Instant::now();
        self.metrics.executor_calls += 1;
        let outputs = self.executor.execute(&self.arena)?;
        let execute_us = exec_start.elapsed().as_micros() as u64;

        let apply_start = Instant::now();
        self.appliers
            .apply(&outputs, &self.agents, &mut self.stores)?;
        let apply_us = apply_start.elapsed().as_micros() as u64;

        Ok(FlushMetrics {
            flush_id,
            batch_size: batch.len(),
            generate_us,
            execute_us,
            apply_us,
            total_us: start.elapsed().as_micros() as u64,
            arena_bytes: self.arena.memory_bytes(),
            arena_grow_events: self.arena.grow_events(),
        })
    }

    /// The most recent action decoded for `agent`, or `None` if the
    /// agent has never been decided or its entry was dropped.
    pub fn get_action(&self, agent: AgentId) -> Option<&ActionBuffer> {
        self.stores.actions.get(agent)
    }

    /// The recurrent memory stored for `agent`.
    pub fn memory(&self, agent: AgentId) -> Option<&[f32]> {
        self.stores.memories.get(agent)
    }

    /// Number of pending requests.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether `agent` has a pending request.
    pub fn is_pending(&self, agent: AgentId) -> bool {
        self.pending_ids.contains(&agent)
    }

    /// Identities of the pending batch, in submission order.
    pub fn pending_agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.pending.iter().map(|r| r.agent)
    }

    /// Identities of the most recent successful batch, in row order.
    ///
    /// An aborted flush leaves this unchanged.
    pub fn last_batch_agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// The observation layout, once the first flush has fixed it.
    pub fn layout(&self) -> Option<&ObservationLayout> {
        self.generator.layout()
    }

    /// The model interface of the executor.
    pub fn interface(&self) -> &ModelInterface {
        self.executor.interface()
    }

    /// The runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Metrics of the last successful flush.
    pub fn last_flush_metrics(&self) -> Option<&FlushMetrics> {
        self.last_flush.as_ref()
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> &RunnerMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadre_core::ActionSpec;
    use cadre_sensor::{SensorHandle, VectorSensor};
    use cadre_tensor::{names, Tensor};
    use std::sync::Arc;

    /// Echoes `vector_observation` as `action`.
    struct Echo {
        interface: ModelInterface,
    }

    impl Echo {
        fn new() -> Self {
            Self {
                interface: ModelInterface::new(
                    "echo",
                    [names::VECTOR_OBSERVATION],
                    [names::ACTION_OUTPUT],
                ),
            }
        }
    }

    impl InferenceExecutor for Echo {
        fn interface(&self) -> &ModelInterface {
            &self.interface
        }

        fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
            let obs = cadre_infer::executor::require_input(inputs, names::VECTOR_OBSERVATION)?;
            let out = Tensor::from_data(names::ACTION_OUTPUT, obs.shape().clone(), obs.data().to_vec())
                .map_err(|e| ExecutionError::Backend {
                    reason: e.to_string(),
                })?;
            Ok(vec![out])
        }
    }

    fn obs(values: &[f32]) -> Vec<SensorHandle> {
        vec![Arc::new(VectorSensor::from_values("obs", values.to_vec()))]
    }

    fn runner(size: usize) -> ModelRunner {
        ModelRunner::new(RunnerConfig::new(ActionSpec::continuous(size)), Echo::new()).unwrap()
    }

    // ── submit ────────────────────────────────────────────────

    #[test]
    fn duplicate_submission_rejected() {
        let mut r = runner(1);
        r.submit(DecisionRequest::new(AgentId(1), obs(&[1.0]))).unwrap();
        let err = r
            .submit(DecisionRequest::new(AgentId(1), obs(&[2.0])))
            .unwrap_err();
        assert_eq!(err, SubmitError::DuplicateAgent { agent: AgentId(1) });
        assert_eq!(r.pending_len(), 1);
        assert_eq!(r.metrics().rejected_submissions, 1);
    }

    #[test]
    fn batch_cap_enforced() {
        let config = RunnerConfig::new(ActionSpec::continuous(1)).with_max_batch_size(2);
        let mut r = ModelRunner::new(config, Echo::new()).unwrap();
        r.submit(DecisionRequest::new(AgentId(1), obs(&[1.0]))).unwrap();
        r.submit(DecisionRequest::new(AgentId(2), obs(&[1.0]))).unwrap();
        assert_eq!(
            r.submit(DecisionRequest::new(AgentId(3), obs(&[1.0]))),
            Err(SubmitError::BatchFull { capacity: 2 })
        );
        r.decide_batch().unwrap();
        r.submit(DecisionRequest::new(AgentId(3), obs(&[1.0]))).unwrap();
    }

    #[test]
    fn submit_time_shape_check_rejects_only_offender() {
        let mut r = runner(2);
        r.submit(DecisionRequest::new(AgentId(1), obs(&[1.0, 2.0]))).unwrap();
        let err = r
            .submit(DecisionRequest::new(AgentId(2), obs(&[1.0, 2.0, 3.0])))
            .unwrap_err();
        assert!(matches!(err, SubmitError::ShapeMismatch { agent: AgentId(2), .. }));
        assert!(r.is_pending(AgentId(1)));
        assert!(!r.is_pending(AgentId(2)));
    }

    #[test]
    fn mask_length_checked_against_spec() {
        let mut r = runner(1);
        let err = r
            .submit(DecisionRequest::new(AgentId(1), obs(&[1.0])).with_action_mask(vec![true]))
            .unwrap_err();
        assert_eq!(
            err,
            SubmitError::InvalidActionMask {
                agent: AgentId(1),
                expected: 0,
                actual: 1
            }
        );
    }

    // ── flush ─────────────────────────────────────────────────

    #[test]
    fn empty_flush_is_noop() {
        let mut r = runner(1);
        assert_eq!(r.decide_batch(), Ok(None));
        assert_eq!(r.metrics().executor_calls, 0);
        assert_eq!(r.metrics().flushes, 0);
        assert!(r.last_flush_metrics().is_none());
    }

    #[test]
    fn flush_preserves_submission_order() {
        let mut r = runner(1);
        for id in [5, 2, 9, 1] {
            r.submit(DecisionRequest::new(AgentId(id), obs(&[id as f32]))).unwrap();
        }
        let pending: Vec<_> = r.pending_agents().collect();
        let m = r.decide_batch().unwrap().unwrap();
        assert_eq!(m.batch_size, 4);
        assert_eq!(r.last_batch_agents(), &pending[..]);
        for id in [5, 2, 9, 1] {
            assert_eq!(r.get_action(AgentId(id)).unwrap().continuous, vec![id as f32]);
        }
        assert_eq!(r.pending_len(), 0);
    }

    #[test]
    fn terminated_agent_decided_then_purged() {
        let mut r = runner(1);
        r.submit(DecisionRequest::new(AgentId(1), obs(&[4.0])).with_done(true))
            .unwrap();
        r.decide_batch().unwrap();
        assert_eq!(r.get_action(AgentId(1)).unwrap().continuous, vec![4.0]);

        r.submit(DecisionRequest::new(AgentId(2), obs(&[1.0]))).unwrap();
        r.decide_batch().unwrap();
        assert!(r.get_action(AgentId(1)).is_none());
        assert!(r.get_action(AgentId(2)).is_some());
    }

    #[test]
    fn flush_ids_advance() {
        let mut r = runner(1);
        for expected in 0..3 {
            r.submit(DecisionRequest::new(AgentId(1), obs(&[1.0]))).unwrap();
            let m = r.decide_batch().unwrap().unwrap();
            assert_eq!(m.flush_id, FlushId(expected));
        }
        assert_eq!(r.metrics().flushes, 3);
        assert_eq!(r.metrics().executor_calls, 3);
        assert_eq!(r.metrics().agents_decided, 3);
    }

    #[test]
    fn missing_agent_is_none() {
        let r = runner(1);
        assert!(r.get_action(AgentId(404)).is_none());
        assert!(r.memory(AgentId(404)).is_none());
    }

    #[test]
    fn unknown_model_input_fails_construction() {
        let mut echo = Echo::new();
        echo.interface.inputs.push("mystery".into());
        let err = ModelRunner::new(RunnerConfig::new(ActionSpec::continuous(1)), echo)
            .err()
            .unwrap();
        assert_eq!(
            err,
            ConfigError::Generate(GenerateError::UnknownInputTensor {
                name: "mystery".into()
            })
        );
    }

    #[test]
    fn flush_error_sources() {
        let e: FlushError = ExecutionError::Backend {
            reason: "boom".into(),
        }
        .into();
        assert!(e.source().is_some());
        assert_eq!(e.to_string(), "execute: backend failed: boom");
    }
}
