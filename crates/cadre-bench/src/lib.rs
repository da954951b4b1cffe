//! Benchmark profiles and utilities for the Cadre decision pipeline.
//!
//! Provides a synthetic backend and pre-built runner profiles for
//! benchmarks and examples:
//!
//! - [`LinearPolicy`]: one dense layer with seeded weights
//! - [`reference_profile`]: 32 observations, 4 continuous actions
//! - [`discrete_profile`]: 32 observations, branches `[3, 3, 2]`
//! - [`agent_requests`]: deterministic per-agent observations via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use cadre_core::{ActionSpec, AgentId, ExecutionError};
use cadre_engine::{ConfigError, ModelRunner, RunnerConfig};
use cadre_infer::executor::require_input;
use cadre_infer::{DecisionRequest, InferenceExecutor, ModelInterface};
use cadre_sensor::VectorSensor;
use cadre_tensor::{names, Tensor, TensorArena, TensorShape};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Observation width of every built-in profile.
pub const REFERENCE_OBS_LEN: usize = 32;

/// A dense `obs_len × out_len` layer: `action = obs · W`.
///
/// Cost grows linearly with the batch, which is enough to show the
/// per-call overhead a batched runner amortises.
pub struct LinearPolicy {
    interface: ModelInterface,
    weights: Vec<f32>,
    obs_len: usize,
    out_len: usize,
}

impl LinearPolicy {
    /// Weights drawn uniformly from `[-1, 1)`.
    pub fn new(obs_len: usize, out_len: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let weights = (0..obs_len * out_len)
            .map(|_| rng.random::<f32>() * 2.0 - 1.0)
            .collect();
        Self {
            interface: ModelInterface::new(
                "linear",
                [names::VECTOR_OBSERVATION],
                [names::ACTION_OUTPUT],
            ),
            weights,
            obs_len,
            out_len,
        }
    }
}

impl InferenceExecutor for LinearPolicy {
    fn interface(&self) -> &ModelInterface {
        &self.interface
    }

    fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
        let obs = require_input(inputs, names::VECTOR_OBSERVATION)?;
        if obs.row_len() != self.obs_len {
            return Err(ExecutionError::Backend {
                reason: format!(
                    "observation width {} does not match layer input {}",
                    obs.row_len(),
                    self.obs_len
                ),
            });
        }
        let rows = obs.rows();
        let mut out = vec![0.0f32; rows * self.out_len];
        for (r, dst) in out.chunks_exact_mut(self.out_len).enumerate() {
            for (x, w_row) in obs.row(r).iter().zip(self.weights.chunks_exact(self.out_len)) {
                for (d, w) in dst.iter_mut().zip(w_row) {
                    *d += x * w;
                }
            }
        }
        let tensor = Tensor::from_data(
            names::ACTION_OUTPUT,
            TensorShape::matrix(rows, self.out_len),
            out,
        )
        .map_err(|e| ExecutionError::Backend {
            reason: e.to_string(),
        })?;
        Ok(vec![tensor])
    }
}

/// A runner configuration and the backend it is paired with.
pub struct Profile {
    /// Runner configuration.
    pub config: RunnerConfig,
    /// The synthetic backend.
    pub policy: LinearPolicy,
}

impl Profile {
    /// Build the runner.
    pub fn into_runner(self) -> Result<ModelRunner, ConfigError> {
        ModelRunner::new(self.config, self.policy)
    }
}

/// Continuous profile: 32 observations → 4 actions.
pub fn reference_profile(seed: u64) -> Profile {
    let spec = ActionSpec::continuous(4);
    Profile {
        policy: LinearPolicy::new(REFERENCE_OBS_LEN, spec.logit_count(), seed),
        config: RunnerConfig::new(spec).with_seed(seed),
    }
}

/// Discrete profile: 32 observations → logits for branches `[3, 3, 2]`.
pub fn discrete_profile(seed: u64) -> Profile {
    let spec = ActionSpec::discrete(&[3, 3, 2]);
    Profile {
        policy: LinearPolicy::new(REFERENCE_OBS_LEN, spec.logit_count(), seed),
        config: RunnerConfig::new(spec).with_seed(seed),
    }
}

/// `n` requests for agents `0..n`, each with one vector sensor of
/// `obs_len` values in `[-1, 1)`.
///
/// The same seed always yields the same observations.
pub fn agent_requests(n: usize, obs_len: usize, seed: u64) -> Vec<DecisionRequest> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let values = (0..obs_len)
                .map(|_| rng.random::<f32>() * 2.0 - 1.0)
                .collect();
            let sensor = VectorSensor::from_values("obs", values);
            DecisionRequest::new(AgentId(i as u64), vec![Arc::new(sensor)])
        })
        .collect()
}
