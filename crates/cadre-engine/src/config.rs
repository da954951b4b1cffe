//! Runner configuration, validation, and error types.
//!
//! [`RunnerConfig`] is the input for constructing a [`ModelRunner`](crate::ModelRunner).
//! [`validate()`](RunnerConfig::validate) checks the configuration alone;
//! [`validate_interface()`](RunnerConfig::validate_interface) checks it
//! against the model the executor declares. The runner constructor runs
//! both.

use std::error::Error;
use std::fmt;

use cadre_core::{ActionSpec, GenerateError};
use cadre_infer::ModelInterface;
use cadre_tensor::names;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building a runner.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The action spec is structurally invalid.
    InvalidActionSpec {
        /// Description of the violated invariant.
        reason: String,
    },
    /// `max_batch_size` was set to zero.
    MaxBatchSizeZero,
    /// The model and the configuration disagree.
    InconsistentModel {
        /// Description of the disagreement.
        reason: String,
    },
    /// Input generators could not be built for the model.
    Generate(GenerateError),
    /// The runner thread could not be spawned.
    ThreadSpawnFailed {
        /// OS-provided description.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidActionSpec { reason } => write!(f, "invalid action spec: {reason}"),
            Self::MaxBatchSizeZero => write!(f, "max_batch_size must be at least 1"),
            Self::InconsistentModel { reason } => write!(f, "inconsistent model: {reason}"),
            Self::Generate(e) => write!(f, "generator: {e}"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Generate(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GenerateError> for ConfigError {
    fn from(e: GenerateError) -> Self {
        Self::Generate(e)
    }
}

// ── RunnerConfig ───────────────────────────────────────────────────

/// Complete configuration for a [`ModelRunner`](crate::ModelRunner).
#[derive(Clone, Debug, PartialEq)]
pub struct RunnerConfig {
    /// Action space the model drives.
    pub action_spec: ActionSpec,
    /// Seed for the discrete sampler and the epsilon noise input.
    pub seed: u64,
    /// Check every submission's sensor shapes against the first one.
    /// Default: true.
    pub validate_sensor_shapes: bool,
    /// Cap on pending submissions per flush. `None` = unbounded.
    pub max_batch_size: Option<usize>,
    /// Initial `f32` capacity reserved per input tensor slot. Default: 0.
    pub arena_capacity: usize,
}

impl RunnerConfig {
    /// Defaults for `action_spec`: seed 0, shape validation on,
    /// unbounded batches, no arena pre-reservation.
    pub fn new(action_spec: ActionSpec) -> Self {
        Self {
            action_spec,
            seed: 0,
            validate_sensor_shapes: true,
            max_batch_size: None,
            arena_capacity: 0,
        }
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cap pending submissions per flush.
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = Some(max);
        self
    }

    /// Validate the configuration on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.action_spec
            .validate()
            .map_err(|reason| ConfigError::InvalidActionSpec { reason })?;
        if self.max_batch_size == Some(0) {
            return Err(ConfigError::MaxBatchSizeZero);
        }
        Ok(())
    }

    /// Validate the configuration against a model interface.
    pub fn validate_interface(&self, interface: &ModelInterface) -> Result<(), ConfigError> {
        if !interface.has_output(names::ACTION_OUTPUT) {
            return Err(ConfigError::InconsistentModel {
                reason: format!(
                    "model '{}' does not declare the '{}' output",
                    interface.name,
                    names::ACTION_OUTPUT
                ),
            });
        }
        let declares_memory = interface.has_input(names::RECURRENT_IN)
            || interface.has_output(names::RECURRENT_OUT)
            || interface.memory_slots > 0;
        if declares_memory && !interface.is_recurrent() {
            return Err(ConfigError::InconsistentModel {
                reason: "recurrent tensors declared with memory_size 0".to_string(),
            });
        }
        if interface.is_recurrent()
            && interface.memory_slots == 0
            && !interface.has_output(names::RECURRENT_OUT)
        {
            return Err(ConfigError::InconsistentModel {
                reason: format!(
                    "memory_size is {} but '{}' is not an output",
                    interface.memory_size,
                    names::RECURRENT_OUT
                ),
            });
        }
        Ok(())
    }
}
