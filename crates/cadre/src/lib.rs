//! Cadre: batched neural decisions for many simulated agents.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Cadre sub-crates. For most users, adding `cadre` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use cadre::prelude::*;
//! use cadre::tensor::{names, Tensor, TensorArena, TensorShape};
//!
//! // A backend that answers every agent with the sum of its observation.
//! struct SumModel(ModelInterface);
//! impl InferenceExecutor for SumModel {
//!     fn interface(&self) -> &ModelInterface { &self.0 }
//!     fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
//!         let obs = cadre::infer::executor::require_input(inputs, names::VECTOR_OBSERVATION)?;
//!         let sums: Vec<f32> = (0..obs.rows()).map(|r| obs.row(r).iter().sum::<f32>()).collect();
//!         let out = Tensor::from_data(names::ACTION_OUTPUT, TensorShape::matrix(obs.rows(), 1), sums)
//!             .map_err(|e| ExecutionError::Backend { reason: e.to_string() })?;
//!         Ok(vec![out])
//!     }
//! }
//!
//! let model = SumModel(ModelInterface::new(
//!     "sum",
//!     [names::VECTOR_OBSERVATION],
//!     [names::ACTION_OUTPUT],
//! ));
//! let mut runner = ModelRunner::new(RunnerConfig::new(ActionSpec::continuous(1)), model).unwrap();
//!
//! for id in 0..3u64 {
//!     let sensor = VectorSensor::from_values("obs", vec![id as f32, 1.0]);
//!     runner.submit(DecisionRequest::new(AgentId(id), vec![Arc::new(sensor)])).unwrap();
//! }
//! runner.decide_batch().unwrap();
//! assert_eq!(runner.get_action(AgentId(2)).unwrap().continuous, vec![3.0]);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cadre-core` | IDs, shapes, action specs, error types |
//! | [`tensor`] | `cadre-tensor` | Named tensors, the flush arena, tensor names |
//! | [`sensor`] | `cadre-sensor` | Sensor trait, observation writer, shape validation |
//! | [`infer`] | `cadre-infer` | Generators, executor boundary, appliers, stores |
//! | [`engine`] | `cadre-engine` | The model runner and its threaded wrapper |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and IDs (`cadre-core`).
///
/// Contains agent and flush identities, observation shapes, action
/// specifications and buffers, and every pipeline error type.
pub use cadre_core as types;

/// Named tensors and flush-scoped storage (`cadre-tensor`).
///
/// [`tensor::TensorArena`] holds the inputs of one flush;
/// [`tensor::names`] lists the conventional tensor names.
pub use cadre_tensor as tensor;

/// Sensors and observation writing (`cadre-sensor`).
///
/// Implement [`sensor::Sensor`] for custom observations; use
/// [`sensor::VectorSensor`] for flat values.
pub use cadre_sensor as sensor;

/// Batch generation, the backend boundary, and output decoding
/// (`cadre-infer`).
///
/// [`infer::InferenceExecutor`] is the extension point for model backends.
pub use cadre_infer as infer;

/// The model runner (`cadre-engine`).
///
/// [`engine::ModelRunner`] for synchronous batching,
/// [`engine::RunnerThread`] to share one runner between threads.
pub use cadre_engine as engine;

/// Common imports for typical Cadre usage.
///
/// ```rust
/// use cadre::prelude::*;
/// ```
///
/// This imports the most frequently used types: the runner and its
/// configuration, requests, sensors, the executor trait, and errors.
pub mod prelude {
    // Core types
    pub use cadre_core::{ActionBuffer, ActionSpec, AgentId, FlushId, ObservationShape};

    // Errors
    pub use cadre_core::{ApplyError, ExecutionError, GenerateError, ShapeMismatch, WriteError};

    // Sensors
    pub use cadre_sensor::{ObservationWriter, Sensor, SensorHandle, VectorSensor};

    // Inference
    pub use cadre_infer::{DecisionRequest, InferenceExecutor, ModelInterface};

    // Engine
    pub use cadre_engine::{
        ConfigError, FlushError, FlushMetrics, ModelRunner, RunnerConfig, RunnerMetrics,
        RunnerThread, SubmitError,
    };
}
