//! Test utilities and mock executors for Cadre development.
//!
//! Provides mock implementations of [`InferenceExecutor`] with fixed,
//! predictable outputs, plus fixture sensors in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cadre_core::ExecutionError;
use cadre_infer::executor::require_input;
use cadre_infer::{InferenceExecutor, ModelInterface};
use cadre_tensor::{names, Tensor, TensorArena, TensorShape};

fn tensor(name: &str, shape: TensorShape, data: Vec<f32>) -> Result<Tensor, ExecutionError> {
    Tensor::from_data(name, shape, data).map_err(|e| ExecutionError::Backend {
        reason: e.to_string(),
    })
}

/// Returns `vector_observation` unchanged as `action`.
///
/// The action size of the runner must equal the total vector
/// observation width.
pub struct EchoExecutor {
    interface: ModelInterface,
}

impl EchoExecutor {
    pub fn new() -> Self {
        Self {
            interface: ModelInterface::new(
                "echo",
                [names::VECTOR_OBSERVATION],
                [names::ACTION_OUTPUT],
            ),
        }
    }

    /// Declare extra inputs the echo ignores, e.g. `batch_size`.
    pub fn with_inputs(mut self, extra: &[&str]) -> Self {
        self.interface
            .inputs
            .extend(extra.iter().map(|s| s.to_string()));
        self
    }
}

impl Default for EchoExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceExecutor for EchoExecutor {
    fn interface(&self) -> &ModelInterface {
        &self.interface
    }

    fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
        let obs = require_input(inputs, names::VECTOR_OBSERVATION)?;
        Ok(vec![tensor(
            names::ACTION_OUTPUT,
            obs.shape().clone(),
            obs.data().to_vec(),
        )?])
    }
}

/// Returns the same `action` row for every agent.
///
/// Works for continuous values and for discrete logits alike.
pub struct ConstantExecutor {
    interface: ModelInterface,
    row: Vec<f32>,
    extra_outputs: Vec<String>,
}

impl ConstantExecutor {
    pub fn new(row: Vec<f32>) -> Self {
        Self {
            interface: ModelInterface::new(
                "constant",
                [names::VECTOR_OBSERVATION],
                [names::ACTION_OUTPUT],
            ),
            row,
            extra_outputs: Vec::new(),
        }
    }

    /// Also emit a zero-filled `[batch, 1]` output named `name`.
    ///
    /// The name is not declared in the interface, so a runner has no
    /// applier for it.
    pub fn with_undeclared_output(mut self, name: &str) -> Self {
        self.extra_outputs.push(name.to_string());
        self
    }
}

impl InferenceExecutor for ConstantExecutor {
    fn interface(&self) -> &ModelInterface {
        &self.interface
    }

    fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
        let rows = require_input(inputs, names::VECTOR_OBSERVATION)?.rows();
        let data = self
            .row
            .iter()
            .copied()
            .cycle()
            .take(rows * self.row.len())
            .collect();
        let mut out = vec![tensor(
            names::ACTION_OUTPUT,
            TensorShape::matrix(rows, self.row.len()),
            data,
        )?];
        for name in &self.extra_outputs {
            out.push(tensor(name, TensorShape::matrix(rows, 1), vec![0.0; rows])?);
        }
        Ok(out)
    }
}

/// Recurrent echo: `action` is the incoming memory row and
/// `recurrent_out` is that row plus one.
///
/// An agent's action therefore shows the memory it was fed, and each
/// flush increments stored memory by one.
pub struct MemoryEchoExecutor {
    interface: ModelInterface,
}

impl MemoryEchoExecutor {
    pub fn new(memory_size: usize) -> Self {
        Self {
            interface: ModelInterface::new(
                "memory-echo",
                [names::VECTOR_OBSERVATION, names::RECURRENT_IN],
                [names::ACTION_OUTPUT, names::RECURRENT_OUT],
            )
            .with_memory(memory_size),
        }
    }
}

impl InferenceExecutor for MemoryEchoExecutor {
    fn interface(&self) -> &ModelInterface {
        &self.interface
    }

    fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
        let memory = require_input(inputs, names::RECURRENT_IN)?;
        let next = memory.data().iter().map(|v| v + 1.0).collect();
        Ok(vec![
            tensor(
                names::ACTION_OUTPUT,
                memory.shape().clone(),
                memory.data().to_vec(),
            )?,
            tensor(names::RECURRENT_OUT, memory.shape().clone(), next)?,
        ])
    }
}

/// Always fails with a backend error.
pub struct FailingExecutor {
    interface: ModelInterface,
    reason: String,
}

impl FailingExecutor {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            interface: ModelInterface::new(
                "failing",
                [names::VECTOR_OBSERVATION],
                [names::ACTION_OUTPUT],
            ),
            reason: reason.into(),
        }
    }
}

impl InferenceExecutor for FailingExecutor {
    fn interface(&self) -> &ModelInterface {
        &self.interface
    }

    fn execute(&mut self, _inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
        Err(ExecutionError::Backend {
            reason: self.reason.clone(),
        })
    }
}

/// Wraps another executor and counts `execute` calls.
///
/// The counter is shared, so it stays readable after the executor has
/// been moved into a runner.
pub struct CountingExecutor<E> {
    inner: E,
    calls: Arc<AtomicUsize>,
}

impl<E> CountingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A handle to the call counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl<E: InferenceExecutor> InferenceExecutor for CountingExecutor<E> {
    fn interface(&self) -> &ModelInterface {
        self.inner.interface()
    }

    fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(inputs)
    }
}

/// Records the names and row counts of the inputs it receives, then
/// delegates.
pub struct RecordingExecutor<E> {
    inner: E,
    seen: Arc<std::sync::Mutex<Vec<Vec<(String, usize)>>>>,
}

impl<E> RecordingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            seen: Arc::default(),
        }
    }

    /// Per call: `(input name, rows)` in arena order.
    pub fn seen(&self) -> Arc<std::sync::Mutex<Vec<Vec<(String, usize)>>>> {
        Arc::clone(&self.seen)
    }
}

impl<E: InferenceExecutor> InferenceExecutor for RecordingExecutor<E> {
    fn interface(&self) -> &ModelInterface {
        self.inner.interface()
    }

    fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
        let call = inputs
            .iter()
            .map(|t| (t.name().to_string(), t.rows()))
            .collect();
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(call);
        }
        self.inner.execute(inputs)
    }
}
