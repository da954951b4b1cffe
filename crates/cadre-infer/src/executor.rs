//! The inference backend boundary.

use cadre_core::ExecutionError;
use cadre_tensor::{names, Tensor, TensorArena};

/// What a loaded model consumes and produces.
///
/// Input names select tensor generators; output names select appliers.
/// Both are fixed for the lifetime of the executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelInterface {
    /// Model name, used in diagnostics.
    pub name: String,
    /// Input tensor names, in the order the backend expects them.
    pub inputs: Vec<String>,
    /// Output tensor names the backend will produce.
    pub outputs: Vec<String>,
    /// Recurrent state width per slot; 0 for a feed-forward model.
    pub memory_size: usize,
    /// Number of recurrent slots declared as `recurrent_in_{i}` inputs.
    ///
    /// Zero when the model uses the single `recurrent_in` tensor or has
    /// no memory.
    pub memory_slots: usize,
}

impl ModelInterface {
    /// A feed-forward interface with the given names and no memory.
    pub fn new(
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = impl Into<String>>,
        outputs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            memory_size: 0,
            memory_slots: 0,
        }
    }

    /// Set the per-slot recurrent width.
    pub fn with_memory(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    /// Declare `slots` numbered memory inputs and outputs.
    ///
    /// Appends `recurrent_in_{i}` to the inputs and `recurrent_out_{i}`
    /// to the outputs for every slot not already listed.
    pub fn with_memory_slots(mut self, slots: usize) -> Self {
        self.memory_slots = slots;
        for i in 0..slots {
            let input = names::memory_slot_input(i);
            if !self.inputs.contains(&input) {
                self.inputs.push(input);
            }
            let output = names::memory_slot_output(i);
            if !self.outputs.contains(&output) {
                self.outputs.push(output);
            }
        }
        self
    }

    /// Whether the model carries recurrent state.
    pub fn is_recurrent(&self) -> bool {
        self.memory_size > 0
    }

    /// Values per agent in the memory store.
    pub fn memory_len(&self) -> usize {
        self.memory_size * self.memory_slots.max(1)
    }

    /// Whether the model declares input `name`.
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|n| n == name)
    }

    /// Whether the model declares output `name`.
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|n| n == name)
    }
}

/// A neural-network backend.
///
/// Called at most once per flush with every generated input. Must
/// return every declared output with one row per batch entry, or an
/// error; partial results are not accepted.
///
/// `Send` so a runner can move onto its own thread.
pub trait InferenceExecutor: Send {
    /// The model's declared inputs and outputs.
    fn interface(&self) -> &ModelInterface;

    /// Run one forward pass.
    fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError>;
}

impl<E: InferenceExecutor + ?Sized> InferenceExecutor for Box<E> {
    fn interface(&self) -> &ModelInterface {
        (**self).interface()
    }

    fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
        (**self).execute(inputs)
    }
}

/// Fetch a required input or report it missing.
///
/// Convenience for executor implementations.
pub fn require_input<'a>(inputs: &'a TensorArena, name: &str) -> Result<&'a Tensor, ExecutionError> {
    inputs.get(name).ok_or_else(|| ExecutionError::MissingInput {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadre_tensor::TensorShape;

    struct Doubler {
        interface: ModelInterface,
    }

    impl InferenceExecutor for Doubler {
        fn interface(&self) -> &ModelInterface {
            &self.interface
        }

        fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
            let obs = require_input(inputs, names::VECTOR_OBSERVATION)?;
            let data = obs.data().iter().map(|v| v * 2.0).collect();
            let out = Tensor::from_data(names::ACTION_OUTPUT, obs.shape().clone(), data)
                .map_err(|e| ExecutionError::Backend {
                    reason: e.to_string(),
                })?;
            Ok(vec![out])
        }
    }

    #[test]
    fn memory_slots_extend_names() {
        let i = ModelInterface::new("m", ["vector_observation"], ["action"])
            .with_memory(4)
            .with_memory_slots(2);
        assert!(i.has_input("recurrent_in_1"));
        assert!(i.has_output("recurrent_out_0"));
        assert_eq!(i.memory_len(), 8);
        assert!(i.is_recurrent());
    }

    #[test]
    fn boxed_executor_delegates() {
        let mut exec: Box<dyn InferenceExecutor> = Box::new(Doubler {
            interface: ModelInterface::new("double", [names::VECTOR_OBSERVATION], [names::ACTION_OUTPUT]),
        });
        let mut arena = TensorArena::new();
        arena
            .acquire(names::VECTOR_OBSERVATION, TensorShape::matrix(1, 2))
            .data_mut()
            .copy_from_slice(&[1.0, 2.0]);
        let out = exec.execute(&arena).unwrap();
        assert_eq!(out[0].data(), &[2.0, 4.0]);
        assert_eq!(exec.interface().name, "double");
    }

    #[test]
    fn missing_input_is_reported() {
        let arena = TensorArena::new();
        let err = require_input(&arena, "x").unwrap_err();
        assert_eq!(err, ExecutionError::MissingInput { name: "x".into() });
    }
}
