//! Decoding output tensors into per-agent state.
//!
//! Every output name the backend may produce maps to one
//! [`TensorApplier`]. Application is two-phase: every output is checked
//! and decoded first, then all decoded values are committed to the
//! stores. A failure in either half of phase one leaves the stores
//! untouched.

use indexmap::IndexMap;
use smallvec::SmallVec;

use cadre_core::{ActionBuffer, ActionSpec, AgentId, ApplyError};
use cadre_tensor::{names, Tensor};

use crate::executor::ModelInterface;
use crate::sampler::Multinomial;
use crate::store::AgentStores;

/// Decoder for one output tensor.
#[derive(Clone, Debug)]
pub enum TensorApplier {
    /// Copies row `i` verbatim into agent `i`'s continuous action.
    ContinuousAction {
        /// Action values per agent.
        size: usize,
    },
    /// Samples one index per branch from row `i`'s logits.
    DiscreteAction {
        /// Branch sizes, in branch order.
        branches: SmallVec<[usize; 4]>,
        /// Seeded sampler shared by every branch and row.
        sampler: Multinomial,
    },
    /// Stores row `i` as (part of) agent `i`'s recurrent memory.
    Memory {
        /// Columns in the output tensor.
        memory_size: usize,
        /// Where this slot starts in the store entry.
        offset: usize,
        /// Length of the full store entry.
        total_len: usize,
    },
}

/// A decoded output awaiting commit.
enum Decoded {
    Actions(Vec<ActionBuffer>),
    Memory {
        offset: usize,
        total_len: usize,
        rows: Vec<Vec<f32>>,
    },
}

impl TensorApplier {
    /// Columns this decoder requires per row.
    pub fn expected_width(&self) -> usize {
        match self {
            Self::ContinuousAction { size } => *size,
            Self::DiscreteAction { branches, .. } => branches.iter().sum(),
            Self::Memory { memory_size, .. } => *memory_size,
        }
    }

    fn decode(&mut self, tensor: &Tensor, agents: &[AgentId]) -> Result<Decoded, ApplyError> {
        match self {
            Self::ContinuousAction { .. } => Ok(Decoded::Actions(
                (0..agents.len())
                    .map(|row| ActionBuffer::from_continuous(tensor.row(row).to_vec()))
                    .collect(),
            )),
            Self::DiscreteAction { branches, sampler } => {
                let mut actions = Vec::with_capacity(agents.len());
                for (row, &agent) in agents.iter().enumerate() {
                    let logits = tensor.row(row);
                    let mut indices = Vec::with_capacity(branches.len());
                    let mut start = 0;
                    for (branch, &size) in branches.iter().enumerate() {
                        let picked = sampler
                            .sample(&logits[start..start + size])
                            .ok_or(ApplyError::InvalidDistribution { agent, branch })?;
                        indices.push(picked as i32);
                        start += size;
                    }
                    actions.push(ActionBuffer::from_discrete(indices));
                }
                Ok(Decoded::Actions(actions))
            }
            Self::Memory {
                offset, total_len, ..
            } => Ok(Decoded::Memory {
                offset: *offset,
                total_len: *total_len,
                rows: (0..agents.len()).map(|row| tensor.row(row).to_vec()).collect(),
            }),
        }
    }
}

/// Output name to decoder mapping, built once per runner.
///
/// # Examples
///
/// ```
/// use cadre_core::{ActionSpec, AgentId};
/// use cadre_infer::{AgentStores, ApplierRegistry, ModelInterface};
/// use cadre_tensor::{Tensor, TensorShape};
///
/// let iface = ModelInterface::new("m", ["vector_observation"], ["action"]);
/// let mut registry = ApplierRegistry::new(&ActionSpec::continuous(2), &iface, 0);
/// let out = Tensor::from_data("action", TensorShape::matrix(1, 2), vec![0.5, -0.5]).unwrap();
/// let mut stores = AgentStores::new();
/// registry.apply(&[out], &[AgentId(7)], &mut stores).unwrap();
/// assert_eq!(stores.actions.get(AgentId(7)).unwrap().continuous, vec![0.5, -0.5]);
/// ```
pub struct ApplierRegistry {
    appliers: IndexMap<String, TensorApplier>,
    /// Outputs the model declares that have a decoder; each must be produced.
    required: Vec<String>,
}

impl ApplierRegistry {
    /// Build the decoder set for `action_spec` and `interface`.
    ///
    /// `action` always has a decoder. Recurrent models also get
    /// `recurrent_out`, or one `recurrent_out_{i}` per memory slot.
    pub fn new(action_spec: &ActionSpec, interface: &ModelInterface, seed: u64) -> Self {
        let mut appliers = IndexMap::new();
        let action = match action_spec {
            ActionSpec::Continuous { size } => TensorApplier::ContinuousAction { size: *size },
            ActionSpec::Discrete { branches } => TensorApplier::DiscreteAction {
                branches: branches.clone(),
                sampler: Multinomial::new(seed),
            },
        };
        appliers.insert(names::ACTION_OUTPUT.to_string(), action);

        if interface.is_recurrent() {
            let memory_size = interface.memory_size;
            let total_len = interface.memory_len();
            if interface.memory_slots == 0 {
                appliers.insert(
                    names::RECURRENT_OUT.to_string(),
                    TensorApplier::Memory {
                        memory_size,
                        offset: 0,
                        total_len,
                    },
                );
            } else {
                for slot in 0..interface.memory_slots {
                    appliers.insert(
                        names::memory_slot_output(slot),
                        TensorApplier::Memory {
                            memory_size,
                            offset: slot * memory_size,
                            total_len,
                        },
                    );
                }
            }
        }

        let required = appliers
            .keys()
            .filter(|n| interface.has_output(n))
            .cloned()
            .collect();
        Self { appliers, required }
    }

    /// The decoder for `name`.
    pub fn get(&self, name: &str) -> Option<&TensorApplier> {
        self.appliers.get(name)
    }

    /// Whether `name` has a decoder.
    pub fn contains(&self, name: &str) -> bool {
        self.appliers.contains_key(name)
    }

    /// Output names with a decoder, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.appliers.keys().map(String::as_str)
    }

    /// Number of registered decoders.
    pub fn len(&self) -> usize {
        self.appliers.len()
    }

    /// Whether no decoder is registered.
    pub fn is_empty(&self) -> bool {
        self.appliers.is_empty()
    }

    /// Decode `outputs` for the ordered `agents` and commit them.
    ///
    /// Row `i` of every output belongs to `agents[i]`. Fails without
    /// touching `stores` if any output is unknown, missing, or
    /// mis-shaped, or if any discrete row cannot be sampled.
    pub fn apply(
        &mut self,
        outputs: &[Tensor],
        agents: &[AgentId],
        stores: &mut AgentStores,
    ) -> Result<(), ApplyError> {
        for tensor in outputs {
            let name = tensor.name();
            let applier = self
                .appliers
                .get(name)
                .ok_or_else(|| ApplyError::UnknownOutputTensor {
                    name: name.to_string(),
                })?;
            if tensor.rows() != agents.len() {
                return Err(ApplyError::BatchSizeMismatch {
                    name: name.to_string(),
                    expected: agents.len(),
                    actual: tensor.rows(),
                });
            }
            if tensor.row_len() != applier.expected_width() {
                return Err(ApplyError::ShapeMismatch {
                    name: name.to_string(),
                    expected: applier.expected_width(),
                    actual: tensor.row_len(),
                });
            }
        }
        if let Some(missing) = self
            .required
            .iter()
            .find(|n| !outputs.iter().any(|t| t.name() == n.as_str()))
        {
            return Err(ApplyError::MissingOutput {
                name: missing.clone(),
            });
        }

        let mut decoded = Vec::with_capacity(outputs.len());
        for tensor in outputs {
            if let Some(applier) = self.appliers.get_mut(tensor.name()) {
                decoded.push(applier.decode(tensor, agents)?);
            }
        }

        for d in decoded {
            match d {
                Decoded::Actions(actions) => {
                    for (&agent, action) in agents.iter().zip(actions) {
                        stores.actions.insert(agent, action);
                    }
                }
                Decoded::Memory {
                    offset,
                    total_len,
                    rows,
                } => {
                    for (&agent, row) in agents.iter().zip(rows) {
                        if offset == 0 && row.len() == total_len {
                            stores.memories.insert(agent, row);
                        } else {
                            stores.memories.write_slice(agent, total_len, offset, &row);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
