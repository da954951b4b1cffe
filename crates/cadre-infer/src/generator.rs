//! Building named input tensors from a batch of decision requests.
//!
//! Each model input name maps to one [`InputGenerator`]. The mapping is
//! fixed when the [`TensorGenerator`] is built; a name with no generator
//! fails construction.
//!
//! The observation layout is fixed from the sensors of the first agent
//! ever generated for:
//!
//! - rank-1 sensors are concatenated, in declaration order, into
//!   `vector_observation`;
//! - each rank-3 sensor gets its own `visual_observation_{i}`, numbered
//!   in declaration order among the visual sensors.
//!
//! Every later agent must expose identical shapes.

use indexmap::IndexMap;

use cadre_core::{ActionSpec, GenerateError, ObservationShape, ShapeMismatch};
use cadre_sensor::{compare_shapes, ObservationWriter};
use cadre_tensor::{names, TensorArena, TensorShape};

use crate::executor::ModelInterface;
use crate::request::DecisionRequest;
use crate::sampler::RandomNormal;
use crate::store::AgentStores;

/// How one model input is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputGenerator {
    /// `[1]` holding the number of agents.
    BatchSize,
    /// `[1]` holding the sequence length, always 1.
    SequenceLength,
    /// `[batch, total_vector_len]`, every rank-1 sensor concatenated.
    VectorObservation,
    /// `[batch, h, w, c]` for the `index`-th rank-3 sensor.
    VisualObservation {
        /// Position among the visual sensors.
        index: usize,
    },
    /// `[batch, memory_len]` from the memory store, zeros when absent.
    RecurrentIn,
    /// `[batch, memory_size]`, one slot of a multi-slot memory entry.
    MemorySlot {
        /// Slot index.
        slot: usize,
    },
    /// `[batch, action_size]` holding each agent's last decoded action.
    PreviousAction,
    /// `[batch, logit_count]`, 1 = allowed, 0 = masked.
    ActionMask,
    /// `[batch, action_size]` seeded standard-normal noise.
    RandomNormal,
}

impl InputGenerator {
    /// The generator serving input `name`, if any.
    pub fn for_name(name: &str) -> Option<Self> {
        let kind = match name {
            names::BATCH_SIZE => Self::BatchSize,
            names::SEQUENCE_LENGTH => Self::SequenceLength,
            names::VECTOR_OBSERVATION => Self::VectorObservation,
            names::RECURRENT_IN => Self::RecurrentIn,
            names::PREVIOUS_ACTION => Self::PreviousAction,
            names::ACTION_MASK => Self::ActionMask,
            names::RANDOM_NORMAL_EPSILON => Self::RandomNormal,
            other => {
                if let Some(index) = names::visual_observation_index(other) {
                    Self::VisualObservation { index }
                } else if let Some(slot) = names::memory_slot_input_index(other) {
                    Self::MemorySlot { slot }
                } else {
                    return None;
                }
            }
        };
        Some(kind)
    }
}

/// Where each sensor of an agent lands in the input tensors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservationLayout {
    shapes: Vec<ObservationShape>,
    /// `(sensor_index, column_offset)` for every rank-1 sensor.
    vector: Vec<(usize, usize)>,
    vector_len: usize,
    /// Sensor index of each visual observation, by visual index.
    visual: Vec<usize>,
}

impl ObservationLayout {
    /// Derive the layout from one agent's sensor shapes.
    pub fn from_shapes(shapes: Vec<ObservationShape>) -> Self {
        let mut vector = Vec::new();
        let mut visual = Vec::new();
        let mut vector_len = 0;
        for (i, shape) in shapes.iter().enumerate() {
            if shape.is_visual() {
                visual.push(i);
            } else {
                vector.push((i, vector_len));
                vector_len += shape.element_count();
            }
        }
        Self {
            shapes,
            vector,
            vector_len,
            visual,
        }
    }

    /// The reference shapes, in sensor order.
    pub fn shapes(&self) -> &[ObservationShape] {
        &self.shapes
    }

    /// Width of the concatenated vector observation.
    pub fn vector_len(&self) -> usize {
        self.vector_len
    }

    /// Number of rank-1 sensors.
    pub fn vector_count(&self) -> usize {
        self.vector.len()
    }

    /// Number of rank-3 sensors.
    pub fn visual_count(&self) -> usize {
        self.visual.len()
    }

    /// Shape of the `index`-th visual observation.
    pub fn visual_shape(&self, index: usize) -> Option<&ObservationShape> {
        self.visual.get(index).map(|&s| &self.shapes[s])
    }

    /// Check another agent's shapes against this layout.
    pub fn check(&self, shapes: &[ObservationShape]) -> Result<(), ShapeMismatch> {
        compare_shapes(&self.shapes, shapes)
    }
}

/// Produces every model input for a batch.
pub struct TensorGenerator {
    generators: IndexMap<String, InputGenerator>,
    layout: Option<ObservationLayout>,
    action_spec: ActionSpec,
    memory_size: usize,
    memory_len: usize,
    noise: RandomNormal,
}

impl TensorGenerator {
    /// Select a generator for every input `interface` declares.
    ///
    /// Fails with [`GenerateError::UnknownInputTensor`] on the first
    /// input name no generator serves.
    pub fn new(
        interface: &ModelInterface,
        action_spec: &ActionSpec,
        seed: u64,
    ) -> Result<Self, GenerateError> {
        let mut generators = IndexMap::with_capacity(interface.inputs.len());
        for name in &interface.inputs {
            let kind = InputGenerator::for_name(name).ok_or_else(|| {
                GenerateError::UnknownInputTensor { name: name.clone() }
            })?;
            generators.insert(name.clone(), kind);
        }
        Ok(Self {
            generators,
            layout: None,
            action_spec: action_spec.clone(),
            memory_size: interface.memory_size,
            memory_len: interface.memory_len(),
            noise: RandomNormal::new(seed.wrapping_add(1), 0.0, 1.0),
        })
    }

    /// The layout, once fixed.
    pub fn layout(&self) -> Option<&ObservationLayout> {
        self.layout.as_ref()
    }

    /// Input names and their generators, in model order.
    pub fn generators(&self) -> impl Iterator<Item = (&str, InputGenerator)> {
        self.generators.iter().map(|(n, g)| (n.as_str(), *g))
    }

    /// Fix the layout from `shapes` unless one is already fixed.
    ///
    /// Returns the layout in effect.
    pub fn fix_layout(&mut self, shapes: Vec<ObservationShape>) -> &ObservationLayout {
        self.layout.get_or_insert_with(|| {
            let layout = ObservationLayout::from_shapes(shapes);
            tracing::info!(
                sensors = layout.shapes().len(),
                vector_len = layout.vector_len(),
                visual = layout.visual_count(),
                "observation layout fixed"
            );
            layout
        })
    }

    /// Write every input tensor for `batch` into `arena`.
    ///
    /// Releases the arena first. Row `i` of every tensor is `batch[i]`.
    /// All agents are checked against the layout before any sensor
    /// is read.
    pub fn generate(
        &mut self,
        batch: &[DecisionRequest],
        stores: &AgentStores,
        arena: &mut TensorArena,
    ) -> Result<(), GenerateError> {
        let Some(first) = batch.first() else {
            return Err(GenerateError::EmptyBatch);
        };
        self.fix_layout(first.sensor_shapes());

        let Self {
            generators,
            layout,
            action_spec,
            memory_size,
            memory_len,
            noise,
        } = self;
        let Some(layout) = layout.as_ref() else {
            return Err(GenerateError::EmptyBatch);
        };

        for req in batch {
            layout
                .check(&req.sensor_shapes())
                .map_err(|mismatch| GenerateError::ShapeMismatch {
                    agent: req.agent,
                    mismatch,
                })?;
        }

        arena.reset();
        let n = batch.len();
        for (name, kind) in generators.iter() {
            match *kind {
                InputGenerator::BatchSize => {
                    arena.acquire(name, TensorShape::scalar_list(1)).data_mut()[0] = n as f32;
                }
                InputGenerator::SequenceLength => {
                    arena.acquire(name, TensorShape::scalar_list(1)).data_mut()[0] = 1.0;
                }
                InputGenerator::VectorObservation => {
                    let tensor = arena.acquire(name, TensorShape::matrix(n, layout.vector_len));
                    for (row, req) in batch.iter().enumerate() {
                        for &(sensor_index, offset) in &layout.vector {
                            let width = layout.shapes[sensor_index].element_count();
                            let mut writer = ObservationWriter::new();
                            writer.set_tensor_slot(tensor, row, offset, width);
                            req.sensors[sensor_index].write(&mut writer).map_err(|source| {
                                GenerateError::SensorWrite {
                                    agent: req.agent,
                                    sensor_index,
                                    source,
                                }
                            })?;
                        }
                    }
                }
                InputGenerator::VisualObservation { index } => {
                    let (Some(&sensor_index), Some(shape)) =
                        (layout.visual.get(index), layout.visual_shape(index))
                    else {
                        return Err(GenerateError::UnknownInputTensor { name: name.clone() });
                    };
                    let tensor = arena.acquire(
                        name,
                        TensorShape::image(n, shape.height(), shape.width(), shape.channels()),
                    );
                    for (row, req) in batch.iter().enumerate() {
                        let mut writer = ObservationWriter::new();
                        writer.set_tensor(tensor, row, 0);
                        req.sensors[sensor_index].write(&mut writer).map_err(|source| {
                            GenerateError::SensorWrite {
                                agent: req.agent,
                                sensor_index,
                                source,
                            }
                        })?;
                    }
                }
                InputGenerator::RecurrentIn => {
                    let width = *memory_len;
                    let tensor = arena.acquire(name, TensorShape::matrix(n, width));
                    for (row, req) in batch.iter().enumerate() {
                        if let Some(memory) = stores.memories.get(req.agent) {
                            let len = memory.len().min(width);
                            tensor.row_mut(row)[..len].copy_from_slice(&memory[..len]);
                        }
                    }
                }
                InputGenerator::MemorySlot { slot } => {
                    let width = *memory_size;
                    let tensor = arena.acquire(name, TensorShape::matrix(n, width));
                    let start = slot * width;
                    for (row, req) in batch.iter().enumerate() {
                        if let Some(memory) = stores.memories.get(req.agent) {
                            if let Some(src) = memory.get(start..) {
                                let len = src.len().min(width);
                                tensor.row_mut(row)[..len].copy_from_slice(&src[..len]);
                            }
                        }
                    }
                }
                InputGenerator::PreviousAction => {
                    let width = action_spec.action_size();
                    let tensor = arena.acquire(name, TensorShape::matrix(n, width));
                    for (row, req) in batch.iter().enumerate() {
                        let Some(action) = stores.actions.get(req.agent) else {
                            continue;
                        };
                        let out = tensor.row_mut(row);
                        if action_spec.is_continuous() {
                            for (dst, &v) in out.iter_mut().zip(&action.continuous) {
                                *dst = v;
                            }
                        } else {
                            for (dst, &v) in out.iter_mut().zip(&action.discrete) {
                                *dst = v as f32;
                            }
                        }
                    }
                }
                InputGenerator::ActionMask => {
                    let width = action_spec.logit_count();
                    let tensor = arena.acquire(name, TensorShape::matrix(n, width));
                    tensor.data_mut().fill(1.0);
                    for (row, req) in batch.iter().enumerate() {
                        let Some(mask) = &req.action_mask else {
                            continue;
                        };
                        for (dst, &masked) in tensor.row_mut(row).iter_mut().zip(mask) {
                            if masked {
                                *dst = 0.0;
                            }
                        }
                    }
                }
                InputGenerator::RandomNormal => {
                    let width = action_spec.action_size();
                    noise.fill(arena.acquire(name, TensorShape::matrix(n, width)).data_mut());
                }
            }
        }
        Ok(())
    }
}
