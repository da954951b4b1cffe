//! Error types for the Cadre decision pipeline.
//!
//! Organized by subsystem: observation writing, tensor generation,
//! backend execution, and output application. Submission and flush
//! errors live in `cadre-engine` and wrap these.

use std::error::Error;
use std::fmt;

use crate::id::AgentId;
use crate::shape::ObservationShape;

/// Errors from an observation writer.
///
/// Every variant is a programming error in a sensor implementation:
/// values are never clamped or silently dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteError {
    /// The writer has no target selected.
    NoTarget,
    /// A linear index fell outside the destination.
    IndexOutOfBounds {
        /// Requested index, after the writer's offsets were applied.
        index: usize,
        /// Number of writable values at the destination.
        len: usize,
    },
    /// A 3-D write coordinate fell outside the declared shape.
    OutOfRange {
        /// Which axis was out of range: `"height"`, `"width"` or `"channel"`.
        axis: &'static str,
        /// The requested coordinate on that axis.
        value: usize,
        /// The size of that axis.
        bound: usize,
    },
    /// A 3-D write was issued against a rank-1 target.
    NotSpatial,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTarget => write!(f, "observation writer has no target"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for destination of length {len}")
            }
            Self::OutOfRange { axis, value, bound } => {
                if *bound == 0 {
                    write!(f, "{axis} value {value} out of range: axis is empty")
                } else {
                    write!(f, "{axis} value {value} must be in range [0, {}]", bound - 1)
                }
            }
            Self::NotSpatial => write!(f, "3-D write against a rank-1 target"),
        }
    }
}

impl Error for WriteError {}

/// A sensor shape that disagrees with the fixed reference layout.
///
/// `expected` is `None` when the agent exposes more sensors than the
/// reference; `actual` is `None` when it exposes fewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeMismatch {
    /// Position of the offending sensor in the agent's sensor list.
    pub sensor_index: usize,
    /// Shape fixed by the reference agent.
    pub expected: Option<ObservationShape>,
    /// Shape reported by this agent.
    pub actual: Option<ObservationShape>,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.expected, &self.actual) {
            (Some(e), Some(a)) => write!(
                f,
                "sensor {} has shape {a}, expected {e}",
                self.sensor_index
            ),
            (Some(e), None) => write!(
                f,
                "sensor {} with shape {e} is missing",
                self.sensor_index
            ),
            (None, Some(a)) => write!(
                f,
                "unexpected sensor {} with shape {a}",
                self.sensor_index
            ),
            (None, None) => write!(f, "sensor {} shape mismatch", self.sensor_index),
        }
    }
}

impl Error for ShapeMismatch {}

/// Errors from building input tensors for a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateError {
    /// An agent's sensors disagree with the fixed observation layout.
    ShapeMismatch {
        /// The offending agent.
        agent: AgentId,
        /// What disagreed.
        mismatch: ShapeMismatch,
    },
    /// The model declares an input no generator can produce.
    UnknownInputTensor {
        /// The unrecognised input name.
        name: String,
    },
    /// A sensor failed while writing its observation.
    SensorWrite {
        /// The agent whose sensor failed.
        agent: AgentId,
        /// Position of the sensor in the agent's list.
        sensor_index: usize,
        /// The underlying writer error.
        source: WriteError,
    },
    /// Generation was requested for an empty batch.
    EmptyBatch,
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { agent, mismatch } => {
                write!(f, "agent {agent}: {mismatch}")
            }
            Self::UnknownInputTensor { name } => {
                write!(f, "unknown tensor expected as input: '{name}'")
            }
            Self::SensorWrite {
                agent,
                sensor_index,
                source,
            } => write!(f, "agent {agent}: sensor {sensor_index} write failed: {source}"),
            Self::EmptyBatch => write!(f, "cannot generate tensors for an empty batch"),
        }
    }
}

impl Error for GenerateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ShapeMismatch { mismatch, .. } => Some(mismatch),
            Self::SensorWrite { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors from the inference backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionError {
    /// The backend rejected or failed the forward pass.
    Backend {
        /// Backend-provided description.
        reason: String,
    },
    /// The backend needed an input that was not supplied.
    MissingInput {
        /// Name of the missing input tensor.
        name: String,
    },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { reason } => write!(f, "backend failed: {reason}"),
            Self::MissingInput { name } => write!(f, "missing input tensor '{name}'"),
        }
    }
}

impl Error for ExecutionError {}

/// Errors from decoding output tensors into per-agent state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyError {
    /// The backend produced an output with no registered decoder.
    ///
    /// Signals that the model and the applier set have drifted apart.
    UnknownOutputTensor {
        /// The unrecognised output name.
        name: String,
    },
    /// A declared output was not produced by the backend.
    MissingOutput {
        /// Name of the absent output tensor.
        name: String,
    },
    /// Output row count differs from the number of agents in the batch.
    BatchSizeMismatch {
        /// Output tensor name.
        name: String,
        /// Agents in the batch.
        expected: usize,
        /// Rows in the tensor.
        actual: usize,
    },
    /// Output column count differs from what the decoder expects.
    ShapeMismatch {
        /// Output tensor name.
        name: String,
        /// Columns the decoder requires.
        expected: usize,
        /// Columns in the tensor.
        actual: usize,
    },
    /// A discrete branch's logits do not form a usable distribution.
    InvalidDistribution {
        /// The agent whose row was being sampled.
        agent: AgentId,
        /// The branch index.
        branch: usize,
    },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOutputTensor { name } => {
                write!(f, "unknown tensor expected as output: '{name}'")
            }
            Self::MissingOutput { name } => write!(f, "output tensor '{name}' was not produced"),
            Self::BatchSizeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "output '{name}' has {actual} rows, batch has {expected} agents"
            ),
            Self::ShapeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "output '{name}' has {actual} columns, expected {expected}"
            ),
            Self::InvalidDistribution { agent, branch } => write!(
                f,
                "agent {agent}: branch {branch} logits do not form a distribution"
            ),
        }
    }
}

impl Error for ApplyError {}
