//! Core types and error definitions for the Cadre decision pipeline.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: agent
//! identities, observation shapes, the action specification, decoded
//! action buffers, and the per-subsystem error enums.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod error;
pub mod id;
pub mod shape;

pub use action::{ActionBuffer, ActionSpec};
pub use error::{ApplyError, ExecutionError, GenerateError, ShapeMismatch, WriteError};
pub use id::{AgentId, FlushId};
pub use shape::ObservationShape;
