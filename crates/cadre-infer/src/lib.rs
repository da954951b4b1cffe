//! Batch tensor generation, the inference backend boundary, and output
//! decoding for the Cadre decision pipeline.
//!
//! One flush moves through three stages, each in its own module:
//!
//! 1. [`generator`] turns an ordered batch of [`DecisionRequest`]s into
//!    named input tensors held in a [`TensorArena`](cadre_tensor::TensorArena).
//! 2. [`executor`] is the opaque backend: named inputs in, named outputs
//!    out, one synchronous call.
//! 3. [`applier`] decodes each output tensor into the per-agent
//!    [`AgentStores`].
//!
//! Row `i` of every tensor belongs to entry `i` of the batch throughout.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod applier;
pub mod executor;
pub mod generator;
pub mod request;
pub mod sampler;
pub mod store;

pub use applier::{ApplierRegistry, TensorApplier};
pub use executor::{InferenceExecutor, ModelInterface};
pub use generator::{InputGenerator, ObservationLayout, TensorGenerator};
pub use request::DecisionRequest;
pub use sampler::{Multinomial, RandomNormal};
pub use store::{ActionStore, AgentStores, MemoryStore};
