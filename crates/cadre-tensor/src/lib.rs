//! Named tensors and a reusable tensor arena.
//!
//! A [`Tensor`] is a named, shaped, row-major `f32` buffer whose first
//! dimension is the batch. The [`TensorArena`] owns every input tensor
//! the pipeline builds and hands the same backing allocations out again
//! on the next flush, so steady-state decision steps do not allocate.
//!
//! # Layout families
//!
//! ```text
//! rank 2   [batch, features]                 vector, recurrent, masks
//! rank 4   [batch, height, width, channels]  visual observations
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod names;
pub mod tensor;

pub use arena::TensorArena;
pub use tensor::{Tensor, TensorError, TensorShape};
