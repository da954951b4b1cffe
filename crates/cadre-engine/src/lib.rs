//! Model runner orchestrating batched decisions for the Cadre pipeline.
//!
//! Provides [`ModelRunner`], which accumulates decision requests,
//! flushes them through generation, inference, and application in one
//! pass, and answers per-agent action queries. [`RunnerThread`] moves a
//! runner onto a dedicated thread for callers on several threads.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod runner;
pub mod threaded;

pub use config::{ConfigError, RunnerConfig};
pub use metrics::{FlushMetrics, RunnerMetrics};
pub use runner::{FlushError, ModelRunner, SubmitError};
pub use threaded::{RunnerHandle, RunnerThread, ThreadError};
