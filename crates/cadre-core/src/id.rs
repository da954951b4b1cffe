//! Strongly-typed identifiers.

use std::fmt;

/// Identifies one agent for the lifetime of one episode.
///
/// The simulation loop hands out episode tokens; the pipeline treats them
/// as opaque keys. An `AgentId` is the only link between a batch row and
/// the agent it was generated for, so it must stay stable until the
/// agent's terminating request has been flushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AgentId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Monotonically increasing flush counter.
///
/// Incremented each time a non-empty batch is flushed through the
/// inference backend, including flushes that abort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlushId(pub u64);

impl FlushId {
    /// The flush that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for FlushId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FlushId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
