//! Per-agent state carried between flushes.

use std::collections::HashMap;

use cadre_core::{ActionBuffer, AgentId};

/// Recurrent memory per agent.
///
/// An entry is a flat `slots × memory_size` sequence; single-slot models
/// store exactly `memory_size` values.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<AgentId, Vec<f32>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory for `agent`, if any was stored.
    pub fn get(&self, agent: AgentId) -> Option<&[f32]> {
        self.entries.get(&agent).map(Vec::as_slice)
    }

    /// Replace the memory for `agent`.
    pub fn insert(&mut self, agent: AgentId, memory: Vec<f32>) {
        self.entries.insert(agent, memory);
    }

    /// Replace `values.len()` values starting at `offset`, creating a
    /// zeroed entry of `total_len` values if none exists.
    ///
    /// The entry is grown to `total_len` if it is shorter.
    pub fn write_slice(&mut self, agent: AgentId, total_len: usize, offset: usize, values: &[f32]) {
        let entry = self.entries.entry(agent).or_default();
        let needed = total_len.max(offset + values.len());
        if entry.len() < needed {
            entry.resize(needed, 0.0);
        }
        entry[offset..offset + values.len()].copy_from_slice(values);
    }

    /// Drop the memory for `agent`. Returns whether an entry existed.
    pub fn remove(&mut self, agent: AgentId) -> bool {
        self.entries.remove(&agent).is_some()
    }

    /// Whether `agent` has stored memory.
    pub fn contains(&self, agent: AgentId) -> bool {
        self.entries.contains_key(&agent)
    }

    /// Number of agents with stored memory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no agent has stored memory.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Most recent decoded action per agent.
#[derive(Clone, Debug, Default)]
pub struct ActionStore {
    entries: HashMap<AgentId, ActionBuffer>,
}

impl ActionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last action decoded for `agent`.
    pub fn get(&self, agent: AgentId) -> Option<&ActionBuffer> {
        self.entries.get(&agent)
    }

    /// Overwrite the last action for `agent`.
    pub fn insert(&mut self, agent: AgentId, action: ActionBuffer) {
        self.entries.insert(agent, action);
    }

    /// Drop the last action for `agent`. Returns whether an entry existed.
    pub fn remove(&mut self, agent: AgentId) -> bool {
        self.entries.remove(&agent).is_some()
    }

    /// Whether `agent` has a stored action.
    pub fn contains(&self, agent: AgentId) -> bool {
        self.entries.contains_key(&agent)
    }

    /// Number of agents with a stored action.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no agent has a stored action.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both per-agent stores, owned together by the runner.
#[derive(Clone, Debug, Default)]
pub struct AgentStores {
    /// Recurrent memory.
    pub memories: MemoryStore,
    /// Last decoded actions.
    pub actions: ActionStore,
}

impl AgentStores {
    /// Empty stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything held for `agent`.
    pub fn forget(&mut self, agent: AgentId) {
        self.memories.remove(agent);
        self.actions.remove(agent);
    }
}
