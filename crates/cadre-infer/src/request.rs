//! The per-agent decision request.

use std::fmt;

use cadre_core::{AgentId, ObservationShape};
use cadre_sensor::SensorHandle;

/// One agent asking for a decision this step.
///
/// Created by the simulation loop, consumed exactly once by a flush.
/// Sensors are read during that flush, not at submission.
#[derive(Clone)]
pub struct DecisionRequest {
    /// The agent's episode identity.
    pub agent: AgentId,
    /// Sensors in declaration order.
    pub sensors: Vec<SensorHandle>,
    /// Whether the episode ended with this step.
    pub done: bool,
    /// Discrete action mask, one flag per logit; `true` means disallowed.
    pub action_mask: Option<Vec<bool>>,
}

impl DecisionRequest {
    /// A request for `agent` reading `sensors`.
    pub fn new(agent: AgentId, sensors: Vec<SensorHandle>) -> Self {
        Self {
            agent,
            sensors,
            done: false,
            action_mask: None,
        }
    }

    /// Mark the episode as terminated.
    pub fn with_done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }

    /// Attach a discrete action mask (`true` = disallowed).
    pub fn with_action_mask(mut self, mask: Vec<bool>) -> Self {
        self.action_mask = Some(mask);
        self
    }

    /// Declared shapes of every sensor, in order.
    pub fn sensor_shapes(&self) -> Vec<ObservationShape> {
        self.sensors.iter().map(|s| s.observation_shape()).collect()
    }
}

impl fmt::Debug for DecisionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sensors.iter().map(|s| s.name()).collect();
        f.debug_struct("DecisionRequest")
            .field("agent", &self.agent)
            .field("sensors", &names)
            .field("done", &self.done)
            .field("action_mask", &self.action_mask)
            .finish()
    }
}
