//! Well-known tensor names shared by models and the pipeline.
//!
//! Input names select a generator; output names select an applier.
//! Visual observations are numbered in the order their sensors appear
//! on the reference agent: `visual_observation_0`, `visual_observation_1`, ...

/// Scalar input holding the number of agents in the batch.
pub const BATCH_SIZE: &str = "batch_size";
/// Scalar input holding the recurrent sequence length (always 1 at inference).
pub const SEQUENCE_LENGTH: &str = "sequence_length";
/// Concatenated rank-1 observations, `[batch, total_vector_len]`.
pub const VECTOR_OBSERVATION: &str = "vector_observation";
/// Prefix of per-sensor spatial observations, `[batch, h, w, c]`.
pub const VISUAL_OBSERVATION_PREFIX: &str = "visual_observation_";
/// Recurrent state fed to the model, `[batch, memory_size]`.
pub const RECURRENT_IN: &str = "recurrent_in";
/// Recurrent state produced by the model, `[batch, memory_size]`.
pub const RECURRENT_OUT: &str = "recurrent_out";
/// Previous discrete action indices, `[batch, branches]`.
pub const PREVIOUS_ACTION: &str = "prev_action";
/// Discrete action mask, 1 = allowed, `[batch, sum(branches)]`.
pub const ACTION_MASK: &str = "action_masks";
/// Standard-normal noise for stochastic continuous policies, `[batch, action_size]`.
pub const RANDOM_NORMAL_EPSILON: &str = "epsilon";
/// Action output, `[batch, logit_count]`.
pub const ACTION_OUTPUT: &str = "action";

/// Name of the `index`-th visual observation input.
pub fn visual_observation(index: usize) -> String {
    format!("{VISUAL_OBSERVATION_PREFIX}{index}")
}

/// Parse the index out of a visual observation input name.
pub fn visual_observation_index(name: &str) -> Option<usize> {
    name.strip_prefix(VISUAL_OBSERVATION_PREFIX)?.parse().ok()
}

/// Input name of recurrent memory slot `slot` in a multi-slot model.
pub fn memory_slot_input(slot: usize) -> String {
    format!("{RECURRENT_IN}_{slot}")
}

/// Output name of recurrent memory slot `slot` in a multi-slot model.
pub fn memory_slot_output(slot: usize) -> String {
    format!("{RECURRENT_OUT}_{slot}")
}

/// Parse the slot out of a multi-slot memory input name.
pub fn memory_slot_input_index(name: &str) -> Option<usize> {
    name.strip_prefix(RECURRENT_IN)?.strip_prefix('_')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visual_names_round_trip_index() {
        assert_eq!(visual_observation(2), "visual_observation_2");
        assert_eq!(visual_observation_index("visual_observation_2"), Some(2));
        assert_eq!(visual_observation_index("visual_observation_x"), None);
        assert_eq!(visual_observation_index(VECTOR_OBSERVATION), None);
    }

    #[test]
    fn memory_slot_names() {
        assert_eq!(memory_slot_input(1), "recurrent_in_1");
        assert_eq!(memory_slot_output(0), "recurrent_out_0");
        assert_eq!(memory_slot_input_index("recurrent_in_3"), Some(3));
        assert_eq!(memory_slot_input_index(RECURRENT_IN), None);
        assert_eq!(memory_slot_input_index("recurrent_out_3"), None);
    }
}
