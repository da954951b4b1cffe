//! Per-flush performance metrics and cumulative runner counters.

use cadre_core::FlushId;

/// Timing and memory metrics collected during a single flush.
///
/// All durations are in microseconds. Populated after each successful
/// `decide_batch()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushMetrics {
    /// Sequence number of the flush.
    pub flush_id: FlushId,
    /// Agents in the batch.
    pub batch_size: usize,
    /// Time spent building input tensors, in microseconds.
    pub generate_us: u64,
    /// Time spent in the executor, in microseconds.
    pub execute_us: u64,
    /// Time spent decoding outputs, in microseconds.
    pub apply_us: u64,
    /// Wall-clock time for the whole flush, in microseconds.
    pub total_us: u64,
    /// Memory held by the tensor arena after the flush, in bytes.
    pub arena_bytes: usize,
    /// Cumulative arena slot creations or growths.
    pub arena_grow_events: u64,
}

/// Counters accumulated over the runner's lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunnerMetrics {
    /// Successful non-empty flushes.
    pub flushes: u64,
    /// Flushes that failed and discarded their batch.
    pub aborted_flushes: u64,
    /// Submissions rejected by `submit()`.
    pub rejected_submissions: u64,
    /// Calls made to the executor.
    pub executor_calls: u64,
    /// Agents whose outputs were applied.
    pub agents_decided: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = FlushMetrics::default();
        assert_eq!(m.flush_id, FlushId(0));
        assert_eq!(m.batch_size, 0);
        assert_eq!(m.total_us, 0);
        assert_eq!(m.arena_bytes, 0);

        let r = RunnerMetrics::default();
        assert_eq!(r.flushes, 0);
        assert_eq!(r.aborted_flushes, 0);
        assert_eq!(r.rejected_submissions, 0);
        assert_eq!(r.executor_calls, 0);
    }
}
