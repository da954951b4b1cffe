//! A [`ModelRunner`] on its own thread.
//!
//! ```text
//! Caller thread(s)                    Runner thread
//!     |                                   |
//!     |--submit()------------------------>| runner.submit()
//!     |   [tx: bounded(64)]               |
//!     |<--Result via reply (bounded(1))---|
//!     |                                   |
//!     |--decide_batch()------------------>| runner.decide_batch()
//!     |<--Result via reply----------------|
//!     |                                   |
//!     |--get_action()-------------------->| runner.get_action().cloned()
//!     |<--Option<ActionBuffer>------------|
//! ```
//!
//! Messages are handled one at a time, so a flush is a critical section:
//! no submission or query interleaves with it.

use std::error::Error;
use std::fmt;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use cadre_core::{ActionBuffer, AgentId};
use cadre_infer::DecisionRequest;

use crate::config::ConfigError;
use crate::metrics::{FlushMetrics, RunnerMetrics};
use crate::runner::{FlushError, ModelRunner, SubmitError};

const CHANNEL_CAPACITY: usize = 64;

// ── Error types ──────────────────────────────────────────────────

/// Error talking to a runner thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ThreadError {
    /// The runner thread has shut down.
    Shutdown,
    /// The runner rejected the submission.
    Submit(SubmitError),
    /// The flush failed.
    Flush(FlushError),
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown => write!(f, "runner thread has shut down"),
            Self::Submit(e) => write!(f, "submit: {e}"),
            Self::Flush(e) => write!(f, "flush: {e}"),
        }
    }
}

impl Error for ThreadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Shutdown => None,
            Self::Submit(e) => Some(e),
            Self::Flush(e) => Some(e),
        }
    }
}

// ── Messages ─────────────────────────────────────────────────────

enum Message {
    Submit {
        request: DecisionRequest,
        reply: Sender<Result<(), SubmitError>>,
    },
    Decide {
        reply: Sender<Result<Option<FlushMetrics>, FlushError>>,
    },
    GetAction {
        agent: AgentId,
        reply: Sender<Option<ActionBuffer>>,
    },
    Metrics {
        reply: Sender<RunnerMetrics>,
    },
    Stop,
}

fn run(mut runner: ModelRunner, rx: Receiver<Message>) -> ModelRunner {
    for msg in rx.iter() {
        // A dropped reply receiver means the caller gave up; ignore it.
        match msg {
            Message::Submit { request, reply } => {
                let _ = reply.send(runner.submit(request));
            }
            Message::Decide { reply } => {
                let _ = reply.send(runner.decide_batch());
            }
            Message::GetAction { agent, reply } => {
                let _ = reply.send(runner.get_action(agent).cloned());
            }
            Message::Metrics { reply } => {
                let _ = reply.send(runner.metrics().clone());
            }
            Message::Stop => break,
        }
    }
    runner
}

// ── RunnerHandle ─────────────────────────────────────────────────

/// A cloneable sender to a [`RunnerThread`].
///
/// Every call blocks until the runner thread has answered.
#[derive(Clone)]
pub struct RunnerHandle {
    tx: Sender<Message>,
}

impl RunnerHandle {
    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Message) -> Result<T, ThreadError> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.tx
            .send(make(reply_tx))
            .map_err(|_| ThreadError::Shutdown)?;
        reply_rx.recv().map_err(|_| ThreadError::Shutdown)
    }

    /// Queue a request for the next flush.
    pub fn submit(&self, request: DecisionRequest) -> Result<(), ThreadError> {
        self.request(|reply| Message::Submit { request, reply })?
            .map_err(ThreadError::Submit)
    }

    /// Flush the pending batch.
    pub fn decide_batch(&self) -> Result<Option<FlushMetrics>, ThreadError> {
        self.request(|reply| Message::Decide { reply })?
            .map_err(ThreadError::Flush)
    }

    /// The most recent action for `agent`.
    pub fn get_action(&self, agent: AgentId) -> Result<Option<ActionBuffer>, ThreadError> {
        self.request(|reply| Message::GetAction { agent, reply })
    }

    /// A snapshot of the cumulative counters.
    pub fn metrics(&self) -> Result<RunnerMetrics, ThreadError> {
        self.request(|reply| Message::Metrics { reply })
    }
}

// ── RunnerThread ─────────────────────────────────────────────────

/// Owns a runner thread and hands out [`RunnerHandle`]s to it.
///
/// Dropping the `RunnerThread` stops the thread; outstanding handles
/// then fail with [`ThreadError::Shutdown`].
pub struct RunnerThread {
    handle: RunnerHandle,
    thread: Option<JoinHandle<ModelRunner>>,
}

impl RunnerThread {
    /// Move `runner` onto a new thread.
    pub fn spawn(runner: ModelRunner) -> Result<Self, ConfigError> {
        let (tx, rx) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let thread = thread::Builder::new()
            .name("cadre-runner".into())
            .spawn(move || run(runner, rx))
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;
        Ok(Self {
            handle: RunnerHandle { tx },
            thread: Some(thread),
        })
    }

    /// A new handle to the runner thread.
    pub fn handle(&self) -> RunnerHandle {
        self.handle.clone()
    }

    /// Queue a request for the next flush.
    pub fn submit(&self, request: DecisionRequest) -> Result<(), ThreadError> {
        self.handle.submit(request)
    }

    /// Flush the pending batch.
    pub fn decide_batch(&self) -> Result<Option<FlushMetrics>, ThreadError> {
        self.handle.decide_batch()
    }

    /// The most recent action for `agent`.
    pub fn get_action(&self, agent: AgentId) -> Result<Option<ActionBuffer>, ThreadError> {
        self.handle.get_action(agent)
    }

    /// Stop the thread and recover the runner.
    ///
    /// Messages queued before the call are handled first. Returns
    /// [`ThreadError::Shutdown`] if the thread had already died.
    pub fn shutdown(mut self) -> Result<ModelRunner, ThreadError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<ModelRunner, ThreadError> {
        let Some(thread) = self.thread.take() else {
            return Err(ThreadError::Shutdown);
        };
        // A send failure means the thread already exited; join reports why.
        let _ = self.handle.tx.send(Message::Stop);
        thread.join().map_err(|_| ThreadError::Shutdown)
    }
}

impl Drop for RunnerThread {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use cadre_core::{ActionSpec, ExecutionError};
    use cadre_infer::{InferenceExecutor, ModelInterface};
    use cadre_sensor::VectorSensor;
    use cadre_tensor::{names, Tensor, TensorArena, TensorShape};
    use std::sync::Arc;

    /// Returns `[rows, 1]` of ones.
    struct Ones {
        interface: ModelInterface,
    }

    impl InferenceExecutor for Ones {
        fn interface(&self) -> &ModelInterface {
            &self.interface
        }

        fn execute(&mut self, inputs: &TensorArena) -> Result<Vec<Tensor>, ExecutionError> {
            let rows = cadre_infer::executor::require_input(inputs, names::VECTOR_OBSERVATION)?.rows();
            Ok(vec![Tensor::from_data(
                names::ACTION_OUTPUT,
                TensorShape::matrix(rows, 1),
                vec![1.0; rows],
            )
            .map_err(|e| ExecutionError::Backend {
                reason: e.to_string(),
            })?])
        }
    }

    fn spawn() -> RunnerThread {
        let exec = Ones {
            interface: ModelInterface::new("ones", [names::VECTOR_OBSERVATION], [names::ACTION_OUTPUT]),
        };
        let runner = ModelRunner::new(RunnerConfig::new(ActionSpec::continuous(1)), exec).unwrap();
        RunnerThread::spawn(runner).unwrap()
    }

    fn request(id: u64) -> DecisionRequest {
        DecisionRequest::new(AgentId(id), vec![Arc::new(VectorSensor::new("v", 2))])
    }

    #[test]
    fn submit_decide_query_through_thread() {
        let t = spawn();
        t.submit(request(1)).unwrap();
        let m = t.decide_batch().unwrap().unwrap();
        assert_eq!(m.batch_size, 1);
        assert_eq!(t.get_action(AgentId(1)).unwrap().unwrap().continuous, vec![1.0]);
        assert_eq!(t.get_action(AgentId(2)).unwrap(), None);
    }

    #[test]
    fn runner_errors_are_forwarded() {
        let t = spawn();
        t.submit(request(1)).unwrap();
        assert_eq!(
            t.submit(request(1)),
            Err(ThreadError::Submit(SubmitError::DuplicateAgent { agent: AgentId(1) }))
        );
    }

    #[test]
    fn handles_fail_after_shutdown() {
        let t = spawn();
        let h = t.handle();
        h.submit(request(3)).unwrap();
        let runner = t.shutdown().unwrap();
        assert_eq!(runner.pending_len(), 1);
        assert_eq!(h.decide_batch(), Err(ThreadError::Shutdown));
    }

    #[test]
    fn concurrent_submitters_one_flush() {
        let t = spawn();
        let workers: Vec<_> = (0..4)
            .map(|w| {
                let h = t.handle();
                std::thread::spawn(move || {
                    for i in 0..8 {
                        h.submit(request(w * 100 + i)).unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        let m = t.decide_batch().unwrap().unwrap();
        assert_eq!(m.batch_size, 32);
        assert_eq!(t.handle().metrics().unwrap().executor_calls, 1);
    }
}
