//! Result pipeline
//!
//! Turns a proof found by a compute process into a pool submission. Each
//! solution is submitted once, on its own task, so a slot never waits for
//! the pool's verdict before drawing its next task.

use anyhow::Result;
use minefleet_core::domain::device::DeviceDescriptor;
use minefleet_core::domain::task::Task;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::repository::SolutionRepository;

/// A proof found for a task that was still current when the process exited
#[derive(Debug, Clone)]
pub struct SolutionAttempt {
    /// Bytes decoded from the proof line
    pub proof: Vec<u8>,
    pub task: Task,
    pub device: DeviceDescriptor,
}

/// Encodes proof bytes into the payload the pool expects
pub trait ProofEncoder: Send + Sync {
    fn encode(&self, attempt: &SolutionAttempt) -> Result<String>;
}

/// Placeholder encoder: the proof bytes after the 2-byte header, hex encoded
///
/// The pool verifies a BOC of an external message addressed to the task's
/// recipient, with this body stored in a snake cell. Building that BOC is
/// not implemented, so the pool rejects these payloads; a real encoder
/// replaces this one through [`ProofEncoder`].
pub struct MessageBodyEncoder;

impl ProofEncoder for MessageBodyEncoder {
    fn encode(&self, attempt: &SolutionAttempt) -> Result<String> {
        let body = attempt.proof.get(2..).ok_or_else(|| {
            anyhow::anyhow!("proof too short for a message body: {} bytes", attempt.proof.len())
        })?;
        Ok(hex::encode(body))
    }
}

/// What became of a submitted solution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionVerdict {
    Accepted,
    Rejected { status: String, data: String },
    TransportError(String),
}

pub struct ResultPipeline {
    encoder: Arc<dyn ProofEncoder>,
    sink: Arc<dyn SolutionRepository>,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl ResultPipeline {
    pub fn new(encoder: Arc<dyn ProofEncoder>, sink: Arc<dyn SolutionRepository>) -> Self {
        Self {
            encoder,
            sink,
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Submits in the background and returns immediately
    pub fn dispatch(self: &Arc<Self>, attempt: SolutionAttempt) -> JoinHandle<SubmissionVerdict> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.submit(attempt).await })
    }

    /// Encodes and submits one solution, logging the verdict
    pub async fn submit(&self, attempt: SolutionAttempt) -> SubmissionVerdict {
        let payload = match self.encoder.encode(&attempt) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Encoding proof for task {} failed: {:#}", attempt.task.id, e);
                return SubmissionVerdict::TransportError(e.to_string());
            }
        };

        match self.sink.submit(payload, &attempt.task).await {
            Ok(response) if response.is_accepted() => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                info!(
                    "Share found! {} #{} task {}",
                    attempt.device.model, attempt.device.device_id, attempt.task.id
                );
                SubmissionVerdict::Accepted
            }
            Ok(response) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Share rejected for task {} on device #{}: status={} data={}",
                    attempt.task.id,
                    attempt.device.device_id,
                    response.response.status,
                    response.response.data
                );
                SubmissionVerdict::Rejected {
                    status: response.response.status,
                    data: response.response.data,
                }
            }
            Err(e) => {
                error!("Submitting share for task {} failed: {:#}", attempt.task.id, e);
                SubmissionVerdict::TransportError(format!("{:#}", e))
            }
        }
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use minefleet_core::dto::ServerResponse;
    use minefleet_core::dto::solution::SubmitSolutionResponse;
    use parking_lot::Mutex;

    /// Records submissions and answers with a fixed verdict
    pub struct RecordingSink {
        pub calls: Mutex<Vec<(String, i64)>>,
        pub status: String,
        pub data: String,
        pub fail: bool,
    }

    impl RecordingSink {
        pub fn accepting() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                status: "ok".to_string(),
                data: "Found".to_string(),
                fail: false,
            })
        }

        pub fn calls(&self) -> Vec<(String, i64)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl SolutionRepository for RecordingSink {
        async fn submit(&self, payload: String, task: &Task) -> Result<SubmitSolutionResponse> {
            self.calls.lock().push((payload, task.id));
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(SubmitSolutionResponse {
                response: ServerResponse {
                    status: self.status.clone(),
                    data: self.data.clone(),
                },
                hash: String::new(),
                complexity: String::new(),
            })
        }
    }
}
