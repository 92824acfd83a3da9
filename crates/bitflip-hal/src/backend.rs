//! Backend traits.
//!
//! The [`Backend`] trait defines the lifecycle for running a circuit:
//!
//! ```text
//!   capabilities() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)      (async)      (async)      (async)
//! ```
//!
//! [`StatevectorBackend`] extends it for backends that can hand back the
//! final amplitudes of a measurement-free circuit.

use std::time::Duration;

use async_trait::async_trait;
use num_complex::Complex64;

use bitflip_ir::Circuit;

use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::ExecutionResult;

/// Trait for quantum backends.
///
/// - `capabilities()` is synchronous and infallible; implementations cache
///   them at construction time.
/// - `submit()` returns a job id; the job starts `Queued`.
/// - `result()` is only valid once `status()` reports `Completed`. A backend
///   may release the job after handing out its result.
/// - `wait()` has a default implementation (poll every 500ms, 5-minute cap).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Submit a circuit for execution.
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Wait for a job to complete and return its result.
    async fn wait(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let poll_interval = Duration::from_millis(500);
        let max_polls = 600;

        for _ in 0..max_polls {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }

        Err(HalError::Timeout(job_id.0.clone()))
    }
}

/// A backend that can return the final statevector of a circuit.
///
/// Amplitude `k` belongs to the basis state whose bit `i` (least
/// significant first) is the value of qubit `i`.
#[async_trait]
pub trait StatevectorBackend: Backend {
    /// Evolve `circuit` from |0...0⟩ and return the final amplitudes.
    ///
    /// Circuits containing measurements or resets are rejected with
    /// [`HalError::Unsupported`].
    async fn statevector(&self, circuit: &Circuit) -> HalResult<Vec<Complex64>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::result::Counts;

    /// Reports `Running` a fixed number of times before completing.
    struct SlowBackend {
        caps: Capabilities,
        remaining: AtomicU32,
        outcome: JobStatus,
    }

    #[async_trait]
    impl Backend for SlowBackend {
        fn name(&self) -> &str {
            "slow"
        }

        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }

        async fn submit(&self, _circuit: &Circuit, _shots: u32) -> HalResult<JobId> {
            Ok(JobId::new("job"))
        }

        async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
            if self.remaining.load(Ordering::SeqCst) == 0 {
                return Ok(self.outcome.clone());
            }
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            Ok(JobStatus::Running)
        }

        async fn result(&self, _job_id: &JobId) -> HalResult<ExecutionResult> {
            let mut counts = Counts::new();
            counts.insert("000", 4);
            Ok(ExecutionResult::new(counts, 4))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_polls_until_complete() {
        let backend = SlowBackend {
            caps: Capabilities::simulator(3),
            remaining: AtomicU32::new(3),
            outcome: JobStatus::Completed,
        };
        let result = backend.wait(&JobId::new("job")).await.unwrap();
        assert_eq!(result.counts.get("000"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_surfaces_failure() {
        let backend = SlowBackend {
            caps: Capabilities::simulator(3),
            remaining: AtomicU32::new(1),
            outcome: JobStatus::Failed("boom".into()),
        };
        let err = backend.wait(&JobId::new("job")).await.unwrap_err();
        assert!(matches!(err, HalError::JobFailed(msg) if msg == "boom"));
    }
}
