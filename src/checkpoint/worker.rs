//! Snapshot worker and its request channel
//!
//! All `store` and `restore` calls for a project run on one background task.
//! Callers reach it through [`WorkerChannel`], which tags every request with
//! a fresh [`RequestId`], waits for the matching reply and gives up after a
//! per-call timeout. A late reply is discarded by the worker.
//!
//! If the backend panics, the task dies and the reply sender of the request
//! in flight is dropped, so that call fails with `WorkerExited`. The next
//! call spawns a new task.

use super::backend::{BackendResult, SnapshotBackend};
use super::errors::{CheckpointError, CheckpointResult, OperationKind};
use super::models::{CommitId, StoreId};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Correlation id of one worker request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Work the snapshot worker can perform
#[derive(Debug, Clone)]
pub enum WorkerOp {
    Store {
        project_dir: PathBuf,
        store: StoreId,
        message: String,
        paths: Vec<PathBuf>,
    },
    Restore {
        project_dir: PathBuf,
        store: StoreId,
        commit: CommitId,
        paths: Vec<PathBuf>,
    },
}

impl WorkerOp {
    pub fn kind(&self) -> OperationKind {
        match self {
            WorkerOp::Store { .. } => OperationKind::Store,
            WorkerOp::Restore { .. } => OperationKind::Restore,
        }
    }
}

/// Successful worker result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerReply {
    Stored(CommitId),
    Restored,
}

struct WorkerEnvelope {
    id: RequestId,
    op: WorkerOp,
    reply: oneshot::Sender<WorkerResponse>,
}

struct WorkerResponse {
    id: RequestId,
    outcome: BackendResult<WorkerReply>,
}

struct WorkerHandle {
    sender: mpsc::UnboundedSender<WorkerEnvelope>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Request/response channel to the snapshot worker
pub struct WorkerChannel {
    backend: Arc<dyn SnapshotBackend>,
    timeout: Duration,
    next_id: AtomicU64,
    worker: Mutex<Option<WorkerHandle>>,
}

impl WorkerChannel {
    /// Create a channel; the worker task starts on the first call
    pub fn new(backend: Arc<dyn SnapshotBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            next_id: AtomicU64::new(0),
            worker: Mutex::new(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Snapshot `paths` and return the new commit id
    pub async fn store(
        &self,
        project_dir: PathBuf,
        store: StoreId,
        message: String,
        paths: Vec<PathBuf>,
    ) -> CheckpointResult<CommitId> {
        let op = WorkerOp::Store {
            project_dir,
            store,
            message,
            paths,
        };
        match self.call(op).await? {
            WorkerReply::Stored(commit) => Ok(commit),
            other => Err(CheckpointError::worker(format!(
                "unexpected reply to store: {:?}",
                other
            ))),
        }
    }

    /// Overwrite `paths` with their contents as of `commit`
    pub async fn restore(
        &self,
        project_dir: PathBuf,
        store: StoreId,
        commit: CommitId,
        paths: Vec<PathBuf>,
    ) -> CheckpointResult<()> {
        let op = WorkerOp::Restore {
            project_dir,
            store,
            commit,
            paths,
        };
        match self.call(op).await? {
            WorkerReply::Restored => Ok(()),
            other => Err(CheckpointError::worker(format!(
                "unexpected reply to restore: {:?}",
                other
            ))),
        }
    }

    /// Send one request to the worker and wait for its reply
    pub async fn call(&self, op: WorkerOp) -> CheckpointResult<WorkerReply> {
        let id = self.next_request_id();
        let operation = op.kind();
        let (reply, response) = oneshot::channel();

        self.submit(WorkerEnvelope { id, op, reply }, operation)?;
        debug!(request_id = %id, %operation, "snapshot request sent");

        match tokio::time::timeout(self.timeout, response).await {
            Err(_) => {
                warn!(
                    request_id = %id,
                    %operation,
                    timeout_secs = self.timeout.as_secs(),
                    "snapshot request timed out"
                );
                Err(CheckpointError::Timeout {
                    operation,
                    seconds: self.timeout.as_secs(),
                })
            }
            Ok(Err(_)) => {
                warn!(request_id = %id, %operation, "snapshot worker exited before replying");
                Err(CheckpointError::WorkerExited { operation })
            }
            Ok(Ok(response)) => {
                if response.id != id {
                    return Err(CheckpointError::worker(format!(
                        "reply {} does not match request {}",
                        response.id, id
                    )));
                }
                response
                    .outcome
                    .map_err(|source| CheckpointError::Backend { operation, source })
            }
        }
    }

    fn next_request_id(&self) -> RequestId {
        RequestId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn submit(&self, envelope: WorkerEnvelope, operation: OperationKind) -> CheckpointResult<()> {
        let mut worker = self
            .worker
            .lock()
            .map_err(|_| CheckpointError::worker("worker handle lock poisoned"))?;

        // A panicking worker drops its receiver before the task reports
        // finished, so a failed send also means the worker is gone.
        let envelope = match worker.as_ref().filter(|handle| handle.is_alive()) {
            Some(handle) => match handle.sender.send(envelope) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(envelope)) => {
                    debug!(request_id = %envelope.id, "snapshot worker gone, restarting");
                    envelope
                }
            },
            None => envelope,
        };

        let handle = self.spawn_worker();
        let sent = handle.sender.send(envelope);
        if let Some(stale) = worker.replace(handle) {
            stale.task.abort();
        }
        sent.map_err(|_| CheckpointError::WorkerExited { operation })
    }

    fn spawn_worker(&self) -> WorkerHandle {
        let (sender, requests) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_worker(self.backend.clone(), requests));
        debug!(backend = self.backend.backend_type(), "snapshot worker started");
        WorkerHandle { sender, task }
    }
}

impl Drop for WorkerChannel {
    fn drop(&mut self) {
        if let Ok(mut worker) = self.worker.lock() {
            if let Some(handle) = worker.take() {
                handle.task.abort();
            }
        }
    }
}

impl fmt::Debug for WorkerChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerChannel")
            .field("backend", &self.backend.backend_type())
            .field("timeout", &self.timeout)
            .field("issued", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

async fn run_worker(
    backend: Arc<dyn SnapshotBackend>,
    mut requests: mpsc::UnboundedReceiver<WorkerEnvelope>,
) {
    while let Some(WorkerEnvelope { id, op, reply }) = requests.recv().await {
        let operation = op.kind();
        let outcome = execute(backend.as_ref(), op).await;
        if let Err(e) = &outcome {
            debug!(request_id = %id, %operation, error = %e, "snapshot request failed");
        }
        if reply.send(WorkerResponse { id, outcome }).is_err() {
            debug!(request_id = %id, %operation, "caller gave up, dropping late reply");
        }
    }
    debug!("snapshot worker stopped");
}

async fn execute(backend: &dyn SnapshotBackend, op: WorkerOp) -> BackendResult<WorkerReply> {
    match op {
        WorkerOp::Store {
            project_dir,
            store,
            message,
            paths,
        } => backend
            .store(&project_dir, &store, &message, &paths)
            .await
            .map(WorkerReply::Stored),
        WorkerOp::Restore {
            project_dir,
            store,
            commit,
            paths,
        } => backend
            .restore(&project_dir, &store, &commit, &paths)
            .await
            .map(|()| WorkerReply::Restored),
    }
}
