//! Failure injection for checkpoint tests

use super::backend::{BackendError, BackendResult, MemoryBackend, SnapshotBackend};
use super::models::{CommitId, StoreId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Memory backend with scripted failures, panics and delays
#[derive(Debug)]
pub(crate) struct FlakyBackend {
    inner: MemoryBackend,
    available: AtomicBool,
    failing_stores: AtomicUsize,
    failing_restores: AtomicUsize,
    panic_next: AtomicBool,
    delay_ms: AtomicU64,
    stores: AtomicUsize,
    restores: AtomicUsize,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
            available: AtomicBool::new(true),
            failing_stores: AtomicUsize::new(0),
            failing_restores: AtomicUsize::new(0),
            panic_next: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            stores: AtomicUsize::new(0),
            restores: AtomicUsize::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn fail_next_stores(&self, count: usize) {
        self.failing_stores.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_restores(&self, count: usize) {
        self.failing_restores.store(count, Ordering::SeqCst);
    }

    /// Panic inside the next store or restore
    pub fn panic_on_next_call(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    /// Sleep this long before every store or restore
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn store_calls(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn restore_calls(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }

    async fn before_call(&self) {
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("injected backend panic");
        }
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SnapshotBackend for FlakyBackend {
    fn backend_type(&self) -> &'static str {
        "flaky"
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn locate(&self, project_dir: &Path) -> BackendResult<StoreId> {
        self.inner.locate(project_dir).await
    }

    async fn has_unsaved_changes(
        &self,
        project_dir: &Path,
        store: &StoreId,
        paths: &[PathBuf],
    ) -> BackendResult<bool> {
        self.inner.has_unsaved_changes(project_dir, store, paths).await
    }

    async fn latest_snapshot_id(&self, store: &StoreId) -> BackendResult<CommitId> {
        self.inner.latest_snapshot_id(store).await
    }

    async fn store(
        &self,
        project_dir: &Path,
        store: &StoreId,
        message: &str,
        paths: &[PathBuf],
    ) -> BackendResult<CommitId> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.before_call().await;
        if Self::take_failure(&self.failing_stores) {
            return Err(BackendError::Other("injected store failure".to_string()));
        }
        self.inner.store(project_dir, store, message, paths).await
    }

    async fn restore(
        &self,
        project_dir: &Path,
        store: &StoreId,
        commit: &CommitId,
        paths: &[PathBuf],
    ) -> BackendResult<()> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        self.before_call().await;
        if Self::take_failure(&self.failing_restores) {
            return Err(BackendError::Other("injected restore failure".to_string()));
        }
        self.inner.restore(project_dir, store, commit, paths).await
    }
}
