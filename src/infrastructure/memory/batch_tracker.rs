//! In-Memory Batch Tracker Implementation

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{BatchError, BatchKind, BatchProgress, BatchTrackerPort};

/// 内存批量进度表
///
/// revision_id -> 最近一次批量操作的进度。结束后保留供查询，修订关闭时删除
pub struct InMemoryBatchTracker {
    batches: DashMap<Uuid, BatchProgress>,
}

impl InMemoryBatchTracker {
    pub fn new() -> Self {
        Self {
            batches: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryBatchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchTrackerPort for InMemoryBatchTracker {
    fn begin(&self, revision_id: Uuid, kind: BatchKind, total: usize) -> Result<(), BatchError> {
        match self.batches.entry(revision_id) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_running() {
                    return Err(BatchError::AlreadyRunning {
                        revision_id,
                        kind: entry.get().kind,
                    });
                }
                entry.insert(BatchProgress::new(revision_id, kind, total));
            }
            Entry::Vacant(entry) => {
                entry.insert(BatchProgress::new(revision_id, kind, total));
            }
        }
        tracing::debug!(revision_id = %revision_id, kind = %kind, total = total, "Batch registered");
        Ok(())
    }

    fn start_item(&self, revision_id: Uuid, chapter_id: Uuid) {
        if let Some(mut batch) = self.batches.get_mut(&revision_id) {
            batch.current_chapter_id = Some(chapter_id);
        }
    }

    fn record(&self, revision_id: Uuid, succeeded: bool) {
        if let Some(mut batch) = self.batches.get_mut(&revision_id) {
            batch.processed += 1;
            if succeeded {
                batch.succeeded += 1;
            } else {
                batch.failed += 1;
            }
        }
    }

    fn finish(&self, revision_id: Uuid) {
        if let Some(mut batch) = self.batches.get_mut(&revision_id) {
            batch.current_chapter_id = None;
            batch.finished_at = Some(Utc::now());
            tracing::debug!(
                revision_id = %revision_id,
                processed = batch.processed,
                total = batch.total,
                "Batch finished"
            );
        }
    }

    fn get(&self, revision_id: Uuid) -> Option<BatchProgress> {
        self.batches.get(&revision_id).map(|b| b.clone())
    }

    fn remove(&self, revision_id: Uuid) {
        self.batches
            .remove_if(&revision_id, |_, batch| !batch.is_running());
    }
}
