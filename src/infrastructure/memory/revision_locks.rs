//! In-Memory Revision Locks

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::{LockGuard, RevisionLockPort};

/// 内存锁表
///
/// key -> 独立的 tokio Mutex。开始修订后回收书籍的锁，关闭修订后回收修订的锁，
/// 表里只保留仍在进行中的修订
pub struct InMemoryRevisionLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl InMemoryRevisionLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 当前保留的锁数量
    pub fn tracked_keys(&self) -> usize {
        self.locks.len()
    }

    fn lock_for(&self, key: Uuid) -> Arc<Mutex<()>> {
        // 先 clone 出 Arc 再 await，避免持有 DashMap 分片锁
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for InMemoryRevisionLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RevisionLockPort for InMemoryRevisionLocks {
    async fn acquire(&self, key: Uuid) -> LockGuard {
        let lock = self.lock_for(key);
        let guard = lock.lock_owned().await;
        tracing::trace!(key = %key, "Revision lock acquired");
        guard
    }

    fn release(&self, key: Uuid) {
        // 表本身持有一份引用；更多引用说明有人持有或在等待
        self.locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
