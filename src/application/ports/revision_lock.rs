//! Revision Lock Port - 按修订串行化写操作
//!
//! 修订计数（words_cut_so_far / chapters_reviewed）是读-改-写，
//! 同一修订上的写操作必须串行执行

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// 持有期间独占对应 key
pub type LockGuard = OwnedMutexGuard<()>;

/// Revision Lock Port
///
/// key 可以是 revision_id（提案操作）或 book_id（开始修订）
#[async_trait]
pub trait RevisionLockPort: Send + Sync {
    /// 获取 key 对应的锁，等待直到可用
    async fn acquire(&self, key: Uuid) -> LockGuard;

    /// 回收 key 对应的锁；仍被持有或有等待者时保留
    fn release(&self, key: Uuid);
}
