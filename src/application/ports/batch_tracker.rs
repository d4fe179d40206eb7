//! Batch Tracker Port - 批量操作进度
//!
//! 记录每个修订当前批量操作的 current/total 计数，供调用方轮询；
//! 同一修订同一时刻只允许一个批量操作

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Batch Tracker 错误
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Batch already running for revision {revision_id}: {kind}")]
    AlreadyRunning { revision_id: Uuid, kind: BatchKind },
}

/// 批量操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    GenerateAll,
    ApproveAll,
}

impl BatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchKind::GenerateAll => "generate_all",
            BatchKind::ApproveAll => "approve_all",
        }
    }
}

impl std::fmt::Display for BatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 批量操作进度快照
#[derive(Debug, Clone, Serialize)]
pub struct BatchProgress {
    pub revision_id: Uuid,
    pub kind: BatchKind,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub current_chapter_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchProgress {
    pub fn new(revision_id: Uuid, kind: BatchKind, total: usize) -> Self {
        Self {
            revision_id,
            kind,
            total,
            processed: 0,
            succeeded: 0,
            failed: 0,
            current_chapter_id: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.finished_at.is_none()
    }
}

/// Batch Tracker Port
///
/// 所有状态存储在内存中
pub trait BatchTrackerPort: Send + Sync {
    /// 开始批量操作；已有运行中的批量操作时失败
    fn begin(&self, revision_id: Uuid, kind: BatchKind, total: usize) -> Result<(), BatchError>;

    /// 标记正在处理的章节
    fn start_item(&self, revision_id: Uuid, chapter_id: Uuid);

    /// 记录单个章节的处理结果
    fn record(&self, revision_id: Uuid, succeeded: bool);

    /// 结束批量操作
    fn finish(&self, revision_id: Uuid);

    /// 获取最近一次批量操作的进度
    fn get(&self, revision_id: Uuid) -> Option<BatchProgress>;

    /// 删除已结束的进度记录；运行中的保留
    fn remove(&self, revision_id: Uuid);
}
