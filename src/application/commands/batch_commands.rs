//! Batch Commands - 批量操作命令

use uuid::Uuid;

use crate::application::ports::BatchKind;
use crate::domain::revision::ProposalStatus;

/// 为所有 pending 提案依次生成
#[derive(Debug, Clone)]
pub struct GenerateAll {
    pub revision_id: Uuid,
}

/// 依次批准所有 ready 提案
#[derive(Debug, Clone)]
pub struct ApproveAll {
    pub revision_id: Uuid,
}

/// 单个章节的处理结果
#[derive(Debug, Clone)]
pub struct BatchItemResult {
    pub chapter_id: Uuid,
    /// 处理后的提案状态；命令本身被拒绝时为 None
    pub status: Option<ProposalStatus>,
    pub error: Option<String>,
}

/// 批量操作结果
///
/// processed 统计所有被处理的章节，无论成功与否
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub revision_id: Uuid,
    pub kind: BatchKind,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchItemResult>,
}

impl BatchReport {
    pub fn new(revision_id: Uuid, kind: BatchKind, total: usize) -> Self {
        Self {
            revision_id,
            kind,
            total,
            processed: 0,
            succeeded: 0,
            failed: 0,
            items: Vec::with_capacity(total),
        }
    }

    pub fn push(&mut self, item: BatchItemResult, succeeded: bool) {
        self.processed += 1;
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.items.push(item);
    }
}
