//! Revision Queries - 修订与提案的只读查询

use uuid::Uuid;

/// 获取修订详情
#[derive(Debug, Clone)]
pub struct GetRevision {
    pub revision_id: Uuid,
}

/// 获取某本书当前 active 的修订
#[derive(Debug, Clone)]
pub struct GetActiveRevision {
    pub book_id: Uuid,
}

/// 获取修订进度
#[derive(Debug, Clone)]
pub struct GetRevisionProgress {
    pub revision_id: Uuid,
}

/// 列出修订的所有提案（优先级顺序）
#[derive(Debug, Clone)]
pub struct ListProposals {
    pub revision_id: Uuid,
}

/// 获取单个章节提案
#[derive(Debug, Clone)]
pub struct GetProposal {
    pub revision_id: Uuid,
    pub chapter_id: Uuid,
}

/// 获取最近一次批量操作的进度
#[derive(Debug, Clone)]
pub struct GetBatchStatus {
    pub revision_id: Uuid,
}
