//! Proposal Commands - 章节提案状态转换命令

use uuid::Uuid;

/// 生成章节压缩提案（首次或重试）
#[derive(Debug, Clone)]
pub struct GenerateProposal {
    pub revision_id: Uuid,
    pub chapter_id: Uuid,
}

/// 批准章节提案
#[derive(Debug, Clone)]
pub struct ApproveProposal {
    pub revision_id: Uuid,
    pub chapter_id: Uuid,
}

/// 拒绝章节提案
#[derive(Debug, Clone)]
pub struct RejectProposal {
    pub revision_id: Uuid,
    pub chapter_id: Uuid,
    pub notes: Option<String>,
}
