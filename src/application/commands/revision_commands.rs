//! Revision Commands - 修订生命周期命令

use uuid::Uuid;

/// 开始修订命令
#[derive(Debug, Clone)]
pub struct StartRevision {
    pub book_id: Uuid,
    pub target_word_count: u32,
    pub tolerance_percent: f64,
}

/// 完成修订命令（要求字数已在容差区间内）
#[derive(Debug, Clone)]
pub struct CompleteRevision {
    pub revision_id: Uuid,
}

/// 放弃修订命令
#[derive(Debug, Clone)]
pub struct AbandonRevision {
    pub revision_id: Uuid,
}
