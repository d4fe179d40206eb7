//! Repository Ports - 出站端口
//!
//! 定义修订与章节提案持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::revision::{ChapterProposal, Revision};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Revision Repository Port
///
/// 修订和它的章节提案放在同一个仓储里，需要原子更新的操作
/// （开始修订、审阅提案）都在一个事务内完成
#[async_trait]
pub trait RevisionRepositoryPort: Send + Sync {
    /// 创建修订及其所有提案（单事务）
    ///
    /// 同一本书已有 active 修订时返回 `RepositoryError::Duplicate`
    async fn create_revision(
        &self,
        revision: &Revision,
        proposals: &[ChapterProposal],
    ) -> Result<(), RepositoryError>;

    /// 更新修订
    async fn update_revision(&self, revision: &Revision) -> Result<(), RepositoryError>;

    /// 根据 ID 查找修订
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Revision>, RepositoryError>;

    /// 查找某本书当前 active 的修订
    async fn find_active_by_book(&self, book_id: Uuid) -> Result<Option<Revision>, RepositoryError>;

    /// 获取修订的所有提案（按章节位置排序）
    async fn find_proposals(&self, revision_id: Uuid) -> Result<Vec<ChapterProposal>, RepositoryError>;

    /// 获取指定章节的提案
    async fn find_proposal(
        &self,
        revision_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Option<ChapterProposal>, RepositoryError>;

    /// 更新提案（生成相关的状态转换）
    async fn update_proposal(&self, proposal: &ChapterProposal) -> Result<(), RepositoryError>;

    /// 审阅结果：同一事务内更新提案和修订计数
    async fn save_review(
        &self,
        revision: &Revision,
        proposal: &ChapterProposal,
    ) -> Result<(), RepositoryError>;

    /// 把所有停留在 generating 的提案标记为 error，返回数量
    ///
    /// 启动时调用：进程退出会让生成中的提案永远无法结束
    async fn fail_in_flight_proposals(&self, message: &str) -> Result<usize, RepositoryError>;
}
