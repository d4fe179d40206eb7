//! Chapter Source Port - 章节内容来源
//!
//! 由外部应用提供书籍当前版本的章节快照，修订开始时读取一次

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::revision::IssueContext;

/// 章节来源错误
#[derive(Debug, Error)]
pub enum ChapterSourceError {
    #[error("Book not found: {0}")]
    BookNotFound(Uuid),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 章节快照
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSnapshot {
    pub chapter_id: Uuid,
    /// 章节在书中的顺序
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub title: Option<String>,
    pub word_count: u32,
    pub content: String,
    #[serde(default)]
    pub veb_issues: Option<IssueContext>,
}

/// Chapter Source Port
#[async_trait]
pub trait ChapterSourcePort: Send + Sync {
    /// 获取书籍当前内容版本的全部章节
    async fn load_chapters(&self, book_id: Uuid) -> Result<Vec<ChapterSnapshot>, ChapterSourceError>;
}
