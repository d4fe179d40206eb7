//! Content Condenser Port - 章节压缩服务抽象
//!
//! 实际的文本压缩由外部 AI 服务完成，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::revision::{CondensedDraft, CutExplanation, IssueContext};

/// 压缩服务错误
#[derive(Debug, Error)]
pub enum CondenserError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Content policy rejection: {0}")]
    ContentPolicy(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CondenserError {
    /// 是否值得重试
    pub fn is_transient(&self) -> bool {
        matches!(self, CondenserError::NetworkError(_) | CondenserError::Timeout)
    }
}

/// 压缩请求
#[derive(Debug, Clone)]
pub struct CondenseRequest {
    pub original_content: String,
    pub original_word_count: u32,
    pub target_word_count: u32,
    pub veb_issues: Option<IssueContext>,
}

/// 压缩响应
#[derive(Debug, Clone)]
pub struct CondenseResponse {
    pub condensed_content: String,
    pub condensed_word_count: u32,
    pub cuts_explanation: Vec<CutExplanation>,
    pub preserved_elements: Vec<String>,
}

impl From<CondenseResponse> for CondensedDraft {
    fn from(response: CondenseResponse) -> Self {
        Self {
            content: response.condensed_content,
            word_count: response.condensed_word_count,
            cuts_explanation: response.cuts_explanation,
            preserved_elements: response.preserved_elements,
        }
    }
}

/// Content Condenser Port
#[async_trait]
pub trait ContentCondenserPort: Send + Sync {
    /// 把章节压缩到目标字数附近
    async fn condense(&self, request: CondenseRequest) -> Result<CondenseResponse, CondenserError>;

    /// 检查压缩服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
