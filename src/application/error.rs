//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;
use uuid::Uuid;

use crate::application::ports::{BatchError, ChapterSourceError, RepositoryError};
use crate::domain::revision::RevisionError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: Uuid,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 同一本书已有进行中的修订
    #[error("Book {book_id} already has an active revision: {revision_id}")]
    ActiveRevisionExists { book_id: Uuid, revision_id: Uuid },

    /// 领域规则 / 状态机守卫失败
    #[error(transparent)]
    Domain(#[from] RevisionError),

    /// 批量操作冲突
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// 是否属于状态冲突（守卫失败）
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ApplicationError::ActiveRevisionExists { .. }
                | ApplicationError::Batch(_)
                | ApplicationError::Domain(
                    RevisionError::InvalidTransition { .. }
                        | RevisionError::NotActive { .. }
                        | RevisionError::NotWithinTolerance { .. }
                )
        )
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<ChapterSourceError> for ApplicationError {
    fn from(err: ChapterSourceError) -> Self {
        match err {
            ChapterSourceError::BookNotFound(id) => Self::not_found("Book", id),
            other => Self::ExternalServiceError(other.to_string()),
        }
    }
}
