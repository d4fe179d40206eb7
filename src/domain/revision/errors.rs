//! Revision Context - Errors

use thiserror::Error;
use uuid::Uuid;

use super::{ProposalAction, ProposalStatus, RevisionStatus};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RevisionError {
    #[error("目标字数必须大于 0: {0}")]
    InvalidTargetWordCount(u32),

    #[error("容差百分比必须在 [0, 100) 之间: {0}")]
    InvalidTolerance(f64),

    #[error("修订不处于进行中状态: {id} ({status})")]
    NotActive { id: Uuid, status: RevisionStatus },

    #[error("修订尚未达到容差区间: 当前 {current} 字, 区间 [{min}, {max}]")]
    NotWithinTolerance { current: u32, min: u32, max: u32 },

    #[error("章节 {chapter_id} 处于 {from} 状态, 不允许 {action}")]
    InvalidTransition {
        chapter_id: Uuid,
        action: ProposalAction,
        from: ProposalStatus,
    },

    #[error("压缩内容不能为空")]
    EmptyCondensedContent,

    #[error("压缩结果比原文更长: 原文 {original} 字, 压缩后 {condensed} 字")]
    CondensedLonger { original: u32, condensed: u32 },
}
