//! Revision Context - 字数修订限界上下文
//!
//! 职责:
//! - Revision 聚合（每本书最多一个进行中的修订）
//! - 章节压缩提案状态机
//! - 编辑问题上下文与删减说明

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::{ProposalCounts, Revision, RevisionProgress};
pub use entities::{sort_by_priority, ChapterProposal, ProposalSeed};
pub use errors::RevisionError;
pub use value_objects::{
    CondensedDraft, CutExplanation, EditorialIssue, IssueContext, ProposalAction,
    ProposalStatus, RevisionStatus, ScenePurpose, ScenePurposeVerdict, Severity,
};
