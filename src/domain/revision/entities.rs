//! Revision Context - Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    CondensedDraft, CutExplanation, IssueContext, ProposalAction, ProposalStatus, RevisionError,
};
use crate::domain::priority::priority_score;

/// 创建提案所需的章节快照信息
#[derive(Debug, Clone)]
pub struct ProposalSeed {
    pub chapter_id: Uuid,
    pub position: u32,
    pub title: Option<String>,
    pub content: String,
    pub word_count: u32,
    pub target_word_count: u32,
    pub veb_issues: Option<IssueContext>,
}

/// 章节压缩提案
///
/// 状态机:
/// - pending/error --generate--> generating --> ready | error
/// - ready --approve--> applied
/// - ready --reject--> rejected
///
/// 不变量:
/// - condensed_content 非空 当且仅当 status ∈ {ready, applied}
/// - error_message 只在 status = error 时存在
/// - actual_reduction = original_word_count - condensed_word_count >= 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterProposal {
    pub(crate) id: Uuid,
    pub(crate) revision_id: Uuid,
    pub(crate) chapter_id: Uuid,
    pub(crate) position: u32,
    pub(crate) title: Option<String>,
    pub(crate) original_content: String,
    pub(crate) original_word_count: u32,
    pub(crate) target_word_count: u32,
    pub(crate) priority_score: u8,
    pub(crate) veb_issues: Option<IssueContext>,
    pub(crate) status: ProposalStatus,
    pub(crate) condensed_content: Option<String>,
    pub(crate) condensed_word_count: Option<u32>,
    pub(crate) actual_reduction: Option<u32>,
    pub(crate) cuts_explanation: Vec<CutExplanation>,
    pub(crate) preserved_elements: Vec<String>,
    pub(crate) error_message: Option<String>,
    pub(crate) reviewer_notes: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl ChapterProposal {
    /// 创建 pending 状态的提案，优先级由问题上下文计算
    pub fn new(revision_id: Uuid, seed: ProposalSeed) -> Self {
        let now = Utc::now();
        let priority = priority_score(seed.veb_issues.as_ref());
        Self {
            id: Uuid::new_v4(),
            revision_id,
            chapter_id: seed.chapter_id,
            position: seed.position,
            title: seed.title,
            original_content: seed.content,
            original_word_count: seed.word_count,
            target_word_count: seed.target_word_count.min(seed.word_count),
            priority_score: priority,
            veb_issues: seed.veb_issues,
            status: ProposalStatus::Pending,
            condensed_content: None,
            condensed_word_count: None,
            actual_reduction: None,
            cuts_explanation: Vec::new(),
            preserved_elements: Vec::new(),
            error_message: None,
            reviewer_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn guard(&self, action: ProposalAction, allowed: bool) -> Result<(), RevisionError> {
        if allowed {
            Ok(())
        } else {
            Err(RevisionError::InvalidTransition {
                chapter_id: self.chapter_id,
                action,
                from: self.status,
            })
        }
    }

    fn clear_condensed(&mut self) {
        self.condensed_content = None;
        self.condensed_word_count = None;
        self.actual_reduction = None;
        self.cuts_explanation.clear();
        self.preserved_elements.clear();
    }

    /// 标记为生成中（比较并交换：只有 pending / error 可以进入）
    pub fn begin_generation(&mut self) -> Result<(), RevisionError> {
        self.guard(ProposalAction::Generate, self.status.can_generate())?;
        self.status = ProposalStatus::Generating;
        self.error_message = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 写入压缩结果，进入 ready
    ///
    /// 压缩结果为空或比原文更长时返回错误，状态不变，由调用方转为 error
    pub fn complete_generation(&mut self, draft: CondensedDraft) -> Result<(), RevisionError> {
        self.guard(
            ProposalAction::CompleteGeneration,
            self.status == ProposalStatus::Generating,
        )?;
        if draft.content.trim().is_empty() {
            return Err(RevisionError::EmptyCondensedContent);
        }
        if draft.word_count > self.original_word_count {
            return Err(RevisionError::CondensedLonger {
                original: self.original_word_count,
                condensed: draft.word_count,
            });
        }

        self.actual_reduction = Some(self.original_word_count - draft.word_count);
        self.condensed_word_count = Some(draft.word_count);
        self.condensed_content = Some(draft.content);
        self.cuts_explanation = draft.cuts_explanation;
        self.preserved_elements = draft.preserved_elements;
        self.error_message = None;
        self.status = ProposalStatus::Ready;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 生成失败，进入 error 并清空内容字段
    pub fn fail_generation(&mut self, message: impl Into<String>) -> Result<(), RevisionError> {
        self.guard(
            ProposalAction::FailGeneration,
            self.status == ProposalStatus::Generating,
        )?;
        self.clear_condensed();
        self.error_message = Some(message.into());
        self.status = ProposalStatus::Error;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 批准，返回本章实际删减字数
    pub fn approve(&mut self) -> Result<u32, RevisionError> {
        self.guard(ProposalAction::Approve, self.status == ProposalStatus::Ready)?;
        let reduction = self.actual_reduction.unwrap_or(0);
        self.status = ProposalStatus::Applied;
        self.updated_at = Utc::now();
        Ok(reduction)
    }

    /// 拒绝，不影响字数
    pub fn reject(&mut self, notes: Option<String>) -> Result<(), RevisionError> {
        self.guard(ProposalAction::Reject, self.status == ProposalStatus::Ready)?;
        self.clear_condensed();
        self.reviewer_notes = notes;
        self.status = ProposalStatus::Rejected;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 目标删减比例 (original - target) / original
    pub fn reduction_percent(&self) -> f64 {
        if self.original_word_count == 0 {
            return 0.0;
        }
        f64::from(self.original_word_count - self.target_word_count)
            / f64::from(self.original_word_count)
            * 100.0
    }

    // Getters
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn revision_id(&self) -> Uuid {
        self.revision_id
    }

    pub fn chapter_id(&self) -> Uuid {
        self.chapter_id
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    pub fn original_word_count(&self) -> u32 {
        self.original_word_count
    }

    pub fn target_word_count(&self) -> u32 {
        self.target_word_count
    }

    pub fn priority_score(&self) -> u8 {
        self.priority_score
    }

    pub fn veb_issues(&self) -> Option<&IssueContext> {
        self.veb_issues.as_ref()
    }

    pub fn status(&self) -> ProposalStatus {
        self.status
    }

    pub fn condensed_content(&self) -> Option<&str> {
        self.condensed_content.as_deref()
    }

    pub fn condensed_word_count(&self) -> Option<u32> {
        self.condensed_word_count
    }

    pub fn actual_reduction(&self) -> Option<u32> {
        self.actual_reduction
    }

    pub fn cuts_explanation(&self) -> &[CutExplanation] {
        &self.cuts_explanation
    }

    pub fn preserved_elements(&self) -> &[String] {
        &self.preserved_elements
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn reviewer_notes(&self) -> Option<&str> {
        self.reviewer_notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// 默认处理顺序：优先级高的在前，同分按章节位置
pub fn sort_by_priority(proposals: &mut [ChapterProposal]) {
    proposals.sort_by(|a, b| {
        b.priority_score
            .cmp(&a.priority_score)
            .then(a.position.cmp(&b.position))
    });
}
