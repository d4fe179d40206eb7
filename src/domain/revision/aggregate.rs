//! Revision Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ChapterProposal, ProposalStatus, RevisionError, RevisionStatus};
use crate::domain::tolerance::{self, ToleranceBand};

/// Revision 聚合根
///
/// 不变量:
/// - 同一本书最多一个 active 修订
/// - words_to_cut 在开始时固定，保证完成度单调
/// - current_word_count = original_word_count - words_cut_so_far
/// - 只有 approve / reject 事件会修改计数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    pub(crate) id: Uuid,
    pub(crate) book_id: Uuid,
    pub(crate) status: RevisionStatus,
    pub(crate) original_word_count: u32,
    pub(crate) current_word_count: u32,
    pub(crate) target_word_count: u32,
    pub(crate) tolerance_percent: f64,
    pub(crate) words_to_cut: u32,
    pub(crate) chapters_total: u32,
    pub(crate) chapters_reviewed: u32,
    pub(crate) words_cut_so_far: u32,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) closed_at: Option<DateTime<Utc>>,
}

/// 修订进度（派生数据，不单独存储）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionProgress {
    pub revision_id: Uuid,
    pub status: RevisionStatus,
    pub current_word_count: u32,
    pub target_word_count: u32,
    pub min_acceptable: u32,
    pub max_acceptable: u32,
    pub words_to_cut: u32,
    pub words_reduced: u32,
    pub words_remaining: u32,
    pub percent_complete: f64,
    pub is_within_tolerance: bool,
    pub chapters_total: u32,
    pub chapters_reviewed: u32,
}

impl Revision {
    /// 开始新修订
    pub fn start(
        book_id: Uuid,
        current_word_count: u32,
        target_word_count: u32,
        tolerance_percent: f64,
        chapters_total: u32,
    ) -> Result<Self, RevisionError> {
        if target_word_count == 0 {
            return Err(RevisionError::InvalidTargetWordCount(target_word_count));
        }
        if !tolerance::is_valid_tolerance(tolerance_percent) {
            return Err(RevisionError::InvalidTolerance(tolerance_percent));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            book_id,
            status: RevisionStatus::Active,
            original_word_count: current_word_count,
            current_word_count,
            target_word_count,
            tolerance_percent,
            words_to_cut: tolerance::words_to_cut(current_word_count, target_word_count),
            chapters_total,
            chapters_reviewed: 0,
            words_cut_so_far: 0,
            created_at: now,
            updated_at: now,
            closed_at: None,
        })
    }

    pub fn ensure_active(&self) -> Result<(), RevisionError> {
        if self.status == RevisionStatus::Active {
            Ok(())
        } else {
            Err(RevisionError::NotActive {
                id: self.id,
                status: self.status,
            })
        }
    }

    /// 记录一次批准：累计删减字数并重算当前字数
    pub fn record_approval(&mut self, actual_reduction: u32) -> Result<(), RevisionError> {
        self.ensure_active()?;
        self.words_cut_so_far = self.words_cut_so_far.saturating_add(actual_reduction);
        self.current_word_count = self
            .original_word_count
            .saturating_sub(self.words_cut_so_far);
        self.chapters_reviewed += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 记录一次拒绝：只增加已审阅数
    pub fn record_rejection(&mut self) -> Result<(), RevisionError> {
        self.ensure_active()?;
        self.chapters_reviewed += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 完成修订，要求字数已落入容差区间
    pub fn complete(&mut self) -> Result<(), RevisionError> {
        self.ensure_active()?;
        let band = self.tolerance_band();
        if !band.contains(self.current_word_count) {
            return Err(RevisionError::NotWithinTolerance {
                current: self.current_word_count,
                min: band.min_acceptable,
                max: band.max_acceptable,
            });
        }
        self.close(RevisionStatus::Completed);
        Ok(())
    }

    /// 放弃修订，之后可以为同一本书开始新修订
    pub fn abandon(&mut self) -> Result<(), RevisionError> {
        self.ensure_active()?;
        self.close(RevisionStatus::Abandoned);
        Ok(())
    }

    fn close(&mut self, status: RevisionStatus) {
        let now = Utc::now();
        self.status = status;
        self.closed_at = Some(now);
        self.updated_at = now;
    }

    pub fn tolerance_band(&self) -> ToleranceBand {
        tolerance::tolerance_band(self.target_word_count, self.tolerance_percent)
    }

    pub fn is_within_tolerance(&self) -> bool {
        self.tolerance_band().contains(self.current_word_count)
    }

    /// 计算派生进度
    pub fn progress(&self) -> RevisionProgress {
        let status = tolerance::evaluate(
            self.current_word_count,
            self.target_word_count,
            self.tolerance_percent,
            self.words_cut_so_far,
            self.words_to_cut,
        );
        RevisionProgress {
            revision_id: self.id,
            status: self.status,
            current_word_count: self.current_word_count,
            target_word_count: self.target_word_count,
            min_acceptable: status.band.min_acceptable,
            max_acceptable: status.band.max_acceptable,
            words_to_cut: self.words_to_cut,
            words_reduced: status.words_reduced,
            words_remaining: status.words_remaining,
            percent_complete: status.percent_complete,
            is_within_tolerance: status.is_within_tolerance,
            chapters_total: self.chapters_total,
            chapters_reviewed: self.chapters_reviewed,
        }
    }

    // Getters
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn book_id(&self) -> Uuid {
        self.book_id
    }

    pub fn status(&self) -> RevisionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == RevisionStatus::Active
    }

    pub fn original_word_count(&self) -> u32 {
        self.original_word_count
    }

    pub fn current_word_count(&self) -> u32 {
        self.current_word_count
    }

    pub fn target_word_count(&self) -> u32 {
        self.target_word_count
    }

    pub fn tolerance_percent(&self) -> f64 {
        self.tolerance_percent
    }

    pub fn words_to_cut(&self) -> u32 {
        self.words_to_cut
    }

    pub fn chapters_total(&self) -> u32 {
        self.chapters_total
    }

    pub fn chapters_reviewed(&self) -> u32 {
        self.chapters_reviewed
    }

    pub fn words_cut_so_far(&self) -> u32 {
        self.words_cut_so_far
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }
}

/// 各状态的提案数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProposalCounts {
    pub pending: u32,
    pub generating: u32,
    pub ready: u32,
    pub applied: u32,
    pub rejected: u32,
    pub error: u32,
}

impl ProposalCounts {
    pub fn tally(proposals: &[ChapterProposal]) -> Self {
        let mut counts = Self::default();
        for p in proposals {
            match p.status() {
                ProposalStatus::Pending => counts.pending += 1,
                ProposalStatus::Generating => counts.generating += 1,
                ProposalStatus::Ready => counts.ready += 1,
                ProposalStatus::Applied => counts.applied += 1,
                ProposalStatus::Rejected => counts.rejected += 1,
                ProposalStatus::Error => counts.error += 1,
            }
        }
        counts
    }
}
