//! Data Transfer Objects

use serde::Serialize;
use uuid::Uuid;

use crate::application::{BatchItemResult, BatchKind, BatchReport, ProgressView};
use crate::domain::revision::{
    ChapterProposal, CutExplanation, IssueContext, ProposalCounts, Revision, RevisionProgress,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Revision DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RevisionDto {
    pub id: Uuid,
    pub book_id: Uuid,
    pub status: String,
    pub original_word_count: u32,
    pub current_word_count: u32,
    pub target_word_count: u32,
    pub tolerance_percent: f64,
    pub min_acceptable: u32,
    pub max_acceptable: u32,
    pub words_to_cut: u32,
    pub words_cut_so_far: u32,
    pub chapters_total: u32,
    pub chapters_reviewed: u32,
    pub created_at: String,
    pub updated_at: String,
    pub closed_at: Option<String>,
}

impl From<&Revision> for RevisionDto {
    fn from(r: &Revision) -> Self {
        let band = r.tolerance_band();
        Self {
            id: r.id(),
            book_id: r.book_id(),
            status: r.status().as_str().to_string(),
            original_word_count: r.original_word_count(),
            current_word_count: r.current_word_count(),
            target_word_count: r.target_word_count(),
            tolerance_percent: r.tolerance_percent(),
            min_acceptable: band.min_acceptable,
            max_acceptable: band.max_acceptable,
            words_to_cut: r.words_to_cut(),
            words_cut_so_far: r.words_cut_so_far(),
            chapters_total: r.chapters_total(),
            chapters_reviewed: r.chapters_reviewed(),
            created_at: r.created_at().to_rfc3339(),
            updated_at: r.updated_at().to_rfc3339(),
            closed_at: r.closed_at().map(|t| t.to_rfc3339()),
        }
    }
}

/// 进度 = 派生进度字段 + 各状态提案数量
#[derive(Debug, Serialize)]
pub struct ProgressDto {
    #[serde(flatten)]
    pub progress: RevisionProgress,
    pub proposals: ProposalCounts,
}

impl From<ProgressView> for ProgressDto {
    fn from(view: ProgressView) -> Self {
        Self {
            progress: view.progress,
            proposals: view.proposals,
        }
    }
}

// ============================================================================
// Proposal DTOs
// ============================================================================

/// 列表项，不含正文
#[derive(Debug, Serialize)]
pub struct ProposalSummaryDto {
    pub chapter_id: Uuid,
    pub position: u32,
    pub title: Option<String>,
    pub status: String,
    pub priority_score: u8,
    pub original_word_count: u32,
    pub target_word_count: u32,
    pub condensed_word_count: Option<u32>,
    pub actual_reduction: Option<u32>,
    pub error_message: Option<String>,
}

impl From<&ChapterProposal> for ProposalSummaryDto {
    fn from(p: &ChapterProposal) -> Self {
        Self {
            chapter_id: p.chapter_id(),
            position: p.position(),
            title: p.title().map(str::to_string),
            status: p.status().as_str().to_string(),
            priority_score: p.priority_score(),
            original_word_count: p.original_word_count(),
            target_word_count: p.target_word_count(),
            condensed_word_count: p.condensed_word_count(),
            actual_reduction: p.actual_reduction(),
            error_message: p.error_message().map(str::to_string),
        }
    }
}

/// 提案详情
#[derive(Debug, Serialize)]
pub struct ProposalDto {
    pub id: Uuid,
    pub revision_id: Uuid,
    #[serde(flatten)]
    pub summary: ProposalSummaryDto,
    pub reduction_percent: f64,
    pub original_content: String,
    pub condensed_content: Option<String>,
    pub cuts_explanation: Vec<CutExplanation>,
    pub preserved_elements: Vec<String>,
    pub veb_issues: Option<IssueContext>,
    pub reviewer_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&ChapterProposal> for ProposalDto {
    fn from(p: &ChapterProposal) -> Self {
        Self {
            id: p.id(),
            revision_id: p.revision_id(),
            summary: ProposalSummaryDto::from(p),
            reduction_percent: p.reduction_percent(),
            original_content: p.original_content().to_string(),
            condensed_content: p.condensed_content().map(str::to_string),
            cuts_explanation: p.cuts_explanation().to_vec(),
            preserved_elements: p.preserved_elements().to_vec(),
            veb_issues: p.veb_issues().cloned(),
            reviewer_notes: p.reviewer_notes().map(str::to_string),
            created_at: p.created_at().to_rfc3339(),
            updated_at: p.updated_at().to_rfc3339(),
        }
    }
}

// ============================================================================
// Batch DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BatchItemDto {
    pub chapter_id: Uuid,
    pub status: Option<String>,
    pub error: Option<String>,
}

impl From<BatchItemResult> for BatchItemDto {
    fn from(item: BatchItemResult) -> Self {
        Self {
            chapter_id: item.chapter_id,
            status: item.status.map(|s| s.as_str().to_string()),
            error: item.error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReportDto {
    pub revision_id: Uuid,
    pub kind: BatchKind,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchItemDto>,
}

impl From<BatchReport> for BatchReportDto {
    fn from(report: BatchReport) -> Self {
        Self {
            revision_id: report.revision_id,
            kind: report.kind,
            total: report.total,
            processed: report.processed,
            succeeded: report.succeeded,
            failed: report.failed,
            items: report.items.into_iter().map(BatchItemDto::from).collect(),
        }
    }
}
