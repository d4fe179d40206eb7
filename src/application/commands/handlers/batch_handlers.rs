//! Batch Command Handlers - 批量生成 / 批量批准
//!
//! 严格顺序执行：
//! - 外部压缩服务有速率和并发限制
//! - 修订计数不需要额外的并发控制
//!
//! 单个章节失败只记录在结果里，批量操作继续处理下一章。
//! 循环在独立任务中运行，调用方断开连接后批量仍会处理完毕

use std::sync::Arc;

use uuid::Uuid;

use crate::application::commands::{
    ApproveAll, ApproveProposal, BatchItemResult, BatchReport, GenerateAll, GenerateProposal,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{BatchError, BatchKind, BatchTrackerPort, RevisionRepositoryPort};
use crate::domain::revision::{sort_by_priority, ProposalStatus};

use super::{ApproveProposalHandler, GenerateProposalHandler};

/// 按优先级顺序取出指定状态的章节
async fn chapters_in_status(
    repo: &dyn RevisionRepositoryPort,
    revision_id: Uuid,
    status: ProposalStatus,
) -> Result<Vec<Uuid>, ApplicationError> {
    let revision = repo
        .find_by_id(revision_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Revision", revision_id))?;
    revision.ensure_active()?;

    let mut proposals = repo.find_proposals(revision_id).await?;
    sort_by_priority(&mut proposals);

    Ok(proposals
        .into_iter()
        .filter(|p| p.status() == status)
        .map(|p| p.chapter_id())
        .collect())
}

/// 运行中的批量操作
///
/// drop 时结束进度，任务被取消或 panic 也不会让修订一直处于运行中
struct RunningBatch {
    tracker: Arc<dyn BatchTrackerPort>,
    revision_id: Uuid,
}

impl RunningBatch {
    fn begin(
        tracker: Arc<dyn BatchTrackerPort>,
        revision_id: Uuid,
        kind: BatchKind,
        total: usize,
    ) -> Result<Self, BatchError> {
        tracker.begin(revision_id, kind, total)?;
        Ok(Self {
            tracker,
            revision_id,
        })
    }

    fn start_item(&self, chapter_id: Uuid) {
        self.tracker.start_item(self.revision_id, chapter_id);
    }

    fn record(&self, succeeded: bool) {
        self.tracker.record(self.revision_id, succeeded);
    }
}

impl Drop for RunningBatch {
    fn drop(&mut self) {
        self.tracker.finish(self.revision_id);
    }
}

fn join_failed(err: tokio::task::JoinError) -> ApplicationError {
    ApplicationError::internal(format!("batch task failed: {}", err))
}

// ============================================================================
// GenerateAll
// ============================================================================

/// GenerateAll Handler
pub struct GenerateAllHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
    batch_tracker: Arc<dyn BatchTrackerPort>,
    generate: Arc<GenerateProposalHandler>,
}

impl GenerateAllHandler {
    pub fn new(
        revision_repo: Arc<dyn RevisionRepositoryPort>,
        batch_tracker: Arc<dyn BatchTrackerPort>,
        generate: Arc<GenerateProposalHandler>,
    ) -> Self {
        Self {
            revision_repo,
            batch_tracker,
            generate,
        }
    }

    pub async fn handle(&self, cmd: GenerateAll) -> Result<BatchReport, ApplicationError> {
        let revision_id = cmd.revision_id;
        let chapters =
            chapters_in_status(self.revision_repo.as_ref(), revision_id, ProposalStatus::Pending)
                .await?;

        let total = chapters.len();
        let batch = RunningBatch::begin(
            self.batch_tracker.clone(),
            revision_id,
            BatchKind::GenerateAll,
            total,
        )?;
        tracing::info!(revision_id = %revision_id, total = total, "Generate-all started");

        tokio::spawn(generate_chapters(batch, self.generate.clone(), chapters))
            .await
            .map_err(join_failed)
    }
}

async fn generate_chapters(
    batch: RunningBatch,
    generate: Arc<GenerateProposalHandler>,
    chapters: Vec<Uuid>,
) -> BatchReport {
    let revision_id = batch.revision_id;
    let total = chapters.len();
    let mut report = BatchReport::new(revision_id, BatchKind::GenerateAll, total);

    for chapter_id in chapters {
        batch.start_item(chapter_id);

        let result = generate
            .handle(GenerateProposal {
                revision_id,
                chapter_id,
            })
            .await;

        let (item, succeeded) = match result {
            Ok(proposal) => {
                let succeeded = proposal.status() == ProposalStatus::Ready;
                (
                    BatchItemResult {
                        chapter_id,
                        status: Some(proposal.status()),
                        error: proposal.error_message().map(str::to_string),
                    },
                    succeeded,
                )
            }
            Err(e) => {
                tracing::warn!(
                    revision_id = %revision_id,
                    chapter_id = %chapter_id,
                    error = %e,
                    "Generate skipped chapter"
                );
                (
                    BatchItemResult {
                        chapter_id,
                        status: None,
                        error: Some(e.to_string()),
                    },
                    false,
                )
            }
        };

        batch.record(succeeded);
        report.push(item, succeeded);

        tracing::debug!(
            revision_id = %revision_id,
            processed = report.processed,
            total = total,
            "Generate-all progress"
        );
    }

    tracing::info!(
        revision_id = %revision_id,
        processed = report.processed,
        succeeded = report.succeeded,
        failed = report.failed,
        "Generate-all finished"
    );

    report
}

// ============================================================================
// ApproveAll
// ============================================================================

/// ApproveAll Handler
pub struct ApproveAllHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
    batch_tracker: Arc<dyn BatchTrackerPort>,
    approve: Arc<ApproveProposalHandler>,
}

impl ApproveAllHandler {
    pub fn new(
        revision_repo: Arc<dyn RevisionRepositoryPort>,
        batch_tracker: Arc<dyn BatchTrackerPort>,
        approve: Arc<ApproveProposalHandler>,
    ) -> Self {
        Self {
            revision_repo,
            batch_tracker,
            approve,
        }
    }

    pub async fn handle(&self, cmd: ApproveAll) -> Result<BatchReport, ApplicationError> {
        let revision_id = cmd.revision_id;
        let chapters =
            chapters_in_status(self.revision_repo.as_ref(), revision_id, ProposalStatus::Ready)
                .await?;

        let total = chapters.len();
        let batch = RunningBatch::begin(
            self.batch_tracker.clone(),
            revision_id,
            BatchKind::ApproveAll,
            total,
        )?;
        tracing::info!(revision_id = %revision_id, total = total, "Approve-all started");

        tokio::spawn(approve_chapters(batch, self.approve.clone(), chapters))
            .await
            .map_err(join_failed)
    }
}

async fn approve_chapters(
    batch: RunningBatch,
    approve: Arc<ApproveProposalHandler>,
    chapters: Vec<Uuid>,
) -> BatchReport {
    let revision_id = batch.revision_id;
    let mut report = BatchReport::new(revision_id, BatchKind::ApproveAll, chapters.len());

    for chapter_id in chapters {
        batch.start_item(chapter_id);

        let result = approve
            .handle(ApproveProposal {
                revision_id,
                chapter_id,
            })
            .await;

        let (item, succeeded) = match result {
            Ok(_) => (
                BatchItemResult {
                    chapter_id,
                    status: Some(ProposalStatus::Applied),
                    error: None,
                },
                true,
            ),
            Err(e) => {
                tracing::warn!(
                    revision_id = %revision_id,
                    chapter_id = %chapter_id,
                    error = %e,
                    "Approve failed for chapter"
                );
                (
                    BatchItemResult {
                        chapter_id,
                        status: None,
                        error: Some(e.to_string()),
                    },
                    false,
                )
            }
        };

        batch.record(succeeded);
        report.push(item, succeeded);
    }

    tracing::info!(
        revision_id = %revision_id,
        processed = report.processed,
        succeeded = report.succeeded,
        failed = report.failed,
        "Approve-all finished"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::application::commands::{AbandonRevision, CompleteRevision};
    use crate::domain::revision::{
        IssueContext, RevisionStatus, ScenePurpose, ScenePurposeVerdict,
    };
    use crate::test_support::{chapter, Fixture, FAIL_MARKER, SLOW_DELAY, SLOW_MARKER};

    fn not_earned() -> Option<IssueContext> {
        Some(IssueContext {
            scene_purpose: Some(ScenePurpose {
                verdict: ScenePurposeVerdict::NotEarned,
                reasoning: None,
            }),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_generate_all_continues_past_failures() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![
            chapter(0, 100, None, None),
            chapter(1, 100, Some(FAIL_MARKER), None),
            chapter(2, 100, None, not_earned()),
            chapter(3, 100, Some(FAIL_MARKER), None),
        ]);
        let revision = fx.start(book_id, 300, 5.0).await;

        let report = fx
            .generate_all_handler()
            .handle(GenerateAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.processed, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 2);
        // 优先级最高的章节先处理
        assert_eq!(report.items[0].chapter_id, ids[2]);
        assert!(report
            .items
            .iter()
            .filter(|i| i.status == Some(ProposalStatus::Error))
            .all(|i| i.error.is_some()));

        let progress = fx.tracker.get(revision.id()).unwrap();
        assert!(!progress.is_running());
        assert_eq!(progress.processed, 4);
        assert_eq!(progress.failed, 2);

        // 修订计数不受生成影响
        let stored = fx.repo.find_by_id(revision.id()).await.unwrap().unwrap();
        assert_eq!(stored.chapters_reviewed(), 0);
        assert_eq!(stored.words_cut_so_far(), 0);
    }

    #[tokio::test]
    async fn test_generate_all_skips_non_pending() {
        let fx = Fixture::new().await;
        let (book_id, _) = fx.add_book(vec![
            chapter(0, 100, None, None),
            chapter(1, 100, None, None),
        ]);
        let revision = fx.start(book_id, 150, 5.0).await;
        let handler = fx.generate_all_handler();

        let first = handler
            .handle(GenerateAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap();
        assert_eq!(first.processed, 2);

        let second = handler
            .handle(GenerateAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap();
        assert_eq!(second.total, 0);
        assert_eq!(second.processed, 0);
        assert_eq!(fx.condenser.calls(), 2);
    }

    #[tokio::test]
    async fn test_reference_revision_reaches_target() {
        let fx = Fixture::new().await;
        let (book_id, _) = fx.add_book(vec![
            chapter(0, 20_000, None, None),
            chapter(1, 30_000, None, None),
            chapter(2, 45_000, None, None),
        ]);
        let revision = fx.start(book_id, 80_000, 5.0).await;
        assert_eq!(revision.words_to_cut(), 15_000);

        fx.generate_all_handler()
            .handle(GenerateAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap();
        let report = fx
            .approve_all_handler()
            .handle(ApproveAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(report.succeeded, 3);

        let stored = fx.repo.find_by_id(revision.id()).await.unwrap().unwrap();
        let progress = stored.progress();
        assert_eq!(stored.words_cut_so_far(), 15_000);
        assert_eq!(stored.current_word_count(), 80_000);
        assert_eq!(progress.percent_complete, 100.0);
        assert!(progress.is_within_tolerance);
        assert_eq!(progress.chapters_reviewed, 3);

        let completed = fx
            .close_handler()
            .complete(CompleteRevision {
                revision_id: revision.id(),
            })
            .await
            .unwrap();
        assert_eq!(completed.status(), RevisionStatus::Completed);
    }

    #[tokio::test]
    async fn test_approve_all_only_touches_ready() {
        let fx = Fixture::new().await;
        let (book_id, _) = fx.add_book(vec![
            chapter(0, 100, None, None),
            chapter(1, 100, Some(FAIL_MARKER), None),
        ]);
        let revision = fx.start(book_id, 150, 5.0).await;

        fx.generate_all_handler()
            .handle(GenerateAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap();
        let report = fx
            .approve_all_handler()
            .handle(ApproveAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(report.items[0].status, Some(ProposalStatus::Applied));

        let stored = fx.repo.find_by_id(revision.id()).await.unwrap().unwrap();
        assert_eq!(stored.chapters_reviewed(), 1);
        assert_eq!(stored.words_cut_so_far(), 25);
    }

    #[tokio::test]
    async fn test_batch_refused_while_another_runs() {
        let fx = Fixture::new().await;
        let (book_id, _) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 80, 5.0).await;
        fx.tracker
            .begin(revision.id(), BatchKind::ApproveAll, 1)
            .unwrap();

        let err = fx
            .generate_all_handler()
            .handle(GenerateAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Batch(BatchError::AlreadyRunning { .. })
        ));
        assert!(err.is_conflict());
        assert_eq!(fx.condenser.calls(), 0);
    }

    #[tokio::test]
    async fn test_batch_on_closed_revision_fails() {
        let fx = Fixture::new().await;
        let (book_id, _) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 80, 5.0).await;
        fx.close_handler()
            .abandon(AbandonRevision {
                revision_id: revision.id(),
            })
            .await
            .unwrap();

        let err = fx
            .approve_all_handler()
            .handle(ApproveAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(fx.tracker.get(revision.id()).is_none());
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_wedge_revision() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![
            chapter(0, 100, Some(SLOW_MARKER), None),
            chapter(1, 100, None, None),
        ]);
        let revision = fx.start(book_id, 150, 5.0).await;
        let handler = fx.generate_all_handler();

        let cut_short = tokio::time::timeout(
            Duration::from_millis(50),
            handler.handle(GenerateAll {
                revision_id: revision.id(),
            }),
        )
        .await;
        assert!(cut_short.is_err());

        tokio::time::sleep(SLOW_DELAY * 2).await;

        // 批量在后台处理完毕并结束进度
        let progress = fx.tracker.get(revision.id()).unwrap();
        assert!(!progress.is_running());
        assert_eq!(progress.processed, 2);
        for id in &ids {
            let proposal = fx
                .repo
                .find_proposal(revision.id(), *id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(proposal.status(), ProposalStatus::Ready);
        }

        let report = fx
            .approve_all_handler()
            .handle(ApproveAll {
                revision_id: revision.id(),
            })
            .await
            .unwrap();
        assert_eq!(report.succeeded, 2);
    }
}
