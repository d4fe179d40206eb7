//! Proposal Command Handlers
//!
//! 章节提案的 generate / approve / reject

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::application::commands::{ApproveProposal, GenerateProposal, RejectProposal};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    CondenseRequest, CondenserError, ContentCondenserPort, RevisionLockPort,
    RevisionRepositoryPort,
};
use crate::domain::revision::{ChapterProposal, CondensedDraft, Revision};

/// 加载 active 修订和指定章节的提案
async fn load_for_update(
    repo: &dyn RevisionRepositoryPort,
    revision_id: Uuid,
    chapter_id: Uuid,
) -> Result<(Revision, ChapterProposal), ApplicationError> {
    let revision = repo
        .find_by_id(revision_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Revision", revision_id))?;
    revision.ensure_active()?;

    let proposal = repo
        .find_proposal(revision_id, chapter_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Chapter", chapter_id))?;

    Ok((revision, proposal))
}

// ============================================================================
// GenerateProposal
// ============================================================================

/// GenerateProposal Handler - 调用压缩服务生成提案
///
/// 锁只在状态转换时持有，外部调用期间不持锁；
/// generating 状态本身阻止同一章节被重复提交
pub struct GenerateProposalHandler {
    generation: Generation,
}

impl GenerateProposalHandler {
    pub fn new(
        revision_repo: Arc<dyn RevisionRepositoryPort>,
        condenser: Arc<dyn ContentCondenserPort>,
        locks: Arc<dyn RevisionLockPort>,
        timeout: Duration,
    ) -> Self {
        Self {
            generation: Generation {
                revision_repo,
                condenser,
                locks,
                timeout,
            },
        }
    }

    /// 生成在独立任务中运行：调用方被取消时提案仍会落到 ready 或 error
    pub async fn handle(&self, cmd: GenerateProposal) -> Result<ChapterProposal, ApplicationError> {
        tokio::spawn(self.generation.clone().run(cmd))
            .await
            .map_err(|e| ApplicationError::internal(format!("generation task failed: {}", e)))?
    }
}

#[derive(Clone)]
struct Generation {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
    condenser: Arc<dyn ContentCondenserPort>,
    locks: Arc<dyn RevisionLockPort>,
    timeout: Duration,
}

impl Generation {
    async fn run(self, cmd: GenerateProposal) -> Result<ChapterProposal, ApplicationError> {
        // 1. pending/error -> generating
        let mut proposal = {
            let _guard = self.locks.acquire(cmd.revision_id).await;
            let (_, mut proposal) =
                load_for_update(self.revision_repo.as_ref(), cmd.revision_id, cmd.chapter_id)
                    .await?;
            proposal.begin_generation()?;
            self.revision_repo.update_proposal(&proposal).await?;
            proposal
        };

        tracing::info!(
            revision_id = %cmd.revision_id,
            chapter_id = %cmd.chapter_id,
            original_word_count = proposal.original_word_count(),
            target_word_count = proposal.target_word_count(),
            "Generating condensed chapter"
        );

        // 2. 外部调用（不持锁）
        let request = CondenseRequest {
            original_content: proposal.original_content().to_string(),
            original_word_count: proposal.original_word_count(),
            target_word_count: proposal.target_word_count(),
            veb_issues: proposal.veb_issues().cloned(),
        };
        let outcome = match tokio::time::timeout(self.timeout, self.condenser.condense(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(CondenserError::Timeout),
        };

        // 3. generating -> ready | error
        let _guard = self.locks.acquire(cmd.revision_id).await;
        let mut settled = proposal.clone();
        match outcome {
            Ok(response) => {
                if let Err(e) = settled.complete_generation(CondensedDraft::from(response)) {
                    tracing::warn!(
                        chapter_id = %cmd.chapter_id,
                        error = %e,
                        "Condensed output rejected"
                    );
                    settled.fail_generation(e.to_string())?;
                }
            }
            Err(e) => {
                tracing::warn!(
                    revision_id = %cmd.revision_id,
                    chapter_id = %cmd.chapter_id,
                    error = %e,
                    "Condenser call failed"
                );
                settled.fail_generation(e.to_string())?;
            }
        }

        if let Err(e) = self.revision_repo.update_proposal(&settled).await {
            tracing::error!(
                revision_id = %cmd.revision_id,
                chapter_id = %cmd.chapter_id,
                error = %e,
                "Failed to save generation result"
            );
            // 结果写不进去时退回 error，保证可以重试
            proposal.fail_generation(format!("failed to save generation result: {}", e))?;
            if let Err(retry) = self.revision_repo.update_proposal(&proposal).await {
                tracing::error!(
                    chapter_id = %cmd.chapter_id,
                    error = %retry,
                    "Proposal stays generating until restart recovery"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            revision_id = %cmd.revision_id,
            chapter_id = %cmd.chapter_id,
            status = %settled.status(),
            actual_reduction = ?settled.actual_reduction(),
            "Proposal generation settled"
        );

        Ok(settled)
    }
}

// ============================================================================
// ApproveProposal
// ============================================================================

/// ApproveProposal Handler - 应用删减并更新修订计数
pub struct ApproveProposalHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
    locks: Arc<dyn RevisionLockPort>,
}

impl ApproveProposalHandler {
    pub fn new(
        revision_repo: Arc<dyn RevisionRepositoryPort>,
        locks: Arc<dyn RevisionLockPort>,
    ) -> Self {
        Self {
            revision_repo,
            locks,
        }
    }

    pub async fn handle(&self, cmd: ApproveProposal) -> Result<Revision, ApplicationError> {
        let _guard = self.locks.acquire(cmd.revision_id).await;
        let (mut revision, mut proposal) =
            load_for_update(self.revision_repo.as_ref(), cmd.revision_id, cmd.chapter_id).await?;

        let reduction = proposal.approve()?;
        revision.record_approval(reduction)?;
        self.revision_repo.save_review(&revision, &proposal).await?;

        tracing::info!(
            revision_id = %cmd.revision_id,
            chapter_id = %cmd.chapter_id,
            actual_reduction = reduction,
            words_cut_so_far = revision.words_cut_so_far(),
            current_word_count = revision.current_word_count(),
            "Proposal approved"
        );

        Ok(revision)
    }
}

// ============================================================================
// RejectProposal
// ============================================================================

/// RejectProposal Handler - 拒绝提案，不影响字数
pub struct RejectProposalHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
    locks: Arc<dyn RevisionLockPort>,
}

impl RejectProposalHandler {
    pub fn new(
        revision_repo: Arc<dyn RevisionRepositoryPort>,
        locks: Arc<dyn RevisionLockPort>,
    ) -> Self {
        Self {
            revision_repo,
            locks,
        }
    }

    pub async fn handle(&self, cmd: RejectProposal) -> Result<ChapterProposal, ApplicationError> {
        let _guard = self.locks.acquire(cmd.revision_id).await;
        let (mut revision, mut proposal) =
            load_for_update(self.revision_repo.as_ref(), cmd.revision_id, cmd.chapter_id).await?;

        proposal.reject(cmd.notes)?;
        revision.record_rejection()?;
        self.revision_repo.save_review(&revision, &proposal).await?;

        tracing::info!(
            revision_id = %cmd.revision_id,
            chapter_id = %cmd.chapter_id,
            chapters_reviewed = revision.chapters_reviewed(),
            "Proposal rejected"
        );

        Ok(proposal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::application::commands::AbandonRevision;
    use crate::application::ports::RepositoryError;
    use crate::domain::revision::{ProposalAction, ProposalStatus, RevisionError};
    use crate::infrastructure::persistence::sqlite::SqliteRevisionRepository;
    use crate::test_support::{
        chapter, Fixture, FAIL_MARKER, GROW_MARKER, SLOW_DELAY, SLOW_MARKER,
    };

    /// 拒绝写入 ready 提案的仓储，其余操作透传
    struct ReadyWriteFails {
        inner: Arc<SqliteRevisionRepository>,
    }

    #[async_trait]
    impl RevisionRepositoryPort for ReadyWriteFails {
        async fn create_revision(
            &self,
            revision: &Revision,
            proposals: &[ChapterProposal],
        ) -> Result<(), RepositoryError> {
            self.inner.create_revision(revision, proposals).await
        }

        async fn update_revision(&self, revision: &Revision) -> Result<(), RepositoryError> {
            self.inner.update_revision(revision).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Revision>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn find_active_by_book(
            &self,
            book_id: Uuid,
        ) -> Result<Option<Revision>, RepositoryError> {
            self.inner.find_active_by_book(book_id).await
        }

        async fn find_proposals(
            &self,
            revision_id: Uuid,
        ) -> Result<Vec<ChapterProposal>, RepositoryError> {
            self.inner.find_proposals(revision_id).await
        }

        async fn find_proposal(
            &self,
            revision_id: Uuid,
            chapter_id: Uuid,
        ) -> Result<Option<ChapterProposal>, RepositoryError> {
            self.inner.find_proposal(revision_id, chapter_id).await
        }

        async fn update_proposal(&self, proposal: &ChapterProposal) -> Result<(), RepositoryError> {
            if proposal.status() == ProposalStatus::Ready {
                return Err(RepositoryError::DatabaseError("disk full".to_string()));
            }
            self.inner.update_proposal(proposal).await
        }

        async fn save_review(
            &self,
            revision: &Revision,
            proposal: &ChapterProposal,
        ) -> Result<(), RepositoryError> {
            self.inner.save_review(revision, proposal).await
        }

        async fn fail_in_flight_proposals(&self, message: &str) -> Result<usize, RepositoryError> {
            self.inner.fail_in_flight_proposals(message).await
        }
    }

    fn generate(revision_id: Uuid, chapter_id: Uuid) -> GenerateProposal {
        GenerateProposal {
            revision_id,
            chapter_id,
        }
    }

    fn approve(revision_id: Uuid, chapter_id: Uuid) -> ApproveProposal {
        ApproveProposal {
            revision_id,
            chapter_id,
        }
    }

    fn assert_transition(err: ApplicationError, expected: ProposalAction, status: ProposalStatus) {
        match err {
            ApplicationError::Domain(RevisionError::InvalidTransition { action, from, .. }) => {
                assert_eq!(action, expected);
                assert_eq!(from, status);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_then_approve() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 80, 5.0).await;

        let proposal = fx
            .generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap();
        assert_eq!(proposal.status(), ProposalStatus::Ready);
        assert_eq!(proposal.condensed_word_count(), Some(80));
        assert_eq!(proposal.actual_reduction(), Some(20));
        assert!(proposal.error_message().is_none());

        let updated = fx
            .approve_handler()
            .handle(approve(revision.id(), ids[0]))
            .await
            .unwrap();
        assert_eq!(updated.words_cut_so_far(), 20);
        assert_eq!(updated.current_word_count(), 80);
        assert_eq!(updated.chapters_reviewed(), 1);
        assert!(updated.is_within_tolerance());
    }

    #[tokio::test]
    async fn test_double_approve_fails_without_double_counting() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 80, 5.0).await;

        fx.generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap();
        fx.approve_handler()
            .handle(approve(revision.id(), ids[0]))
            .await
            .unwrap();

        let err = fx
            .approve_handler()
            .handle(approve(revision.id(), ids[0]))
            .await
            .unwrap_err();
        assert_transition(err, ProposalAction::Approve, ProposalStatus::Applied);

        let stored = fx.repo.find_by_id(revision.id()).await.unwrap().unwrap();
        assert_eq!(stored.words_cut_so_far(), 20);
        assert_eq!(stored.chapters_reviewed(), 1);
    }

    #[tokio::test]
    async fn test_reject_then_approve_fails() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 80, 5.0).await;

        fx.generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap();
        let rejected = fx
            .reject_handler()
            .handle(RejectProposal {
                revision_id: revision.id(),
                chapter_id: ids[0],
                notes: Some("too much lost".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(rejected.status(), ProposalStatus::Rejected);
        assert_eq!(rejected.reviewer_notes(), Some("too much lost"));
        assert!(rejected.condensed_content().is_none());

        let err = fx
            .approve_handler()
            .handle(approve(revision.id(), ids[0]))
            .await
            .unwrap_err();
        assert_transition(err, ProposalAction::Approve, ProposalStatus::Rejected);

        let stored = fx.repo.find_by_id(revision.id()).await.unwrap().unwrap();
        assert_eq!(stored.words_cut_so_far(), 0);
        assert_eq!(stored.chapters_reviewed(), 1);
        assert_eq!(stored.current_word_count(), 100);
    }

    #[tokio::test]
    async fn test_condenser_failure_becomes_error_state() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, Some(FAIL_MARKER), None)]);
        let revision = fx.start(book_id, 80, 5.0).await;

        let proposal = fx
            .generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap();
        assert_eq!(proposal.status(), ProposalStatus::Error);
        assert!(proposal.error_message().unwrap().contains("refused by policy"));
        assert!(proposal.condensed_content().is_none());
        assert!(proposal.actual_reduction().is_none());

        // error 可以重试
        let retried = fx
            .generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap();
        assert_eq!(retried.status(), ProposalStatus::Error);
        assert_eq!(fx.condenser.calls(), 2);

        let err = fx
            .approve_handler()
            .handle(approve(revision.id(), ids[0]))
            .await
            .unwrap_err();
        assert_transition(err, ProposalAction::Approve, ProposalStatus::Error);
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_state() {
        let fx = Fixture::new()
            .await
            .with_timeout(std::time::Duration::from_millis(50));
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, Some(SLOW_MARKER), None)]);
        let revision = fx.start(book_id, 80, 5.0).await;

        let proposal = fx
            .generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap();
        assert_eq!(proposal.status(), ProposalStatus::Error);
        assert_eq!(proposal.error_message(), Some("Request timeout"));

        let stored = fx
            .repo
            .find_proposal(revision.id(), ids[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status(), ProposalStatus::Error);
    }

    #[tokio::test]
    async fn test_longer_output_is_rejected() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, Some(GROW_MARKER), None)]);
        let revision = fx.start(book_id, 80, 5.0).await;

        let proposal = fx
            .generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap();
        assert_eq!(proposal.status(), ProposalStatus::Error);
        assert!(proposal.condensed_word_count().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_generate_is_guarded() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, Some(SLOW_MARKER), None)]);
        let revision = fx.start(book_id, 80, 5.0).await;
        let handler = fx.generate_handler();

        let (a, b) = tokio::join!(
            handler.handle(generate(revision.id(), ids[0])),
            handler.handle(generate(revision.id(), ids[0]))
        );

        let (ok, err) = match (a, b) {
            (Ok(p), Err(e)) | (Err(e), Ok(p)) => (p, e),
            other => panic!("expected exactly one success: {other:?}"),
        };
        assert_eq!(ok.status(), ProposalStatus::Ready);
        assert_transition(err, ProposalAction::Generate, ProposalStatus::Generating);
        assert_eq!(fx.condenser.calls(), 1);
    }

    #[tokio::test]
    async fn test_applied_chapter_cannot_regenerate() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 80, 5.0).await;

        fx.generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap();
        fx.approve_handler()
            .handle(approve(revision.id(), ids[0]))
            .await
            .unwrap();

        let err = fx
            .generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap_err();
        assert_transition(err, ProposalAction::Generate, ProposalStatus::Applied);
    }

    #[tokio::test]
    async fn test_closed_revision_refuses_proposal_operations() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 80, 5.0).await;
        fx.close_handler()
            .abandon(AbandonRevision {
                revision_id: revision.id(),
            })
            .await
            .unwrap();

        let err = fx
            .generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(RevisionError::NotActive { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_chapter_is_not_found() {
        let fx = Fixture::new().await;
        let (book_id, _) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 80, 5.0).await;

        let err = fx
            .generate_handler()
            .handle(generate(revision.id(), Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::NotFound {
                resource_type: "Chapter",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_generation_survives_dropped_caller() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, Some(SLOW_MARKER), None)]);
        let revision = fx.start(book_id, 80, 5.0).await;
        let handler = fx.generate_handler();

        let cut_short = tokio::time::timeout(
            Duration::from_millis(50),
            handler.handle(generate(revision.id(), ids[0])),
        )
        .await;
        assert!(cut_short.is_err());

        tokio::time::sleep(SLOW_DELAY * 2).await;

        let stored = fx
            .repo
            .find_proposal(revision.id(), ids[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status(), ProposalStatus::Ready);

        let revision = fx
            .approve_handler()
            .handle(approve(revision.id(), ids[0]))
            .await
            .unwrap();
        assert_eq!(revision.words_cut_so_far(), 20);
    }

    #[tokio::test]
    async fn test_unsaved_result_falls_back_to_error() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 80, 5.0).await;
        let handler = GenerateProposalHandler::new(
            Arc::new(ReadyWriteFails {
                inner: fx.repo.clone(),
            }),
            fx.condenser.clone(),
            fx.locks.clone(),
            fx.timeout,
        );

        let err = handler
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::RepositoryError(_)));

        let stored = fx
            .repo
            .find_proposal(revision.id(), ids[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status(), ProposalStatus::Error);
        assert!(stored
            .error_message()
            .unwrap()
            .starts_with("failed to save generation result"));

        // error 可以重试
        let retried = fx
            .generate_handler()
            .handle(generate(revision.id(), ids[0]))
            .await
            .unwrap();
        assert_eq!(retried.status(), ProposalStatus::Ready);
    }
}
