//! Revision Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{BatchProgress, BatchTrackerPort, RevisionRepositoryPort};
use crate::application::queries::{
    GetActiveRevision, GetBatchStatus, GetProposal, GetRevision, GetRevisionProgress,
    ListProposals,
};
use crate::domain::revision::{
    sort_by_priority, ChapterProposal, ProposalCounts, Revision, RevisionProgress,
};

// ============================================================================
// Response DTOs
// ============================================================================

/// 进度视图：修订进度 + 各状态提案数量
#[derive(Debug, Clone)]
pub struct ProgressView {
    pub progress: RevisionProgress,
    pub proposals: ProposalCounts,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetRevision Handler
pub struct GetRevisionHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
}

impl GetRevisionHandler {
    pub fn new(revision_repo: Arc<dyn RevisionRepositoryPort>) -> Self {
        Self { revision_repo }
    }

    pub async fn handle(&self, query: GetRevision) -> Result<Revision, ApplicationError> {
        self.revision_repo
            .find_by_id(query.revision_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Revision", query.revision_id))
    }
}

/// GetActiveRevision Handler
pub struct GetActiveRevisionHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
}

impl GetActiveRevisionHandler {
    pub fn new(revision_repo: Arc<dyn RevisionRepositoryPort>) -> Self {
        Self { revision_repo }
    }

    /// 没有进行中的修订时返回 None
    pub async fn handle(&self, query: GetActiveRevision) -> Result<Option<Revision>, ApplicationError> {
        Ok(self.revision_repo.find_active_by_book(query.book_id).await?)
    }
}

/// GetRevisionProgress Handler - 只读，无副作用
pub struct GetRevisionProgressHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
}

impl GetRevisionProgressHandler {
    pub fn new(revision_repo: Arc<dyn RevisionRepositoryPort>) -> Self {
        Self { revision_repo }
    }

    pub async fn handle(&self, query: GetRevisionProgress) -> Result<ProgressView, ApplicationError> {
        let revision = self
            .revision_repo
            .find_by_id(query.revision_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Revision", query.revision_id))?;
        let proposals = self.revision_repo.find_proposals(query.revision_id).await?;

        Ok(ProgressView {
            progress: revision.progress(),
            proposals: ProposalCounts::tally(&proposals),
        })
    }
}

/// ListProposals Handler
pub struct ListProposalsHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
}

impl ListProposalsHandler {
    pub fn new(revision_repo: Arc<dyn RevisionRepositoryPort>) -> Self {
        Self { revision_repo }
    }

    pub async fn handle(&self, query: ListProposals) -> Result<Vec<ChapterProposal>, ApplicationError> {
        self.revision_repo
            .find_by_id(query.revision_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Revision", query.revision_id))?;

        let mut proposals = self.revision_repo.find_proposals(query.revision_id).await?;
        sort_by_priority(&mut proposals);
        Ok(proposals)
    }
}

/// GetProposal Handler
pub struct GetProposalHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
}

impl GetProposalHandler {
    pub fn new(revision_repo: Arc<dyn RevisionRepositoryPort>) -> Self {
        Self { revision_repo }
    }

    pub async fn handle(&self, query: GetProposal) -> Result<ChapterProposal, ApplicationError> {
        self.revision_repo
            .find_proposal(query.revision_id, query.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", query.chapter_id))
    }
}

/// GetBatchStatus Handler
pub struct GetBatchStatusHandler {
    batch_tracker: Arc<dyn BatchTrackerPort>,
}

impl GetBatchStatusHandler {
    pub fn new(batch_tracker: Arc<dyn BatchTrackerPort>) -> Self {
        Self { batch_tracker }
    }

    pub fn handle(&self, query: GetBatchStatus) -> Option<BatchProgress> {
        self.batch_tracker.get(query.revision_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::GenerateProposal;
    use crate::domain::revision::{
        IssueContext, ProposalStatus, RevisionStatus, ScenePurpose, ScenePurposeVerdict,
    };
    use crate::test_support::{chapter, Fixture, FAIL_MARKER};
    use uuid::Uuid;

    fn flagged() -> Option<IssueContext> {
        Some(IssueContext {
            scene_purpose: Some(ScenePurpose {
                verdict: ScenePurposeVerdict::PartiallyEarned,
                reasoning: Some("drifts".to_string()),
            }),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_list_in_priority_order() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![
            chapter(0, 100, None, None),
            chapter(1, 100, None, flagged()),
            chapter(2, 100, None, None),
        ]);
        let revision = fx.start(book_id, 240, 5.0).await;

        let proposals = ListProposalsHandler::new(fx.repo.clone())
            .handle(ListProposals {
                revision_id: revision.id(),
            })
            .await
            .unwrap();

        let order: Vec<Uuid> = proposals.iter().map(|p| p.chapter_id()).collect();
        assert_eq!(order, vec![ids[1], ids[0], ids[2]]);
    }

    #[tokio::test]
    async fn test_progress_counts_proposals() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![
            chapter(0, 100, None, None),
            chapter(1, 100, Some(FAIL_MARKER), None),
            chapter(2, 100, None, None),
        ]);
        let revision = fx.start(book_id, 270, 5.0).await;
        let generate = fx.generate_handler();
        for id in &ids[..2] {
            generate
                .handle(GenerateProposal {
                    revision_id: revision.id(),
                    chapter_id: *id,
                })
                .await
                .unwrap();
        }

        let view = GetRevisionProgressHandler::new(fx.repo.clone())
            .handle(GetRevisionProgress {
                revision_id: revision.id(),
            })
            .await
            .unwrap();

        assert_eq!(view.progress.status, RevisionStatus::Active);
        assert_eq!(view.progress.words_reduced, 0);
        assert_eq!(view.progress.percent_complete, 0.0);
        assert_eq!(view.proposals.pending, 1);
        assert_eq!(view.proposals.ready, 1);
        assert_eq!(view.proposals.error, 1);
    }

    #[tokio::test]
    async fn test_missing_lookups() {
        let fx = Fixture::new().await;
        let err = GetRevisionHandler::new(fx.repo.clone())
            .handle(GetRevision {
                revision_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));

        let active = GetActiveRevisionHandler::new(fx.repo.clone())
            .handle(GetActiveRevision {
                book_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
        assert!(active.is_none());

        let status = GetBatchStatusHandler::new(fx.tracker.clone()).handle(GetBatchStatus {
            revision_id: Uuid::new_v4(),
        });
        assert!(status.is_none());
    }

    #[tokio::test]
    async fn test_get_proposal_after_generation() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let revision = fx.start(book_id, 90, 5.0).await;
        fx.generate_handler()
            .handle(GenerateProposal {
                revision_id: revision.id(),
                chapter_id: ids[0],
            })
            .await
            .unwrap();

        let proposal = GetProposalHandler::new(fx.repo.clone())
            .handle(GetProposal {
                revision_id: revision.id(),
                chapter_id: ids[0],
            })
            .await
            .unwrap();
        assert_eq!(proposal.status(), ProposalStatus::Ready);
        assert_eq!(proposal.condensed_word_count(), Some(90));
    }
}
