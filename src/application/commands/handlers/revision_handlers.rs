//! Revision Command Handlers

use std::sync::Arc;

use crate::application::commands::{AbandonRevision, CompleteRevision, StartRevision};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BatchTrackerPort, ChapterSourcePort, RepositoryError, RevisionLockPort,
    RevisionRepositoryPort,
};
use crate::domain::revision::{ChapterProposal, ProposalSeed, Revision, RevisionError};
use crate::domain::{apportion_cuts, priority_score, tolerance, ChapterWeight};

// ============================================================================
// StartRevision
// ============================================================================

/// 开始修订的可调参数
#[derive(Debug, Clone, Copy)]
pub struct RevisionSettings {
    /// 单章最多删减比例 (0, 1]
    pub max_chapter_reduction: f64,
}

impl Default for RevisionSettings {
    fn default() -> Self {
        Self {
            max_chapter_reduction: 0.5,
        }
    }
}

/// StartRevision Handler - 创建修订并为每章创建 pending 提案
pub struct StartRevisionHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
    chapter_source: Arc<dyn ChapterSourcePort>,
    locks: Arc<dyn RevisionLockPort>,
    settings: RevisionSettings,
}

impl StartRevisionHandler {
    pub fn new(
        revision_repo: Arc<dyn RevisionRepositoryPort>,
        chapter_source: Arc<dyn ChapterSourcePort>,
        locks: Arc<dyn RevisionLockPort>,
        settings: RevisionSettings,
    ) -> Self {
        Self {
            revision_repo,
            chapter_source,
            locks,
            settings,
        }
    }

    pub async fn handle(&self, command: StartRevision) -> Result<Revision, ApplicationError> {
        if command.target_word_count == 0 {
            return Err(RevisionError::InvalidTargetWordCount(command.target_word_count).into());
        }
        if !tolerance::is_valid_tolerance(command.tolerance_percent) {
            return Err(RevisionError::InvalidTolerance(command.tolerance_percent).into());
        }

        // 同一本书的开始操作串行执行
        let book_id = command.book_id;
        let guard = self.locks.acquire(book_id).await;
        let result = self.start_locked(command).await;
        drop(guard);
        self.locks.release(book_id);
        result
    }

    async fn start_locked(&self, command: StartRevision) -> Result<Revision, ApplicationError> {
        if let Some(active) = self.revision_repo.find_active_by_book(command.book_id).await? {
            return Err(ApplicationError::ActiveRevisionExists {
                book_id: command.book_id,
                revision_id: active.id(),
            });
        }

        let mut chapters = self.chapter_source.load_chapters(command.book_id).await?;
        if chapters.is_empty() {
            return Err(ApplicationError::validation(format!(
                "Book {} has no chapters",
                command.book_id
            )));
        }
        chapters.sort_by_key(|c| c.position);

        let total_words: u64 = chapters.iter().map(|c| u64::from(c.word_count)).sum();
        let current_word_count = u32::try_from(total_words).unwrap_or(u32::MAX);

        let revision = Revision::start(
            command.book_id,
            current_word_count,
            command.target_word_count,
            command.tolerance_percent,
            chapters.len() as u32,
        )?;

        let weights: Vec<ChapterWeight> = chapters
            .iter()
            .map(|c| ChapterWeight {
                word_count: c.word_count,
                priority_score: priority_score(c.veb_issues.as_ref()),
            })
            .collect();
        let cuts = apportion_cuts(
            &weights,
            revision.words_to_cut(),
            self.settings.max_chapter_reduction,
        );

        let allotted: u64 = cuts.iter().map(|&c| u64::from(c)).sum();
        if allotted < u64::from(revision.words_to_cut()) {
            tracing::warn!(
                book_id = %command.book_id,
                words_to_cut = revision.words_to_cut(),
                allotted = allotted,
                "Per-chapter reduction cap prevents reaching the target"
            );
        }

        let proposals: Vec<ChapterProposal> = chapters
            .into_iter()
            .zip(cuts)
            .map(|(chapter, cut)| {
                ChapterProposal::new(
                    revision.id(),
                    ProposalSeed {
                        chapter_id: chapter.chapter_id,
                        position: chapter.position,
                        title: chapter.title,
                        content: chapter.content,
                        word_count: chapter.word_count,
                        target_word_count: chapter.word_count - cut,
                        veb_issues: chapter.veb_issues,
                    },
                )
            })
            .collect();

        match self.revision_repo.create_revision(&revision, &proposals).await {
            Ok(()) => {}
            Err(RepositoryError::Duplicate(msg)) => {
                tracing::warn!(book_id = %command.book_id, error = %msg, "Active revision raced");
                let active = self
                    .revision_repo
                    .find_active_by_book(command.book_id)
                    .await?
                    .ok_or_else(|| ApplicationError::internal(msg))?;
                return Err(ApplicationError::ActiveRevisionExists {
                    book_id: command.book_id,
                    revision_id: active.id(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            revision_id = %revision.id(),
            book_id = %command.book_id,
            current_word_count = revision.current_word_count(),
            target_word_count = revision.target_word_count(),
            words_to_cut = revision.words_to_cut(),
            chapters = proposals.len(),
            "Revision started"
        );

        Ok(revision)
    }
}

// ============================================================================
// CompleteRevision / AbandonRevision
// ============================================================================

/// CloseRevision Handler - 完成或放弃修订
///
/// 关闭后释放该修订在内存中的锁和批量进度记录
pub struct CloseRevisionHandler {
    revision_repo: Arc<dyn RevisionRepositoryPort>,
    locks: Arc<dyn RevisionLockPort>,
    batch_tracker: Arc<dyn BatchTrackerPort>,
}

impl CloseRevisionHandler {
    pub fn new(
        revision_repo: Arc<dyn RevisionRepositoryPort>,
        locks: Arc<dyn RevisionLockPort>,
        batch_tracker: Arc<dyn BatchTrackerPort>,
    ) -> Self {
        Self {
            revision_repo,
            locks,
            batch_tracker,
        }
    }

    fn forget(&self, revision_id: uuid::Uuid) {
        self.locks.release(revision_id);
        self.batch_tracker.remove(revision_id);
    }

    async fn load(&self, revision_id: uuid::Uuid) -> Result<Revision, ApplicationError> {
        self.revision_repo
            .find_by_id(revision_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Revision", revision_id))
    }

    pub async fn complete(&self, command: CompleteRevision) -> Result<Revision, ApplicationError> {
        let guard = self.locks.acquire(command.revision_id).await;
        let mut revision = self.load(command.revision_id).await?;

        revision.complete()?;
        self.revision_repo.update_revision(&revision).await?;
        drop(guard);
        self.forget(command.revision_id);

        tracing::info!(
            revision_id = %revision.id(),
            current_word_count = revision.current_word_count(),
            words_cut = revision.words_cut_so_far(),
            "Revision completed"
        );
        Ok(revision)
    }

    pub async fn abandon(&self, command: AbandonRevision) -> Result<Revision, ApplicationError> {
        let guard = self.locks.acquire(command.revision_id).await;
        let mut revision = self.load(command.revision_id).await?;

        revision.abandon()?;
        self.revision_repo.update_revision(&revision).await?;
        drop(guard);
        self.forget(command.revision_id);

        tracing::info!(
            revision_id = %revision.id(),
            chapters_reviewed = revision.chapters_reviewed(),
            "Revision abandoned"
        );
        Ok(revision)
    }
}
