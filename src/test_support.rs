//! 测试替身与夹具
//!
//! ScriptedCondenser 根据章节内容中的标记决定行为：
//! - `[[fail]]` 返回内容策略拒绝
//! - `[[slow]]` 先等待再返回
//! - `[[grow]]` 返回比原文更长的结果
//! - 其余情况截断到目标字数

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::{
    ApproveAllHandler, ApproveProposalHandler, ChapterSnapshot, CloseRevisionHandler,
    CondenseRequest, CondenseResponse, CondenserError, ContentCondenserPort, GenerateAllHandler,
    GenerateProposalHandler, RejectProposalHandler, RevisionSettings, StartRevision,
    StartRevisionHandler,
};
use crate::domain::count_words;
use crate::domain::revision::{CutExplanation, IssueContext, Revision};
use crate::infrastructure::http::{AppState, StateOptions};
use crate::infrastructure::memory::{
    InMemoryBatchTracker, InMemoryChapterSource, InMemoryRevisionLocks,
};
use crate::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteRevisionRepository,
};

pub(crate) const FAIL_MARKER: &str = "[[fail]]";
pub(crate) const SLOW_MARKER: &str = "[[slow]]";
pub(crate) const GROW_MARKER: &str = "[[grow]]";

pub(crate) const SLOW_DELAY: Duration = Duration::from_millis(300);

pub(crate) struct ScriptedCondenser {
    calls: AtomicUsize,
}

impl ScriptedCondenser {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentCondenserPort for ScriptedCondenser {
    async fn condense(&self, request: CondenseRequest) -> Result<CondenseResponse, CondenserError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = request.original_content;

        if content.contains(SLOW_MARKER) {
            tokio::time::sleep(SLOW_DELAY).await;
        }
        if content.contains(FAIL_MARKER) {
            return Err(CondenserError::ContentPolicy("refused by policy".to_string()));
        }
        if content.contains(GROW_MARKER) {
            let grown = format!("{} and then some more", content);
            return Ok(CondenseResponse {
                condensed_word_count: count_words(&grown),
                condensed_content: grown,
                cuts_explanation: Vec::new(),
                preserved_elements: Vec::new(),
            });
        }

        let words: Vec<&str> = content.split_whitespace().collect();
        let keep = (request.target_word_count as usize).min(words.len());
        let condensed = words[..keep].join(" ");
        Ok(CondenseResponse {
            condensed_word_count: count_words(&condensed),
            condensed_content: condensed,
            cuts_explanation: vec![CutExplanation {
                what_was_cut: "tail".to_string(),
                why: "over length".to_string(),
                words_removed: (words.len() - keep) as u32,
            }],
            preserved_elements: vec!["opening".to_string()],
        })
    }
}

/// 生成 n 个词的章节正文，可带一个行为标记（标记本身计为一个词）
pub(crate) fn chapter_text(words: u32, marker: Option<&str>) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(words as usize);
    if let Some(marker) = marker {
        parts.push(marker);
    }
    while parts.len() < words as usize {
        parts.push("word");
    }
    parts.join(" ")
}

pub(crate) fn chapter(
    position: u32,
    words: u32,
    marker: Option<&str>,
    veb_issues: Option<IssueContext>,
) -> ChapterSnapshot {
    let content = chapter_text(words, marker);
    ChapterSnapshot {
        chapter_id: Uuid::new_v4(),
        position,
        title: Some(format!("Chapter {}", position + 1)),
        word_count: count_words(&content),
        content,
        veb_issues,
    }
}

pub(crate) struct Fixture {
    pub repo: Arc<SqliteRevisionRepository>,
    pub source: Arc<InMemoryChapterSource>,
    pub locks: Arc<InMemoryRevisionLocks>,
    pub tracker: Arc<InMemoryBatchTracker>,
    pub condenser: Arc<ScriptedCondenser>,
    pub timeout: Duration,
}

impl Fixture {
    pub(crate) async fn new() -> Self {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        Self {
            repo: Arc::new(SqliteRevisionRepository::new(pool)),
            source: Arc::new(InMemoryChapterSource::new()),
            locks: Arc::new(InMemoryRevisionLocks::new()),
            tracker: Arc::new(InMemoryBatchTracker::new()),
            condenser: Arc::new(ScriptedCondenser::new()),
            timeout: Duration::from_secs(5),
        }
    }

    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 登记一本书，返回 book_id 和章节 id（按输入顺序）
    pub(crate) fn add_book(&self, chapters: Vec<ChapterSnapshot>) -> (Uuid, Vec<Uuid>) {
        let book_id = Uuid::new_v4();
        let ids = chapters.iter().map(|c| c.chapter_id).collect();
        self.source.put_book(book_id, chapters);
        (book_id, ids)
    }

    pub(crate) fn start_handler(&self) -> StartRevisionHandler {
        StartRevisionHandler::new(
            self.repo.clone(),
            self.source.clone(),
            self.locks.clone(),
            RevisionSettings::default(),
        )
    }

    pub(crate) fn close_handler(&self) -> CloseRevisionHandler {
        CloseRevisionHandler::new(
            self.repo.clone(),
            self.locks.clone(),
            self.tracker.clone(),
        )
    }

    pub(crate) fn generate_handler(&self) -> GenerateProposalHandler {
        GenerateProposalHandler::new(
            self.repo.clone(),
            self.condenser.clone(),
            self.locks.clone(),
            self.timeout,
        )
    }

    pub(crate) fn approve_handler(&self) -> ApproveProposalHandler {
        ApproveProposalHandler::new(self.repo.clone(), self.locks.clone())
    }

    pub(crate) fn reject_handler(&self) -> RejectProposalHandler {
        RejectProposalHandler::new(self.repo.clone(), self.locks.clone())
    }

    pub(crate) fn generate_all_handler(&self) -> GenerateAllHandler {
        GenerateAllHandler::new(
            self.repo.clone(),
            self.tracker.clone(),
            Arc::new(self.generate_handler()),
        )
    }

    pub(crate) fn approve_all_handler(&self) -> ApproveAllHandler {
        ApproveAllHandler::new(
            self.repo.clone(),
            self.tracker.clone(),
            Arc::new(self.approve_handler()),
        )
    }

    pub(crate) fn app_state(&self) -> AppState {
        AppState::new(
            self.repo.clone(),
            self.condenser.clone(),
            self.source.clone(),
            self.locks.clone(),
            self.tracker.clone(),
            StateOptions {
                generation_timeout: self.timeout,
                ..Default::default()
            },
        )
    }

    pub(crate) async fn start(&self, book_id: Uuid, target: u32, tolerance: f64) -> Revision {
        self.start_handler()
            .handle(StartRevision {
                book_id,
                target_word_count: target,
                tolerance_percent: tolerance,
            })
            .await
            .unwrap()
    }
}
