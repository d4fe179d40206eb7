//! In-Memory Chapter Source
//!
//! 本地开发和测试用：章节快照直接保存在内存里

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{ChapterSnapshot, ChapterSourceError, ChapterSourcePort};

/// 内存章节来源
pub struct InMemoryChapterSource {
    books: DashMap<Uuid, Vec<ChapterSnapshot>>,
}

impl InMemoryChapterSource {
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 设置（覆盖）一本书的章节
    pub fn put_book(&self, book_id: Uuid, chapters: Vec<ChapterSnapshot>) {
        tracing::debug!(book_id = %book_id, chapters = chapters.len(), "Book chapters stored");
        self.books.insert(book_id, chapters);
    }
}

impl Default for InMemoryChapterSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChapterSourcePort for InMemoryChapterSource {
    async fn load_chapters(&self, book_id: Uuid) -> Result<Vec<ChapterSnapshot>, ChapterSourceError> {
        self.books
            .get(&book_id)
            .map(|chapters| chapters.clone())
            .ok_or(ChapterSourceError::BookNotFound(book_id))
    }
}
