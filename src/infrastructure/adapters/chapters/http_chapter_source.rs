//! HTTP Chapter Source - 从书籍服务读取章节快照
//!
//! GET {base_url}/api/books/{bookId}/chapters
//! Response: [{"chapterId": "...", "position": 0, "title": "...", "wordCount": 1200,
//!             "content": "...", "vebIssues": {...}}]

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use uuid::Uuid;

use crate::application::ports::{ChapterSnapshot, ChapterSourceError, ChapterSourcePort};

/// HTTP 章节来源配置
#[derive(Debug, Clone)]
pub struct HttpChapterSourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for HttpChapterSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpChapterSourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 章节来源
pub struct HttpChapterSource {
    client: Client,
    config: HttpChapterSourceConfig,
}

impl HttpChapterSource {
    pub fn new(config: HttpChapterSourceConfig) -> Result<Self, ChapterSourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChapterSourceError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn chapters_url(&self, book_id: Uuid) -> String {
        format!(
            "{}/api/books/{}/chapters",
            self.config.base_url.trim_end_matches('/'),
            book_id
        )
    }
}

#[async_trait]
impl ChapterSourcePort for HttpChapterSource {
    async fn load_chapters(&self, book_id: Uuid) -> Result<Vec<ChapterSnapshot>, ChapterSourceError> {
        let url = self.chapters_url(book_id);
        tracing::debug!(url = %url, "Loading book chapters");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChapterSourceError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ChapterSourceError::BookNotFound(book_id));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChapterSourceError::NetworkError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let chapters: Vec<ChapterSnapshot> = response
            .json()
            .await
            .map_err(|e| ChapterSourceError::InvalidResponse(e.to_string()))?;

        tracing::info!(book_id = %book_id, chapters = chapters.len(), "Book chapters loaded");
        Ok(chapters)
    }
}
