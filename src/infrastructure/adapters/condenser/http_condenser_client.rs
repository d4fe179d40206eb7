//! HTTP Content Condenser - 调用外部文本压缩服务
//!
//! 实现 ContentCondenserPort trait
//!
//! 外部压缩 API:
//! POST {base_url}/api/condense
//! Request:  {"originalContent": "...", "originalWordCount": 1200, "targetWordCount": 900, "vebIssues": {...}}
//! Response: {"condensedContent": "...", "condensedWordCount": 880,
//!            "cutsExplanation": [{"whatWasCut": "...", "why": "...", "wordsRemoved": 120}],
//!            "preservedElements": ["..."]}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    CondenseRequest, CondenseResponse, CondenserError, ContentCondenserPort,
};
use crate::domain::count_words;
use crate::domain::revision::{CutExplanation, IssueContext};

/// 压缩请求体 (JSON)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CondenseHttpRequest<'a> {
    original_content: &'a str,
    original_word_count: u32,
    target_word_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    veb_issues: Option<&'a IssueContext>,
}

/// 压缩响应体 (JSON)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CondenseHttpResponse {
    condensed_content: String,
    /// 服务端未返回时本地计数
    #[serde(default)]
    condensed_word_count: Option<u32>,
    #[serde(default)]
    cuts_explanation: Vec<CutExplanation>,
    #[serde(default)]
    preserved_elements: Vec<String>,
}

/// HTTP 压缩客户端配置
#[derive(Debug, Clone)]
pub struct HttpCondenserConfig {
    /// 压缩服务基础 URL
    pub base_url: String,
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
    /// 网络错误/超时的重试次数
    pub max_retries: u32,
}

impl Default for HttpCondenserConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            timeout_secs: 120,
            max_retries: 1,
        }
    }
}

impl HttpCondenserConfig {
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

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// HTTP 压缩客户端
pub struct HttpContentCondenser {
    client: Client,
    config: HttpCondenserConfig,
}

impl HttpContentCondenser {
    pub fn new(config: HttpCondenserConfig) -> Result<Self, CondenserError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CondenserError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn condense_url(&self) -> String {
        format!("{}/api/condense", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    async fn condense_once(
        &self,
        body: &CondenseHttpRequest<'_>,
    ) -> Result<CondenseResponse, CondenserError> {
        let response = self
            .client
            .post(self.condense_url())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CondenserError::Timeout
                } else if e.is_connect() {
                    CondenserError::NetworkError(format!("Cannot connect to condenser: {}", e))
                } else {
                    CondenserError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_text));
        }

        let parsed: CondenseHttpResponse = response
            .json()
            .await
            .map_err(|e| CondenserError::InvalidResponse(e.to_string()))?;

        let condensed_word_count = parsed
            .condensed_word_count
            .unwrap_or_else(|| count_words(&parsed.condensed_content));

        Ok(CondenseResponse {
            condensed_content: parsed.condensed_content,
            condensed_word_count,
            cuts_explanation: parsed.cuts_explanation,
            preserved_elements: parsed.preserved_elements,
        })
    }
}

/// 非 2xx 响应映射为错误
fn status_error(status: StatusCode, body: String) -> CondenserError {
    match status {
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS => {
            CondenserError::ContentPolicy(body)
        }
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => CondenserError::Timeout,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            CondenserError::NetworkError(format!("HTTP {}: {}", status, body))
        }
        _ => CondenserError::ServiceError(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl ContentCondenserPort for HttpContentCondenser {
    async fn condense(&self, request: CondenseRequest) -> Result<CondenseResponse, CondenserError> {
        let body = CondenseHttpRequest {
            original_content: &request.original_content,
            original_word_count: request.original_word_count,
            target_word_count: request.target_word_count,
            veb_issues: request.veb_issues.as_ref(),
        };

        let mut attempt = 0;
        loop {
            tracing::debug!(
                url = %self.condense_url(),
                attempt = attempt,
                original_word_count = body.original_word_count,
                target_word_count = body.target_word_count,
                "Sending condense request"
            );

            match self.condense_once(&body).await {
                Ok(response) => {
                    tracing::info!(
                        condensed_word_count = response.condensed_word_count,
                        cuts = response.cuts_explanation.len(),
                        "Condense request completed"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt = attempt, "Condense request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
