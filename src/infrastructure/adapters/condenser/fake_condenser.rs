//! Fake Content Condenser - 本地运行和测试用
//!
//! 不调用外部服务，直接把原文截断到目标字数

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{
    CondenseRequest, CondenseResponse, CondenserError, ContentCondenserPort,
};
use crate::domain::count_words;
use crate::domain::revision::CutExplanation;

/// Fake Condenser 配置
#[derive(Debug, Clone, Default)]
pub struct FakeCondenserConfig {
    /// 模拟处理延迟
    pub delay: Duration,
}

/// Fake Content Condenser
///
/// 保留前 target_word_count 个词，并给出一条删减说明
pub struct FakeContentCondenser {
    config: FakeCondenserConfig,
}

impl FakeContentCondenser {
    pub fn new(config: FakeCondenserConfig) -> Self {
        tracing::info!(delay_ms = config.delay.as_millis() as u64, "FakeContentCondenser initialized");
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeCondenserConfig::default())
    }
}

#[async_trait]
impl ContentCondenserPort for FakeContentCondenser {
    async fn condense(&self, request: CondenseRequest) -> Result<CondenseResponse, CondenserError> {
        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }

        let words: Vec<&str> = request.original_content.split_whitespace().collect();
        let keep = (request.target_word_count as usize).min(words.len());
        let condensed_content = words[..keep].join(" ");
        let condensed_word_count = count_words(&condensed_content);
        let removed = words.len() - keep;

        tracing::debug!(
            original_words = words.len(),
            kept = keep,
            "FakeContentCondenser: truncated chapter"
        );

        let cuts_explanation = if removed > 0 {
            vec![CutExplanation {
                what_was_cut: "chapter tail".to_string(),
                why: "truncated to target length".to_string(),
                words_removed: removed as u32,
            }]
        } else {
            Vec::new()
        };

        Ok(CondenseResponse {
            condensed_content,
            condensed_word_count,
            cuts_explanation,
            preserved_elements: Vec::new(),
        })
    }
}
