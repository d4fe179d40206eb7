//! Domain Layer - 领域层
//!
//! 包含:
//! - Revision Context: 修订聚合与章节提案状态机
//! - 纯函数: 容差计算、优先级评分、删减分配、字数统计

pub mod apportion;
pub mod priority;
pub mod revision;
pub mod tolerance;

mod word_count;

pub use apportion::{apportion_cuts, ChapterWeight};
pub use priority::priority_score;
pub use tolerance::{ToleranceBand, ToleranceStatus};
pub use word_count::count_words;
