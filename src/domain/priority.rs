//! 章节优先级评分
//!
//! 根据编辑问题的严重程度给章节打分（0-100，越高越急）。
//! 分数只影响默认处理顺序和展示，不会阻塞任何状态转换。

use crate::domain::revision::{IssueContext, ScenePurposeVerdict, Severity};

/// 没有问题上下文（或上下文为空）的章节的基础分
pub const BASELINE_SCORE: u8 = 10;

const SCENE_NOT_EARNED_WEIGHT: u32 = 40;
const SCENE_PARTIALLY_EARNED_WEIGHT: u32 = 15;

const MAX_SCORE: u32 = 100;

fn exposition_weight(severity: Severity) -> u32 {
    match severity {
        Severity::Minor => 5,
        Severity::Moderate => 10,
        Severity::Major => 20,
    }
}

fn pacing_weight(severity: Severity) -> u32 {
    match severity {
        Severity::Minor => 3,
        Severity::Moderate => 8,
        Severity::Major => 15,
    }
}

/// 计算章节优先级
pub fn priority_score(issues: Option<&IssueContext>) -> u8 {
    let Some(issues) = issues.filter(|i| !i.is_empty()) else {
        return BASELINE_SCORE;
    };

    let mut score: u32 = 0;

    if let Some(purpose) = &issues.scene_purpose {
        score += match purpose.verdict {
            ScenePurposeVerdict::NotEarned => SCENE_NOT_EARNED_WEIGHT,
            ScenePurposeVerdict::PartiallyEarned => SCENE_PARTIALLY_EARNED_WEIGHT,
            ScenePurposeVerdict::Earned => 0,
        };
    }

    score += issues
        .exposition_issues
        .iter()
        .map(|i| exposition_weight(i.severity))
        .sum::<u32>();

    score += issues
        .pacing_issues
        .iter()
        .map(|i| pacing_weight(i.severity))
        .sum::<u32>();

    score.min(MAX_SCORE) as u8
}
