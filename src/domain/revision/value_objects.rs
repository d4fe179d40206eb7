//! Revision Context - Value Objects

use serde::{Deserialize, Serialize};

/// 修订状态
///
/// 同一本书同一时刻最多只有一个 Active 修订
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    /// 进行中
    Active,
    /// 已完成（字数落入容差区间）
    Completed,
    /// 已放弃
    Abandoned,
}

impl RevisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionStatus::Active => "active",
            RevisionStatus::Completed => "completed",
            RevisionStatus::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(RevisionStatus::Active),
            "completed" => Some(RevisionStatus::Completed),
            "abandoned" => Some(RevisionStatus::Abandoned),
            _ => None,
        }
    }
}

impl std::fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 章节压缩提案状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// 等待生成
    Pending,
    /// 生成中（外部调用进行中）
    Generating,
    /// 可审阅
    Ready,
    /// 已应用
    Applied,
    /// 已拒绝
    Rejected,
    /// 生成失败
    Error,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Generating => "generating",
            ProposalStatus::Ready => "ready",
            ProposalStatus::Applied => "applied",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProposalStatus::Pending),
            "generating" => Some(ProposalStatus::Generating),
            "ready" => Some(ProposalStatus::Ready),
            "applied" => Some(ProposalStatus::Applied),
            "rejected" => Some(ProposalStatus::Rejected),
            "error" => Some(ProposalStatus::Error),
            _ => None,
        }
    }

    /// 是否可以触发生成（首次或失败重试）
    pub fn can_generate(&self) -> bool {
        matches!(self, ProposalStatus::Pending | ProposalStatus::Error)
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 提案状态机上的动作，用于错误信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalAction {
    Generate,
    CompleteGeneration,
    FailGeneration,
    Approve,
    Reject,
}

impl std::fmt::Display for ProposalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProposalAction::Generate => "generate",
            ProposalAction::CompleteGeneration => "complete_generation",
            ProposalAction::FailGeneration => "fail_generation",
            ProposalAction::Approve => "approve",
            ProposalAction::Reject => "reject",
        };
        f.write_str(s)
    }
}

/// 问题严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

/// 场景目的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenePurposeVerdict {
    Earned,
    PartiallyEarned,
    NotEarned,
}

/// 场景目的评估
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePurpose {
    pub verdict: ScenePurposeVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// 单条编辑问题（说明性 / 节奏）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorialIssue {
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
}

impl EditorialIssue {
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
        }
    }
}

/// 章节的编辑问题上下文
///
/// 只作为评分和压缩提示的输入，修订流程中不会修改
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_purpose: Option<ScenePurpose>,
    #[serde(default)]
    pub exposition_issues: Vec<EditorialIssue>,
    #[serde(default)]
    pub pacing_issues: Vec<EditorialIssue>,
}

impl IssueContext {
    /// 没有任何评估结果（等同于缺少上下文）
    pub fn is_empty(&self) -> bool {
        self.scene_purpose.is_none()
            && self.exposition_issues.is_empty()
            && self.pacing_issues.is_empty()
    }
}

/// 单处删减说明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutExplanation {
    pub what_was_cut: String,
    pub why: String,
    pub words_removed: u32,
}

/// 压缩结果（由外部压缩服务产出，写入提案前的中间形态）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondensedDraft {
    pub content: String,
    pub word_count: u32,
    pub cuts_explanation: Vec<CutExplanation>,
    pub preserved_elements: Vec<String>,
}
