//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、ContentCondenser、ChapterSource、锁、批量进度）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Revision commands
    AbandonRevision,
    CompleteRevision,
    StartRevision,
    // Proposal commands
    ApproveProposal,
    GenerateProposal,
    RejectProposal,
    // Batch commands
    ApproveAll,
    BatchItemResult,
    BatchReport,
    GenerateAll,
    // Handlers
    handlers::{
        ApproveAllHandler, ApproveProposalHandler, CloseRevisionHandler, GenerateAllHandler,
        GenerateProposalHandler, RejectProposalHandler, RevisionSettings, StartRevisionHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Batch tracker
    BatchError,
    BatchKind,
    BatchProgress,
    BatchTrackerPort,
    // Chapter source
    ChapterSnapshot,
    ChapterSourceError,
    ChapterSourcePort,
    // Content condenser
    CondenseRequest,
    CondenseResponse,
    CondenserError,
    ContentCondenserPort,
    // Repositories
    RepositoryError,
    RevisionRepositoryPort,
    // Locks
    LockGuard,
    RevisionLockPort,
};

pub use queries::{
    GetActiveRevision,
    GetBatchStatus,
    GetProposal,
    GetRevision,
    GetRevisionProgress,
    ListProposals,
    // Handlers
    handlers::{
        GetActiveRevisionHandler, GetBatchStatusHandler, GetProposalHandler, GetRevisionHandler,
        GetRevisionProgressHandler, ListProposalsHandler, ProgressView,
    },
};
