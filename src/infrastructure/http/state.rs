//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;
use std::time::Duration;

use crate::application::{
    // Command handlers
    ApproveAllHandler, ApproveProposalHandler, CloseRevisionHandler, GenerateAllHandler,
    GenerateProposalHandler, RejectProposalHandler, RevisionSettings, StartRevisionHandler,
    // Query handlers
    GetActiveRevisionHandler, GetBatchStatusHandler, GetProposalHandler, GetRevisionHandler,
    GetRevisionProgressHandler, ListProposalsHandler,
    // Ports
    BatchTrackerPort, ChapterSourcePort, ContentCondenserPort, RevisionLockPort,
    RevisionRepositoryPort,
};

/// 运行参数
#[derive(Debug, Clone, Copy)]
pub struct StateOptions {
    pub revision: RevisionSettings,
    /// 请求未指定容差时使用
    pub default_tolerance_percent: f64,
    /// 单章压缩调用的超时
    pub generation_timeout: Duration,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            revision: RevisionSettings::default(),
            default_tolerance_percent: 5.0,
            generation_timeout: Duration::from_secs(180),
        }
    }
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub condenser: Arc<dyn ContentCondenserPort>,
    pub default_tolerance_percent: f64,

    // ========== Command Handlers ==========
    pub start_revision_handler: StartRevisionHandler,
    pub close_revision_handler: CloseRevisionHandler,
    pub generate_proposal_handler: Arc<GenerateProposalHandler>,
    pub approve_proposal_handler: Arc<ApproveProposalHandler>,
    pub reject_proposal_handler: RejectProposalHandler,
    pub generate_all_handler: GenerateAllHandler,
    pub approve_all_handler: ApproveAllHandler,

    // ========== Query Handlers ==========
    pub get_revision_handler: GetRevisionHandler,
    pub get_active_revision_handler: GetActiveRevisionHandler,
    pub get_progress_handler: GetRevisionProgressHandler,
    pub list_proposals_handler: ListProposalsHandler,
    pub get_proposal_handler: GetProposalHandler,
    pub get_batch_status_handler: GetBatchStatusHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        revision_repo: Arc<dyn RevisionRepositoryPort>,
        condenser: Arc<dyn ContentCondenserPort>,
        chapter_source: Arc<dyn ChapterSourcePort>,
        locks: Arc<dyn RevisionLockPort>,
        batch_tracker: Arc<dyn BatchTrackerPort>,
        options: StateOptions,
    ) -> Self {
        let generate_proposal_handler = Arc::new(GenerateProposalHandler::new(
            revision_repo.clone(),
            condenser.clone(),
            locks.clone(),
            options.generation_timeout,
        ));
        let approve_proposal_handler = Arc::new(ApproveProposalHandler::new(
            revision_repo.clone(),
            locks.clone(),
        ));

        Self {
            // Ports
            condenser: condenser.clone(),
            default_tolerance_percent: options.default_tolerance_percent,

            // Command handlers
            start_revision_handler: StartRevisionHandler::new(
                revision_repo.clone(),
                chapter_source,
                locks.clone(),
                options.revision,
            ),
            close_revision_handler: CloseRevisionHandler::new(
                revision_repo.clone(),
                locks.clone(),
                batch_tracker.clone(),
            ),
            generate_proposal_handler: generate_proposal_handler.clone(),
            approve_proposal_handler: approve_proposal_handler.clone(),
            reject_proposal_handler: RejectProposalHandler::new(revision_repo.clone(), locks),
            generate_all_handler: GenerateAllHandler::new(
                revision_repo.clone(),
                batch_tracker.clone(),
                generate_proposal_handler,
            ),
            approve_all_handler: ApproveAllHandler::new(
                revision_repo.clone(),
                batch_tracker.clone(),
                approve_proposal_handler,
            ),

            // Query handlers
            get_revision_handler: GetRevisionHandler::new(revision_repo.clone()),
            get_active_revision_handler: GetActiveRevisionHandler::new(revision_repo.clone()),
            get_progress_handler: GetRevisionProgressHandler::new(revision_repo.clone()),
            list_proposals_handler: ListProposalsHandler::new(revision_repo.clone()),
            get_proposal_handler: GetProposalHandler::new(revision_repo),
            get_batch_status_handler: GetBatchStatusHandler::new(batch_tracker),
        }
    }
}
