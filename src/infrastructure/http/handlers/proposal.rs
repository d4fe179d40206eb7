//! Proposal Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    ApproveProposal, GenerateProposal, GetProposal, ListProposals, RejectProposal,
};
use crate::infrastructure::http::dto::{
    ApiResponse, ProposalDto, ProposalSummaryDto, RevisionDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::handlers::RevisionIdRequest;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChapterRequest {
    pub revision_id: Uuid,
    pub chapter_id: Uuid,
}

// ============================================================================
// List / Get
// ============================================================================

/// 按优先级排序的提案列表
pub async fn list_proposals(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevisionIdRequest>,
) -> Result<Json<ApiResponse<Vec<ProposalSummaryDto>>>, ApiError> {
    let proposals = state
        .list_proposals_handler
        .handle(ListProposals {
            revision_id: req.revision_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        proposals.iter().map(ProposalSummaryDto::from).collect(),
    )))
}

pub async fn get_proposal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChapterRequest>,
) -> Result<Json<ApiResponse<ProposalDto>>, ApiError> {
    let proposal = state
        .get_proposal_handler
        .handle(GetProposal {
            revision_id: req.revision_id,
            chapter_id: req.chapter_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ProposalDto::from(&proposal))))
}

// ============================================================================
// Generate / Approve / Reject
// ============================================================================

/// 生成失败不是请求错误：返回 status = error 的提案
pub async fn generate_proposal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChapterRequest>,
) -> Result<Json<ApiResponse<ProposalDto>>, ApiError> {
    let proposal = state
        .generate_proposal_handler
        .handle(GenerateProposal {
            revision_id: req.revision_id,
            chapter_id: req.chapter_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ProposalDto::from(&proposal))))
}

#[derive(Debug, Serialize)]
pub struct ApproveResponseDto {
    pub chapter_id: Uuid,
    pub revision: RevisionDto,
}

pub async fn approve_proposal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChapterRequest>,
) -> Result<Json<ApiResponse<ApproveResponseDto>>, ApiError> {
    let revision = state
        .approve_proposal_handler
        .handle(ApproveProposal {
            revision_id: req.revision_id,
            chapter_id: req.chapter_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ApproveResponseDto {
        chapter_id: req.chapter_id,
        revision: RevisionDto::from(&revision),
    })))
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub revision_id: Uuid,
    pub chapter_id: Uuid,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn reject_proposal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<ApiResponse<ProposalDto>>, ApiError> {
    let proposal = state
        .reject_proposal_handler
        .handle(RejectProposal {
            revision_id: req.revision_id,
            chapter_id: req.chapter_id,
            notes: req.notes,
        })
        .await?;

    Ok(Json(ApiResponse::success(ProposalDto::from(&proposal))))
}
