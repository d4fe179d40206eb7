//! Revision Handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    AbandonRevision, CompleteRevision, GetActiveRevision, GetRevision, GetRevisionProgress,
    StartRevision,
};
use crate::infrastructure::http::dto::{ApiResponse, ProgressDto, RevisionDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Start
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRevisionRequest {
    pub book_id: Uuid,
    pub target_word_count: u32,
    /// 缺省时使用配置中的默认容差
    #[serde(default)]
    pub tolerance_percent: Option<f64>,
}

pub async fn start_revision(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRevisionRequest>,
) -> Result<Json<ApiResponse<RevisionDto>>, ApiError> {
    let cmd = StartRevision {
        book_id: req.book_id,
        target_word_count: req.target_word_count,
        tolerance_percent: req
            .tolerance_percent
            .unwrap_or(state.default_tolerance_percent),
    };

    let revision = state.start_revision_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(RevisionDto::from(&revision))))
}

// ============================================================================
// Get / Active / Progress
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RevisionIdRequest {
    pub revision_id: Uuid,
}

pub async fn get_revision(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevisionIdRequest>,
) -> Result<Json<ApiResponse<RevisionDto>>, ApiError> {
    let revision = state
        .get_revision_handler
        .handle(GetRevision {
            revision_id: req.revision_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(RevisionDto::from(&revision))))
}

#[derive(Debug, Deserialize)]
pub struct ActiveRevisionRequest {
    pub book_id: Uuid,
}

/// 没有进行中的修订时 data 为 null
pub async fn get_active_revision(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActiveRevisionRequest>,
) -> Result<Json<ApiResponse<Option<RevisionDto>>>, ApiError> {
    let revision = state
        .get_active_revision_handler
        .handle(GetActiveRevision {
            book_id: req.book_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        revision.as_ref().map(RevisionDto::from),
    )))
}

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevisionIdRequest>,
) -> Result<Json<ApiResponse<ProgressDto>>, ApiError> {
    let view = state
        .get_progress_handler
        .handle(GetRevisionProgress {
            revision_id: req.revision_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ProgressDto::from(view))))
}

// ============================================================================
// Complete / Abandon
// ============================================================================

pub async fn complete_revision(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevisionIdRequest>,
) -> Result<Json<ApiResponse<RevisionDto>>, ApiError> {
    let revision = state
        .close_revision_handler
        .complete(CompleteRevision {
            revision_id: req.revision_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(RevisionDto::from(&revision))))
}

pub async fn abandon_revision(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevisionIdRequest>,
) -> Result<Json<ApiResponse<RevisionDto>>, ApiError> {
    let revision = state
        .close_revision_handler
        .abandon(AbandonRevision {
            revision_id: req.revision_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(RevisionDto::from(&revision))))
}
