//! Batch Handlers
//!
//! 批量操作在请求内同步执行，结束后返回完整报告；
//! 执行期间可通过 /api/batch/status 轮询进度

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{ApproveAll, BatchProgress, GenerateAll, GetBatchStatus};
use crate::infrastructure::http::dto::{ApiResponse, BatchReportDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::handlers::RevisionIdRequest;
use crate::infrastructure::http::state::AppState;

pub async fn generate_all(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevisionIdRequest>,
) -> Result<Json<ApiResponse<BatchReportDto>>, ApiError> {
    let report = state
        .generate_all_handler
        .handle(GenerateAll {
            revision_id: req.revision_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(BatchReportDto::from(report))))
}

pub async fn approve_all(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevisionIdRequest>,
) -> Result<Json<ApiResponse<BatchReportDto>>, ApiError> {
    let report = state
        .approve_all_handler
        .handle(ApproveAll {
            revision_id: req.revision_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(BatchReportDto::from(report))))
}

/// 没有批量记录时 data 为 null
pub async fn batch_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevisionIdRequest>,
) -> Json<ApiResponse<Option<BatchProgress>>> {
    let progress = state.get_batch_status_handler.handle(GetBatchStatus {
        revision_id: req.revision_id,
    });

    Json(ApiResponse::success(progress))
}
