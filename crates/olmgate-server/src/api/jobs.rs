use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use olmgate_scheduler::{reload_registry, Job, ReloadSummary, RequestTemplate, Schedule};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpsertJobRequest {
    schedule: Schedule,
    request: RequestTemplate,
}

#[derive(Debug, Serialize)]
pub(super) struct RemovedData {
    pub removed: bool,
}

pub(super) async fn upsert_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(payload): Json<UpsertJobRequest>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let job = state
        .registry
        .upsert(&id, payload.schedule, payload.request)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    Ok(Json(ApiResponse {
        data: job,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_jobs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<Job>>> {
    Json(ApiResponse {
        data: state.registry.all(),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn get_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let job = state
        .registry
        .get(&id)
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", format!("no job '{id}'")))?;

    Ok(Json(ApiResponse {
        data: job,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn remove_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RemovedData>>, ApiError> {
    if !state.registry.remove(&id) {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no job '{id}'"),
        ));
    }

    Ok(Json(ApiResponse {
        data: RemovedData { removed: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Rebuild the registry from the product/order sync-config stores.
pub(super) async fn reload_jobs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ReloadSummary>>, ApiError> {
    let registry = Arc::clone(&state.registry);
    let stores = Arc::clone(&state.sync_stores);

    let summary = tokio::task::spawn_blocking(move || reload_registry(&registry, stores.as_slice()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "reload task failed");
            ApiError::new(req_id.0.clone(), "internal_error", "reload task failed")
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "sync config reload failed");
            ApiError::new(req_id.0.clone(), "internal_error", e.to_string())
        })?;

    tracing::info!(
        upserted = summary.upserted,
        removed = summary.removed,
        rejected = summary.rejected,
        "sync jobs reloaded"
    );

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}
