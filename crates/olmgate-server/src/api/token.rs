use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use olmgate_olmed::TokenInfo;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Expiry metadata for the shared token. The token value itself never leaves
/// the process through this API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TokenStatusData {
    pub present: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TokenStatusData {
    fn from_snapshot(info: Option<TokenInfo>) -> Self {
        match info {
            Some(info) => Self {
                present: true,
                expires_at: Some(info.expires_at),
                created_at: Some(info.created_at),
            },
            None => Self {
                present: false,
                expires_at: None,
                created_at: None,
            },
        }
    }
}

pub(super) async fn token_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<TokenStatusData>> {
    Json(ApiResponse {
        data: TokenStatusData::from_snapshot(state.tokens.current()),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn refresh_token(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<TokenStatusData>>, ApiError> {
    let info = state.tokens.refresh_if_needed().await.map_err(|e| {
        tracing::warn!(error = %e, "token refresh request failed");
        ApiError::new(req_id.0.clone(), "upstream_error", e.to_string())
    })?;

    Ok(Json(ApiResponse {
        data: TokenStatusData::from_snapshot(Some(info)),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<TokenStatusData>>, ApiError> {
    let info = state.tokens.login().await.map_err(|e| {
        tracing::warn!(error = %e, "login request failed");
        ApiError::new(req_id.0.clone(), "upstream_error", e.to_string())
    })?;

    Ok(Json(ApiResponse {
        data: TokenStatusData::from_snapshot(Some(info)),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<TokenStatusData>> {
    state.tokens.logout().await;

    Json(ApiResponse {
        data: TokenStatusData::from_snapshot(None),
        meta: ResponseMeta::new(req_id.0),
    })
}
