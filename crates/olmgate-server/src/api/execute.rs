use axum::{extract::State, Extension, Json};
use olmgate_scheduler::{ExecutionOutcome, RequestTemplate};

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

/// One-off execution of a request template, bypassing the registry.
///
/// The outcome is returned to the caller but recorded nowhere, since ad-hoc
/// executions have no owning job.
pub(super) async fn execute_ad_hoc(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(template): Json<RequestTemplate>,
) -> Json<ApiResponse<ExecutionOutcome>> {
    let outcome = state.executor.execute(&template).await;

    Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    })
}
