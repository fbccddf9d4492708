use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use types::OptimizeResponse;

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Job status", body = jobs::JobStatus),
            (status = 404, description = "Unknown job")
        )
    )]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<jobs::JobStatus>, ApiError> {
    state
        .jobs
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("job {id} not found")))
}

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}/result",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Optimize result (if ready)", body = OptimizeResponse),
            (status = 404, description = "Unknown job")
        )
    )]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let body = match state.jobs.get(&id) {
        Some(jobs::JobStatus::Solved { result }) => {
            serde_json::to_value(result).map_err(|e| ApiError::internal(e.to_string()))?
        }
        Some(jobs::JobStatus::Infeasible { reason, message }) => {
            serde_json::json!({"ok": false, "reason": reason, "message": message})
        }
        Some(jobs::JobStatus::Failed { message }) => {
            serde_json::json!({"ok": false, "reason": "internal_error", "message": message})
        }
        Some(_) => serde_json::json!({"status": "not_ready"}),
        None => return Err(ApiError::not_found(format!("job {id} not found"))),
    };
    Ok(Json(body))
}
