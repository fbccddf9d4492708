use axum::{extract::State, http::StatusCode, Json};
use types::{GenerateRequest, GenerateResponse};

use crate::error::ApiError;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/v1/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Feasible timetable", body = GenerateResponse),
        (status = 400, description = "Rejected input or no feasible assignment", body = GenerateResponse)
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), ApiError> {
    let engine = state.engine.clone();
    let res = tokio::task::spawn_blocking(move || engine.generate(&req))
        .await
        .map_err(|e| ApiError::internal(format!("generation task failed: {e}")))?;
    let status = if res.ok {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(res)))
}
