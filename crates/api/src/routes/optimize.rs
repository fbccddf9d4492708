use crate::state::AppState;
use axum::{extract::State, Json};
use types::OptimizeRequest;
use utoipa::ToSchema;

#[derive(serde::Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[utoipa::path(
        post,
        path = "/v1/optimize",
        request_body = OptimizeRequest,
        responses((status = 200, description = "Optimize job enqueued", body = JobCreated))
    )]
pub async fn optimize(
    State(state): State<AppState>,
    Json(req): Json<OptimizeRequest>,
) -> Json<JobCreated> {
    let id = state.jobs.enqueue(req);
    Json(JobCreated {
        job_id: id.0,
        status: "queued",
    })
}
