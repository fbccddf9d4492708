use axum::{http::StatusCode, Json};
use serde::Serialize;
use timetable_core::validate;
use types::GenerateRequest;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = GenerateRequest,
    responses(
    (status = 200, description = "Validation and capacity check result", body = ValidationReport)
    )
)]
pub async fn validate_handler(Json(req): Json<GenerateRequest>) -> (StatusCode, Json<ValidationReport>) {
    let report = match validate(&req.instance, req.grid) {
        Ok(()) => ValidationReport {
            ok: true,
            reason: None,
            errors: vec![],
        },
        Err(e) => ValidationReport {
            ok: false,
            reason: Some(e.reason().to_string()),
            errors: vec![e.to_string()],
        },
    };
    (StatusCode::OK, Json(report))
}
