mod config;
mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod generate;
    pub mod health;
    pub mod jobs;
    pub mod optimize;
    pub mod validate;
}

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::validate::validate_handler,
            routes::generate::generate,
            routes::optimize::optimize,
            routes::jobs::status,
            routes::jobs::result,
        ),
        components(schemas(
            types::Instance, types::Faculty, types::Subject, types::Class, types::Combo,
            types::FixedSlot, types::Grid, types::Policy, types::SoftWeights, types::SearchParams,
            types::SubjectKind, types::GenerateRequest, types::GenerateResponse,
            types::OptimizeRequest, types::OptimizeResponse, types::ClassCell, types::FacultyCell,
            types::FacultyId, types::SubjectId, types::ClassId, types::ComboId,
            jobs::JobId, jobs::JobStatus,
            routes::validate::ValidationReport,
            routes::optimize::JobCreated,
        )),
        tags(
            (name = "timetable", description = "Weekly timetable generation API")
        )
    )]
struct ApiDoc;

fn app(state: state::AppState) -> Router {
    Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/generate", post(routes::generate::generate))
        .route("/v1/optimize", post(routes::optimize::optimize))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;
    telemetry::init_logging(config.log_json);

    let app = app(state::AppState::new(&config));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, trials = config.search.trial_count, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
